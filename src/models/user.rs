use crate::entities::{Choice, Sex, user_entity};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub is_active: bool,
    pub phone_2_number: Option<String>,
    pub sex: Option<Sex>,
    pub sex_label: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub country: Option<String>,
    pub state_province: Option<String>,
    pub city: Option<String>,
    pub full_address: Option<String>,
    pub postal_code: Option<String>,
    pub photo: Option<String>,
    pub has_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user_entity::Model> for UserResponse {
    fn from(user: user_entity::Model) -> Self {
        Self {
            full_name: user.full_name(),
            id: user.id,
            phone_number: user.phone_number,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            is_active: user.is_active,
            phone_2_number: user.phone_2_number,
            sex: user.sex,
            sex_label: user.sex.map(|s| s.label().to_string()),
            birthday: user.birthday,
            country: user.country,
            state_province: user.state_province,
            city: user.city,
            full_address: user.full_address,
            postal_code: user.postal_code,
            photo: user.photo,
            has_password: user.password_hash.is_some(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Compact user block nested in other views
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&user_entity::Model> for UserSummary {
    fn from(user: &user_entity::Model) -> Self {
        Self {
            id: user.id,
            phone_number: user.phone_number.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "09121234567")]
    pub phone_number: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub phone_2_number: Option<String>,
    /// `male` / `female` or the display label
    pub sex: Option<String>,
    #[schema(example = "1995-04-21")]
    pub birthday: Option<NaiveDate>,
    pub country: Option<String>,
    pub state_province: Option<String>,
    pub city: Option<String>,
    pub full_address: Option<String>,
    pub postal_code: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub phone_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub phone_2_number: Option<String>,
    pub sex: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub country: Option<String>,
    pub state_province: Option<String>,
    pub city: Option<String>,
    pub full_address: Option<String>,
    pub postal_code: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Matches first name, last name or phone number
    pub search: Option<String>,
    pub is_active: Option<bool>,
}
