use crate::entities::apollonyar_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApollonyarResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone_number: String,
    pub telegram_id: Option<String>,
    pub is_admin: bool,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<apollonyar_entity::Model> for ApollonyarResponse {
    fn from(a: apollonyar_entity::Model) -> Self {
        Self {
            full_name: a.full_name(),
            id: a.id,
            first_name: a.first_name,
            last_name: a.last_name,
            phone_number: a.phone_number,
            telegram_id: a.telegram_id,
            is_admin: a.is_admin,
            is_blocked: a.is_blocked,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

/// Compact staff block nested in profile, note and call views
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApollonyarSummary {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub telegram_id: Option<String>,
}

impl From<&apollonyar_entity::Model> for ApollonyarSummary {
    fn from(a: &apollonyar_entity::Model) -> Self {
        Self {
            id: a.id,
            first_name: a.first_name.clone(),
            last_name: a.last_name.clone(),
            telegram_id: a.telegram_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateApollonyarRequest {
    pub first_name: String,
    pub last_name: String,
    #[schema(example = "09121234567")]
    pub phone_number: String,
    pub password: String,
    pub telegram_id: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateApollonyarRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub telegram_id: Option<String>,
    pub is_admin: Option<bool>,
    pub is_blocked: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApollonyarQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub search: Option<String>,
}
