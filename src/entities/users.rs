use super::choice::choice_enum;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;

choice_enum! {
    Sex {
        Male => ("male", "مرد"),
        Female => ("female", "زن"),
    }
}

/// A student, identified by phone number
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
    #[sea_orm(column_name = "phone_2_number")]
    pub phone_2_number: Option<String>,
    pub sex: Option<Sex>,
    pub birthday: Option<NaiveDate>,
    pub country: Option<String>,
    pub state_province: Option<String>,
    pub city: Option<String>,
    pub full_address: Option<String>,
    pub postal_code: Option<String>,
    pub photo: Option<String>,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
