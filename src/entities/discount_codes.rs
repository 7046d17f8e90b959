use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "discount_codes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
    /// Amount taken off a one-off payment
    pub cash_price: Option<i64>,
    /// Amount taken off an installment plan
    pub installment_price: Option<i64>,
    pub max_usage: i32,
    pub usage_count: i32,
    pub expiration_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date.is_some_and(|exp| exp <= now)
    }

    pub fn is_exhausted(&self) -> bool {
        self.usage_count >= self.max_usage
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && !self.is_exhausted()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
