use super::choice::choice_enum;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;

choice_enum! {
    InstallmentStatus {
        Pending => ("pending", "در انتظار"),
        Paid => ("paid", "پرداخت شده"),
        Refund => ("refund", "عودت شده"),
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "installments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub profile_id: i32,
    pub transaction_id: Option<i32>,
    pub due_amount: i64,
    pub due_date: NaiveDate,
    pub status: InstallmentStatus,
    pub is_splited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
