use super::choice::choice_enum;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

choice_enum! {
    CallType {
        Course => ("course", "دوره"),
        Installment => ("installment", "قسط"),
        Cancellation => ("cancellation", "انصراف"),
        Other => ("other", "غیره"),
    }
}

choice_enum! {
    CallStatus {
        Pending => ("pending", "در انتظار"),
        NotAnswered => ("not_answered", "بی‌پاسخ"),
        Successful => ("successful", "موفق"),
        Lost => ("lost", "سوخته"),
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "calls")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub profile_id: i32,
    pub call_def_id: Option<i32>,
    pub caller_id: Option<i32>,
    #[sea_orm(column_name = "type")]
    pub call_type: CallType,
    pub status: CallStatus,
    pub call_timestamp: DateTime<Utc>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
