use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Term-level assignment, instantiated once per enrolled profile
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "assignment_defs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub term_id: i32,
    pub title: String,
    pub deadline: DateTime<Utc>,
    pub is_required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
