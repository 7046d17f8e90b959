use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// An expected upload slot (or help file) of an assignment definition
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "assignment_def_templates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub assignment_def_id: i32,
    pub title: String,
    pub file: String,
    pub is_help_file: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
