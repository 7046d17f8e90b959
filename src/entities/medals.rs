use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// A medal definition awarded to a profile
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "medals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub profile_id: i32,
    pub medal_def_id: i32,
    pub giver_apollonyar_id: Option<i32>,
    pub description: Option<String>,
    pub awarded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
