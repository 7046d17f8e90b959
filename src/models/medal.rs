use super::ApollonyarSummary;
use crate::entities::{medal_def_entity, medal_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MedalDefResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<medal_def_entity::Model> for MedalDefResponse {
    fn from(m: medal_def_entity::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            icon: m.icon,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateMedalDefRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub icon: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateMedalDefRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// An awarded medal
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MedalResponse {
    pub id: i32,
    pub profile_id: i32,
    pub medal_def_id: i32,
    pub title: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub giver: Option<ApollonyarSummary>,
    pub awarded_at: DateTime<Utc>,
}

impl MedalResponse {
    pub fn new(
        medal: medal_entity::Model,
        def: &medal_def_entity::Model,
        giver: Option<ApollonyarSummary>,
    ) -> Self {
        Self {
            id: medal.id,
            profile_id: medal.profile_id,
            medal_def_id: medal.medal_def_id,
            title: def.title.clone(),
            icon: def.icon.clone(),
            description: medal.description,
            giver,
            awarded_at: medal.awarded_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddMedalRequest {
    #[serde(alias = "medalId")]
    pub medal_def_id: i32,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RemoveMedalRequest {
    #[serde(alias = "medalId")]
    pub medal_def_id: i32,
}
