use crate::entities::{assignment_def_entity, assignment_def_template_entity, call_def_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TemplateResponse {
    pub id: i32,
    pub assignment_def_id: i32,
    pub title: String,
    pub file: String,
    pub is_help_file: bool,
}

impl From<assignment_def_template_entity::Model> for TemplateResponse {
    fn from(t: assignment_def_template_entity::Model) -> Self {
        Self {
            id: t.id,
            assignment_def_id: t.assignment_def_id,
            title: t.title,
            file: t.file,
            is_help_file: t.is_help_file,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignmentDefResponse {
    pub id: i32,
    pub term_id: i32,
    pub title: String,
    pub deadline: DateTime<Utc>,
    pub is_required: bool,
    pub templates: Vec<TemplateResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssignmentDefResponse {
    pub fn new(
        def: assignment_def_entity::Model,
        templates: Vec<assignment_def_template_entity::Model>,
    ) -> Self {
        Self {
            id: def.id,
            term_id: def.term_id,
            title: def.title,
            deadline: def.deadline,
            is_required: def.is_required,
            templates: templates.into_iter().map(Into::into).collect(),
            created_at: def.created_at,
            updated_at: def.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTemplateRequest {
    pub title: String,
    pub file: String,
    #[serde(default)]
    pub is_help_file: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateAssignmentDefRequest {
    pub term_id: i32,
    pub title: String,
    pub deadline: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_required: bool,
    #[serde(default)]
    pub templates: Vec<CreateTemplateRequest>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateAssignmentDefRequest {
    pub title: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub is_required: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CallDefResponse {
    pub id: i32,
    pub term_id: i32,
    pub title: String,
    pub start_due_date: DateTime<Utc>,
    pub end_due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<call_def_entity::Model> for CallDefResponse {
    fn from(c: call_def_entity::Model) -> Self {
        Self {
            id: c.id,
            term_id: c.term_id,
            title: c.title,
            start_due_date: c.start_due_date,
            end_due_date: c.end_due_date,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCallDefRequest {
    pub term_id: i32,
    pub title: String,
    pub start_due_date: DateTime<Utc>,
    pub end_due_date: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateCallDefRequest {
    pub term_id: Option<i32>,
    pub title: Option<String>,
    pub start_due_date: Option<DateTime<Utc>>,
    pub end_due_date: Option<DateTime<Utc>>,
}
