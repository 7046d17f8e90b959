use super::ApollonyarSummary;
use crate::entities::{CallStatus, CallType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CallResponse {
    pub id: i32,
    pub profile_id: i32,
    #[serde(rename = "type")]
    pub call_type: CallType,
    pub type_label: String,
    pub status: CallStatus,
    pub call_status: String,
    pub call_timestamp: DateTime<Utc>,
    pub description: Option<String>,
    pub caller: Option<ApollonyarSummary>,
    pub call_def_id: Option<i32>,
    pub call_def: Option<String>,
    pub student_name: String,
    pub phone: String,
    /// Campaign title, or the call type when logged outside a campaign
    pub topic: String,
    pub hearts: i16,
    pub course: String,
    pub term: String,
    pub student_id: i32,
    pub apollonyar: String,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateCallRequest {
    pub call_def_id: Option<i32>,
    #[serde(rename = "type")]
    pub call_type: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub call_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub profile_id: Option<i32>,
    pub caller_id: Option<i32>,
    pub call_def_id: Option<i32>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub call_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    pub id: i32,
    pub profile_id: i32,
    pub note: String,
    pub timestamp: DateTime<Utc>,
    pub author_apollonyar: Option<ApollonyarSummary>,
    /// `YYYY/MM/DD`
    pub date: String,
    pub author: String,
}
