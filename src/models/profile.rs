use super::{ApollonyarSummary, GroupSummary, LogResponse, TermSummary, UserSummary};
use crate::entities::{ProfileStatus, ProfileType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Full enrollment view with nested records and derived display fields
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: i32,
    pub user: Option<UserSummary>,
    pub term: Option<TermSummary>,
    pub group: Option<GroupSummary>,
    pub apollonyar: Option<ApollonyarSummary>,
    pub sales_representative: Option<ApollonyarSummary>,
    #[serde(rename = "type")]
    pub profile_type: ProfileType,
    pub status: ProfileStatus,
    pub hearts: i16,
    pub stars: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub name: String,
    pub phone: String,
    pub birth_year: Option<i32>,
    pub city: Option<String>,
    pub student_type: String,
    pub enrollment_status: String,
    pub access_status: String,
    pub term_name: String,
    pub term_start_date: Option<String>,
    pub term_end_date: Option<String>,
    pub apollonyar_name: String,
    pub apollonyar_telegram_id: Option<String>,
    pub apollonyar_id: Option<i32>,
    pub course_id: i32,
    pub total_course_fee: i64,
    pub earned_medal_ids: Vec<i32>,
    pub action_logs: Vec<LogResponse>,
    pub enrolled_courses: Vec<EnrolledCourse>,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnrolledCourse {
    pub course_id: i32,
    pub course_name: String,
    pub term_id: Option<i32>,
    pub term_name: Option<String>,
    pub enrollment_id: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateProfileRequest {
    pub user_id: i32,
    /// Taken from the term when omitted
    pub course_id: Option<i32>,
    pub term_id: Option<i32>,
    pub group_id: Option<i32>,
    pub apollonyar_id: Option<i32>,
    pub sales_representative_id: Option<i32>,
    /// Stored value or display label
    #[serde(rename = "type")]
    pub profile_type: Option<String>,
    pub status: Option<String>,
    pub hearts: Option<i16>,
    pub stars: Option<f64>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub group_id: Option<i32>,
    pub sales_representative_id: Option<i32>,
    pub hearts: Option<i16>,
    pub stars: Option<f64>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProfileQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub user_id: Option<i32>,
    pub course_id: Option<i32>,
    pub term_id: Option<i32>,
    pub group_id: Option<i32>,
    pub apollonyar_id: Option<i32>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub profile_type: Option<String>,
    /// Matches the student's name or phone number
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogCallRequest {
    pub call_def_id: Option<i32>,
    #[serde(rename = "type")]
    pub call_type: String,
    pub status: Option<String>,
    pub description: Option<String>,
    /// Defaults to now
    pub call_timestamp: Option<DateTime<Utc>>,
}

/// Accepts either `note` or `text`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddNoteRequest {
    pub note: Option<String>,
    pub text: Option<String>,
}

impl AddNoteRequest {
    pub fn body(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.note.as_deref().filter(|n| !n.trim().is_empty()))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RemoveNoteRequest {
    #[serde(alias = "noteId")]
    pub note_id: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangeTermRequest {
    #[serde(alias = "termId")]
    pub term_id: i32,
    #[serde(alias = "groupId")]
    pub group_id: Option<i32>,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangeApollonyarRequest {
    #[serde(alias = "apollonyarId")]
    pub apollonyar_id: i32,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangeTypeRequest {
    #[serde(rename = "type", alias = "student_type", alias = "studentType")]
    pub profile_type: String,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangeStatusRequest {
    pub status: String,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InstallmentInput {
    pub amount: i64,
    #[serde(alias = "dueDate")]
    #[schema(example = "2025-10-01")]
    pub due_date: NaiveDate,
    /// Defaults to `pending`
    #[serde(alias = "paymentStatus")]
    pub status: Option<String>,
    #[serde(alias = "transactionId")]
    pub transaction_id: Option<i32>,
    #[serde(default, alias = "isSplited")]
    pub is_splited: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateInstallmentsRequest {
    pub installments: Vec<InstallmentInput>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateInstallmentsRequest {
    pub count: u32,
    #[schema(example = "2025-10-01")]
    pub start_date: NaiveDate,
    #[serde(default = "default_interval_months")]
    pub interval_months: u32,
    pub discount_code: Option<String>,
}

fn default_interval_months() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_body_prefers_text() {
        let req = AddNoteRequest {
            note: Some("from note".into()),
            text: Some("from text".into()),
        };
        assert_eq!(req.body(), Some("from text"));

        let req = AddNoteRequest {
            note: Some("only note".into()),
            text: Some("   ".into()),
        };
        assert_eq!(req.body(), Some("only note"));

        let req = AddNoteRequest {
            note: None,
            text: None,
        };
        assert_eq!(req.body(), None);
    }

    #[test]
    fn test_change_type_accepts_alias() {
        let req: ChangeTypeRequest =
            serde_json::from_str(r#"{"student_type": "خودخوان"}"#).unwrap();
        assert_eq!(req.profile_type, "خودخوان");
        let req: ChangeTypeRequest = serde_json::from_str(r#"{"type": "term-based"}"#).unwrap();
        assert_eq!(req.profile_type, "term-based");
    }

    #[test]
    fn test_installment_input_accepts_camel_case() {
        let req: UpdateInstallmentsRequest = serde_json::from_str(
            r#"{"installments": [
                {"amount": 500, "dueDate": "2025-10-01", "paymentStatus": "Paid", "transactionId": 7},
                {"amount": 300, "due_date": "2025-11-01"}
            ]}"#,
        )
        .unwrap();
        let first = &req.installments[0];
        assert_eq!(first.due_date, NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
        assert_eq!(first.status.as_deref(), Some("Paid"));
        assert_eq!(first.transaction_id, Some(7));
        assert!(!first.is_splited);
        assert_eq!(req.installments[1].status, None);
    }

    #[test]
    fn test_generate_request_defaults_interval() {
        let req: GenerateInstallmentsRequest =
            serde_json::from_str(r#"{"count": 3, "start_date": "2025-10-01"}"#).unwrap();
        assert_eq!(req.interval_months, 1);
        assert!(req.discount_code.is_none());
    }
}
