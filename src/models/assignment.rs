use super::ApollonyarSummary;
use crate::entities::assignment_submission_files;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const MIN_GRADE: i16 = 0;
pub const MAX_GRADE: i16 = 100;

/// Review state derived from the latest submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    NotSubmitted,
    PendingReview,
    Reviewed,
}

impl AssignmentStatus {
    pub fn from_latest(latest: Option<&SubmissionResponse>) -> Self {
        match latest {
            None => AssignmentStatus::NotSubmitted,
            Some(s) if s.grade.is_some() => AssignmentStatus::Reviewed,
            Some(_) => AssignmentStatus::PendingReview,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssignmentStatus::NotSubmitted => "ارسال نشده",
            AssignmentStatus::PendingReview => "در انتظار بررسی",
            AssignmentStatus::Reviewed => "بررسی شده",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        [
            AssignmentStatus::NotSubmitted,
            AssignmentStatus::PendingReview,
            AssignmentStatus::Reviewed,
        ]
        .into_iter()
        .find(|s| {
            s.label() == input
                || serde_json::to_value(s)
                    .ok()
                    .and_then(|v| v.as_str().map(|v| v == input))
                    .unwrap_or(false)
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionFileResponse {
    pub id: i32,
    pub template_id: i32,
    pub template_title: Option<String>,
    pub file: String,
    pub description: Option<String>,
}

impl SubmissionFileResponse {
    pub fn new(file: assignment_submission_files::Model, template_title: Option<String>) -> Self {
        Self {
            id: file.id,
            template_id: file.template_id,
            template_title,
            file: file.file,
            description: file.description,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResponse {
    pub id: i32,
    pub assignment_id: i32,
    pub submitted_at: DateTime<Utc>,
    pub grade: Option<i16>,
    pub feedback: Option<String>,
    pub assessed_at: Option<DateTime<Utc>>,
    pub assessor: Option<ApollonyarSummary>,
    pub files: Vec<SubmissionFileResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignmentResponse {
    pub id: i32,
    pub profile_id: i32,
    pub assignment_def_id: i32,
    pub assignment_title: String,
    pub is_required: bool,
    pub deadline: DateTime<Utc>,
    /// Newest first
    pub submissions: Vec<SubmissionResponse>,
    pub student_name: String,
    pub phone: String,
    pub course: String,
    pub term: String,
    pub student_id: i32,
    pub apollonyar: String,
    pub submission_date: Option<String>,
    pub review_date: Option<String>,
    pub status: AssignmentStatus,
    pub status_label: String,
    pub grade: Option<i16>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionFileInput {
    pub template_id: i32,
    pub file: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitAssignmentRequest {
    pub files: Vec<SubmissionFileInput>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GradeSubmissionRequest {
    pub grade: i16,
    pub feedback: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateDueDateRequest {
    /// `YYYY-MM-DD`
    #[serde(alias = "dueDate")]
    pub due_date: String,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AssignmentQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub profile_id: Option<i32>,
    pub assignment_def_id: Option<i32>,
    /// `not_submitted`, `pending_review`, `reviewed` or the display label
    pub status: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubmissionQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub assignment_id: Option<i32>,
    pub graded: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(grade: Option<i16>) -> SubmissionResponse {
        SubmissionResponse {
            id: 1,
            assignment_id: 1,
            submitted_at: Utc::now(),
            grade,
            feedback: None,
            assessed_at: None,
            assessor: None,
            files: Vec::new(),
        }
    }

    #[test]
    fn test_status_from_latest_submission() {
        assert_eq!(AssignmentStatus::from_latest(None), AssignmentStatus::NotSubmitted);
        assert_eq!(
            AssignmentStatus::from_latest(Some(&submission(None))),
            AssignmentStatus::PendingReview
        );
        assert_eq!(
            AssignmentStatus::from_latest(Some(&submission(Some(80)))),
            AssignmentStatus::Reviewed
        );
        assert_eq!(AssignmentStatus::Reviewed.label(), "بررسی شده");
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(AssignmentStatus::parse("reviewed"), Some(AssignmentStatus::Reviewed));
        assert_eq!(
            AssignmentStatus::parse("در انتظار بررسی"),
            Some(AssignmentStatus::PendingReview)
        );
        assert_eq!(AssignmentStatus::parse("graded"), None);
    }
}
