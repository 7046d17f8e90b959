use super::{ApollonyarSummary, UserSummary};
use crate::entities::{InstallmentStatus, PaymentMethod, TransactionType, VerificationStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionNoteResponse {
    pub id: i32,
    pub transaction_id: i32,
    pub note: String,
    pub timestamp: DateTime<Utc>,
    pub author_apollonyar: Option<ApollonyarSummary>,
    pub author: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: i32,
    pub target_user_id: i32,
    pub target_user: Option<UserSummary>,
    pub amount: i64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub type_label: String,
    pub timestamp: DateTime<Utc>,
    pub date_time: String,
    pub reference_number: Option<String>,
    pub tracking_number: String,
    pub payment_method: PaymentMethod,
    pub payment_method_label: String,
    pub verification_status: VerificationStatus,
    pub status_label: String,
    pub verification_timestamp: Option<DateTime<Utc>>,
    pub receipt_image: Option<String>,
    pub notes: Vec<TransactionNoteResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    pub target_user_id: i32,
    pub amount: i64,
    /// `deposit` / `withdrawal` or the display label
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// Defaults to now
    pub timestamp: Option<DateTime<Utc>>,
    pub reference_number: Option<String>,
    pub payment_method: String,
    pub receipt_image: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateTransactionRequest {
    pub amount: Option<i64>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub reference_number: Option<String>,
    pub payment_method: Option<String>,
    pub receipt_image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyTransactionRequest {
    /// `pending`, `valid` or `invalid`
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddTransactionNoteRequest {
    pub note: String,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub target_user_id: Option<i32>,
    pub verification_status: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InstallmentResponse {
    pub id: i32,
    pub profile_id: i32,
    pub transaction_id: Option<i32>,
    pub due_amount: i64,
    pub due_date: NaiveDate,
    pub status: InstallmentStatus,
    pub is_splited: bool,
    pub student_name: String,
    pub phone: String,
    /// `YYYY/MM/DD`
    pub due_date_formatted: String,
    /// due_date minus today, in days
    pub days_remaining: i64,
    pub payment_status: String,
    pub term: String,
    pub course: String,
    pub apollonyar: String,
    pub course_status: String,
    pub student_id: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateInstallmentRequest {
    pub profile_id: i32,
    pub due_amount: i64,
    pub due_date: NaiveDate,
    pub status: Option<String>,
    pub transaction_id: Option<i32>,
    #[serde(default)]
    pub is_splited: bool,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateInstallmentRequest {
    pub due_amount: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub transaction_id: Option<i32>,
    pub is_splited: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InstallmentQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub profile_id: Option<i32>,
    pub status: Option<String>,
    /// Only unpaid installments past their due date
    pub overdue: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Installment,
    Transaction,
}

/// One row of the merged installment/transaction timeline
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentEntry {
    /// `installment_<id>` or `transaction_<id>`
    pub id: String,
    pub kind: PaymentKind,
    #[serde(rename = "type")]
    pub type_label: String,
    pub amount: i64,
    /// `YYYY/MM/DD`
    pub date: String,
    pub method: String,
    pub status: String,
    pub payment_status: String,
    pub transaction_id: Option<i32>,
    pub due_date: Option<String>,
    #[serde(skip)]
    pub sort_key: NaiveDate,
}
