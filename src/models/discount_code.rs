use crate::entities::discount_code_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DiscountCodeResponse {
    pub id: i32,
    pub code: String,
    pub cash_price: Option<i64>,
    pub installment_price: Option<i64>,
    pub max_usage: i32,
    pub usage_count: i32,
    pub expiration_date: Option<DateTime<Utc>>,
    pub is_usable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiscountCodeResponse {
    pub fn new(code: discount_code_entity::Model, now: DateTime<Utc>) -> Self {
        Self {
            is_usable: code.is_usable(now),
            id: code.id,
            code: code.code,
            cash_price: code.cash_price,
            installment_price: code.installment_price,
            max_usage: code.max_usage,
            usage_count: code.usage_count,
            expiration_date: code.expiration_date,
            created_at: code.created_at,
            updated_at: code.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateDiscountCodeRequest {
    /// Generated when omitted
    pub code: Option<String>,
    pub cash_price: Option<i64>,
    pub installment_price: Option<i64>,
    pub max_usage: Option<i32>,
    pub expiration_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateDiscountCodeRequest {
    pub code: Option<String>,
    pub cash_price: Option<i64>,
    pub installment_price: Option<i64>,
    pub max_usage: Option<i32>,
    pub expiration_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidateDiscountCodeRequest {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DiscountValidationResponse {
    pub code: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub cash_price: Option<i64>,
    pub installment_price: Option<i64>,
    pub remaining_uses: i32,
}
