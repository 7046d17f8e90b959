use crate::entities::{apollonyar_entity, log_entity};
use crate::utils::format_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Issuer name used when an action was not performed by staff
pub const SYSTEM_ISSUER: &str = "سیستم";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogResponse {
    pub id: i32,
    pub action: String,
    pub description: Option<String>,
    pub profile_id: Option<i32>,
    pub issuer_apollonyar_id: Option<i32>,
    pub issuer_name: String,
    pub timestamp: DateTime<Utc>,
    pub timestamp_formatted: String,
}

impl LogResponse {
    pub fn new(log: log_entity::Model, issuer: Option<&apollonyar_entity::Model>) -> Self {
        Self {
            issuer_name: issuer
                .map(|a| a.full_name())
                .unwrap_or_else(|| SYSTEM_ISSUER.to_string()),
            timestamp_formatted: format_datetime(log.timestamp),
            id: log.id,
            action: log.action,
            description: log.description,
            profile_id: log.profile_id,
            issuer_apollonyar_id: log.issuer_apollonyar_id,
            timestamp: log.timestamp,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub profile_id: Option<i32>,
    pub issuer_apollonyar_id: Option<i32>,
    pub action: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn log_row(issuer: Option<i32>) -> log_entity::Model {
        let ts = Utc.with_ymd_and_hms(2025, 9, 1, 8, 30, 0).unwrap();
        log_entity::Model {
            id: 1,
            action: "تغییر ترم".into(),
            issuer_apollonyar_id: issuer,
            profile_id: Some(3),
            description: None,
            timestamp: ts,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_system_issuer_when_missing() {
        let view = LogResponse::new(log_row(None), None);
        assert_eq!(view.issuer_name, SYSTEM_ISSUER);
        assert_eq!(view.timestamp_formatted, "2025/09/01 08:30");
    }

    #[test]
    fn test_issuer_full_name() {
        let ts = Utc::now();
        let issuer = apollonyar_entity::Model {
            id: 5,
            first_name: "Sara".into(),
            last_name: "Ahmadi".into(),
            phone_number: "09120000000".into(),
            password_hash: String::new(),
            telegram_id: None,
            is_admin: false,
            is_blocked: false,
            created_at: ts,
            updated_at: ts,
        };
        let view = LogResponse::new(log_row(Some(5)), Some(&issuer));
        assert_eq!(view.issuer_name, "Sara Ahmadi");
    }
}
