use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Per-field validation messages, serialized as `{"field": ["msg", ...]}`
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Ok when nothing was collected, otherwise a `FieldValidation` error.
    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::FieldValidation(self))
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, msgs)| format!("{field}: {}", msgs.join(", ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Validation error: {0}")]
    FieldValidation(FieldErrors),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    /// Shorthand for a single-field validation failure.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        AppError::FieldValidation(errors)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            AppError::ValidationError(_) | AppError::FieldValidation(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden | AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let (error_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                ("VALIDATION_ERROR", msg.clone())
            }
            AppError::FieldValidation(fields) => {
                log::warn!("Validation error: {fields}");
                ("VALIDATION_ERROR", "Invalid input".to_string())
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                ("AUTH_ERROR", msg.clone())
            }
            AppError::JwtError(err) => {
                log::warn!("Token rejected: {err}");
                ("AUTH_ERROR", "Invalid or expired token".to_string())
            }
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            AppError::Forbidden => {
                log::warn!("Forbidden access");
                ("FORBIDDEN", "Forbidden".to_string())
            }
            AppError::PermissionDenied => {
                log::warn!("Permission denied");
                ("FORBIDDEN", "Permission denied".to_string())
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                ("DATABASE_ERROR", "Database error".to_string())
            }
            _ => {
                log::error!("Internal error: {self}");
                ("INTERNAL_ERROR", "Internal server error".to_string())
            }
        };

        let body = match self {
            AppError::FieldValidation(fields) => json!({
                "success": false,
                "error": {
                    "code": error_code,
                    "message": message,
                    "fields": fields
                }
            }),
            _ => json!({
                "success": false,
                "error": {
                    "code": error_code,
                    "message": message
                }
            }),
        };

        HttpResponse::build(status_code).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::field("term_id", "missing").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::AuthError("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::PermissionDenied.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InternalError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_field_errors_collect() {
        let mut errors = FieldErrors::new();
        assert!(errors.clone().into_result().is_ok());
        errors.add("term_id", "Term does not exist");
        errors.add("term_id", "Term belongs to another course");
        errors.add("group_id", "Group does not exist");
        assert!(errors.contains("term_id"));
        assert_eq!(errors.0["term_id"].len(), 2);
        assert!(matches!(errors.into_result(), Err(AppError::FieldValidation(_))));
    }
}
