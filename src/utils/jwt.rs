use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Who a token was issued to. Students and staff live in separate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Staff,
    Admin,
}

impl Role {
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id or apollonyar id, depending on role
    pub role: Role,
    pub phone: String,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String, // "access" or "refresh"
}

impl Claims {
    pub fn subject_id(&self) -> AppResult<i32> {
        self.sub
            .parse::<i32>()
            .map_err(|_| AppError::AuthError("Malformed token subject".to_string()))
    }
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_in: i64,
    refresh_token_expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, access_expires_in: i64, refresh_expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in: access_expires_in,
            refresh_token_expires_in: refresh_expires_in,
        }
    }

    fn issue(&self, id: i32, role: Role, phone: &str, token_type: &str, ttl: i64) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(ttl);

        let claims = Claims {
            sub: id.to_string(),
            role,
            phone: phone.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: token_type.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn generate_access_token(&self, id: i32, role: Role, phone: &str) -> AppResult<String> {
        self.issue(id, role, phone, "access", self.access_token_expires_in)
    }

    pub fn generate_refresh_token(&self, id: i32, role: Role, phone: &str) -> AppResult<String> {
        self.issue(id, role, phone, "refresh", self.refresh_token_expires_in)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    pub fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.token_type != "access" {
            return Err(AppError::AuthError("Invalid access token type".to_string()));
        }

        Ok(claims)
    }

    pub fn verify_refresh_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.token_type != "refresh" {
            return Err(AppError::AuthError("Invalid refresh token type".to_string()));
        }

        Ok(claims)
    }

    pub fn get_access_token_expires_in(&self) -> i64 {
        self.access_token_expires_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test-secret", 60, 120)
    }

    #[test]
    fn test_access_token_roundtrip() {
        let jwt = service();
        let token = jwt.generate_access_token(7, Role::Admin, "09121234567").unwrap();
        let claims = jwt.verify_access_token(&token).unwrap();
        assert_eq!(claims.subject_id().unwrap(), 7);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.phone, "09121234567");
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let jwt = service();
        let refresh = jwt.generate_refresh_token(1, Role::Student, "09121234567").unwrap();
        assert!(jwt.verify_access_token(&refresh).is_err());
        assert!(jwt.verify_refresh_token(&refresh).is_ok());

        let access = jwt.generate_access_token(1, Role::Student, "09121234567").unwrap();
        assert!(jwt.verify_refresh_token(&access).is_err());
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let token = service()
            .generate_access_token(1, Role::Staff, "09121234567")
            .unwrap();
        let other = JwtService::new("another-secret", 60, 120);
        assert!(other.verify_access_token(&token).is_err());
    }

    #[test]
    fn test_role_is_staff() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Staff.is_staff());
        assert!(!Role::Student.is_staff());
    }
}
