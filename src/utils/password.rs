use bcrypt::{DEFAULT_COST, hash, verify};
use crate::error::{AppError, AppResult};

/// Password strength: 8-128 chars with upper, lower and digit
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < 8 || password.len() > 128 {
        return Err(AppError::field(
            "password",
            "Password must be between 8 and 128 characters",
        ));
    }

    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_lowercase || !has_uppercase || !has_digit {
        return Err(AppError::field(
            "password",
            "Password must contain upper and lower case letters and a digit",
        ));
    }

    Ok(())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    verify(password, hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Password123").is_ok());
        assert!(validate_password("password123").is_err()); // no upper case
        assert!(validate_password("PASSWORD123").is_err()); // no lower case
        assert!(validate_password("Password").is_err()); // no digit
        assert!(validate_password("Pass123").is_err()); // too short
    }

    #[test]
    fn test_hash_and_verify_password() {
        let password = "Password123";
        let hashed = hash_password(password).unwrap();

        assert!(verify_password(password, &hashed).unwrap());
        assert!(!verify_password("WrongPassword", &hashed).unwrap());
    }
}
