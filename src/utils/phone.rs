use regex::Regex;
use std::sync::OnceLock;
use crate::error::{AppError, AppResult};

fn mobile_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^09\d{9}$").expect("static mobile regex"))
}

/// Normalizes an Iranian mobile number to the local `09xxxxxxxxx` form.
///
/// Accepts `+98`, `0098` and `98` prefixes, Persian/Arabic-Indic digits and
/// separators. Anything that cannot be normalized is returned unchanged (trimmed).
pub fn normalize_phone(phone: &str) -> String {
    let digits: String = phone
        .chars()
        .filter_map(|c| match c {
            '0'..='9' => Some(c),
            '۰'..='۹' => char::from_digit(c as u32 - '۰' as u32, 10),
            '٠'..='٩' => char::from_digit(c as u32 - '٠' as u32, 10),
            _ => None,
        })
        .collect();

    let local = if let Some(rest) = digits.strip_prefix("0098") {
        format!("0{rest}")
    } else if digits.len() == 12 && digits.starts_with("98") {
        format!("0{}", &digits[2..])
    } else if digits.len() == 10 && digits.starts_with('9') {
        format!("0{digits}")
    } else {
        digits
    };

    if local.is_empty() {
        phone.trim().to_string()
    } else {
        local
    }
}

/// Validates an already-normalized mobile number.
pub fn validate_phone(phone: &str) -> AppResult<()> {
    if !mobile_regex().is_match(phone) {
        return Err(AppError::field(
            "phone_number",
            "Invalid mobile number, expected 09xxxxxxxxx",
        ));
    }

    Ok(())
}

/// Normalize then validate; returns the canonical form.
pub fn canonical_phone(phone: &str) -> AppResult<String> {
    let normalized = normalize_phone(phone);
    validate_phone(&normalized)?;
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("09121234567").is_ok());
        assert!(validate_phone("0912123456").is_err());
        assert!(validate_phone("9121234567").is_err());
        assert!(validate_phone("08121234567").is_err());
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("09121234567"), "09121234567");
        assert_eq!(normalize_phone("+989121234567"), "09121234567");
        assert_eq!(normalize_phone("00989121234567"), "09121234567");
        assert_eq!(normalize_phone("9121234567"), "09121234567");
        assert_eq!(normalize_phone("0912 123 4567"), "09121234567");
        assert_eq!(normalize_phone("۰۹۱۲۱۲۳۴۵۶۷"), "09121234567");
    }

    #[test]
    fn test_canonical_phone() {
        assert_eq!(canonical_phone("+98 912 123 4567").unwrap(), "09121234567");
        assert!(canonical_phone("12345").is_err());
    }
}
