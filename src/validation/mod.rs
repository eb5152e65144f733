use bigdecimal::BigDecimal;
use std::fmt;
use std::str::FromStr;

pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 50;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PASSWORD_MIN_LEN: usize = 6;
// bcrypt truncates beyond 72 bytes; refuse instead of silently truncating.
pub const PASSWORD_MAX_LEN: usize = 72;
pub const DESCRIPTION_MAX_LEN: usize = 200;
pub const AMOUNT_MAX_FRACTION_DIGITS: i64 = 2;
pub const PROOF_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

/// Display name: trimmed, 2 to 50 characters.
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = sanitize_string(name);
    validate_required("name", &name)?;

    if name.chars().count() < NAME_MIN_LEN {
        return Err(ValidationError::new(
            "name",
            format!("must be at least {} characters", NAME_MIN_LEN),
        ));
    }
    validate_max_len("name", &name, NAME_MAX_LEN)?;

    Ok(name)
}

/// Email: lowercased and shape-checked (single @, dotted domain).
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = sanitize_string(email).to_lowercase();
    validate_required("email", &email)?;
    validate_max_len("email", &email, EMAIL_MAX_LEN)?;

    let mut parts = email.split('@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();

    let shape_ok = parts.next().is_none()
        && !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(' ');

    if !shape_ok {
        return Err(ValidationError::new("email", "must be a valid email address"));
    }

    Ok(email)
}

pub fn validate_password(password: &str) -> ValidationResult {
    if password.len() < PASSWORD_MIN_LEN {
        return Err(ValidationError::new(
            "password",
            format!("must be at least {} characters", PASSWORD_MIN_LEN),
        ));
    }
    if password.len() > PASSWORD_MAX_LEN {
        return Err(ValidationError::new(
            "password",
            format!("must be at most {} characters", PASSWORD_MAX_LEN),
        ));
    }

    Ok(())
}

/// Transaction description: trimmed, required, bounded length.
pub fn validate_description(description: &str) -> Result<String, ValidationError> {
    let description = sanitize_string(description);
    validate_required("description", &description)?;
    validate_max_len("description", &description, DESCRIPTION_MAX_LEN)?;

    Ok(description)
}

/// Parse a money amount from its decimal-string transport form.
///
/// Amounts are positive, carry at most two fractional digits, and are
/// bounded below the store's NUMERIC(12,2) capacity, so downstream
/// aggregation is exact in cents.
pub fn parse_amount(raw: &str) -> Result<BigDecimal, ValidationError> {
    let raw = sanitize_string(raw);
    validate_required("amount", &raw)?;

    let amount = BigDecimal::from_str(&raw)
        .map_err(|_| ValidationError::new("amount", "must be a valid decimal number"))?;

    if amount <= BigDecimal::from(0) {
        return Err(ValidationError::new("amount", "must be greater than zero"));
    }

    let (_, fraction_digits) = amount.normalized().as_bigint_and_exponent();
    if fraction_digits > AMOUNT_MAX_FRACTION_DIGITS {
        return Err(ValidationError::new(
            "amount",
            "must have at most 2 decimal places",
        ));
    }

    if amount >= BigDecimal::from(10_000_000_000_i64) {
        return Err(ValidationError::new("amount", "is too large"));
    }

    Ok(amount)
}

/// Optional proof image: http(s) URL ending in a known image extension.
/// Empty strings collapse to `None`.
pub fn validate_proof_image(raw: Option<&str>) -> Result<Option<String>, ValidationError> {
    let url = match raw {
        Some(value) => sanitize_string(value),
        None => return Ok(None),
    };
    if url.is_empty() {
        return Ok(None);
    }

    let lowered = url.to_lowercase();
    let scheme_ok = lowered.starts_with("http://") || lowered.starts_with("https://");
    let extension_ok = PROOF_IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lowered.ends_with(&format!(".{}", ext)));

    if !scheme_ok || !extension_ok {
        return Err(ValidationError::new(
            "proofImage",
            "must be a valid image URL",
        ));
    }

    Ok(Some(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_required_field() {
        assert!(validate_required("field", "value").is_ok());
        assert!(validate_required("field", "   ").is_err());
    }

    #[test]
    fn validates_max_len() {
        assert!(validate_max_len("field", "abc", 3).is_ok());
        assert!(validate_max_len("field", "abcd", 3).is_err());
    }

    #[test]
    fn sanitizes_string() {
        assert_eq!(sanitize_string("  hello\tworld  "), "hello world");
        assert_eq!(sanitize_string("single"), "single");
        assert_eq!(sanitize_string(" \n "), "");
        assert_eq!(sanitize_string("ab\u{0000}cd\u{0007}"), "abcd");
    }

    #[test]
    fn validates_name_bounds() {
        assert_eq!(validate_name("  Asha Rao  ").unwrap(), "Asha Rao");
        assert!(validate_name("A").is_err());
        assert!(validate_name(&"x".repeat(51)).is_err());
    }

    #[test]
    fn validates_and_lowercases_email() {
        assert_eq!(
            validate_email("  Asha@Example.COM ").unwrap(),
            "asha@example.com"
        );
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn validates_password_bounds() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(73)).is_err());
    }

    #[test]
    fn parses_positive_two_decimal_amounts() {
        assert_eq!(parse_amount("100.50").unwrap(), "100.50".parse().unwrap());
        assert_eq!(parse_amount(" 42 ").unwrap(), BigDecimal::from(42));
        assert_eq!(parse_amount("0.01").unwrap(), "0.01".parse().unwrap());
        // Trailing zeros beyond two places are still exact cents.
        assert!(parse_amount("1.230").is_ok());
    }

    #[test]
    fn rejects_bad_amounts() {
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("1.999").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("").is_err());
        assert!(parse_amount("10000000000").is_err());
    }

    #[test]
    fn validates_proof_image_urls() {
        assert_eq!(validate_proof_image(None).unwrap(), None);
        assert_eq!(validate_proof_image(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_proof_image(Some("https://cdn.example.com/receipt.png")).unwrap(),
            Some("https://cdn.example.com/receipt.png".to_string())
        );
        assert!(validate_proof_image(Some("ftp://example.com/a.png")).is_err());
        assert!(validate_proof_image(Some("https://example.com/a.pdf")).is_err());
    }
}
