//! Input validation and sanitization utilities.
//!
//! These checks run before anything is sent to the remote store: an order
//! or profile that fails validation never leaves the client.
//!
//! # Rules
//!
//! - Order number, party name and company name must contain non-whitespace text
//! - Weight and rate, when given, must be finite and strictly positive
//! - Bags, when given, must be at least one
//! - Dates must parse as calendar dates

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Maximum length for order numbers
pub const MAX_ORDER_NUMBER_LENGTH: usize = 64;

/// Maximum length for party and company names
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum length for exported file names
pub const MAX_FILE_NAME_LENGTH: usize = 255;

/// Errors that can occur during input validation.
#[derive(Debug, Clone, Error, Serialize, PartialEq)]
pub enum ValidationError {
    /// Input is empty when a value is required
    #[error("{0} is required")]
    Empty(&'static str),

    /// Input exceeds maximum allowed length
    #[error("{field} exceeds maximum length (max: {max}, got: {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    /// Numeric input is zero, negative or not a number
    #[error("{0} must be positive")]
    NotPositive(&'static str),

    /// Input has invalid format
    #[error("{0}: {1}")]
    InvalidFormat(&'static str, String),
}

impl ValidationError {
    /// Name of the offending field, for inline form errors
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Empty(field)
            | ValidationError::NotPositive(field)
            | ValidationError::InvalidFormat(field, _) => *field,
            ValidationError::TooLong { field, .. } => *field,
        }
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn validate_required(field: &'static str, value: &str, max: usize) -> ValidationResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty(field));
    }

    let length = trimmed.chars().count();
    if length > max {
        return Err(ValidationError::TooLong {
            field,
            max,
            actual: length,
        });
    }

    Ok(())
}

/// Validate an order number.
///
/// # Examples
///
/// ```
/// use purchase_order_sdk::validation::input::validate_order_number;
///
/// assert!(validate_order_number("PO-001").is_ok());
/// assert!(validate_order_number("   ").is_err());
/// ```
pub fn validate_order_number(order_number: &str) -> ValidationResult<()> {
    validate_required("order number", order_number, MAX_ORDER_NUMBER_LENGTH)
}

/// Validate a party name.
pub fn validate_party_name(party_name: &str) -> ValidationResult<()> {
    validate_required("party name", party_name, MAX_NAME_LENGTH)
}

/// Validate a company name.
///
/// # Examples
///
/// ```
/// use purchase_order_sdk::validation::input::validate_company_name;
///
/// assert!(validate_company_name("Acme Agro").is_ok());
/// assert!(validate_company_name("").is_err());
/// ```
pub fn validate_company_name(company_name: &str) -> ValidationResult<()> {
    validate_required("company name", company_name, MAX_NAME_LENGTH)
}

/// Validate a raw `YYYY-MM-DD` date string as entered in a form.
pub fn validate_date(raw: &str) -> ValidationResult<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Empty("date"));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| ValidationError::InvalidFormat("date", format!("invalid date: {}", e)))
}

/// Validate an optional amount (weight, rate) that must be positive when present.
///
/// # Examples
///
/// ```
/// use purchase_order_sdk::validation::input::validate_positive_amount;
///
/// assert!(validate_positive_amount("weight", None).is_ok());
/// assert!(validate_positive_amount("weight", Some(12.5)).is_ok());
/// assert!(validate_positive_amount("weight", Some(0.0)).is_err());
/// ```
pub fn validate_positive_amount(field: &'static str, value: Option<f64>) -> ValidationResult<()> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(ValidationError::NotPositive(field)),
        _ => Ok(()),
    }
}

/// Validate an optional bag count.
pub fn validate_bags(bags: Option<u32>) -> ValidationResult<()> {
    match bags {
        Some(0) => Err(ValidationError::NotPositive("bags")),
        _ => Ok(()),
    }
}

/// Sanitize a file name for writing to disk.
///
/// Path separators and control characters are replaced with `-` so an
/// order number can never escape the download directory.
///
/// # Examples
///
/// ```
/// use purchase_order_sdk::validation::input::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("PO-2024/17.pdf"), "PO-2024-17.pdf");
/// assert_eq!(sanitize_file_name("../../etc/passwd"), "etc-passwd");
/// ```
pub fn sanitize_file_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());

    for ch in name.chars() {
        match ch {
            '/' | '\\' | ':' => sanitized.push('-'),
            ch if ch.is_control() => sanitized.push('-'),
            ch => sanitized.push(ch),
        }

        if sanitized.len() >= MAX_FILE_NAME_LENGTH {
            break;
        }
    }

    // Leading dots and separators would make hidden or relative names
    let sanitized = sanitized.trim_start_matches(['.', '-']).to_string();

    if sanitized.is_empty() {
        "purchase-order.pdf".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields() {
        assert_eq!(
            validate_order_number(""),
            Err(ValidationError::Empty("order number"))
        );
        assert_eq!(
            validate_party_name(" \t"),
            Err(ValidationError::Empty("party name"))
        );
        assert!(validate_party_name("Shree Traders").is_ok());
    }

    #[test]
    fn test_too_long() {
        let long = "x".repeat(MAX_ORDER_NUMBER_LENGTH + 1);
        let err = validate_order_number(&long).unwrap_err();
        assert_eq!(err.field(), "order number");
        assert!(err.to_string().contains("maximum length"));
    }

    #[test]
    fn test_validate_date() {
        assert_eq!(
            validate_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(validate_date("2023-02-29").is_err());
        assert!(validate_date("").is_err());
        assert!(validate_date("05/03/2024").is_err());
    }

    #[test]
    fn test_positive_amount() {
        assert!(validate_positive_amount("rate", Some(f64::INFINITY)).is_err());
        assert!(validate_positive_amount("rate", Some(-1.0)).is_err());
        assert!(validate_positive_amount("rate", Some(0.01)).is_ok());
    }

    #[test]
    fn test_validate_bags() {
        assert!(validate_bags(None).is_ok());
        assert!(validate_bags(Some(1)).is_ok());
        assert_eq!(validate_bags(Some(0)), Err(ValidationError::NotPositive("bags")));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("PO-PO-0042.pdf"), "PO-PO-0042.pdf");
        assert_eq!(sanitize_file_name("a\\b:c"), "a-b-c");
        assert_eq!(sanitize_file_name("..."), "purchase-order.pdf");
    }
}
