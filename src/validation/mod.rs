//! Validation functionality
//!
//! Provides submission-time validation for purchase orders and the company
//! profile, and file name sanitization for exported documents.

pub mod input;

pub use input::{
    ValidationError, ValidationResult, sanitize_file_name, validate_bags, validate_company_name,
    validate_date, validate_order_number, validate_party_name, validate_positive_amount,
};
