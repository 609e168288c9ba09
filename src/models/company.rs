//! Company profile used to brand exported purchase orders
//!
//! There is one profile per deployment. It is created lazily by the first
//! save and every later save replaces it wholesale.
//!
//! The wire format uses the backend's camelCase names (`companyName`,
//! `gstNumber`, `ifscCode`, ...).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::validation::input::{ValidationResult, validate_company_name};

/// Company identity and bank details printed on purchase orders
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    /// Company name (required)
    pub company_name: String,

    /// Logo as a `data:` URL or bare base64 image data
    #[serde(default, rename = "companyLogo", skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Tax identifier (GST number)
    #[serde(default, rename = "gstNumber", skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account_number: Option<String>,

    /// Bank routing code (IFSC)
    #[serde(default, rename = "ifscCode", skip_serializing_if = "Option::is_none")]
    pub routing_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
}

impl CompanyProfile {
    /// Create a profile with only the company name set
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            ..Default::default()
        }
    }

    /// Check the profile can be saved
    pub fn validate(&self) -> ValidationResult<()> {
        validate_company_name(&self.company_name)
    }

    /// Whether any of the four bank fields carries a value
    pub fn has_bank_details(&self) -> bool {
        [
            &self.bank_name,
            &self.bank_account_number,
            &self.routing_code,
            &self.branch_name,
        ]
        .into_iter()
        .any(|field| non_blank(field).is_some())
    }

    /// Decode the inline logo.
    ///
    /// Accepts `data:image/png;base64,<payload>` as produced by browser file
    /// readers, or a bare base64 payload. Returns `None` when there is no
    /// logo or it does not decode.
    pub fn logo_bytes(&self) -> Option<Vec<u8>> {
        let raw = non_blank(&self.logo)?;
        let payload = match raw.split_once(',') {
            Some((header, data)) if header.starts_with("data:") => data,
            _ => raw,
        };
        STANDARD.decode(payload.trim()).ok()
    }

    /// Set the logo from raw image bytes, stored as a PNG data URL
    pub fn set_logo_png(&mut self, bytes: &[u8]) {
        self.logo = Some(format!("data:image/png;base64,{}", STANDARD.encode(bytes)));
    }
}

/// Borrow an optional text field when it holds non-whitespace content
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let json = r#"{
            "companyName": "Acme Agro",
            "companyLogo": "data:image/png;base64,AAEC",
            "gstNumber": "27ABCDE1234F1Z5",
            "bankName": "State Bank",
            "ifscCode": "SBIN0000123"
        }"#;
        let profile: CompanyProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.company_name, "Acme Agro");
        assert_eq!(profile.tax_id.as_deref(), Some("27ABCDE1234F1Z5"));
        assert_eq!(profile.routing_code.as_deref(), Some("SBIN0000123"));

        let back = serde_json::to_value(&profile).unwrap();
        assert_eq!(back["companyName"], "Acme Agro");
        assert_eq!(back["ifscCode"], "SBIN0000123");
        assert!(back.get("address").is_none());
    }

    #[test]
    fn test_has_bank_details() {
        let mut profile = CompanyProfile::new("Acme");
        assert!(!profile.has_bank_details());

        profile.branch_name = Some("  ".to_string());
        assert!(!profile.has_bank_details());

        profile.branch_name = Some("Andheri".to_string());
        assert!(profile.has_bank_details());
    }

    #[test]
    fn test_logo_bytes() {
        let mut profile = CompanyProfile::new("Acme");
        assert_eq!(profile.logo_bytes(), None);

        profile.set_logo_png(&[0, 1, 2]);
        assert_eq!(profile.logo_bytes(), Some(vec![0, 1, 2]));

        profile.logo = Some("AAEC".to_string());
        assert_eq!(profile.logo_bytes(), Some(vec![0, 1, 2]));

        profile.logo = Some("data:image/png;base64,!!!".to_string());
        assert_eq!(profile.logo_bytes(), None);
    }

    #[test]
    fn test_validate_requires_name() {
        assert!(CompanyProfile::new("Acme").validate().is_ok());
        assert!(CompanyProfile::new("   ").validate().is_err());
    }
}
