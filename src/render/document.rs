//! Rendered purchase order document
//!
//! A fixed single-page form. The structure mirrors what gets printed:
//!
//! ```text
//! +--------------------------------------------------------------+
//! | [logo] COMPANY NAME                      Order number: PO-42 |
//! |        address                           Date: 05 Mar 2024   |
//! |        MOB:..., EMAIL ID: ...                                |
//! |        G.S.T. NO. : ...                                      |
//! |--------------------------------------------------------------|
//! | PARTY NAME:        | ...                                     |
//! | BROKER:            | ...                                     |
//! | ...                | ...                                     |
//! | TERMS & CONDITION: | ...                                     |
//! |                                                              |
//! | BANK DETAILS                                                 |
//! | bank, ACCOUNT NO ..., IFSC: ..., BRANCH: ...                 |
//! +--------------------------------------------------------------+
//! ```

use serde::{Deserialize, Serialize};

/// Header block: company identity on the left, order identity on the right
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderBlock {
    /// Decoded logo image bytes, if the profile carries a usable logo
    #[serde(skip)]
    pub logo: Option<Vec<u8>>,
    pub company_name: String,
    /// Lines under the company name (address, contact, tax id), in order
    pub identity_lines: Vec<String>,
    /// Right-aligned `Order number: ...` line
    pub order_number_line: String,
    /// Right-aligned `Date: ...` line
    pub date_line: String,
}

/// One labelled row of the details table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRow {
    pub label: String,
    pub value: String,
}

impl DetailRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Bank details block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankBlock {
    pub title: String,
    pub text: String,
}

/// A purchase order rendered for preview and export.
///
/// Every render produces an independent value; nothing is shared with the
/// record or profile it was rendered from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedDocument {
    /// Order number the document was rendered for
    pub order_number: String,
    /// File name the exported PDF is saved under
    pub file_name: String,
    pub header: HeaderBlock,
    pub details: Vec<DetailRow>,
    /// Present only when the profile has at least one bank field
    pub bank: Option<BankBlock>,
}

impl RenderedDocument {
    /// Value of a details row by label
    pub fn detail(&self, label: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|row| row.label == label)
            .map(|row| row.value.as_str())
    }

    /// Every line of text in reading order, for previews and plain-text output
    pub fn text_lines(&self) -> Vec<String> {
        let mut lines = vec![self.header.company_name.clone()];
        lines.extend(self.header.identity_lines.iter().cloned());
        lines.push(self.header.order_number_line.clone());
        lines.push(self.header.date_line.clone());
        for row in &self.details {
            lines.push(format!("{} {}", row.label, row.value));
        }
        if let Some(bank) = &self.bank {
            lines.push(bank.title.clone());
            lines.push(bank.text.clone());
        }
        lines
    }
}
