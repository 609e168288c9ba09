//! Maps a purchase order and the company profile onto a [`RenderedDocument`]

use tracing::debug;

use super::document::{BankBlock, DetailRow, HeaderBlock, RenderedDocument};
use crate::format::{
    format_bags, format_calendar_date, format_currency, format_text, format_weight,
};
use crate::models::company::non_blank;
use crate::models::{CompanyProfile, PurchaseOrder};

/// Company name printed when no profile has been saved yet
pub const PLACEHOLDER_COMPANY_NAME: &str = "Your Company";

pub const LABEL_PARTY_NAME: &str = "PARTY NAME:";
pub const LABEL_BROKER: &str = "BROKER:";
pub const LABEL_MILL: &str = "MILL:";
pub const LABEL_QUALITY: &str = "QUALITY:";
pub const LABEL_RATE: &str = "RATE:";
pub const LABEL_WEIGHT: &str = "WEIGHT:";
pub const LABEL_BAGS: &str = "BAGS:";
pub const LABEL_TERMS: &str = "TERMS & CONDITION:";

/// Title of the bank details block
pub const BANK_DETAILS_TITLE: &str = "BANK DETAILS";

/// Pure purchase order renderer.
///
/// Rendering never fails: missing profile data falls back to placeholders
/// and malformed optional fields render as `-` or `N/A`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentRenderer;

impl DocumentRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render `order`, branded with `profile` when one is available
    pub fn render(&self, order: &PurchaseOrder, profile: Option<&CompanyProfile>) -> RenderedDocument {
        debug!(
            "Rendering order {} ({} profile)",
            order.order_number,
            if profile.is_some() { "with" } else { "without" }
        );

        RenderedDocument {
            order_number: order.order_number.clone(),
            file_name: order.pdf_file_name(),
            header: header(order, profile),
            details: details(order),
            bank: profile.and_then(bank_block),
        }
    }
}

fn header(order: &PurchaseOrder, profile: Option<&CompanyProfile>) -> HeaderBlock {
    let company_name = profile
        .map(|p| p.company_name.trim())
        .filter(|name| !name.is_empty())
        .unwrap_or(PLACEHOLDER_COMPANY_NAME)
        .to_string();

    let mut identity_lines = Vec::new();
    if let Some(profile) = profile {
        // Contact details are only printed underneath an address
        if let Some(address) = non_blank(&profile.address) {
            identity_lines.push(address.to_string());

            let mut contact = Vec::new();
            if let Some(phone) = non_blank(&profile.phone) {
                contact.push(format!("MOB:{}", phone));
            }
            if let Some(email) = non_blank(&profile.email) {
                contact.push(format!("EMAIL ID: {}", email));
            }
            if !contact.is_empty() {
                identity_lines.push(contact.join(", "));
            }
        }
        if let Some(tax_id) = non_blank(&profile.tax_id) {
            identity_lines.push(format!("G.S.T. NO. : {}", tax_id));
        }
    }

    HeaderBlock {
        logo: profile.and_then(CompanyProfile::logo_bytes),
        company_name,
        identity_lines,
        order_number_line: format!("Order number: {}", order.order_number),
        date_line: format!("Date: {}", format_calendar_date(order.date)),
    }
}

fn details(order: &PurchaseOrder) -> Vec<DetailRow> {
    vec![
        DetailRow::new(LABEL_PARTY_NAME, order.party_name.clone()),
        DetailRow::new(LABEL_BROKER, format_text(order.broker.as_deref())),
        DetailRow::new(LABEL_MILL, format_text(order.mill.as_deref())),
        DetailRow::new(LABEL_QUALITY, format_text(order.product.as_deref())),
        DetailRow::new(LABEL_RATE, format_currency(order.rate)),
        DetailRow::new(LABEL_WEIGHT, format_weight(order.weight)),
        DetailRow::new(LABEL_BAGS, format_bags(order.bags)),
        DetailRow::new(LABEL_TERMS, format_text(order.terms_and_conditions.as_deref())),
    ]
}

fn bank_block(profile: &CompanyProfile) -> Option<BankBlock> {
    if !profile.has_bank_details() {
        return None;
    }

    let parts: Vec<String> = [
        non_blank(&profile.bank_name).map(str::to_string),
        non_blank(&profile.bank_account_number).map(|n| format!("ACCOUNT NO {}", n)),
        non_blank(&profile.routing_code).map(|c| format!("IFSC: {}", c)),
        non_blank(&profile.branch_name).map(|b| format!("BRANCH: {}", b)),
    ]
    .into_iter()
    .flatten()
    .collect();

    Some(BankBlock {
        title: BANK_DETAILS_TITLE.to_string(),
        text: parts.join(", "),
    })
}
