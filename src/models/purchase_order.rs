//! Purchase order model
//!
//! A purchase order is owned by the remote store: the store assigns the `id`
//! and the timestamps, and enforces that `order_number` is unique across all
//! records. Clients submit a [`PurchaseOrderDraft`] and receive the stored
//! [`PurchaseOrder`] back.
//!
//! ## Wire format
//!
//! ```json
//! {
//!   "id": "6f1c2a7e-0d1b-4a47-9a55-2c3f7c1b9e10",
//!   "date": "2024-03-05",
//!   "order_number": "PO-0042",
//!   "party_name": "Shree Traders",
//!   "broker": "R. K. Agencies",
//!   "weight": 1250.5,
//!   "bags": 50,
//!   "rate": 3150,
//!   "created_at": "2024-03-05T09:30:00Z",
//!   "updated_at": "2024-03-05T09:30:00Z"
//! }
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::input::{
    ValidationResult, validate_bags, validate_order_number, validate_party_name,
    validate_positive_amount,
};

/// A purchase order as stored by the remote store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PurchaseOrder {
    /// Opaque, server-assigned identifier
    pub id: String,
    /// Order date (no time component)
    pub date: NaiveDate,
    /// Order number, unique across all records
    pub order_number: String,
    /// Party the order is placed with
    pub party_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mill: Option<String>,
    /// Weight in kilograms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Number of bags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bags: Option<u32>,
    /// Product (shown as "quality" on the printed order)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    /// Rate in currency units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_and_conditions: Option<String>,
    /// Creation timestamp (server-assigned)
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp (server-assigned)
    pub updated_at: DateTime<Utc>,
}

impl PurchaseOrder {
    /// Build a stored record from a draft, as a store does on create
    pub fn from_draft(id: impl Into<String>, draft: PurchaseOrderDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            date: draft.date,
            order_number: draft.order_number,
            party_name: draft.party_name,
            broker: draft.broker,
            mill: draft.mill,
            weight: draft.weight,
            bags: draft.bags,
            product: draft.product,
            rate: draft.rate,
            terms_and_conditions: draft.terms_and_conditions,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace every client-editable field with the draft's values.
    ///
    /// `id` and `created_at` are kept; `updated_at` moves to `now`.
    pub fn apply_draft(&mut self, draft: PurchaseOrderDraft, now: DateTime<Utc>) {
        self.date = draft.date;
        self.order_number = draft.order_number;
        self.party_name = draft.party_name;
        self.broker = draft.broker;
        self.mill = draft.mill;
        self.weight = draft.weight;
        self.bags = draft.bags;
        self.product = draft.product;
        self.rate = draft.rate;
        self.terms_and_conditions = draft.terms_and_conditions;
        self.updated_at = now.max(self.updated_at);
    }

    /// File name used when the order is exported as PDF
    pub fn pdf_file_name(&self) -> String {
        crate::export::pdf_file_name(&self.order_number)
    }
}

/// Submission payload for creating or updating a purchase order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PurchaseOrderDraft {
    pub date: NaiveDate,
    pub order_number: String,
    pub party_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bags: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_and_conditions: Option<String>,
}

impl PurchaseOrderDraft {
    /// Create a draft with the required fields only
    pub fn new(
        date: NaiveDate,
        order_number: impl Into<String>,
        party_name: impl Into<String>,
    ) -> Self {
        Self {
            date,
            order_number: order_number.into(),
            party_name: party_name.into(),
            broker: None,
            mill: None,
            weight: None,
            bags: None,
            product: None,
            rate: None,
            terms_and_conditions: None,
        }
    }

    /// Check the draft is fit for submission.
    ///
    /// Order number and party name must be non-blank; weight and rate, when
    /// present, must be finite and strictly positive; bags, when present,
    /// must be at least one.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_order_number(&self.order_number)?;
        validate_party_name(&self.party_name)?;
        validate_positive_amount("weight", self.weight)?;
        validate_bags(self.bags)?;
        validate_positive_amount("rate", self.rate)?;
        Ok(())
    }

    /// Trim text fields and drop optional text that is blank.
    ///
    /// Form inputs submit empty strings for untouched optional fields; the
    /// store treats those as absent.
    pub fn normalized(mut self) -> Self {
        self.order_number = self.order_number.trim().to_string();
        self.party_name = self.party_name.trim().to_string();
        for field in [
            &mut self.broker,
            &mut self.mill,
            &mut self.product,
            &mut self.terms_and_conditions,
        ] {
            *field = field
                .take()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty());
        }
        self
    }
}

impl From<&PurchaseOrder> for PurchaseOrderDraft {
    fn from(order: &PurchaseOrder) -> Self {
        Self {
            date: order.date,
            order_number: order.order_number.clone(),
            party_name: order.party_name.clone(),
            broker: order.broker.clone(),
            mill: order.mill.clone(),
            weight: order.weight,
            bags: order.bags,
            product: order.product.clone(),
            rate: order.rate,
            terms_and_conditions: order.terms_and_conditions.clone(),
        }
    }
}
