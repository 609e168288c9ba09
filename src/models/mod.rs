//! Models module for the SDK
//!
//! Defines the purchase order, the company profile that brands exported
//! documents, and the sort keys used by the list view.

pub mod company;
pub mod purchase_order;
pub mod sort;

pub use company::CompanyProfile;
pub use purchase_order::{PurchaseOrder, PurchaseOrderDraft};
pub use sort::{SortDirection, SortField, SortOrder};
