//! Remote store abstraction
//!
//! The remote store owns persistence, search and pagination arithmetic for
//! purchase orders, and holds the deployment's company profile. The client
//! core only consumes it through [`RemoteStore`].
//!
//! Implementations:
//! - [`ApiStore`](api::ApiStore): HTTP backend client (feature `api-backend`)
//! - [`InMemoryStore`](memory::InMemoryStore): reference implementation for tests and demos

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{CompanyProfile, PurchaseOrder, PurchaseOrderDraft};

#[cfg(feature = "api-backend")]
pub mod api;
pub mod memory;

#[cfg(feature = "api-backend")]
pub use api::ApiStore;
pub use memory::InMemoryStore;

/// Message the backend uses for a duplicate order number
pub const DUPLICATE_ORDER_NUMBER: &str = "Order number already exists";

/// Error type for remote store operations
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum StoreError {
    /// The identifier no longer refers to a record
    #[error("Not found: {0}")]
    NotFound(String),

    /// The write conflicts with existing data (duplicate order number)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store could not be reached or failed internally; the action may be repeated
    #[error("Store unavailable: {0}")]
    Transient(String),

    /// The store refused the request
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Response could not be decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Operation not offered by this store
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// One page of search results
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Page {
    /// Records on the requested page, in store order
    pub records: Vec<PurchaseOrder>,
    /// Total number of pages for the search term
    pub total_pages: u32,
}

/// Remote store contract
///
/// All operations are async and single-threaded (`?Send`) so the same
/// implementation works on a current-thread runtime and in the browser.
#[async_trait(?Send)]
pub trait RemoteStore {
    /// List one page of orders whose order number or party name contains
    /// `search_term` (case-insensitive). Pages are 1-based.
    async fn list(&self, search_term: &str, page: u32, page_size: u32) -> StoreResult<Page>;

    /// Fetch a single order
    async fn get(&self, id: &str) -> StoreResult<PurchaseOrder>;

    /// Create an order; fails with [`StoreError::Conflict`] on a duplicate order number
    async fn create(&self, draft: &PurchaseOrderDraft) -> StoreResult<PurchaseOrder>;

    /// Replace an order's editable fields
    async fn update(&self, id: &str, draft: &PurchaseOrderDraft) -> StoreResult<PurchaseOrder>;

    /// Delete an order
    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Fetch the company profile, `None` if it was never saved
    async fn company_profile(&self) -> StoreResult<Option<CompanyProfile>>;

    /// Create or fully replace the company profile
    async fn save_company_profile(&self, profile: &CompanyProfile) -> StoreResult<CompanyProfile>;

    /// Ask the store for a server-rendered PDF of an order.
    ///
    /// When `profile` is given the server prints it instead of its own copy.
    async fn render_server_pdf(
        &self,
        id: &str,
        profile: Option<&CompanyProfile>,
    ) -> StoreResult<Vec<u8>> {
        let _ = (id, profile);
        Err(StoreError::Unsupported(
            "server-side PDF rendering".to_string(),
        ))
    }
}

#[async_trait(?Send)]
impl<T: RemoteStore + ?Sized> RemoteStore for Arc<T> {
    async fn list(&self, search_term: &str, page: u32, page_size: u32) -> StoreResult<Page> {
        (**self).list(search_term, page, page_size).await
    }

    async fn get(&self, id: &str) -> StoreResult<PurchaseOrder> {
        (**self).get(id).await
    }

    async fn create(&self, draft: &PurchaseOrderDraft) -> StoreResult<PurchaseOrder> {
        (**self).create(draft).await
    }

    async fn update(&self, id: &str, draft: &PurchaseOrderDraft) -> StoreResult<PurchaseOrder> {
        (**self).update(id, draft).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        (**self).delete(id).await
    }

    async fn company_profile(&self) -> StoreResult<Option<CompanyProfile>> {
        (**self).company_profile().await
    }

    async fn save_company_profile(&self, profile: &CompanyProfile) -> StoreResult<CompanyProfile> {
        (**self).save_company_profile(profile).await
    }

    async fn render_server_pdf(
        &self,
        id: &str,
        profile: Option<&CompanyProfile>,
    ) -> StoreResult<Vec<u8>> {
        (**self).render_server_pdf(id, profile).await
    }
}

/// Number of pages needed for `total` records, never less than one
pub fn page_count(total: usize, page_size: u32) -> u32 {
    let page_size = page_size.max(1) as usize;
    total.div_ceil(page_size).max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(25, 10), 3);
        assert_eq!(page_count(3, 0), 3);
    }
}
