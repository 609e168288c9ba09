//! In-memory remote store
//!
//! Implements the full [`RemoteStore`] contract without a server: records
//! are kept in insertion order, identifiers are random UUIDs, order numbers
//! are unique and pagination follows the backend's arithmetic. Useful for
//! tests, demos and offline development.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use super::{
    DUPLICATE_ORDER_NUMBER, Page, RemoteStore, StoreError, StoreResult, page_count,
};
use crate::models::{CompanyProfile, PurchaseOrder, PurchaseOrderDraft};

#[derive(Debug, Default)]
struct MemoryState {
    orders: Vec<PurchaseOrder>,
    profile: Option<CompanyProfile>,
    offline: bool,
}

/// Remote store kept entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records, kept in the given order
    pub fn with_orders(orders: Vec<PurchaseOrder>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                orders,
                ..Default::default()
            }),
        }
    }

    /// Simulate an outage: while offline every call fails with
    /// [`StoreError::Transient`]
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.offline = offline;
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.orders.len()).unwrap_or(0)
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn state(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        let state = self
            .state
            .lock()
            .map_err(|_| StoreError::Transient("store state poisoned".to_string()))?;
        if state.offline {
            return Err(StoreError::Transient("store is offline".to_string()));
        }
        Ok(state)
    }
}

fn matches(order: &PurchaseOrder, needle: &str) -> bool {
    needle.is_empty()
        || order.order_number.to_lowercase().contains(needle)
        || order.party_name.to_lowercase().contains(needle)
}

fn check_unique(
    orders: &[PurchaseOrder],
    order_number: &str,
    except_id: Option<&str>,
) -> StoreResult<()> {
    let taken = orders
        .iter()
        .any(|o| o.order_number == order_number && Some(o.id.as_str()) != except_id);
    if taken {
        return Err(StoreError::Conflict(DUPLICATE_ORDER_NUMBER.to_string()));
    }
    Ok(())
}

#[async_trait(?Send)]
impl RemoteStore for InMemoryStore {
    async fn list(&self, search_term: &str, page: u32, page_size: u32) -> StoreResult<Page> {
        let state = self.state()?;
        let needle = search_term.trim().to_lowercase();
        let page_size = page_size.max(1);

        let hits: Vec<&PurchaseOrder> = state
            .orders
            .iter()
            .filter(|o| matches(o, &needle))
            .collect();

        let total_pages = page_count(hits.len(), page_size);
        let start = (page.max(1) as usize - 1) * page_size as usize;
        let records = hits
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect::<Vec<_>>();

        debug!(
            "Listed {} orders for '{}' page {}/{}",
            records.len(),
            search_term,
            page,
            total_pages
        );

        Ok(Page {
            records,
            total_pages,
        })
    }

    async fn get(&self, id: &str) -> StoreResult<PurchaseOrder> {
        let state = self.state()?;
        state
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("purchase order {}", id)))
    }

    async fn create(&self, draft: &PurchaseOrderDraft) -> StoreResult<PurchaseOrder> {
        let mut state = self.state()?;
        check_unique(&state.orders, &draft.order_number, None)?;

        let order = PurchaseOrder::from_draft(Uuid::new_v4().to_string(), draft.clone(), Utc::now());
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn update(&self, id: &str, draft: &PurchaseOrderDraft) -> StoreResult<PurchaseOrder> {
        let mut state = self.state()?;
        check_unique(&state.orders, &draft.order_number, Some(id))?;

        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("purchase order {}", id)))?;
        order.apply_draft(draft.clone(), Utc::now());
        Ok(order.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut state = self.state()?;
        let index = state
            .orders
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("purchase order {}", id)))?;
        state.orders.remove(index);
        Ok(())
    }

    async fn company_profile(&self) -> StoreResult<Option<CompanyProfile>> {
        Ok(self.state()?.profile.clone())
    }

    async fn save_company_profile(&self, profile: &CompanyProfile) -> StoreResult<CompanyProfile> {
        let mut state = self.state()?;
        state.profile = Some(profile.clone());
        Ok(profile.clone())
    }
}
