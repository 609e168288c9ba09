//! List reconciliation view
//!
//! Keeps one page of purchase orders consistent with the remote store while
//! the user searches, pages, sorts and deletes.
//!
//! Every fetch takes a ticket. Only the result for the most recently issued
//! ticket is applied; anything that arrives for an older ticket is dropped,
//! so a slow response for page 3 can never overwrite the results of a search
//! typed after it:
//!
//! ```text
//! set_page(3)  ──ticket 1──────────────────────▶ response (dropped)
//! search("abc")     ──ticket 2──▶ response (applied)
//! ```
//!
//! The view is single-threaded. Methods take `&self` so fetches can be in
//! flight concurrently on one task; the state cell is never borrowed across
//! an await.

use std::cell::RefCell;
use tracing::{debug, info, warn};

use crate::config::ListSection;
use crate::models::{CompanyProfile, PurchaseOrder, SortField, SortOrder};
use crate::render::{DocumentRenderer, RenderedDocument};
use crate::store::{RemoteStore, StoreError, StoreResult};

/// Default number of records per page
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// What happened to a fetch result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result replaced the displayed page
    Applied,
    /// A newer request was issued meanwhile; the result was discarded
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Ticket {
    generation: u64,
    search_term: String,
    page: u32,
}

#[derive(Debug)]
struct ViewState {
    search_term: String,
    page: u32,
    total_pages: u32,
    sort: SortOrder,
    records: Vec<PurchaseOrder>,
    /// Term and page the displayed records were fetched for
    applied_term: String,
    applied_page: u32,
    issued: u64,
    settled: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            page: 1,
            total_pages: 1,
            sort: SortOrder::default(),
            records: Vec::new(),
            applied_term: String::new(),
            applied_page: 1,
            issued: 0,
            settled: 0,
        }
    }
}

/// One page of purchase orders kept in step with a [`RemoteStore`]
pub struct ListView<S> {
    store: S,
    page_size: u32,
    state: RefCell<ViewState>,
}

impl<S: RemoteStore> ListView<S> {
    pub fn new(store: S, page_size: u32) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            state: RefCell::new(ViewState::default()),
        }
    }

    pub fn from_config(store: S, config: &ListSection) -> Self {
        Self::new(store, config.page_size)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Current page, 1-based
    pub fn page(&self) -> u32 {
        self.state.borrow().page
    }

    /// Total pages reported by the last applied fetch
    pub fn total_pages(&self) -> u32 {
        self.state.borrow().total_pages
    }

    pub fn search_term(&self) -> String {
        self.state.borrow().search_term.clone()
    }

    pub fn sort(&self) -> SortOrder {
        self.state.borrow().sort
    }

    /// Whether the most recent fetch is still outstanding
    pub fn is_loading(&self) -> bool {
        let state = self.state.borrow();
        state.settled != state.issued
    }

    /// Fetch the current search term and page
    pub async fn refresh(&self) -> StoreResult<FetchOutcome> {
        self.fetch().await
    }

    /// Search for `term`, starting again from page 1
    pub async fn search(&self, term: &str) -> StoreResult<FetchOutcome> {
        {
            let mut state = self.state.borrow_mut();
            state.search_term = term.trim().to_string();
            state.page = 1;
        }
        self.fetch().await
    }

    /// Go to page `page`, clamped to the known page range
    pub async fn set_page(&self, page: u32) -> StoreResult<FetchOutcome> {
        {
            let mut state = self.state.borrow_mut();
            state.page = page.clamp(1, state.total_pages.max(1));
        }
        self.fetch().await
    }

    /// Go to the next page; `None` when already on the last page
    pub async fn next_page(&self) -> StoreResult<Option<FetchOutcome>> {
        let (page, total_pages) = {
            let state = self.state.borrow();
            (state.page, state.total_pages)
        };
        if page >= total_pages {
            return Ok(None);
        }
        self.set_page(page + 1).await.map(Some)
    }

    /// Go to the previous page; `None` when already on the first page
    pub async fn previous_page(&self) -> StoreResult<Option<FetchOutcome>> {
        let page = self.page();
        if page <= 1 {
            return Ok(None);
        }
        self.set_page(page - 1).await.map(Some)
    }

    /// Sort the current page by `field`.
    ///
    /// Choosing the active field again flips the direction; a new field
    /// starts ascending. Nothing is fetched.
    pub fn sort_by(&self, field: SortField) -> SortOrder {
        let mut state = self.state.borrow_mut();
        state.sort = state.sort.toggled(field);
        debug!("Sorting by {} {}", state.sort.field, state.sort.direction.arrow());
        state.sort
    }

    /// Current page in store order
    pub fn records(&self) -> Vec<PurchaseOrder> {
        self.state.borrow().records.clone()
    }

    /// Current page in the active sort order
    pub fn sorted_records(&self) -> Vec<PurchaseOrder> {
        let state = self.state.borrow();
        let mut records = state.records.clone();
        state.sort.sort(&mut records);
        records
    }

    /// Look up a record on the current page
    pub fn record(&self, id: &str) -> Option<PurchaseOrder> {
        self.state
            .borrow()
            .records
            .iter()
            .find(|order| order.id == id)
            .cloned()
    }

    /// Delete a record, then reload the current page.
    ///
    /// If the deletion emptied the last page, the view steps back to the
    /// new last page. On failure the view is left as it was.
    pub async fn delete(&self, id: &str) -> StoreResult<FetchOutcome> {
        self.store.delete(id).await.inspect_err(|e| {
            warn!("Failed to delete order {}: {}", id, e);
        })?;
        info!("Deleted order {}", id);

        let outcome = self.fetch().await?;
        if outcome == FetchOutcome::Superseded {
            return Ok(outcome);
        }

        let clamped = {
            let mut state = self.state.borrow_mut();
            if state.page > state.total_pages {
                debug!(
                    "Page {} no longer exists, moving to page {}",
                    state.page, state.total_pages
                );
                state.page = state.total_pages;
                true
            } else {
                false
            }
        };

        if clamped {
            self.fetch().await
        } else {
            Ok(outcome)
        }
    }

    /// Render the record `id` from the current page for export
    pub fn export_current(
        &self,
        id: &str,
        renderer: &DocumentRenderer,
        profile: Option<&CompanyProfile>,
    ) -> StoreResult<RenderedDocument> {
        let state = self.state.borrow();
        let order = state
            .records
            .iter()
            .find(|order| order.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Order {} is not on the current page", id)))?;
        Ok(renderer.render(order, profile))
    }

    fn issue_ticket(&self) -> Ticket {
        let mut state = self.state.borrow_mut();
        state.issued += 1;
        Ticket {
            generation: state.issued,
            search_term: state.search_term.clone(),
            page: state.page,
        }
    }

    async fn fetch(&self) -> StoreResult<FetchOutcome> {
        let ticket = self.issue_ticket();
        let result = self
            .store
            .list(&ticket.search_term, ticket.page, self.page_size)
            .await;

        let mut state = self.state.borrow_mut();
        if state.issued != ticket.generation {
            debug!(
                "Discarding stale response for '{}' page {} (request {}, latest {})",
                ticket.search_term, ticket.page, ticket.generation, state.issued
            );
            return Ok(FetchOutcome::Superseded);
        }
        state.settled = ticket.generation;

        match result {
            Ok(page) => {
                debug!(
                    "Loaded {} order(s) for '{}' page {}/{}",
                    page.records.len(),
                    ticket.search_term,
                    ticket.page,
                    page.total_pages
                );
                state.records = page.records;
                state.total_pages = page.total_pages.max(1);
                state.applied_term = ticket.search_term;
                state.applied_page = ticket.page;
                Ok(FetchOutcome::Applied)
            }
            Err(e) => {
                warn!(
                    "Failed to load '{}' page {}: {}",
                    ticket.search_term, ticket.page, e
                );
                // records still belong to the last applied term and page
                state.search_term = state.applied_term.clone();
                state.page = state.applied_page;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PurchaseOrderDraft, SortDirection};
    use crate::store::memory::InMemoryStore;
    use chrono::NaiveDate;

    fn draft(order_number: &str, party_name: &str) -> PurchaseOrderDraft {
        PurchaseOrderDraft::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            order_number,
            party_name,
        )
    }

    async fn seeded(count: usize) -> InMemoryStore {
        let store = InMemoryStore::new();
        for i in 1..=count {
            store
                .create(&draft(&format!("PO-{:02}", i), &format!("Party {}", i)))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_refresh_loads_first_page() {
        let view = ListView::new(seeded(12).await, 5);
        assert_eq!(view.refresh().await.unwrap(), FetchOutcome::Applied);
        assert_eq!(view.records().len(), 5);
        assert_eq!(view.total_pages(), 3);
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn test_search_resets_page() {
        let view = ListView::new(seeded(12).await, 5);
        view.refresh().await.unwrap();
        view.set_page(3).await.unwrap();
        assert_eq!(view.page(), 3);

        view.search("po-1").await.unwrap();
        assert_eq!(view.page(), 1);
        assert_eq!(view.search_term(), "po-1");
        assert!(view.records().iter().all(|o| o.order_number.starts_with("PO-1")));
    }

    #[tokio::test]
    async fn test_set_page_clamps() {
        let view = ListView::new(seeded(12).await, 5);
        view.refresh().await.unwrap();
        view.set_page(9).await.unwrap();
        assert_eq!(view.page(), 3);
        view.set_page(0).await.unwrap();
        assert_eq!(view.page(), 1);
    }

    #[tokio::test]
    async fn test_next_and_previous_page() {
        let view = ListView::new(seeded(7).await, 5);
        view.refresh().await.unwrap();
        assert_eq!(view.previous_page().await.unwrap(), None);
        assert_eq!(view.next_page().await.unwrap(), Some(FetchOutcome::Applied));
        assert_eq!(view.page(), 2);
        assert_eq!(view.records().len(), 2);
        assert_eq!(view.next_page().await.unwrap(), None);
        assert_eq!(view.previous_page().await.unwrap(), Some(FetchOutcome::Applied));
        assert_eq!(view.page(), 1);
    }

    #[tokio::test]
    async fn test_sort_toggles_direction() {
        let view = ListView::new(seeded(3).await, 10);
        view.refresh().await.unwrap();

        let order = view.sort_by(SortField::PartyName);
        assert_eq!(order.direction, SortDirection::Ascending);
        let order = view.sort_by(SortField::PartyName);
        assert_eq!(order.direction, SortDirection::Descending);

        let parties: Vec<String> = view.sorted_records().into_iter().map(|o| o.party_name).collect();
        assert_eq!(parties, vec!["Party 3", "Party 2", "Party 1"]);
        // store order untouched
        assert_eq!(view.records()[0].party_name, "Party 1");
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_records() {
        let store = seeded(3).await;
        let view = ListView::new(store, 10);
        view.refresh().await.unwrap();

        view.store().set_offline(true);
        assert!(matches!(view.refresh().await, Err(StoreError::Transient(_))));
        assert_eq!(view.records().len(), 3);
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn test_failed_page_change_keeps_page() {
        let view = ListView::new(seeded(15).await, 10);
        view.refresh().await.unwrap();

        view.store().set_offline(true);
        assert!(view.set_page(2).await.is_err());
        assert_eq!(view.page(), 1);
        assert_eq!(view.records()[0].order_number, "PO-01");

        view.store().set_offline(false);
        view.refresh().await.unwrap();
        assert_eq!(view.page(), 1);
        assert_eq!(view.records().len(), 10);
    }

    #[tokio::test]
    async fn test_failed_search_keeps_term() {
        let view = ListView::new(seeded(15).await, 10);
        view.set_page(1).await.unwrap();
        view.set_page(2).await.unwrap();

        view.store().set_offline(true);
        assert!(view.search("zzz").await.is_err());
        assert_eq!(view.search_term(), "");
        assert_eq!(view.page(), 2);
        assert_eq!(view.records().len(), 5);
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_state() {
        let view = ListView::new(seeded(3).await, 10);
        view.refresh().await.unwrap();
        let result = view.delete("missing").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert_eq!(view.records().len(), 3);
    }

    #[tokio::test]
    async fn test_export_current() {
        let view = ListView::new(seeded(2).await, 10);
        view.refresh().await.unwrap();
        let id = view.records()[1].id.clone();

        let doc = view
            .export_current(&id, &DocumentRenderer::new(), None)
            .unwrap();
        assert_eq!(doc.order_number, "PO-02");
        assert_eq!(view.record(&id).unwrap().order_number, "PO-02");

        let missing = view.export_current("nope", &DocumentRenderer::new(), None);
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }
}
