//! Purchase order create and edit flows
//!
//! [`OrderEditor`] normalizes and validates drafts before anything reaches
//! the store, and reports a duplicate order number as a conflict the form
//! can show next to the order number field.

use tracing::{info, warn};

use crate::error::Result;
use crate::models::{PurchaseOrder, PurchaseOrderDraft};
use crate::store::{RemoteStore, StoreError};

/// Create and update purchase orders through a [`RemoteStore`]
pub struct OrderEditor<S> {
    store: S,
}

impl<S: RemoteStore> OrderEditor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load an existing order as a draft for the edit form
    pub async fn load(&self, id: &str) -> Result<PurchaseOrderDraft> {
        let order = self.store.get(id).await?;
        Ok(PurchaseOrderDraft::from(&order))
    }

    /// Create a new order
    pub async fn create(&self, draft: PurchaseOrderDraft) -> Result<PurchaseOrder> {
        let draft = draft.normalized();
        draft.validate()?;

        let order = self
            .store
            .create(&draft)
            .await
            .inspect_err(|e| log_write_failure(&draft, e))?;
        info!("Created order {} ({})", order.order_number, order.id);
        Ok(order)
    }

    /// Replace the editable fields of order `id`
    pub async fn update(&self, id: &str, draft: PurchaseOrderDraft) -> Result<PurchaseOrder> {
        let draft = draft.normalized();
        draft.validate()?;

        let order = self
            .store
            .update(id, &draft)
            .await
            .inspect_err(|e| log_write_failure(&draft, e))?;
        info!("Updated order {} ({})", order.order_number, order.id);
        Ok(order)
    }

    /// Create when `id` is `None`, update otherwise
    pub async fn submit(&self, id: Option<&str>, draft: PurchaseOrderDraft) -> Result<PurchaseOrder> {
        match id {
            Some(id) => self.update(id, draft).await,
            None => self.create(draft).await,
        }
    }
}

fn log_write_failure(draft: &PurchaseOrderDraft, error: &StoreError) {
    match error {
        StoreError::Conflict(_) => warn!("Order number {} is already taken", draft.order_number),
        other => warn!("Failed to save order {}: {}", draft.order_number, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::store::memory::InMemoryStore;
    use crate::validation::ValidationError;
    use chrono::NaiveDate;

    fn draft(order_number: &str) -> PurchaseOrderDraft {
        PurchaseOrderDraft::new(
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            order_number,
            "Shree Traders",
        )
    }

    #[tokio::test]
    async fn test_create_normalizes() {
        let editor = OrderEditor::new(InMemoryStore::new());
        let mut input = draft("  PO-9 ");
        input.broker = Some("   ".to_string());
        let order = editor.create(input).await.unwrap();
        assert_eq!(order.order_number, "PO-9");
        assert!(order.broker.is_none());
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_store() {
        let editor = OrderEditor::new(InMemoryStore::new());
        let mut input = draft("PO-1");
        input.rate = Some(-5.0);
        let err = editor.create(input).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::NotPositive("rate"))));
        assert!(editor.store().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_is_conflict() {
        let editor = OrderEditor::new(InMemoryStore::new());
        editor.create(draft("PO-1")).await.unwrap();
        let err = editor.create(draft(" PO-1 ")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(matches!(err, Error::Store(StoreError::Conflict(_))));
        assert_eq!(editor.store().len(), 1);
    }

    #[tokio::test]
    async fn test_load_and_update() {
        let editor = OrderEditor::new(InMemoryStore::new());
        let created = editor.create(draft("PO-2")).await.unwrap();

        let mut edit = editor.load(&created.id).await.unwrap();
        assert_eq!(edit.order_number, "PO-2");
        edit.bags = Some(40);
        let updated = editor.submit(Some(&created.id), edit).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.bags, Some(40));

        let missing = editor.load("nope").await.unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }
}
