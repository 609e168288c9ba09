//! Company profile access
//!
//! [`ProfileService`] is the single way the rest of the SDK reads and writes
//! the company profile. Reads hand out immutable `Arc` snapshots, so a
//! document rendered from one snapshot is unaffected by a later save.

use std::cell::RefCell;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::CompanyProfile;
use crate::store::{RemoteStore, StoreResult};

/// Company profile reads and validated saves over a [`RemoteStore`]
pub struct ProfileService<S> {
    store: S,
    snapshot: RefCell<Option<Arc<CompanyProfile>>>,
}

impl<S: RemoteStore> ProfileService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            snapshot: RefCell::new(None),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The profile from the last successful fetch or save
    pub fn snapshot(&self) -> Option<Arc<CompanyProfile>> {
        self.snapshot.borrow().clone()
    }

    /// Fetch the profile from the store; `None` if none was saved yet
    pub async fn fetch(&self) -> StoreResult<Option<Arc<CompanyProfile>>> {
        let profile = self.store.company_profile().await?.map(Arc::new);
        debug!(
            "Fetched company profile ({})",
            if profile.is_some() { "present" } else { "absent" }
        );
        self.snapshot.replace(profile.clone());
        Ok(profile)
    }

    /// Fetch the profile for branding a document.
    ///
    /// A failed fetch falls back to the last snapshot, so documents still
    /// render (with placeholders if nothing was ever loaded).
    pub async fn load_for_render(&self) -> Option<Arc<CompanyProfile>> {
        match self.fetch().await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Company profile unavailable, using last snapshot: {}", e);
                self.snapshot()
            }
        }
    }

    /// Validate and save `profile`, replacing the stored one.
    ///
    /// Invalid profiles are rejected before the store is contacted.
    pub async fn save(&self, profile: &CompanyProfile) -> Result<Arc<CompanyProfile>> {
        profile.validate()?;

        let saved = Arc::new(self.store.save_company_profile(profile).await?);
        info!("Saved company profile '{}'", saved.company_name);
        self.snapshot.replace(Some(Arc::clone(&saved)));
        Ok(saved)
    }
}
