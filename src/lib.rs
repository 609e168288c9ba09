//! Purchase Order SDK - client core for purchase order management
//!
//! Provides unified interfaces for:
//! - Formatting of dates, amounts and placeholders
//! - The remote store contract (HTTP backend or in-memory)
//! - List reconciliation (search, pagination, sort, delete)
//! - Company profile and order editing flows
//! - Document rendering and PDF export

pub mod config;
pub mod desk;
pub mod error;
pub mod export;
pub mod format;
pub mod models;
pub mod orders;
pub mod profile;
pub mod render;
pub mod store;
pub mod validation;
pub mod view;

// Re-export commonly used types
pub use config::{ConfigError, ExportMode, SdkConfig};
pub use desk::OrderDesk;
pub use error::{Error, ErrorKind};
#[cfg(feature = "native-fs")]
pub use export::DownloadDirectory;
pub use export::{
    ExportError, ExportPipeline, ExportResult, ExportedFile, FileDelivery, LayoutRasterizer,
    MemoryDelivery, PageSize, Rasterizer,
};
pub use orders::OrderEditor;
pub use profile::ProfileService;
pub use render::{DocumentRenderer, MountHandle, PreviewSurface, RenderedDocument};
#[cfg(feature = "api-backend")]
pub use store::ApiStore;
pub use store::{InMemoryStore, Page, RemoteStore, StoreError, StoreResult};
pub use validation::{ValidationError, ValidationResult};
pub use view::{FetchOutcome, ListView};

// Re-export models
pub use models::{
    CompanyProfile, PurchaseOrder, PurchaseOrderDraft, SortDirection, SortField, SortOrder,
};
