//! Export functionality
//!
//! Turns a mounted purchase order document into a downloadable PDF:
//! - [`raster`]: paints the document into a bitmap at an oversampling factor
//! - [`paginate`]: places one tall raster across as many pages as it needs
//! - [`pdf`]: writes the PDF with a single shared image
//! - [`delivery`]: hands the finished file to its destination
//! - [`pipeline`]: runs the steps in order, or fetches a server-rendered PDF instead

pub mod delivery;
pub mod paginate;
pub mod pdf;
pub mod pipeline;
pub mod raster;

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Error during export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The document to export is not mounted or not yet painted
    #[error("Document not ready for export: {0}")]
    NotReady(String),
    #[error("Rasterization error: {0}")]
    RasterError(String),
    #[error("Encoding error: {0}")]
    EncodeError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Page size options
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    /// A4 paper size (210 x 297 mm)
    #[default]
    A4,
    /// US Letter size (8.5 x 11 inches)
    Letter,
}

impl PageSize {
    /// Get page dimensions in millimeters (width, height)
    pub fn dimensions_mm(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
        }
    }
}

/// File name of an exported purchase order
///
/// ```
/// assert_eq!(purchase_order_sdk::export::pdf_file_name("17"), "PO-17.pdf");
/// ```
pub fn pdf_file_name(order_number: &str) -> String {
    format!("PO-{}.pdf", order_number)
}

pub use delivery::{DeliveredFile, FileDelivery, MemoryDelivery};
#[cfg(feature = "native-fs")]
pub use delivery::DownloadDirectory;
pub use paginate::{PageGeometry, PagePlacement, paginate};
pub use pdf::PdfDocument;
pub use pipeline::{ExportOptions, ExportPipeline, ExportSource, ExportedFile};
pub use raster::{LayoutRasterizer, Rasterizer};
