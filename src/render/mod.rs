//! Document rendering
//!
//! - [`DocumentRenderer`]: pure mapping of an order and profile onto a document
//! - [`PreviewSurface`]: mount point with a readiness signal, targeted by export

pub mod document;
pub mod renderer;
pub mod surface;

pub use document::{BankBlock, DetailRow, HeaderBlock, RenderedDocument};
pub use renderer::{DocumentRenderer, PLACEHOLDER_COMPANY_NAME};
pub use surface::{MountHandle, PreviewSurface};
