//! Export pipeline
//!
//! Client-side export runs `locate root → rasterize → paginate → write PDF →
//! deliver`. The document is only looked up on the preview surface; if it is
//! not mounted and painted the export fails with [`ExportError::NotReady`]
//! before anything is rasterized or delivered.
//!
//! Server-side export skips rasterization and delivers the PDF bytes the
//! backend renders for the record.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::delivery::{DeliveredFile, FileDelivery};
use super::paginate::{PageGeometry, PagePlacement};
use super::pdf::{DEFAULT_JPEG_QUALITY, PdfDocument, build_pdf};
use super::raster::Rasterizer;
use super::{ExportError, ExportResult, PageSize};
use crate::config::{ExportSection, MIN_RASTER_SCALE};
use crate::models::{CompanyProfile, PurchaseOrder};
use crate::render::{MountHandle, PreviewSurface, RenderedDocument};
use crate::store::RemoteStore;

/// Export settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Oversampling factor for the raster
    pub scale: u32,
    pub jpeg_quality: u8,
    pub page_size: PageSize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: MIN_RASTER_SCALE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            page_size: PageSize::A4,
        }
    }
}

impl From<&ExportSection> for ExportOptions {
    fn from(section: &ExportSection) -> Self {
        Self {
            scale: section.effective_scale(),
            jpeg_quality: section.effective_jpeg_quality(),
            page_size: section.page_size,
        }
    }
}

/// Where the PDF bytes came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportSource {
    Client,
    Server,
}

/// Result of an export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub file: DeliveredFile,
    pub source: ExportSource,
    /// Raster placement per page; empty for server-rendered files
    pub placements: Vec<PagePlacement>,
}

impl ExportedFile {
    /// Page count, when the PDF was assembled locally
    pub fn page_count(&self) -> Option<usize> {
        match self.source {
            ExportSource::Client => Some(self.placements.len()),
            ExportSource::Server => None,
        }
    }
}

/// Runs exports with a rasterizer and a delivery target
pub struct ExportPipeline<R, D> {
    rasterizer: R,
    delivery: D,
    options: ExportOptions,
}

impl<R: Rasterizer, D: FileDelivery> ExportPipeline<R, D> {
    /// Create a pipeline; a scale below [`MIN_RASTER_SCALE`] is raised to it
    pub fn new(rasterizer: R, delivery: D, mut options: ExportOptions) -> Self {
        if options.scale < MIN_RASTER_SCALE {
            debug!(
                "Raising raster scale {} to {}",
                options.scale, MIN_RASTER_SCALE
            );
            options.scale = MIN_RASTER_SCALE;
        }
        Self {
            rasterizer,
            delivery,
            options,
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    pub fn delivery(&self) -> &D {
        &self.delivery
    }

    /// Rasterize and paginate `document` without delivering it
    pub async fn render_pdf(&self, document: &RenderedDocument) -> ExportResult<PdfDocument> {
        let raster = self
            .rasterizer
            .rasterize(document, self.options.scale)
            .await?;
        let geometry = PageGeometry::for_page_size(self.options.page_size);
        build_pdf(
            &raster,
            &geometry,
            self.options.jpeg_quality,
            &format!("Purchase Order {}", document.order_number),
        )
    }

    /// Export the document mounted under `handle`.
    ///
    /// Fails with [`ExportError::NotReady`] if the document is not mounted
    /// or has not been painted yet; callers that just mounted it should
    /// await [`PreviewSurface::ready`] first.
    pub async fn export(&self, surface: &PreviewSurface, handle: MountHandle) -> ExportResult<ExportedFile> {
        let document = surface.root(handle).ok_or_else(|| {
            warn!("Export requested for {} before it was ready", handle);
            ExportError::NotReady(format!("{} is not mounted or not painted", handle))
        })?;

        let pdf = self.render_pdf(&document).await?;
        let file = self.delivery.deliver(&document.file_name, &pdf.bytes).await?;
        info!(
            "Exported {} ({} page(s), {} bytes)",
            file.file_name,
            pdf.page_count(),
            file.size
        );

        Ok(ExportedFile {
            file,
            source: ExportSource::Client,
            placements: pdf.placements,
        })
    }

    /// Deliver the PDF the backend renders for `order`
    pub async fn export_from_server<S: RemoteStore + ?Sized>(
        &self,
        store: &S,
        order: &PurchaseOrder,
        profile: Option<&CompanyProfile>,
    ) -> ExportResult<ExportedFile> {
        let bytes = store.render_server_pdf(&order.id, profile).await?;
        if bytes.is_empty() {
            return Err(ExportError::EncodeError(format!(
                "Server returned an empty PDF for {}",
                order.order_number
            )));
        }

        let file = self.delivery.deliver(&order.pdf_file_name(), &bytes).await?;
        info!("Exported {} from server ({} bytes)", file.file_name, file.size);

        Ok(ExportedFile {
            file,
            source: ExportSource::Server,
            placements: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::delivery::MemoryDelivery;
    use crate::export::raster::LayoutRasterizer;
    use crate::models::PurchaseOrderDraft;
    use crate::render::DocumentRenderer;
    use crate::store::memory::InMemoryStore;
    use chrono::{NaiveDate, Utc};

    fn order() -> PurchaseOrder {
        PurchaseOrder::from_draft(
            "id-1",
            PurchaseOrderDraft::new(
                NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                "17",
                "Shree Traders",
            ),
            Utc::now(),
        )
    }

    fn pipeline() -> ExportPipeline<LayoutRasterizer, MemoryDelivery> {
        ExportPipeline::new(
            LayoutRasterizer::new(),
            MemoryDelivery::new(),
            ExportOptions::default(),
        )
    }

    #[test]
    fn test_options_from_config() {
        let section = ExportSection {
            scale: 1,
            ..Default::default()
        };
        let options = ExportOptions::from(&section);
        assert_eq!(options.scale, MIN_RASTER_SCALE);
        assert_eq!(options.jpeg_quality, DEFAULT_JPEG_QUALITY);
    }

    /// Records the scale it was asked to paint at
    struct ScaleRecorder(std::cell::Cell<u32>);

    #[async_trait::async_trait(?Send)]
    impl Rasterizer for ScaleRecorder {
        async fn rasterize(&self, _: &RenderedDocument, scale: u32) -> ExportResult<image::RgbImage> {
            self.0.set(scale);
            Ok(image::RgbImage::from_pixel(10, 10, image::Rgb([255, 255, 255])))
        }
    }

    #[tokio::test]
    async fn test_scale_below_minimum_is_raised() {
        for scale in [0, 1] {
            let pipeline = ExportPipeline::new(
                ScaleRecorder(std::cell::Cell::new(0)),
                MemoryDelivery::new(),
                ExportOptions {
                    scale,
                    ..Default::default()
                },
            );
            assert_eq!(pipeline.options().scale, MIN_RASTER_SCALE);

            let document = DocumentRenderer::new().render(&order(), None);
            pipeline.render_pdf(&document).await.unwrap();
            assert_eq!(pipeline.rasterizer().0.get(), MIN_RASTER_SCALE);
        }
    }

    #[tokio::test]
    async fn test_export_mounted_document() {
        let surface = PreviewSurface::headless();
        let handle = surface.mount(DocumentRenderer::new().render(&order(), None));
        let pipeline = pipeline();

        let exported = pipeline.export(&surface, handle).await.unwrap();
        assert_eq!(exported.file.file_name, "PO-17.pdf");
        assert_eq!(exported.source, ExportSource::Client);
        assert_eq!(exported.page_count(), Some(1));

        let files = pipeline.delivery().files();
        assert_eq!(files.len(), 1);
        assert!(files[0].1.starts_with(b"%PDF-1.4"));
    }

    #[tokio::test]
    async fn test_export_before_paint_is_not_ready() {
        let surface = PreviewSurface::new();
        let handle = surface.mount(DocumentRenderer::new().render(&order(), None));
        let pipeline = pipeline();

        let result = pipeline.export(&surface, handle).await;
        assert!(matches!(result, Err(ExportError::NotReady(_))));
        assert!(pipeline.delivery().files().is_empty());
    }

    #[tokio::test]
    async fn test_server_export_unsupported_by_memory_store() {
        let store = InMemoryStore::new();
        let result = pipeline().export_from_server(&store, &order(), None).await;
        assert!(matches!(result, Err(ExportError::StoreError(_))));
    }
}
