//! Order desk: the user-facing flows
//!
//! [`OrderDesk`] wires the list view, profile service, editor, renderer and
//! export pipeline around one shared store. Downloads render the record
//! with the current profile snapshot, mount it on an offscreen surface,
//! wait for it to be ready, export it and unmount it again, in that order.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{ExportMode, SdkConfig};
use crate::error::{Error, ErrorKind, Result};
use crate::export::{ExportOptions, ExportPipeline, ExportedFile, FileDelivery, Rasterizer};
use crate::models::{CompanyProfile, PurchaseOrder};
use crate::orders::OrderEditor;
use crate::profile::ProfileService;
use crate::render::{DocumentRenderer, MountHandle, PreviewSurface};
use crate::store::RemoteStore;
use crate::view::ListView;

/// Purchase order workspace over one store
pub struct OrderDesk<S, R, D> {
    store: S,
    view: ListView<S>,
    profiles: ProfileService<S>,
    editor: OrderEditor<S>,
    renderer: DocumentRenderer,
    preview: PreviewSurface,
    offscreen: PreviewSurface,
    pipeline: ExportPipeline<R, D>,
    mode: ExportMode,
}

impl<S, R, D> OrderDesk<S, R, D>
where
    S: RemoteStore + Clone,
    R: Rasterizer,
    D: FileDelivery,
{
    pub fn new(store: S, rasterizer: R, delivery: D, config: &SdkConfig) -> Self {
        Self {
            view: ListView::from_config(store.clone(), &config.list),
            profiles: ProfileService::new(store.clone()),
            editor: OrderEditor::new(store.clone()),
            store,
            renderer: DocumentRenderer::new(),
            preview: PreviewSurface::new(),
            offscreen: PreviewSurface::headless(),
            pipeline: ExportPipeline::new(
                rasterizer,
                delivery,
                ExportOptions::from(&config.export),
            ),
            mode: config.export.mode,
        }
    }

    pub fn view(&self) -> &ListView<S> {
        &self.view
    }

    pub fn profiles(&self) -> &ProfileService<S> {
        &self.profiles
    }

    pub fn editor(&self) -> &OrderEditor<S> {
        &self.editor
    }

    /// Surface the host displays previews on; the host reports paints
    pub fn preview_surface(&self) -> &PreviewSurface {
        &self.preview
    }

    pub fn pipeline(&self) -> &ExportPipeline<R, D> {
        &self.pipeline
    }

    pub fn export_mode(&self) -> ExportMode {
        self.mode
    }

    /// Render a record from the current page onto the preview surface
    pub async fn preview(&self, id: &str) -> Result<MountHandle> {
        let profile = self.profiles.load_for_render().await;
        let document = self
            .view
            .export_current(id, &self.renderer, profile.as_deref())?;
        let handle = self.preview.mount(document);
        debug!("Previewing order {} as {}", id, handle);
        Ok(handle)
    }

    /// Download a record from the current page as PDF
    pub async fn download(&self, id: &str) -> Result<ExportedFile> {
        match self.download_inner(id).await {
            Ok(exported) => Ok(exported),
            Err(e) => Err(self.refresh_if_stale(e).await),
        }
    }

    /// Delete a record and reload the list
    pub async fn delete(&self, id: &str) -> Result<()> {
        match self.view.delete(id).await {
            Ok(_) => Ok(()),
            Err(e) => Err(self.refresh_if_stale(e.into()).await),
        }
    }

    /// A record that no longer exists means the page is out of date
    async fn refresh_if_stale(&self, error: Error) -> Error {
        if error.kind() == ErrorKind::NotFound {
            debug!("Reloading list after stale reference: {}", error);
            if let Err(e) = self.view.refresh().await {
                warn!("Reload after stale reference failed: {}", e);
            }
        }
        error
    }

    async fn download_inner(&self, id: &str) -> Result<ExportedFile> {
        let profile = self.profiles.load_for_render().await;
        match self.mode {
            ExportMode::Client => self.download_rendered(id, profile).await,
            ExportMode::Server => {
                let order = self.resolve(id).await?;
                let exported = self
                    .pipeline
                    .export_from_server(&self.store, &order, profile.as_deref())
                    .await?;
                Ok(exported)
            }
        }
    }

    async fn download_rendered(
        &self,
        id: &str,
        profile: Option<Arc<CompanyProfile>>,
    ) -> Result<ExportedFile> {
        let document = self
            .view
            .export_current(id, &self.renderer, profile.as_deref())?;
        let handle = self.offscreen.mount(document);

        let result = async {
            self.offscreen.ready(handle).await?;
            self.pipeline.export(&self.offscreen, handle).await
        }
        .await;

        self.offscreen.unmount(handle);
        let exported = result?;
        info!("Downloaded order {} as {}", id, exported.file.file_name);
        Ok(exported)
    }

    async fn resolve(&self, id: &str) -> Result<PurchaseOrder> {
        match self.view.record(id) {
            Some(order) => Ok(order),
            None => Ok(self.store.get(id).await?),
        }
    }
}
