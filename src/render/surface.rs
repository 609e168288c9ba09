//! Preview surface: the mount point export targets
//!
//! A rendered document only becomes exportable once it is mounted and has
//! been painted at least once. Instead of waiting a fixed delay after
//! mounting, callers await [`PreviewSurface::ready`], which resolves as soon
//! as the surface reports the first paint.
//!
//! The surface holds at most one document (the preview). Mounting a new
//! document replaces the old one and invalidates its handle.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use super::RenderedDocument;
use crate::export::ExportError;

/// Handle to a mounted document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MountHandle(u64);

impl std::fmt::Display for MountHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "preview-{}", self.0)
    }
}

#[derive(Debug)]
struct Mounted {
    handle: MountHandle,
    document: Arc<RenderedDocument>,
    painted: bool,
}

#[derive(Debug, Default)]
struct SurfaceState {
    last_handle: u64,
    mounted: Option<Mounted>,
}

impl SurfaceState {
    fn painted_root(&self, handle: MountHandle) -> Option<Arc<RenderedDocument>> {
        match &self.mounted {
            Some(m) if m.handle == handle && m.painted => Some(Arc::clone(&m.document)),
            _ => None,
        }
    }
}

/// Mount point for rendered documents with a readiness signal
pub struct PreviewSurface {
    state: watch::Sender<SurfaceState>,
    paint_on_mount: bool,
}

impl Default for PreviewSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewSurface {
    /// Surface driven by a real display: documents are ready once the
    /// display calls [`mark_painted`](Self::mark_painted)
    pub fn new() -> Self {
        Self {
            state: watch::Sender::new(SurfaceState::default()),
            paint_on_mount: false,
        }
    }

    /// Surface without a display: documents are ready as soon as they are mounted
    pub fn headless() -> Self {
        Self {
            paint_on_mount: true,
            ..Self::new()
        }
    }

    /// Mount a document, replacing whatever was mounted before
    pub fn mount(&self, document: RenderedDocument) -> MountHandle {
        let paint_on_mount = self.paint_on_mount;
        let mut handle = MountHandle(0);
        self.state.send_modify(|state| {
            state.last_handle += 1;
            handle = MountHandle(state.last_handle);
            state.mounted = Some(Mounted {
                handle,
                document: Arc::new(document),
                painted: paint_on_mount,
            });
        });
        debug!("Mounted {}", handle);
        handle
    }

    /// Report the first paint of a mounted document.
    ///
    /// Returns `false` if `handle` is no longer mounted.
    pub fn mark_painted(&self, handle: MountHandle) -> bool {
        let mut found = false;
        self.state.send_if_modified(|state| match &mut state.mounted {
            Some(m) if m.handle == handle => {
                found = true;
                let changed = !m.painted;
                m.painted = true;
                changed
            }
            _ => false,
        });
        found
    }

    /// Remove a document; a no-op if `handle` was already replaced
    pub fn unmount(&self, handle: MountHandle) {
        let removed = self.state.send_if_modified(|state| {
            if state.mounted.as_ref().is_some_and(|m| m.handle == handle) {
                state.mounted = None;
                true
            } else {
                false
            }
        });
        if removed {
            debug!("Unmounted {}", handle);
        }
    }

    /// Handle of the currently mounted document
    pub fn current(&self) -> Option<MountHandle> {
        self.state.borrow().mounted.as_ref().map(|m| m.handle)
    }

    /// Root of a mounted, painted document; `None` if not (yet) visible
    pub fn root(&self, handle: MountHandle) -> Option<Arc<RenderedDocument>> {
        self.state.borrow().painted_root(handle)
    }

    /// Wait until the document behind `handle` has been painted.
    ///
    /// Fails with [`ExportError::NotReady`] if the document is replaced or
    /// unmounted before it was painted.
    pub async fn ready(&self, handle: MountHandle) -> Result<Arc<RenderedDocument>, ExportError> {
        let mut receiver = self.state.subscribe();
        let state = receiver
            .wait_for(|state| match &state.mounted {
                Some(m) if m.handle == handle => m.painted,
                _ => true,
            })
            .await
            .map_err(|_| ExportError::NotReady(format!("{} surface closed", handle)))?;

        state
            .painted_root(handle)
            .ok_or_else(|| ExportError::NotReady(format!("{} is no longer mounted", handle)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::document::HeaderBlock;

    fn document(order_number: &str) -> RenderedDocument {
        RenderedDocument {
            order_number: order_number.to_string(),
            file_name: format!("PO-{}.pdf", order_number),
            header: HeaderBlock {
                logo: None,
                company_name: "Acme".to_string(),
                identity_lines: Vec::new(),
                order_number_line: format!("Order number: {}", order_number),
                date_line: "Date: 05 Mar 2024".to_string(),
            },
            details: Vec::new(),
            bank: None,
        }
    }

    #[test]
    fn test_headless_is_ready_on_mount() {
        let surface = PreviewSurface::headless();
        let handle = surface.mount(document("1"));
        assert_eq!(surface.root(handle).unwrap().order_number, "1");
        assert_eq!(surface.current(), Some(handle));
    }

    #[test]
    fn test_root_requires_paint() {
        let surface = PreviewSurface::new();
        let handle = surface.mount(document("1"));
        assert!(surface.root(handle).is_none());
        assert!(surface.mark_painted(handle));
        assert!(surface.root(handle).is_some());
    }

    #[test]
    fn test_mount_replaces_previous() {
        let surface = PreviewSurface::headless();
        let first = surface.mount(document("1"));
        let second = surface.mount(document("2"));
        assert_ne!(first, second);
        assert!(surface.root(first).is_none());
        assert!(!surface.mark_painted(first));

        surface.unmount(first);
        assert!(surface.root(second).is_some());
        surface.unmount(second);
        assert_eq!(surface.current(), None);
    }

    #[tokio::test]
    async fn test_ready_resolves_after_paint() {
        let surface = PreviewSurface::new();
        let handle = surface.mount(document("7"));

        let paint = async {
            tokio::task::yield_now().await;
            surface.mark_painted(handle);
        };
        let (root, _) = tokio::join!(surface.ready(handle), paint);
        assert_eq!(root.unwrap().order_number, "7");
    }

    #[tokio::test]
    async fn test_ready_fails_when_replaced() {
        let surface = PreviewSurface::new();
        let handle = surface.mount(document("7"));

        let replace = async {
            tokio::task::yield_now().await;
            surface.mount(document("8"));
        };
        let (result, _) = tokio::join!(surface.ready(handle), replace);
        assert!(matches!(result, Err(ExportError::NotReady(_))));
    }
}
