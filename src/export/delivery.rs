//! Delivery of finished files
//!
//! A [`FileDelivery`] is where an exported PDF ends up: a download directory
//! on native hosts, or an in-memory outbox for hosts that hand the bytes on
//! themselves (a browser download, an email attachment, a test).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

use super::{ExportError, ExportResult};
use crate::validation::sanitize_file_name;

/// A delivered file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveredFile {
    /// File name as delivered (sanitized)
    pub file_name: String,
    /// Where the file was written, for deliveries that write to disk
    pub location: Option<PathBuf>,
    /// Size in bytes
    pub size: usize,
}

/// Destination for exported files
#[async_trait(?Send)]
pub trait FileDelivery {
    async fn deliver(&self, file_name: &str, bytes: &[u8]) -> ExportResult<DeliveredFile>;
}

/// Writes files into a download directory
#[cfg(feature = "native-fs")]
#[derive(Debug, Clone)]
pub struct DownloadDirectory {
    dir: PathBuf,
}

#[cfg(feature = "native-fs")]
impl DownloadDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

#[cfg(feature = "native-fs")]
#[async_trait(?Send)]
impl FileDelivery for DownloadDirectory {
    async fn deliver(&self, file_name: &str, bytes: &[u8]) -> ExportResult<DeliveredFile> {
        let file_name = sanitize_file_name(file_name);
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            ExportError::IoError(format!(
                "Failed to create download directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ExportError::IoError(format!("Failed to write {}: {}", path.display(), e)))?;

        info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(DeliveredFile {
            file_name,
            location: Some(path),
            size: bytes.len(),
        })
    }
}

/// Keeps delivered files in memory
#[derive(Debug, Default)]
pub struct MemoryDelivery {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivered files in delivery order
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files
            .lock()
            .map(|files| files.clone())
            .unwrap_or_default()
    }

    /// Remove and return everything delivered so far
    pub fn take(&self) -> Vec<(String, Vec<u8>)> {
        self.files
            .lock()
            .map(|mut files| std::mem::take(&mut *files))
            .unwrap_or_default()
    }
}

#[async_trait(?Send)]
impl FileDelivery for MemoryDelivery {
    async fn deliver(&self, file_name: &str, bytes: &[u8]) -> ExportResult<DeliveredFile> {
        let file_name = sanitize_file_name(file_name);
        self.files
            .lock()
            .map_err(|e| ExportError::IoError(format!("Outbox unavailable: {}", e)))?
            .push((file_name.clone(), bytes.to_vec()));
        Ok(DeliveredFile {
            file_name,
            location: None,
            size: bytes.len(),
        })
    }
}
