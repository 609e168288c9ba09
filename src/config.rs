//! SDK configuration file support
//!
//! Handles parsing of `.purchase-orders.toml` configuration files and
//! environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::export::PageSize;

/// Default configuration filename
pub const CONFIG_FILENAME: &str = ".purchase-orders.toml";

/// Default backend API URL
pub const DEFAULT_API_URL: &str = "http://localhost:4000/api";

/// Environment variable for the backend API URL
pub const ENV_API_URL: &str = "PO_API_URL";

/// Environment variable for the list page size
pub const ENV_PAGE_SIZE: &str = "PO_PAGE_SIZE";

/// Environment variable for the PDF download directory
pub const ENV_DOWNLOAD_DIR: &str = "PO_DOWNLOAD_DIR";

/// Environment variable for the TrueType font used when rasterizing
pub const ENV_FONT_PATH: &str = "PO_FONT_PATH";

/// Environment variable for the system font family used when rasterizing
pub const ENV_FONT_FAMILY: &str = "PO_FONT_FAMILY";

/// Environment variable for the rasterization oversampling factor
pub const ENV_RASTER_SCALE: &str = "PO_RASTER_SCALE";

/// Smallest oversampling factor that keeps printed text legible
pub const MIN_RASTER_SCALE: u32 = 2;

/// Error type for configuration handling
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type for configuration handling
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Backend API configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    /// Base URL of the backend API
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// List view configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSection {
    /// Records per page requested from the store
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    10
}

impl Default for ListSection {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

/// Where exported PDFs come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Rasterize and paginate locally (default)
    #[default]
    Client,
    /// Request a pre-rendered PDF from the backend
    Server,
}

/// Export configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSection {
    /// Where PDFs are produced
    #[serde(default)]
    pub mode: ExportMode,

    /// Oversampling factor applied when rasterizing (at least 2)
    #[serde(default = "default_scale")]
    pub scale: u32,

    /// JPEG quality for the embedded raster (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Page size of the generated PDF
    #[serde(default)]
    pub page_size: PageSize,

    /// Directory PDFs are saved into
    #[serde(default)]
    pub download_dir: Option<PathBuf>,

    /// TrueType font used to draw text into the raster
    #[serde(default)]
    pub font_path: Option<PathBuf>,

    /// System font family, looked up when no font file is set
    #[serde(default)]
    pub font_family: Option<String>,
}

fn default_scale() -> u32 {
    MIN_RASTER_SCALE
}

fn default_jpeg_quality() -> u8 {
    98
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            mode: ExportMode::default(),
            scale: default_scale(),
            jpeg_quality: default_jpeg_quality(),
            page_size: PageSize::default(),
            download_dir: None,
            font_path: None,
            font_family: None,
        }
    }
}

impl ExportSection {
    /// Oversampling factor, never below [`MIN_RASTER_SCALE`]
    pub fn effective_scale(&self) -> u32 {
        self.scale.max(MIN_RASTER_SCALE)
    }

    /// JPEG quality clamped into 1..=100
    pub fn effective_jpeg_quality(&self) -> u8 {
        self.jpeg_quality.clamp(1, 100)
    }
}

/// Main configuration structure
///
/// Represents the `.purchase-orders.toml` configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SdkConfig {
    /// Backend API configuration
    #[serde(default)]
    pub api: ApiSection,

    /// List view configuration
    #[serde(default)]
    pub list: ListSection,

    /// Export configuration
    #[serde(default)]
    pub export: ExportSection,
}

impl SdkConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a directory
    ///
    /// Looks for `.purchase-orders.toml` in the directory.
    /// Falls back to defaults if not found.
    pub fn load(dir: &Path) -> ConfigResult<Self> {
        let config_path = dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(format!("Failed to read config: {}", e)))?;

            Self::parse(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a directory
    pub fn save(&self, dir: &Path) -> ConfigResult<()> {
        let config_path = dir.join(CONFIG_FILENAME);
        let content = self.to_toml()?;

        std::fs::write(&config_path, content)
            .map_err(|e| ConfigError::IoError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Convert configuration to TOML string
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::SerializationError(format!("Failed to serialize config: {}", e))
        })
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            self.api.base_url = url;
        }

        if let Ok(size) = std::env::var(ENV_PAGE_SIZE)
            && let Ok(size) = size.parse::<u32>()
            && size > 0
        {
            self.list.page_size = size;
        }

        if let Ok(dir) = std::env::var(ENV_DOWNLOAD_DIR) {
            self.export.download_dir = Some(PathBuf::from(dir));
        }

        if let Ok(path) = std::env::var(ENV_FONT_PATH) {
            self.export.font_path = Some(PathBuf::from(path));
        }

        if let Ok(family) = std::env::var(ENV_FONT_FAMILY) {
            self.export.font_family = Some(family);
        }

        if let Ok(scale) = std::env::var(ENV_RASTER_SCALE)
            && let Ok(scale) = scale.parse()
        {
            self.export.scale = scale;
        }
    }

    /// Directory exported PDFs are written to, relative paths resolved against `dir`
    pub fn download_dir(&self, dir: &Path) -> PathBuf {
        match &self.export.download_dir {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => dir.join(path),
            None => dir.to_path_buf(),
        }
    }

    /// Check if a configuration file exists in a directory
    pub fn exists(dir: &Path) -> bool {
        dir.join(CONFIG_FILENAME).exists()
    }
}

/// Generate a sample configuration file content
pub fn sample_config() -> &'static str {
    r#"# Purchase Order SDK Configuration

[api]
# Backend API base URL
base_url = "http://localhost:4000/api"
timeout_secs = 30

[list]
# Records per page
page_size = 10

[export]
# "client" rasterizes locally, "server" downloads the backend's PDF
mode = "client"

# Oversampling factor for rasterization (minimum 2)
scale = 2
jpeg_quality = 98

# Page size: "a4" or "letter"
page_size = "a4"

# download_dir = "downloads"
# Text font: a font file, or a system family; the bundled DejaVu Sans otherwise
# font_path = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"
# font_family = "Liberation Sans"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = SdkConfig::new();
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.list.page_size, 10);
        assert_eq!(config.export.mode, ExportMode::Client);
        assert_eq!(config.export.scale, 2);
        assert_eq!(config.export.jpeg_quality, 98);
        assert_eq!(config.export.page_size, PageSize::A4);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[api]
base_url = "https://orders.example.com/api"

[list]
page_size = 25

[export]
mode = "server"
scale = 3
download_dir = "pdfs"
font_family = "Noto Sans"
"#;
        let config = SdkConfig::parse(toml).unwrap();
        assert_eq!(config.api.base_url, "https://orders.example.com/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.list.page_size, 25);
        assert_eq!(config.export.mode, ExportMode::Server);
        assert_eq!(config.export.scale, 3);
        assert_eq!(config.export.font_family.as_deref(), Some("Noto Sans"));
        assert_eq!(
            config.download_dir(Path::new("/home/user")),
            PathBuf::from("/home/user/pdfs")
        );
    }

    #[test]
    fn test_effective_values_are_clamped() {
        let export = ExportSection {
            scale: 1,
            jpeg_quality: 0,
            ..Default::default()
        };
        assert_eq!(export.effective_scale(), MIN_RASTER_SCALE);
        assert_eq!(export.effective_jpeg_quality(), 1);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            SdkConfig::parse("[list]\npage_size = \"ten\""),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let mut config = SdkConfig::new();
        config.list.page_size = 15;

        config.save(dir.path()).unwrap();
        assert!(SdkConfig::exists(dir.path()));

        let loaded = SdkConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.list.page_size, 15);
    }

    #[test]
    fn test_load_missing_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let loaded = SdkConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.export.mode, ExportMode::Client);
    }

    #[test]
    fn test_sample_config_is_valid() {
        let config = SdkConfig::parse(sample_config()).unwrap();
        assert_eq!(config.export.page_size, PageSize::A4);
    }
}
