use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CameraError;

/// Olympus access point mode default IP address.
pub const DEFAULT_HOST: &str = "192.168.0.10";

/// Camera directory the listing walk starts from.
pub const DEFAULT_DCIM_ROOT: &str = "/DCIM";

/// Download destination, relative to the home directory.
pub const DEFAULT_DOWNLOAD_SUBDIR: &str = "DCIM/OLYMPUS";

const APP_DIR: &str = "oly-imageshare";
const CONFIG_FILE: &str = "config.json";

/// Persistent settings for oly-imageshare.
///
/// Holds the camera endpoint, the download directory, the thumbnail cache
/// location and gallery layout. Every field has a default, so a partial or
/// missing settings file still loads.
///
/// # Loading
///
/// ```rust,no_run
/// use oly_imageshare::config::Config;
///
/// // From the default location (created by `Config::save(None)`)
/// let config = Config::load(None).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.camera.host = "192.168.0.10".into();
/// config.download_dir = "/tmp/olympus".into();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera endpoint and request timeouts.
    pub camera: CameraConfig,
    /// Where downloaded images are written.
    pub download_dir: PathBuf,
    /// Thumbnail cache settings.
    pub cache: CacheConfig,
    /// Thumbnail grid layout and file filter.
    pub gallery: GalleryConfig,
    /// Gallery page shown when the gallery was last closed.
    pub last_selected_page: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Host or host:port of the camera HTTP server.
    pub host: String,
    pub dcim_root: String,
    pub timeouts: Timeouts,
}

/// Request timeouts in milliseconds.
///
/// For file downloads this bounds connecting and waiting for the response
/// headers, not the whole transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub command_ms: u64,
    pub imglist_ms: u64,
    pub thumbnail_ms: u64,
    pub file_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub root: PathBuf,
    /// Thumbnails not used for longer than this are purged.
    pub max_age_days: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub rows: usize,
    pub cols: usize,
    /// File extensions listed in the gallery, compared case-insensitively.
    pub show_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            download_dir: default_download_dir(),
            cache: CacheConfig::default(),
            gallery: GalleryConfig::default(),
            last_selected_page: 0,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            dcim_root: DEFAULT_DCIM_ROOT.to_string(),
            timeouts: Timeouts::default(),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command_ms: 1000,
            imglist_ms: 2000,
            thumbnail_ms: 500,
            file_ms: 2000,
        }
    }
}

impl Timeouts {
    pub fn command(&self) -> Duration {
        Duration::from_millis(self.command_ms)
    }

    pub fn imglist(&self) -> Duration {
        Duration::from_millis(self.imglist_ms)
    }

    pub fn thumbnail(&self) -> Duration {
        Duration::from_millis(self.thumbnail_ms)
    }

    pub fn file(&self) -> Duration {
        Duration::from_millis(self.file_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let root = dirs::cache_dir()
            .map(|d| d.join(APP_DIR).join("thumbnails"))
            .unwrap_or_else(|| PathBuf::from("cache"));
        Self {
            root,
            max_age_days: 180,
        }
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            rows: 6,
            cols: 4,
            show_extensions: vec!["JPG".to_string(), "MOV".to_string()],
        }
    }
}

impl GalleryConfig {
    /// Whether a file name has one of the configured extensions.
    pub fn shows(&self, file_name: &str) -> bool {
        match file_name.rsplit_once('.') {
            Some((_, ext)) => self
                .show_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}

fn default_download_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DOWNLOAD_SUBDIR)
}

impl Config {
    /// Resolve the settings file path: the platform config directory, or the
    /// executable's directory when the platform has none.
    pub fn config_path() -> Result<PathBuf> {
        if let Some(dir) = dirs::config_dir() {
            return Ok(dir.join(APP_DIR).join(CONFIG_FILE));
        }
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join(CONFIG_FILE))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory {}", parent.display())
                })?;
            }
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(config_path)
    }

    /// Record the gallery page in the settings file, leaving every other
    /// stored value as it is on disk.
    pub fn save_last_selected_page(path: Option<&Path>, page: usize) -> Result<PathBuf> {
        let mut stored = Self::load(path)?;
        stored.last_selected_page = page;
        stored.save(path)
    }

    /// Create the download directory if needed and check that it accepts writes.
    pub fn ensure_download_dir(&self) -> Result<&Path> {
        ensure_writable_dir(&self.download_dir)?;
        Ok(&self.download_dir)
    }
}

/// Create `dir` and probe it with a throwaway file.
pub fn ensure_writable_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| CameraError::filesystem(dir, e))
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    let probe = dir.join(".oly-imageshare-write-test");
    std::fs::write(&probe, b"")
        .map_err(|e| CameraError::filesystem(dir, e))
        .with_context(|| format!("Directory {} is not writable", dir.display()))?;
    if let Err(e) = std::fs::remove_file(&probe) {
        log::warn!("Failed to remove {}: {e}", probe.display());
    }
    Ok(())
}
