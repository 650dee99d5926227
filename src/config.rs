//! Loader configuration
//!
//! Stored as JSON. Every field has a default, so a partial file (or no
//! file at all) is fine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

const APP_DIR: &str = "thumbnail-loader";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    /// Root of the pre-baked thumbnail folders
    pub thumbnail_directory: PathBuf,
    /// How long the loader thread sleeps between checks of a lost device
    pub device_poll_interval_ms: u64,
    /// Decoded thumbnails are downscaled to fit this square
    pub thumbnail_size: u32,
    /// Full extension identifying shader assets (e.g. "shader.json")
    pub shader_extension: String,
    /// Name given to the loader thread
    pub thread_name: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            thumbnail_directory: default_thumbnail_directory(),
            device_poll_interval_ms: 100,
            thumbnail_size: 256,
            shader_extension: "shader.json".to_string(),
            thread_name: "thumbnail-loader".to_string(),
        }
    }
}

/// `~/.cache/thumbnail-loader/thumbnails` on Linux
///
/// Falls back to the home directory, then to a relative path, when the
/// platform has no cache directory.
pub fn default_thumbnail_directory() -> PathBuf {
    let mut path = dirs_next::cache_dir()
        .or_else(dirs_next::home_dir)
        .unwrap_or_default();

    path.push(APP_DIR);
    path.push("thumbnails");
    path
}

/// `~/.config/thumbnail-loader/loader.json` on Linux
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("loader.json"))
}

impl LoaderConfig {
    pub fn device_poll_interval(&self) -> Duration {
        Duration::from_millis(self.device_poll_interval_ms)
    }

    pub fn with_thumbnail_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.thumbnail_directory = dir.into();
        self
    }

    pub fn with_device_poll_interval(mut self, interval: Duration) -> Self {
        self.device_poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read the user config file if there is one, defaults otherwise
    pub fn load_or_default() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "loading loader config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.device_poll_interval(), Duration::from_millis(100));
        assert_eq!(config.thumbnail_size, 256);
        assert!(config.thumbnail_directory.ends_with("thumbnail-loader/thumbnails"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = LoaderConfig::from_json(r#"{ "thumbnail_size": 128 }"#).unwrap();
        assert_eq!(config.thumbnail_size, 128);
        assert_eq!(config.shader_extension, "shader.json");
        assert_eq!(config.device_poll_interval_ms, 100);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loader.json");
        let config = LoaderConfig::default()
            .with_thumbnail_directory("/tmp/thumbs")
            .with_device_poll_interval(Duration::from_millis(5));
        fs::write(&path, config.to_json().unwrap()).unwrap();

        assert_eq!(LoaderConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loader.json");
        fs::write(&path, "[1, 2").unwrap();

        assert!(matches!(LoaderConfig::load(&path), Err(Error::Config { .. })));
    }

    #[test]
    fn test_poll_interval_saturates() {
        let config = LoaderConfig::default().with_device_poll_interval(Duration::from_millis(250));
        assert_eq!(config.device_poll_interval_ms, 250);

        let config = LoaderConfig::default().with_device_poll_interval(Duration::MAX);
        assert_eq!(config.device_poll_interval_ms, u64::MAX);
    }
}
