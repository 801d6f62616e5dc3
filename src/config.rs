use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::TrackMapError;
use crate::telemetry::REFRESH_RATE_MS;
use crate::track_map::FileTrackStore;

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Interval between two telemetry ticks
    pub refresh_rate_ms: u64,
    /// Directory holding the stored track maps, the user data directory when unset
    pub storage_dir: Option<PathBuf>,
    /// Log every progress message of the capture engine
    pub log_progress: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: REFRESH_RATE_MS,
            storage_dir: None,
            log_progress: true,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Result<PathBuf, TrackMapError> {
        Ok(dirs::config_dir()
            .ok_or(TrackMapError::NoConfigDir)?
            .join("trackmap")
            .join(CONFIG_FILE_NAME))
    }

    /// Read the user's config file, `None` when there is none yet
    pub fn from_local_file() -> Result<Option<Self>, TrackMapError> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::from_file(&config_path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, TrackMapError> {
        let file = fs::File::open(path).map_err(|e| TrackMapError::ConfigIOError { source: e })?;
        serde_json::from_reader(file).map_err(|e| TrackMapError::ConfigSerializeError { source: e })
    }

    pub fn save(&self) -> Result<(), TrackMapError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), TrackMapError> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| TrackMapError::ConfigIOError { source: e })?;
        }

        let file = fs::File::create(config_path)
            .map_err(|e| TrackMapError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| TrackMapError::ConfigSerializeError { source: e })
    }

    /// Directory the track maps are stored in
    pub fn storage_path(&self) -> Result<PathBuf, TrackMapError> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => FileTrackStore::default_storage_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.refresh_rate_ms, REFRESH_RATE_MS);
        assert!(config.storage_dir.is_none());
        assert!(config.log_progress);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("trackmap").join(CONFIG_FILE_NAME);
        let config = AppConfig {
            refresh_rate_ms: 25,
            storage_dir: Some(temp_dir.path().join("tracks")),
            log_progress: false,
        };

        config.save_to(&path).unwrap();
        let loaded = AppConfig::from_file(&path).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.storage_path().unwrap(), temp_dir.path().join("tracks"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{"refresh_rate_ms": 50}"#).unwrap();

        let loaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(loaded.refresh_rate_ms, 50);
        assert!(loaded.log_progress);
        assert!(loaded.storage_dir.is_none());
    }

    #[test]
    fn test_invalid_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            AppConfig::from_file(&path),
            Err(TrackMapError::ConfigSerializeError { .. })
        ));
    }
}
