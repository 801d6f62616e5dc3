// Storage implementation for track map persistence

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::{debug, info, warn};

use crate::errors::TrackMapError;
use crate::track_map::codec::{decode_track_points, write_track_points};
use crate::track_map::types::TrackPoint;

const TRACK_MAP_EXTENSION: &str = "bin";

/// Interface for track map storage operations.
///
/// Implementations keep no state between calls: every load reads the artifact from
/// scratch and every save rewrites it completely.
pub trait TrackStore {
    /// Load the stored points for a track, `None` if nothing was stored yet
    fn load(&self, track_name: &str) -> Result<Option<Vec<TrackPoint>>, TrackMapError>;

    /// Store the points for a track, replacing any previous map
    fn save(&self, track_name: &str, points: &[TrackPoint]) -> Result<(), TrackMapError>;

    /// Check if a map exists for a given track
    fn exists(&self, track_name: &str) -> bool;

    /// List the normalized names of all stored tracks
    fn list_tracks(&self) -> Result<Vec<String>, TrackMapError>;

    /// Delete the map for a track. Deleting a missing map is not an error.
    fn delete(&self, track_name: &str) -> Result<(), TrackMapError>;
}

/// Normalize track name for consistent file naming.
///
/// Simulation track identifiers such as `paul_ricard` or `Spa` keep their shape,
/// only lower-cased; anything that could escape the storage directory becomes `_`.
pub fn normalize_track_name(track_name: &str) -> String {
    track_name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// File-based implementation of track map storage, one `<track>.bin` file per track
pub struct FileTrackStore {
    storage_path: PathBuf,
}

impl FileTrackStore {
    /// Create a store rooted at `storage_path`. The directory is created on first save.
    pub fn new(storage_path: PathBuf) -> Self {
        Self { storage_path }
    }

    /// Create storage in the default application data directory
    pub fn new_default() -> Result<Self, TrackMapError> {
        Ok(Self::new(Self::default_storage_path()?))
    }

    /// Get the default storage path for track maps
    pub fn default_storage_path() -> Result<PathBuf, TrackMapError> {
        let app_data_dir = dirs::data_dir().ok_or(TrackMapError::NoConfigDir)?;
        Ok(app_data_dir.join("trackmap").join("tracks"))
    }

    /// Get the storage directory path
    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    /// Generate file path for a given track name
    pub fn file_path_for_track(&self, track_name: &str) -> Result<PathBuf, TrackMapError> {
        let normalized = normalize_track_name(track_name);
        if normalized.is_empty() {
            return Err(TrackMapError::InvalidTrackName {
                reason: "Track name cannot be empty".to_string(),
            });
        }
        Ok(self
            .storage_path
            .join(format!("{}.{}", normalized, TRACK_MAP_EXTENSION)))
    }
}

impl TrackStore for FileTrackStore {
    fn load(&self, track_name: &str) -> Result<Option<Vec<TrackPoint>>, TrackMapError> {
        let file_path = self.file_path_for_track(track_name)?;
        debug!("Loading track map for {} from {:?}", track_name, file_path);

        let bytes = match fs::read(&file_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No track map file found for: {}", track_name);
                return Ok(None);
            }
            Err(e) => {
                return Err(TrackMapError::TrackMapReadError {
                    path: file_path.display().to_string(),
                    source: e,
                });
            }
        };

        let points = decode_track_points(&bytes).inspect_err(|e| {
            warn!("Track map for {} could not be decoded: {}", track_name, e);
        })?;

        debug!("Loaded {} points for track {}", points.len(), track_name);
        Ok(Some(points))
    }

    fn save(&self, track_name: &str, points: &[TrackPoint]) -> Result<(), TrackMapError> {
        let file_path = self.file_path_for_track(track_name)?;
        let write_error = |e: io::Error| TrackMapError::TrackMapWriteError {
            path: file_path.display().to_string(),
            source: e,
        };

        info!(
            "Saving track map for {} ({} points)",
            track_name,
            points.len()
        );

        if !self.storage_path.exists() {
            fs::create_dir_all(&self.storage_path).map_err(write_error)?;
        }

        // a failure past this point leaves whatever was already written on disk
        let file = File::create(&file_path).map_err(write_error)?;
        let mut writer = BufWriter::new(file);
        write_track_points(&mut writer, points).map_err(write_error)?;
        writer.flush().map_err(write_error)?;

        Ok(())
    }

    fn exists(&self, track_name: &str) -> bool {
        self.file_path_for_track(track_name)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    fn list_tracks(&self) -> Result<Vec<String>, TrackMapError> {
        let entries = match fs::read_dir(&self.storage_path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(TrackMapError::TrackMapListError { source: e }),
        };

        let mut tracks = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| TrackMapError::TrackMapListError { source: e })?
                .path();

            let is_track_map =
                path.extension().and_then(|s| s.to_str()) == Some(TRACK_MAP_EXTENSION);
            if path.is_file() && is_track_map {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    tracks.push(stem.to_string());
                }
            }
        }

        Ok(tracks.into_iter().sorted().collect())
    }

    fn delete(&self, track_name: &str) -> Result<(), TrackMapError> {
        let file_path = self.file_path_for_track(track_name)?;

        match fs::remove_file(&file_path) {
            Ok(()) => {
                info!("Deleted track map for {}", track_name);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TrackMapError::TrackMapWriteError {
                path: file_path.display().to_string(),
                source: e,
            }),
        }
    }
}
