use log::{debug, error};

use crate::errors::TrackMapError;

use super::TelemetrySnapshot;

/// A trait for producing telemetry snapshots from a racing simulation.
///
/// The capture engine pulls exactly one snapshot per tick. Live implementations read
/// the simulation's shared memory; recorded ones replay a previous session, which also
/// makes the engine testable without a running game.
///
/// # Lifecycle
///
/// 1. Call `start()` to initialize the connection to the data source
/// 2. Call `telemetry()` once per tick to read the current snapshot
pub trait TelemetryProducer {
    /// Initialize the telemetry producer and establish connection to the data source.
    ///
    /// # Errors
    ///
    /// Returns an error if the data source cannot be opened.
    fn start(&mut self) -> Result<(), TrackMapError>;

    /// Read the current telemetry snapshot.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryExhausted` once a finite source has no snapshots left, or a
    /// producer error if the snapshot cannot be read.
    fn telemetry(&mut self) -> Result<TelemetrySnapshot, TrackMapError>;
}

/// A telemetry producer replaying recorded snapshots.
///
/// Recordings are JSON Lines files with one `TelemetrySnapshot` per line.
pub struct RecordedTelemetryProducer {
    cur_tick: usize,
    snapshots: Vec<TelemetrySnapshot>,
}

impl RecordedTelemetryProducer {
    /// Create a producer that replays `snapshots` in order
    pub fn from_snapshots(snapshots: Vec<TelemetrySnapshot>) -> Self {
        Self {
            cur_tick: 0,
            snapshots,
        }
    }

    /// Load a recording from a JSON Lines file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or a line is not a valid snapshot.
    pub fn from_file(file: &str) -> Result<Self, TrackMapError> {
        let lines = serde_jsonlines::json_lines::<TelemetrySnapshot, _>(file).map_err(|e| {
            TrackMapError::TelemetryRecordingError {
                path: file.to_string(),
                source: e,
            }
        })?;

        let snapshots = lines
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                error!("Could not parse telemetry recording {}: {}", file, e);
                TrackMapError::TelemetryRecordingError {
                    path: file.to_string(),
                    source: e,
                }
            })?;

        debug!("Loaded {} telemetry snapshots from {}", snapshots.len(), file);
        Ok(Self::from_snapshots(snapshots))
    }

    /// Number of snapshots not replayed yet
    pub fn remaining(&self) -> usize {
        self.snapshots.len().saturating_sub(self.cur_tick)
    }
}

impl TelemetryProducer for RecordedTelemetryProducer {
    fn start(&mut self) -> Result<(), TrackMapError> {
        // Recorded producer doesn't need to connect to anything
        Ok(())
    }

    fn telemetry(&mut self) -> Result<TelemetrySnapshot, TrackMapError> {
        let snapshot = self
            .snapshots
            .get(self.cur_tick)
            .cloned()
            .ok_or(TrackMapError::TelemetryExhausted)?;
        self.cur_tick += 1;

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn snapshot(packet_id: i32) -> TelemetrySnapshot {
        TelemetrySnapshot {
            track_name: "monza".to_string(),
            running: true,
            packet_id,
            ..TelemetrySnapshot::default()
        }
    }

    #[test]
    fn test_recorded_producer_replays_in_order() {
        let mut producer =
            RecordedTelemetryProducer::from_snapshots(vec![snapshot(1), snapshot(2)]);
        assert!(producer.start().is_ok());
        assert_eq!(producer.remaining(), 2);

        assert_eq!(producer.telemetry().unwrap().packet_id, 1);
        assert_eq!(producer.telemetry().unwrap().packet_id, 2);
        assert_eq!(producer.remaining(), 0);
        assert!(matches!(
            producer.telemetry(),
            Err(TrackMapError::TelemetryExhausted)
        ));
    }

    #[test]
    fn test_recorded_producer_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.jsonl");
        serde_jsonlines::write_json_lines(&path, [snapshot(5), snapshot(6), snapshot(7)]).unwrap();

        let mut producer = RecordedTelemetryProducer::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(producer.remaining(), 3);
        assert_eq!(producer.telemetry().unwrap(), snapshot(5));
    }

    #[test]
    fn test_recorded_producer_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.jsonl");
        fs::write(&path, "{\"packet_id\": 1}\nnot json\n").unwrap();

        assert!(matches!(
            RecordedTelemetryProducer::from_file(path.to_str().unwrap()),
            Err(TrackMapError::TelemetryRecordingError { .. })
        ));
    }

    #[test]
    fn test_recorded_producer_missing_file() {
        assert!(RecordedTelemetryProducer::from_file("/nonexistent/session.jsonl").is_err());
    }
}
