use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use log::{info, warn};

use crate::TrackMapError;
use crate::capture::{CaptureEngine, CaptureListener, CapturePhase};
use crate::track_map::TrackStore;

use super::producer::TelemetryProducer;

pub const REFRESH_RATE_MS: u64 = 10;

/// How a capture run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The session delivered its track map
    Completed,
    /// The telemetry source ran out before the session finished
    TelemetryExhausted,
    /// The stop flag was cleared
    Stopped,
}

/// Tick `engine` every `refresh_rate` until its session ends.
///
/// Producer hiccups are logged and retried on the next tick; only the end of a finite
/// telemetry source or clearing `keep_running` ends the loop early. A trace still in
/// progress at that point is dropped without being stored.
pub fn run_capture<P, S, L>(
    engine: &mut CaptureEngine<P, S, L>,
    refresh_rate: Duration,
    keep_running: Arc<AtomicBool>,
) -> Result<CaptureOutcome, TrackMapError>
where
    P: TelemetryProducer,
    S: TrackStore,
    L: CaptureListener,
{
    engine.start()?;

    while keep_running.load(Ordering::SeqCst) {
        match engine.tick() {
            Ok(CapturePhase::End) => return Ok(CaptureOutcome::Completed),
            Ok(_) => {}
            Err(TrackMapError::TelemetryExhausted) => {
                info!(
                    "Telemetry source exhausted while {}",
                    engine.phase().label()
                );
                return Ok(CaptureOutcome::TelemetryExhausted);
            }
            Err(e) => warn!("Could not read telemetry: {}", e),
        }
        if !refresh_rate.is_zero() {
            thread::sleep(refresh_rate);
        }
    }

    info!("Capture stopped while {}", engine.phase().label());
    Ok(CaptureOutcome::Stopped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::LoggingListener;
    use crate::telemetry::{CarPosition, RecordedTelemetryProducer, TelemetrySnapshot};
    use crate::track_map::FileTrackStore;
    use tempfile::TempDir;

    /// Producer that fails every other read
    struct FlakyProducer {
        inner: RecordedTelemetryProducer,
        reads: usize,
    }

    impl TelemetryProducer for FlakyProducer {
        fn start(&mut self) -> Result<(), TrackMapError> {
            self.inner.start()
        }

        fn telemetry(&mut self) -> Result<TelemetrySnapshot, TrackMapError> {
            self.reads += 1;
            if self.reads % 2 == 0 {
                return Err(TrackMapError::TelemetryProducerError {
                    description: "shared memory not mapped".to_string(),
                });
            }
            self.inner.telemetry()
        }
    }

    fn lap_tick(packet_id: i32, spline: f32, completed_laps: i32) -> TelemetrySnapshot {
        TelemetrySnapshot {
            track_name: "snetterton".to_string(),
            running: true,
            packet_id,
            completed_laps,
            normalized_car_position: spline,
            is_valid_lap: true,
            player_car_index: 1,
            car_index: vec![1],
            car_positions: vec![CarPosition::new(spline, spline)],
            speed_kmh: 100.,
            acceleration_g: [0.; 3],
        }
    }

    fn lap() -> Vec<TelemetrySnapshot> {
        vec![
            lap_tick(1, 0.9, 0),
            lap_tick(2, 0.001, 1),
            lap_tick(3, 0.3, 1),
            lap_tick(4, 0.6, 1),
            lap_tick(5, 0.001, 2),
        ]
    }

    #[test]
    fn test_run_capture_completes() {
        let temp_dir = TempDir::new().unwrap();
        let mut engine = CaptureEngine::new(
            RecordedTelemetryProducer::from_snapshots(lap()),
            FileTrackStore::new(temp_dir.path().to_path_buf()),
            LoggingListener::new(false),
        );

        let outcome =
            run_capture(&mut engine, Duration::ZERO, Arc::new(AtomicBool::new(true))).unwrap();

        assert_eq!(outcome, CaptureOutcome::Completed);
        assert_eq!(engine.listener().completed().map(|p| p.len()), Some(2));
        assert!(temp_dir.path().join("snetterton.bin").is_file());
    }

    #[test]
    fn test_run_capture_survives_producer_errors() {
        let temp_dir = TempDir::new().unwrap();
        let producer = FlakyProducer {
            inner: RecordedTelemetryProducer::from_snapshots(lap()),
            reads: 0,
        };
        let mut engine = CaptureEngine::new(
            producer,
            FileTrackStore::new(temp_dir.path().to_path_buf()),
            LoggingListener::new(false),
        );

        let outcome =
            run_capture(&mut engine, Duration::ZERO, Arc::new(AtomicBool::new(true))).unwrap();

        assert_eq!(outcome, CaptureOutcome::Completed);
        assert_eq!(engine.listener().completed().map(|p| p.len()), Some(2));
    }

    #[test]
    fn test_run_capture_exhausted_mid_lap() {
        let temp_dir = TempDir::new().unwrap();
        let mut snapshots = lap();
        snapshots.pop();
        let mut engine = CaptureEngine::new(
            RecordedTelemetryProducer::from_snapshots(snapshots),
            FileTrackStore::new(temp_dir.path().to_path_buf()),
            LoggingListener::new(false),
        );

        let outcome =
            run_capture(&mut engine, Duration::ZERO, Arc::new(AtomicBool::new(true))).unwrap();

        assert_eq!(outcome, CaptureOutcome::TelemetryExhausted);
        assert_eq!(engine.phase(), CapturePhase::Tracing);
        assert!(engine.listener().completed().is_none());
        assert!(!temp_dir.path().join("snetterton.bin").exists());
    }

    #[test]
    fn test_run_capture_stopped() {
        let temp_dir = TempDir::new().unwrap();
        let mut engine = CaptureEngine::new(
            RecordedTelemetryProducer::from_snapshots(lap()),
            FileTrackStore::new(temp_dir.path().to_path_buf()),
            LoggingListener::new(false),
        );

        let outcome =
            run_capture(&mut engine, Duration::ZERO, Arc::new(AtomicBool::new(false))).unwrap();

        assert_eq!(outcome, CaptureOutcome::Stopped);
        assert_eq!(engine.phase(), CapturePhase::Idle);
    }
}
