// Library interface for trackmap
// This allows integration tests to access internal modules

pub mod capture;
pub mod config;
pub mod errors;
pub mod telemetry;
pub mod track_map;
pub mod writer;

// Re-export commonly used types
pub use capture::{CaptureEngine, CaptureEvent, CaptureListener, CapturePhase, CaptureState};
pub use config::AppConfig;
pub use errors::TrackMapError;
pub use telemetry::{TelemetryProducer, TelemetrySnapshot};
pub use track_map::{FileTrackStore, TrackPoint, TrackStore, TrackSummary};
