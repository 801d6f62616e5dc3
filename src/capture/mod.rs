// Track capture module
// Traces a track map from live telemetry during one clean lap, or loads the map
// stored by an earlier session

pub mod buffer;
pub mod engine;
pub mod listener;
pub mod state;

// Re-export commonly used types
pub use buffer::{CaptureBuffer, DedupeCursor, RepeatedFrame};
pub use engine::CaptureEngine;
pub use listener::{CallbackListener, CaptureEvent, CaptureListener, LoggingListener};
pub use state::{CaptureEffect, CapturePhase, CaptureState, IdleState, TraceSession, transition};
