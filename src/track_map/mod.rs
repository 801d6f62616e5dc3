// Track map management module
// Provides the captured point model, its binary encoding and file based storage

pub mod codec;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use codec::{RECORD_SIZE, decode_track_points, encode_track_points};
pub use storage::{FileTrackStore, TrackStore, normalize_track_name};
pub use types::{BoundingBox, TrackPoint, TrackSummary};
