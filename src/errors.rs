// Error types for trackmap

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum TrackMapError {
    // Errors while reading telemetry
    #[snafu(display("Telemetry producer error: {description}"))]
    TelemetryProducerError { description: String },
    #[snafu(display("Telemetry recording exhausted"))]
    TelemetryExhausted,
    #[snafu(display("Unable to read telemetry recording {path}"))]
    TelemetryRecordingError { path: String, source: io::Error },

    // Track map store errors
    #[snafu(display("Invalid track name: {reason}"))]
    InvalidTrackName { reason: String },
    #[snafu(display("Error reading track map {path}"))]
    TrackMapReadError { path: String, source: io::Error },
    #[snafu(display(
        "Corrupt track map: {len} bytes is not a multiple of the {record_size} byte record size"
    ))]
    TrackMapDecodeError { len: usize, record_size: usize },
    #[snafu(display("Error writing track map {path}"))]
    TrackMapWriteError { path: String, source: io::Error },
    #[snafu(display("Error listing stored track maps"))]
    TrackMapListError { source: io::Error },

    // Errors for the track point exporter
    #[snafu(display("Error writing export file"))]
    WriterError { source: io::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory"))]
    NoConfigDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
}
