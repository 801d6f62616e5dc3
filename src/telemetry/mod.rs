pub mod collector;
pub mod producer;

use serde::{Deserialize, Serialize};

pub use collector::{CaptureOutcome, REFRESH_RATE_MS, run_capture};
pub use producer::{RecordedTelemetryProducer, TelemetryProducer};

/// Position of a car on the simulation's ground plane
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CarPosition {
    pub x: f32,
    pub z: f32,
}

impl CarPosition {
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }
}

/// One poll of the simulation's shared telemetry.
///
/// Snapshots are pulled once per tick; every field reflects the same instant.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TelemetrySnapshot {
    /// Simulation identifier of the loaded track, empty while no session is loaded
    pub track_name: String,
    /// Whether the simulation process is running
    pub running: bool,
    /// Increases with every telemetry update written by the simulation
    pub packet_id: i32,
    /// Laps completed by the player in the current session
    pub completed_laps: i32,
    /// Player's position along the lap (0.0-1.0)
    pub normalized_car_position: f32,
    /// Whether the player's current lap is still valid
    pub is_valid_lap: bool,
    /// Car id of the local player
    pub player_car_index: i32,
    /// Car ids of every active car, parallel to `car_positions`
    pub car_index: Vec<i32>,
    /// Ground plane positions of every active car
    pub car_positions: Vec<CarPosition>,
    /// Player's speed in km/h
    pub speed_kmh: f32,
    /// Player's acceleration (g) along x, y, z
    pub acceleration_g: [f32; 3],
}

impl TelemetrySnapshot {
    /// Position of the local player's car. When the roster lists the player more than
    /// once only the first entry counts.
    pub fn player_position(&self) -> Option<CarPosition> {
        self.car_index
            .iter()
            .zip(self.car_positions.iter())
            .find(|(index, _)| **index == self.player_car_index)
            .map(|(_, position)| *position)
    }
}
