// Track capture state machine
//
// `transition` is a pure step function: given the current state, one telemetry
// snapshot and the tick time it returns the next state and the side effects the
// engine has to carry out. Reads from the track store happen inside the step, every
// write and notification is returned as a `CaptureEffect`.

use std::time::Instant;

use log::{debug, warn};

use crate::telemetry::TelemetrySnapshot;
use crate::track_map::{TrackPoint, TrackStore, normalize_track_name};

use super::buffer::{CaptureBuffer, RepeatedFrame};

/// Context carried by the idle state between traces
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IdleState {
    /// Lap count a trace start is detected against, `None` until the first snapshot
    pub completed_laps: Option<i32>,
    /// Track whose stored map failed to decode; it is traced again instead of reloaded
    pub rejected_track: Option<String>,
}

impl IdleState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A trace in progress
#[derive(Clone, Debug)]
pub struct TraceSession {
    pub track_name: String,
    /// Lap count when the trace started; a different value means the lap is done
    pub completed_laps: i32,
    pub started_at: Instant,
    pub buffer: CaptureBuffer,
    rejected_track: Option<String>,
}

impl TraceSession {
    pub fn new(track_name: &str, completed_laps: i32, started_at: Instant) -> Self {
        Self {
            track_name: track_name.to_string(),
            completed_laps,
            started_at,
            buffer: CaptureBuffer::new(),
            rejected_track: None,
        }
    }

    fn starting_at(snapshot: &TelemetrySnapshot, now: Instant, idle: IdleState) -> Self {
        Self {
            track_name: snapshot.track_name.clone(),
            completed_laps: snapshot.completed_laps,
            started_at: now,
            buffer: CaptureBuffer::seeded(snapshot.packet_id, snapshot.normalized_car_position),
            rejected_track: idle.rejected_track,
        }
    }

    /// Idle state to fall back to when this trace is abandoned
    fn abandon(self, completed_laps: Option<i32>) -> IdleState {
        IdleState {
            completed_laps,
            rejected_track: self.rejected_track,
        }
    }

    /// Spline position of the last accepted frame
    pub fn progress(&self) -> f32 {
        self.buffer.cursor().map(|c| c.spline).unwrap_or(0.)
    }

    fn sample(&self, snapshot: &TelemetrySnapshot, now: Instant) -> Option<TrackPoint> {
        let position = snapshot.player_position()?;
        Some(TrackPoint {
            x: position.x,
            y: position.z,
            spline: snapshot.normalized_car_position,
            delta_time_ms: (now.saturating_duration_since(self.started_at).as_secs_f64()
                * 1000.) as f32,
            speed_kmh: snapshot.speed_kmh,
            acc_x: snapshot.acceleration_g[0],
            acc_y: snapshot.acceleration_g[1],
            acc_z: snapshot.acceleration_g[2],
        })
    }
}

/// States of a capture session
#[derive(Clone, Debug)]
pub enum CaptureState {
    Idle(IdleState),
    Tracing(TraceSession),
    LoadingFromStore {
        track_name: String,
        idle: IdleState,
    },
    NotifyingSubscriber {
        track_name: String,
        points: Vec<TrackPoint>,
    },
    End,
}

impl Default for CaptureState {
    fn default() -> Self {
        CaptureState::Idle(IdleState::new())
    }
}

/// Fieldless view of `CaptureState`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    Tracing,
    LoadingFromStore,
    NotifyingSubscriber,
    End,
}

impl CapturePhase {
    pub fn label(&self) -> &'static str {
        match self {
            CapturePhase::Idle => "idle",
            CapturePhase::Tracing => "tracing",
            CapturePhase::LoadingFromStore => "loading",
            CapturePhase::NotifyingSubscriber => "notifying",
            CapturePhase::End => "end",
        }
    }
}

impl CaptureState {
    pub fn phase(&self) -> CapturePhase {
        match self {
            CaptureState::Idle(_) => CapturePhase::Idle,
            CaptureState::Tracing(_) => CapturePhase::Tracing,
            CaptureState::LoadingFromStore { .. } => CapturePhase::LoadingFromStore,
            CaptureState::NotifyingSubscriber { .. } => CapturePhase::NotifyingSubscriber,
            CaptureState::End => CapturePhase::End,
        }
    }

    /// States that act without waiting for fresh telemetry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CaptureState::LoadingFromStore { .. } | CaptureState::NotifyingSubscriber { .. }
        )
    }

    /// Points captured or loaded so far
    pub fn points(&self) -> &[TrackPoint] {
        match self {
            CaptureState::Tracing(session) => session.buffer.points(),
            CaptureState::NotifyingSubscriber { points, .. } => points,
            _ => &[],
        }
    }
}

/// Work the engine carries out after a transition, in order
#[derive(Clone, Debug, PartialEq)]
pub enum CaptureEffect {
    Progress {
        label: Option<&'static str>,
        message: String,
    },
    Persist {
        track_name: String,
        points: Vec<TrackPoint>,
    },
    Complete(Vec<TrackPoint>),
}

impl CaptureEffect {
    fn progress(phase: CapturePhase, message: impl Into<String>) -> Self {
        CaptureEffect::Progress {
            label: Some(phase.label()),
            message: message.into(),
        }
    }
}

pub const WAITING_FOR_SIMULATION: &str = "Waiting for the simulation to start.";
pub const WAITING_FOR_LAP: &str = "Waiting for the lap counter to change.";
pub const TRACE_DISCARDED_INVALID: &str =
    "Lap invalidated, trace discarded. Waiting for the next lap.";
pub const TRACE_DISCARDED_STOPPED: &str = "Simulation stopped, trace discarded.";
pub const LOADING_FROM_STORE: &str = "Map found on disk, loading it.";
pub const WRITING_TO_STORE: &str = "Writing map to file.";

/// Advance the capture state by one step
pub fn transition(
    state: CaptureState,
    snapshot: &TelemetrySnapshot,
    now: Instant,
    store: &dyn TrackStore,
) -> (CaptureState, Vec<CaptureEffect>) {
    match state {
        CaptureState::Idle(idle) => idle_step(idle, snapshot, now, store),
        CaptureState::Tracing(session) => tracing_step(session, snapshot, now),
        CaptureState::LoadingFromStore { track_name, idle } => {
            loading_step(track_name, idle, store)
        }
        CaptureState::NotifyingSubscriber { track_name, points } => {
            let effects = vec![
                CaptureEffect::progress(
                    CapturePhase::NotifyingSubscriber,
                    format!("Map of {} ready with {} points.", track_name, points.len()),
                ),
                CaptureEffect::Complete(points),
            ];
            (CaptureState::End, effects)
        }
        CaptureState::End => (CaptureState::End, Vec::new()),
    }
}

fn idle_step(
    mut idle: IdleState,
    snapshot: &TelemetrySnapshot,
    now: Instant,
    store: &dyn TrackStore,
) -> (CaptureState, Vec<CaptureEffect>) {
    let has_track = !snapshot.track_name.trim().is_empty();
    let rejected = idle.rejected_track.as_deref().is_some_and(|track| {
        normalize_track_name(track) == normalize_track_name(&snapshot.track_name)
    });

    if has_track && !rejected && store.exists(&snapshot.track_name) {
        debug!("Stored map found for {}", snapshot.track_name);
        return (
            CaptureState::LoadingFromStore {
                track_name: snapshot.track_name.clone(),
                idle,
            },
            Vec::new(),
        );
    }

    if !snapshot.running || !has_track {
        // a restarted simulation resets its lap counter, take a new baseline then
        idle.completed_laps = None;
        return (
            CaptureState::Idle(idle),
            vec![CaptureEffect::progress(
                CapturePhase::Idle,
                WAITING_FOR_SIMULATION,
            )],
        );
    }

    let baseline = idle.completed_laps;
    match baseline {
        Some(laps) if laps != snapshot.completed_laps => {
            debug!(
                "Lap counter changed from {} to {}, tracing {}",
                laps, snapshot.completed_laps, snapshot.track_name
            );
            let session = TraceSession::starting_at(snapshot, now, idle);
            (
                CaptureState::Tracing(session),
                vec![CaptureEffect::progress(
                    CapturePhase::Tracing,
                    tracing_message(0.),
                )],
            )
        }
        _ => {
            idle.completed_laps = Some(snapshot.completed_laps);
            (
                CaptureState::Idle(idle),
                vec![CaptureEffect::progress(CapturePhase::Idle, WAITING_FOR_LAP)],
            )
        }
    }
}

fn tracing_step(
    mut session: TraceSession,
    snapshot: &TelemetrySnapshot,
    now: Instant,
) -> (CaptureState, Vec<CaptureEffect>) {
    if !snapshot.running {
        debug!(
            "Simulation stopped, dropping {} traced points",
            session.buffer.len()
        );
        return (
            CaptureState::Idle(session.abandon(None)),
            vec![CaptureEffect::progress(
                CapturePhase::Idle,
                TRACE_DISCARDED_STOPPED,
            )],
        );
    }

    let mut effects = vec![CaptureEffect::progress(
        CapturePhase::Tracing,
        tracing_message(session.progress()),
    )];

    let spline = snapshot.normalized_car_position;
    if let Some(repeat) = session.buffer.check_repeat(snapshot.packet_id, spline) {
        if repeat == RepeatedFrame::SameSplinePosition {
            debug!("Packet {} did not move the car", snapshot.packet_id);
        }
        return (CaptureState::Tracing(session), effects);
    }
    session.buffer.accept(snapshot.packet_id, spline);

    if !snapshot.is_valid_lap {
        debug!(
            "Lap invalidated, dropping {} traced points",
            session.buffer.len()
        );
        let completed_laps = session.completed_laps;
        effects.push(CaptureEffect::progress(
            CapturePhase::Idle,
            TRACE_DISCARDED_INVALID,
        ));
        return (
            CaptureState::Idle(session.abandon(Some(completed_laps))),
            effects,
        );
    }

    if snapshot.completed_laps != session.completed_laps {
        let track_name = session.track_name;
        let points = session.buffer.into_points();
        effects.push(CaptureEffect::progress(
            CapturePhase::Tracing,
            WRITING_TO_STORE,
        ));
        effects.push(CaptureEffect::Persist {
            track_name: track_name.clone(),
            points: points.clone(),
        });
        return (
            CaptureState::NotifyingSubscriber { track_name, points },
            effects,
        );
    }

    match session.sample(snapshot, now) {
        Some(point) => session.buffer.push(point),
        None => debug!(
            "Player car {} not found in packet {}",
            snapshot.player_car_index, snapshot.packet_id
        ),
    }

    (CaptureState::Tracing(session), effects)
}

fn loading_step(
    track_name: String,
    mut idle: IdleState,
    store: &dyn TrackStore,
) -> (CaptureState, Vec<CaptureEffect>) {
    let mut effects = vec![CaptureEffect::progress(
        CapturePhase::LoadingFromStore,
        LOADING_FROM_STORE,
    )];

    match store.load(&track_name) {
        Ok(Some(points)) => (
            CaptureState::NotifyingSubscriber { track_name, points },
            effects,
        ),
        Ok(None) => {
            warn!("Map for {} disappeared before it could be loaded", track_name);
            effects.push(CaptureEffect::progress(
                CapturePhase::Idle,
                format!("Map of {} not found, tracing it instead.", track_name),
            ));
            (CaptureState::Idle(idle), effects)
        }
        Err(e) => {
            warn!("Could not load map for {}: {}", track_name, e);
            effects.push(CaptureEffect::progress(
                CapturePhase::Idle,
                format!("Stored map of {} is unreadable ({}), tracing it again.", track_name, e),
            ));
            idle.rejected_track = Some(track_name);
            (CaptureState::Idle(idle), effects)
        }
    }
}

fn tracing_message(progress: f32) -> String {
    format!(
        "Tracking map ({:.1}%), invalidating the lap restarts the trace.",
        progress * 100.
    )
}
