use std::time::Instant;

use log::{debug, error, warn};

use crate::errors::TrackMapError;
use crate::telemetry::{TelemetryProducer, TelemetrySnapshot};
use crate::track_map::{TrackPoint, TrackStore};

use super::listener::CaptureListener;
use super::state::{CaptureEffect, CapturePhase, CaptureState, transition};

/// Drives one capture session.
///
/// The engine owns the session state exclusively. Every tick pulls one snapshot from
/// the producer, advances the state machine and carries out the resulting effects:
/// store writes and listener notifications. Nothing that happens inside a tick is
/// allowed to stop the caller's loop; failures are logged, reported as progress and
/// the session falls back to a safe state.
pub struct CaptureEngine<P: TelemetryProducer, S: TrackStore, L: CaptureListener> {
    producer: P,
    store: S,
    listener: L,
    state: CaptureState,
    completions: usize,
}

impl<P: TelemetryProducer, S: TrackStore, L: CaptureListener> CaptureEngine<P, S, L> {
    pub fn new(producer: P, store: S, listener: L) -> Self {
        Self {
            producer,
            store,
            listener,
            state: CaptureState::default(),
            completions: 0,
        }
    }

    /// Connect the telemetry producer
    pub fn start(&mut self) -> Result<(), TrackMapError> {
        self.producer.start()
    }

    /// Pull one snapshot and advance the session with it.
    ///
    /// # Errors
    ///
    /// Only producer failures are returned; the session state is left untouched then.
    pub fn tick(&mut self) -> Result<CapturePhase, TrackMapError> {
        if self.is_finished() {
            return Ok(CapturePhase::End);
        }
        let snapshot = self.producer.telemetry()?;
        Ok(self.step(&snapshot, Instant::now()))
    }

    /// Advance the session with a snapshot observed at `now`.
    ///
    /// Loading and notifying need no fresh telemetry, so the engine keeps stepping
    /// until the session waits for the next snapshot again.
    pub fn step(&mut self, snapshot: &TelemetrySnapshot, now: Instant) -> CapturePhase {
        loop {
            let before = self.state.phase();
            let state = std::mem::replace(&mut self.state, CaptureState::End);
            let (next, effects) = transition(state, snapshot, now, &self.store);
            if next.phase() != before {
                debug!("Capture state {:?} -> {:?}", before, next.phase());
            }
            self.state = next;

            for effect in effects {
                self.apply(effect);
            }

            if !self.state.is_transient() {
                return self.state.phase();
            }
        }
    }

    fn apply(&mut self, effect: CaptureEffect) {
        match effect {
            CaptureEffect::Progress { label, message } => {
                debug!("{}", message);
                self.listener.on_progress(label, &message);
            }
            CaptureEffect::Persist { track_name, points } => self.persist(&track_name, &points),
            CaptureEffect::Complete(points) => {
                if self.completions > 0 {
                    error!("Capture session already delivered its track map");
                    return;
                }
                self.completions += 1;
                self.listener.on_complete(points);
            }
        }
    }

    fn persist(&mut self, track_name: &str, points: &[TrackPoint]) {
        if let Err(e) = self.store.save(track_name, points) {
            // the traced points are still delivered, only the stored copy is lost
            warn!("Could not save map for {}: {}", track_name, e);
            self.listener.on_progress(
                Some(CapturePhase::Tracing.label()),
                &format!("Map of {} could not be saved: {}", track_name, e),
            );
        }
    }

    pub fn phase(&self) -> CapturePhase {
        self.state.phase()
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.phase() == CapturePhase::End
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }
}
