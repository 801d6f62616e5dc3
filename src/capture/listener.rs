use std::sync::mpsc::Sender;

use log::{debug, info, warn};
use serde::Serialize;

use crate::track_map::TrackPoint;

/// Receives the capture engine's notifications.
///
/// Both callbacks run synchronously on the thread driving the engine and should
/// return quickly.
pub trait CaptureListener {
    /// Human readable status, delivered on every tick
    fn on_progress(&mut self, label: Option<&str>, message: &str);

    /// Finished track map, delivered exactly once per successful session
    fn on_complete(&mut self, points: Vec<TrackPoint>);
}

/// Notification forwarded over a channel
#[derive(Clone, Debug, Serialize, PartialEq)]
pub enum CaptureEvent {
    Progress {
        label: Option<String>,
        message: String,
    },
    Completed(Vec<TrackPoint>),
}

impl CaptureListener for Sender<CaptureEvent> {
    fn on_progress(&mut self, label: Option<&str>, message: &str) {
        let event = CaptureEvent::Progress {
            label: label.map(str::to_string),
            message: message.to_string(),
        };
        if let Err(e) = self.send(event) {
            debug!("Progress receiver is gone: {}", e);
        }
    }

    fn on_complete(&mut self, points: Vec<TrackPoint>) {
        if self.send(CaptureEvent::Completed(points)).is_err() {
            warn!("Track map completed but its receiver is gone");
        }
    }
}

/// Listener built from a pair of closures
pub struct CallbackListener<P, C>
where
    P: FnMut(Option<&str>, &str),
    C: FnMut(Vec<TrackPoint>),
{
    progress: P,
    completion: C,
}

impl<P, C> CallbackListener<P, C>
where
    P: FnMut(Option<&str>, &str),
    C: FnMut(Vec<TrackPoint>),
{
    pub fn new(progress: P, completion: C) -> Self {
        Self {
            progress,
            completion,
        }
    }
}

impl<P, C> CaptureListener for CallbackListener<P, C>
where
    P: FnMut(Option<&str>, &str),
    C: FnMut(Vec<TrackPoint>),
{
    fn on_progress(&mut self, label: Option<&str>, message: &str) {
        (self.progress)(label, message)
    }

    fn on_complete(&mut self, points: Vec<TrackPoint>) {
        (self.completion)(points)
    }
}

/// Listener that writes progress to the log and keeps the completed map.
///
/// Identical consecutive progress messages are logged once.
#[derive(Default)]
pub struct LoggingListener {
    log_progress: bool,
    last_message: Option<String>,
    completed: Option<Vec<TrackPoint>>,
}

impl LoggingListener {
    pub fn new(log_progress: bool) -> Self {
        Self {
            log_progress,
            ..Self::default()
        }
    }

    pub fn completed(&self) -> Option<&[TrackPoint]> {
        self.completed.as_deref()
    }

    pub fn take_completed(&mut self) -> Option<Vec<TrackPoint>> {
        self.completed.take()
    }
}

impl CaptureListener for LoggingListener {
    fn on_progress(&mut self, label: Option<&str>, message: &str) {
        if !self.log_progress || self.last_message.as_deref() == Some(message) {
            return;
        }
        match label {
            Some(label) => info!("[{}] {}", label, message),
            None => info!("{}", message),
        }
        self.last_message = Some(message.to_string());
    }

    fn on_complete(&mut self, points: Vec<TrackPoint>) {
        info!("Track map completed with {} points", points.len());
        self.completed = Some(points);
    }
}
