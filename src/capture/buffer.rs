use crate::track_map::TrackPoint;

/// Last telemetry frame accepted by a trace
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DedupeCursor {
    pub packet_id: i32,
    pub spline: f32,
}

/// Why a frame was not accepted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepeatedFrame {
    SamePacket,
    SameSplinePosition,
}

/// Append-only accumulator for an in-progress trace.
///
/// Alongside the points the buffer keeps the dedupe cursor: a frame whose packet id
/// or spline position did not move since the last accepted frame is a repeat of that
/// frame and never yields a second sample.
#[derive(Clone, Debug, Default)]
pub struct CaptureBuffer {
    points: Vec<TrackPoint>,
    cursor: Option<DedupeCursor>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer that treats `packet_id`/`spline` as already seen
    pub fn seeded(packet_id: i32, spline: f32) -> Self {
        Self {
            points: Vec::new(),
            cursor: Some(DedupeCursor { packet_id, spline }),
        }
    }

    /// Check a frame against the cursor, `Some` when it repeats the last accepted one
    pub fn check_repeat(&self, packet_id: i32, spline: f32) -> Option<RepeatedFrame> {
        let cursor = self.cursor?;
        if cursor.packet_id == packet_id {
            Some(RepeatedFrame::SamePacket)
        } else if (cursor.spline - spline).abs() <= f32::EPSILON {
            Some(RepeatedFrame::SameSplinePosition)
        } else {
            None
        }
    }

    /// Move the cursor to a newly accepted frame
    pub fn accept(&mut self, packet_id: i32, spline: f32) {
        self.cursor = Some(DedupeCursor { packet_id, spline });
    }

    pub fn push(&mut self, point: TrackPoint) {
        self.points.push(point);
    }

    pub fn cursor(&self) -> Option<DedupeCursor> {
        self.cursor
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_points(self) -> Vec<TrackPoint> {
        self.points
    }
}
