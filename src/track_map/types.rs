// Core data structures for captured track maps

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// One sample of the traced lap.
///
/// Points carry no identity of their own: a track map is only meaningful as the
/// ordered sequence the samples were captured in.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackPoint {
    /// Planar world position, X axis
    pub x: f32,
    /// Planar world position, taken from the simulation's Z axis
    pub y: f32,
    /// Normalized position along the lap (0.0-1.0)
    pub spline: f32,
    /// Milliseconds elapsed since the trace started
    pub delta_time_ms: f32,
    /// Instantaneous speed in km/h
    pub speed_kmh: f32,
    /// Lateral acceleration (g)
    pub acc_x: f32,
    /// Vertical acceleration (g)
    pub acc_y: f32,
    /// Longitudinal acceleration (g)
    pub acc_z: f32,
}

impl TrackPoint {
    /// Planar position of the sample
    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

/// Bounding box of the traced positions
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl BoundingBox {
    pub fn new() -> Self {
        Self {
            min_x: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            min_y: f32::INFINITY,
            max_y: f32::NEG_INFINITY,
        }
    }

    pub fn update(&mut self, (x, y): (f32, f32)) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate figures describing a traced lap
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackSummary {
    pub point_count: usize,
    /// Time of the last sample relative to the trace start
    pub lap_time_ms: f32,
    pub top_speed_kmh: f32,
    /// `None` for an empty trace
    pub bounds: Option<BoundingBox>,
    /// Number of samples whose spline position is lower than the previous one
    pub spline_regressions: usize,
}

impl TrackSummary {
    pub fn from_points(points: &[TrackPoint]) -> Self {
        let bounds = if points.is_empty() {
            None
        } else {
            let mut bounds = BoundingBox::new();
            points.iter().for_each(|p| bounds.update(p.position()));
            Some(bounds)
        };

        Self {
            point_count: points.len(),
            lap_time_ms: points.last().map(|p| p.delta_time_ms).unwrap_or(0.),
            top_speed_kmh: points.iter().map(|p| p.speed_kmh).fold(0., f32::max),
            bounds,
            spline_regressions: points
                .iter()
                .tuple_windows()
                .filter(|(prev, cur)| cur.spline < prev.spline)
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f32, y: f32, spline: f32, delta_time_ms: f32, speed_kmh: f32) -> TrackPoint {
        TrackPoint {
            x,
            y,
            spline,
            delta_time_ms,
            speed_kmh,
            ..TrackPoint::default()
        }
    }

    #[test]
    fn test_summary_of_empty_trace() {
        let summary = TrackSummary::from_points(&[]);

        assert_eq!(summary.point_count, 0);
        assert_eq!(summary.lap_time_ms, 0.);
        assert_eq!(summary.top_speed_kmh, 0.);
        assert!(summary.bounds.is_none());
        assert_eq!(summary.spline_regressions, 0);
    }

    #[test]
    fn test_summary_figures() {
        let points = vec![
            point(-10., 5., 0.1, 0., 120.),
            point(30., -20., 0.2, 1500., 210.5),
            point(15., 40., 0.3, 3200., 180.),
        ];

        let summary = TrackSummary::from_points(&points);
        assert_eq!(summary.point_count, 3);
        assert_eq!(summary.lap_time_ms, 3200.);
        assert_eq!(summary.top_speed_kmh, 210.5);

        let bounds = summary.bounds.unwrap();
        assert_eq!(bounds.min_x, -10.);
        assert_eq!(bounds.max_x, 30.);
        assert_eq!(bounds.min_y, -20.);
        assert_eq!(bounds.max_y, 40.);
        assert_eq!(bounds.width(), 40.);
        assert_eq!(bounds.height(), 60.);
    }

    #[test]
    fn test_summary_counts_spline_regressions() {
        // a car reversing or jittering telemetry leaves samples out of spatial order
        let points = vec![
            point(0., 0., 0.10, 0., 100.),
            point(1., 0., 0.12, 10., 100.),
            point(2., 0., 0.11, 20., 100.),
            point(3., 0., 0.13, 30., 100.),
        ];

        assert_eq!(TrackSummary::from_points(&points).spline_regressions, 1);
    }
}
