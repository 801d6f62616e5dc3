use std::path::Path;

use crate::{TrackMapError, track_map::TrackPoint};

/// Export a track map as JSON Lines, one point per line in capture order
pub fn write_track_points(file: &Path, points: &[TrackPoint]) -> Result<(), TrackMapError> {
    serde_jsonlines::write_json_lines(file, points)
        .map_err(|e| TrackMapError::WriterError { source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_export_one_line_per_point() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("monza.jsonl");
        let points: Vec<TrackPoint> = (0..3)
            .map(|i| TrackPoint {
                spline: i as f32 / 3.,
                speed_kmh: 200. + i as f32,
                ..TrackPoint::default()
            })
            .collect();

        write_track_points(&path, &points).unwrap();

        let exported: Vec<TrackPoint> = serde_jsonlines::json_lines(&path)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(exported, points);
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 3);
    }

    #[test]
    fn test_export_to_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("monza.jsonl");

        assert!(matches!(
            write_track_points(&path, &[TrackPoint::default()]),
            Err(TrackMapError::WriterError { .. })
        ));
    }
}
