// Binary encoding for track maps
//
// A track map file has no header, footer or version field. It is a plain sequence of
// fixed size little-endian records, one per point, in capture order:
//
//   x | y | spline | delta_time_ms | speed_kmh | acc_x | acc_y | acc_z
//
// with every field stored as an IEEE-754 f32.

use std::io::{self, Cursor, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::errors::TrackMapError;
use crate::track_map::types::TrackPoint;

/// Number of f32 fields in a record
pub const FIELDS_PER_RECORD: usize = 8;
/// Size in bytes of one encoded point
pub const RECORD_SIZE: usize = FIELDS_PER_RECORD * std::mem::size_of::<f32>();

/// Write every point in order to `writer`
pub fn write_track_points<W: Write>(writer: &mut W, points: &[TrackPoint]) -> io::Result<()> {
    for point in points {
        writer.write_f32::<LittleEndian>(point.x)?;
        writer.write_f32::<LittleEndian>(point.y)?;
        writer.write_f32::<LittleEndian>(point.spline)?;
        writer.write_f32::<LittleEndian>(point.delta_time_ms)?;
        writer.write_f32::<LittleEndian>(point.speed_kmh)?;
        writer.write_f32::<LittleEndian>(point.acc_x)?;
        writer.write_f32::<LittleEndian>(point.acc_y)?;
        writer.write_f32::<LittleEndian>(point.acc_z)?;
    }
    Ok(())
}

/// Encode points into a freshly allocated buffer
pub fn encode_track_points(points: &[TrackPoint]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(points.len() * RECORD_SIZE);
    // writing into a Vec cannot fail
    let _ = write_track_points(&mut buf, points);
    buf
}

/// Decode a whole track map.
///
/// Fails with `TrackMapDecodeError` when the length is not a multiple of
/// [`RECORD_SIZE`]; nothing is decoded in that case.
pub fn decode_track_points(bytes: &[u8]) -> Result<Vec<TrackPoint>, TrackMapError> {
    if bytes.len() % RECORD_SIZE != 0 {
        return Err(TrackMapError::TrackMapDecodeError {
            len: bytes.len(),
            record_size: RECORD_SIZE,
        });
    }

    let record_count = bytes.len() / RECORD_SIZE;
    let mut cursor = Cursor::new(bytes);
    let mut points = Vec::with_capacity(record_count);
    for _ in 0..record_count {
        points.push(read_record(&mut cursor).map_err(|_| {
            TrackMapError::TrackMapDecodeError {
                len: bytes.len(),
                record_size: RECORD_SIZE,
            }
        })?);
    }

    Ok(points)
}

fn read_record(cursor: &mut Cursor<&[u8]>) -> io::Result<TrackPoint> {
    Ok(TrackPoint {
        x: cursor.read_f32::<LittleEndian>()?,
        y: cursor.read_f32::<LittleEndian>()?,
        spline: cursor.read_f32::<LittleEndian>()?,
        delta_time_ms: cursor.read_f32::<LittleEndian>()?,
        speed_kmh: cursor.read_f32::<LittleEndian>()?,
        acc_x: cursor.read_f32::<LittleEndian>()?,
        acc_y: cursor.read_f32::<LittleEndian>()?,
        acc_z: cursor.read_f32::<LittleEndian>()?,
    })
}
