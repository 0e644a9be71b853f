//! Speed profiles from GPS trajectories
//!
//! Converts a lat/lng/timestamp trajectory into instantaneous speeds using
//! great-circle distance, rejecting GPS jumps.

use crate::error::LabelingError;
use crate::features::{calculate_variance, mean};
use crate::types::GpsPoint;

/// Mean Earth radius (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Speeds at or above this are treated as GPS jumps (180 km/h)
pub const MAX_PLAUSIBLE_SPEED_MPS: f64 = 50.0;

/// Great-circle distance between two points (meters)
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Instantaneous speeds (m/s) between consecutive fixes.
///
/// Pairs with a non-positive time step are skipped, and speeds at or above
/// `max_speed_mps` are discarded.
pub fn calculate_speeds(points: &[GpsPoint], max_speed_mps: f64) -> Vec<f64> {
    points
        .windows(2)
        .filter_map(|pair| {
            let (prev, curr) = (&pair[0], &pair[1]);
            let dt_sec = (curr.timestamp_ms as f64 - prev.timestamp_ms as f64) / 1000.0;
            if dt_sec <= 0.0 {
                return None;
            }

            let speed = haversine_distance(prev.lat, prev.lng, curr.lat, curr.lng) / dt_sec;
            (speed < max_speed_mps).then_some(speed)
        })
        .collect()
}

/// Summary statistics stored on a labeled journey
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpeedSummary {
    pub avg: f64,
    pub max: f64,
    pub min: f64,
    /// Population variance
    pub variance: f64,
}

impl SpeedSummary {
    pub fn from_speeds(speeds: &[f64]) -> Self {
        if speeds.is_empty() {
            return Self::default();
        }

        Self {
            avg: mean(speeds),
            max: speeds.iter().copied().fold(f64::MIN, f64::max),
            min: speeds.iter().copied().fold(f64::MAX, f64::min),
            variance: calculate_variance(speeds),
        }
    }
}

/// Serialize a trajectory as `lat,lng,timestamp` triples joined by `|`
pub fn serialize_trajectory(points: &[GpsPoint]) -> String {
    points
        .iter()
        .map(|p| format!("{},{},{}", p.lat, p.lng, p.timestamp_ms))
        .collect::<Vec<_>>()
        .join("|")
}

/// Parse a trajectory stored by [`serialize_trajectory`]
pub fn parse_trajectory(serialized: &str) -> Result<Vec<GpsPoint>, LabelingError> {
    if serialized.trim().is_empty() {
        return Ok(Vec::new());
    }

    serialized
        .split('|')
        .enumerate()
        .map(|(index, triple)| {
            let fields: Vec<&str> = triple.split(',').map(str::trim).collect();
            if fields.len() != 3 {
                return Err(LabelingError::TrajectoryParse(format!(
                    "point {} has {} fields, expected 3",
                    index,
                    fields.len()
                )));
            }

            let invalid = |what: &str| {
                LabelingError::TrajectoryParse(format!("point {}: invalid {}", index, what))
            };

            Ok(GpsPoint::new(
                fields[0].parse().map_err(|_| invalid("latitude"))?,
                fields[1].parse().map_err(|_| invalid("longitude"))?,
                fields[2].parse().map_err(|_| invalid("timestamp"))?,
            ))
        })
        .collect()
}

/// Mean reported accuracy (meters); 0 when no fix reports one
pub fn mean_accuracy(points: &[GpsPoint]) -> f32 {
    let reported: Vec<f64> = points.iter().filter_map(|p| p.accuracy_m).collect();
    mean(&reported) as f32
}
