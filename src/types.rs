//! Core types for the labeling pipeline
//!
//! This module defines the data structures that flow through each stage:
//! raw GPS points, the persisted labeled journey, the derived feature vector
//! and the flat CSV record used at the export boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport mode label
///
/// The fixed variants cover the classes the heuristic can emit. `Other` keeps
/// labels entered for modes that are not modelled yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransportMode {
    Walking,
    Cycling,
    Bus,
    Subway,
    Driving,
    Unknown,
    Other(String),
}

impl TransportMode {
    pub fn as_str(&self) -> &str {
        match self {
            TransportMode::Walking => "WALKING",
            TransportMode::Cycling => "CYCLING",
            TransportMode::Bus => "BUS",
            TransportMode::Subway => "SUBWAY",
            TransportMode::Driving => "DRIVING",
            TransportMode::Unknown => "UNKNOWN",
            TransportMode::Other(label) => label,
        }
    }
}

impl From<&str> for TransportMode {
    fn from(label: &str) -> Self {
        match label {
            "WALKING" => TransportMode::Walking,
            "CYCLING" => TransportMode::Cycling,
            "BUS" => TransportMode::Bus,
            "SUBWAY" => TransportMode::Subway,
            "DRIVING" => TransportMode::Driving,
            "UNKNOWN" => TransportMode::Unknown,
            other => TransportMode::Other(other.to_string()),
        }
    }
}

impl From<String> for TransportMode {
    fn from(label: String) -> Self {
        TransportMode::from(label.as_str())
    }
}

impl From<TransportMode> for String {
    fn from(mode: TransportMode) -> Self {
        match mode {
            TransportMode::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of a journey's transport-mode label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LabelSource {
    /// Heuristic label backed by the snap-to-roads service
    AutoSnap,
    /// Label entered by a user
    Manual,
    /// User-confirmed correction of an existing label
    Verified,
}

impl LabelSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelSource::AutoSnap => "AUTO_SNAP",
            LabelSource::Manual => "MANUAL",
            LabelSource::Verified => "VERIFIED",
        }
    }

    /// Whether a human produced or confirmed the label
    pub fn is_human(&self) -> bool {
        !matches!(self, LabelSource::AutoSnap)
    }
}

impl fmt::Display for LabelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single GPS fix from the capturing app
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
    /// Fix time (epoch milliseconds)
    #[serde(rename = "time")]
    pub timestamp_ms: i64,
    /// Reported horizontal accuracy (meters)
    #[serde(rename = "accuracy", default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
}

impl GpsPoint {
    pub fn new(lat: f64, lng: f64, timestamp_ms: i64) -> Self {
        Self {
            lat,
            lng,
            timestamp_ms,
            accuracy_m: None,
        }
    }
}

/// One completed trip capture with its transport-mode label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledJourney {
    /// Store-assigned identifier (0 until inserted)
    pub id: i64,
    /// Journey start (epoch milliseconds)
    pub start_time: i64,
    /// Journey end (epoch milliseconds); not guaranteed to follow `start_time`
    pub end_time: i64,
    pub transport_mode: TransportMode,
    pub label_source: LabelSource,

    /// Serialized trajectory, `lat,lng,timestamp` triples joined by `|`
    pub gps_trajectory: String,
    pub gps_point_count: usize,

    /// Average speed (m/s)
    pub avg_speed: f64,
    /// Maximum speed (m/s)
    pub max_speed: f64,
    /// Minimum speed (m/s)
    pub min_speed: f64,
    /// Population variance of the speed samples
    pub speed_variance: f64,

    /// Raw accelerometer stream (JSON array of x/y/z objects)
    pub accelerometer_data: String,
    /// Raw gyroscope stream (JSON array of x/y/z objects)
    pub gyroscope_data: String,
    /// Raw barometer stream
    pub barometer_data: String,

    /// Road-type hint from the road-classification service
    pub road_types: String,
    pub snap_confidence: f32,
    /// Mean GPS accuracy (meters)
    pub gps_accuracy: f32,

    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub verification_time: Option<i64>,
    #[serde(default)]
    pub verification_notes: String,
}

impl LabeledJourney {
    /// Apply a human correction to the label.
    ///
    /// A verified journey never carries an `AUTO_SNAP` source, so that source
    /// is recorded as `VERIFIED`.
    pub fn mark_verified(
        &mut self,
        mode: TransportMode,
        source: LabelSource,
        notes: &str,
        verified_at_ms: i64,
    ) {
        self.transport_mode = mode;
        self.label_source = if source.is_human() {
            source
        } else {
            LabelSource::Verified
        };
        self.is_verified = true;
        self.verification_time = Some(verified_at_ms);
        self.verification_notes = notes.to_string();
    }
}

/// Feature vector derived from a journey for classifier training
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JourneyFeatures {
    pub accel_mean_x: f64,
    pub accel_mean_y: f64,
    pub accel_mean_z: f64,
    pub accel_std_x: f64,
    pub accel_std_y: f64,
    pub accel_std_z: f64,
    /// Mean of per-sample `sqrt(x² + y² + z²)`
    pub accel_magnitude: f64,

    pub gyro_mean_x: f64,
    pub gyro_mean_y: f64,
    pub gyro_mean_z: f64,
    pub gyro_std_x: f64,
    pub gyro_std_y: f64,
    pub gyro_std_z: f64,

    /// Signed journey duration (seconds)
    pub journey_duration: f64,

    pub gps_speed_mean: f64,
    pub gps_speed_std: f64,
    pub gps_speed_max: f64,

    /// Label at extraction time
    pub transport_mode: Option<TransportMode>,
}

/// Flat 22-field row written to the training CSV
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyCsvRecord {
    pub journey_id: i64,
    pub timestamp: i64,
    pub transport_mode: String,
    pub label_source: String,
    pub accel_mean_x: f64,
    pub accel_mean_y: f64,
    pub accel_mean_z: f64,
    pub accel_std_x: f64,
    pub accel_std_y: f64,
    pub accel_std_z: f64,
    pub accel_magnitude: f64,
    pub gyro_mean_x: f64,
    pub gyro_mean_y: f64,
    pub gyro_mean_z: f64,
    pub gyro_std_x: f64,
    pub gyro_std_y: f64,
    pub gyro_std_z: f64,
    pub journey_duration: f64,
    pub gps_speed_mean: f64,
    pub gps_speed_std: f64,
    pub gps_speed_max: f64,
    pub is_verified: bool,
}

/// Row of the transport-mode distribution query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeCount {
    pub transport_mode: TransportMode,
    pub count: u32,
}

/// Row of the label-source distribution query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCount {
    pub label_source: LabelSource,
    pub count: u32,
}
