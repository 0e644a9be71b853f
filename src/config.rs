//! Pipeline configuration
//!
//! Every section has defaults, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! [labeling]
//! min_gps_points = 30
//!
//! [export]
//! export_limit = 5000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LabelingError;
use crate::trajectory::MAX_PLAUSIBLE_SPEED_MPS;

/// Minimum number of GPS fixes for a trip to be labeled
pub const MIN_GPS_POINTS: usize = 20;

/// Minimum trip duration (1 minute)
pub const MIN_JOURNEY_DURATION_MS: i64 = 60_000;

/// Row cap for a single CSV export
pub const EXPORT_LIMIT: usize = 10_000;

/// Auto-labeling gates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelingConfig {
    pub min_gps_points: usize,
    pub min_journey_duration_ms: i64,
    /// Speeds at or above this are discarded as GPS jumps (m/s)
    pub max_plausible_speed_mps: f64,
    /// Reject heuristic labels below this confidence; unset disables the gate
    pub min_confidence: Option<f32>,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            min_gps_points: MIN_GPS_POINTS,
            min_journey_duration_ms: MIN_JOURNEY_DURATION_MS,
            max_plausible_speed_mps: MAX_PLAUSIBLE_SPEED_MPS,
            min_confidence: None,
        }
    }
}

/// CSV export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub export_limit: usize,
    /// Log progress every N rows
    pub progress_interval: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            export_limit: EXPORT_LIMIT,
            progress_interval: 100,
        }
    }
}

/// Snap-to-roads service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadsConfig {
    pub base_url: String,
    pub interpolate: bool,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RoadsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://roads.googleapis.com".to_string(),
            interpolate: true,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub labeling: LabelingConfig,
    pub export: ExportConfig,
    pub roads: RoadsConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, LabelingError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn load(path: &Path) -> Result<Self, LabelingError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
