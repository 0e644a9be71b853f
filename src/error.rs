//! Error types for the journey labeler

use thiserror::Error;

use crate::roads::RoadsError;
use crate::store::StoreError;

/// Errors that can occur while labeling, extracting or exporting journeys
#[derive(Debug, Error)]
pub enum LabelingError {
    #[error("Failed to parse sensor stream: {0}")]
    SensorParse(String),

    #[error("Failed to parse GPS trajectory: {0}")]
    TrajectoryParse(String),

    #[error("Journey store error: {0}")]
    Store(#[from] StoreError),

    #[error("Road classification failed: {0}")]
    RoadClassification(#[from] RoadsError),

    #[error("Journey {journey_id} cannot be written as CSV: {reason}")]
    InvalidRecord { journey_id: i64, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
