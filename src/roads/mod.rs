//! Road-classification collaborators
//!
//! A road classifier maps a raw GPS trace onto the road network and returns a
//! road-type hint (tags joined by `|`) for the mode heuristic.

mod snap;

pub use snap::SnapToRoadsClient;

use std::future::Future;

use thiserror::Error;

use crate::types::GpsPoint;

/// Errors raised by a road classifier
#[derive(Debug, Error)]
pub enum RoadsError {
    #[error("trajectory rejected: {0}")]
    InvalidTrajectory(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("service error: {0}")]
    Api(String),

    #[error("undecodable response: {0}")]
    Decode(String),
}

/// Trait for snap-to-roads style road classifiers
pub trait RoadClassifier: Send + Sync {
    /// Classify the roads under a trajectory; any failure is an error
    fn detect(
        &self,
        trajectory: &[GpsPoint],
        api_key: &str,
    ) -> impl Future<Output = Result<String, RoadsError>> + Send;
}

/// Classifier that returns a fixed road-type hint
#[derive(Debug, Clone, Default)]
pub struct StaticRoadHint {
    hint: String,
}

impl StaticRoadHint {
    pub fn new(hint: impl Into<String>) -> Self {
        Self { hint: hint.into() }
    }
}

impl RoadClassifier for StaticRoadHint {
    async fn detect(&self, _trajectory: &[GpsPoint], _api_key: &str) -> Result<String, RoadsError> {
        Ok(self.hint.clone())
    }
}
