//! Google Roads API snap-to-roads client
//!
//! API docs: https://developers.google.com/maps/documentation/roads/snap

use serde::Deserialize;
use tracing::{debug, warn};

use super::{RoadClassifier, RoadsError};
use crate::config::RoadsConfig;
use crate::types::GpsPoint;

/// Hint reported when the trace snapped onto the road network.
///
/// The Roads API returns snapped points and place ids, not road classes.
pub const ALIGNED_STREET_HINT: &str = "aligned_street";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapToRoadsResponse {
    #[serde(default)]
    snapped_points: Option<Vec<SnappedPoint>>,
    #[serde(default)]
    warning_message: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
struct SnappedPoint {
    #[serde(default)]
    original_index: Option<usize>,
    #[serde(default)]
    place_id: Option<String>,
}

/// Blocking HTTP client for the snap-to-roads endpoint, run off the async
/// executor.
#[derive(Debug, Clone)]
pub struct SnapToRoadsClient {
    agent: ureq::Agent,
    base_url: String,
    interpolate: bool,
}

impl Default for SnapToRoadsClient {
    fn default() -> Self {
        Self::new(&RoadsConfig::default())
    }
}

impl SnapToRoadsClient {
    pub fn new(config: &RoadsConfig) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(std::time::Duration::from_secs(config.timeout_secs))
                .build(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            interpolate: config.interpolate,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/snapToRoads", self.base_url)
    }
}

/// Path parameter: `lat1,lng1|lat2,lng2|...`
fn build_path(points: &[GpsPoint]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.lat, p.lng))
        .collect::<Vec<_>>()
        .join("|")
}

/// Turn a response body into a road-type hint
fn road_hint_from_response(body: &str) -> Result<String, RoadsError> {
    let response: SnapToRoadsResponse =
        serde_json::from_str(body).map_err(|e| RoadsError::Decode(e.to_string()))?;

    if let Some(error) = response.error.filter(|e| !e.is_null()) {
        let message = error["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(RoadsError::Api(message));
    }

    if let Some(warning) = &response.warning_message {
        warn!(warning = %warning, "snap-to-roads warning");
    }

    let snapped = response.snapped_points.map(|p| p.len()).unwrap_or(0);
    debug!(snapped_points = snapped, "snap-to-roads response");

    Ok(if snapped > 0 {
        ALIGNED_STREET_HINT.to_string()
    } else {
        String::new()
    })
}

impl RoadClassifier for SnapToRoadsClient {
    async fn detect(&self, trajectory: &[GpsPoint], api_key: &str) -> Result<String, RoadsError> {
        if trajectory.len() < 2 {
            return Err(RoadsError::InvalidTrajectory(format!(
                "{} points, at least 2 required",
                trajectory.len()
            )));
        }

        let agent = self.agent.clone();
        let url = self.endpoint();
        let path = build_path(trajectory);
        let key = api_key.to_string();
        let interpolate = self.interpolate.to_string();

        debug!(points = trajectory.len(), url = %url, "calling snap-to-roads");

        let body = tokio::task::spawn_blocking(move || {
            let result = agent
                .get(&url)
                .query("path", &path)
                .query("key", &key)
                .query("interpolate", &interpolate)
                .call();

            match result {
                Ok(response) => response
                    .into_string()
                    .map_err(|e| RoadsError::Transport(e.to_string())),
                Err(ureq::Error::Status(status, response)) => Err(RoadsError::Http {
                    status,
                    body: response.into_string().unwrap_or_default(),
                }),
                Err(e) => Err(RoadsError::Transport(e.to_string())),
            }
        })
        .await
        .map_err(|e| RoadsError::Transport(e.to_string()))??;

        road_hint_from_response(&body)
    }
}
