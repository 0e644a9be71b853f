//! Auto-labeling orchestration
//!
//! Turns a finished trip capture into a persisted, heuristically labeled
//! journey, and applies user corrections afterwards.
//!
//! Pipeline stages:
//! 1. Minimum GPS point count
//! 2. Minimum trip duration
//! 3. Speed extraction with GPS-jump rejection
//! 4. Road classification through the snap-to-roads collaborator
//! 5. Rule-table classification and persistence as `AUTO_SNAP`
//!
//! Each gate fails closed: the call returns `None` and nothing is stored.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::classifier::infer_transport_mode_with_confidence;
use crate::config::LabelingConfig;
use crate::roads::RoadClassifier;
use crate::store::JourneyStore;
use crate::trajectory::{calculate_speeds, mean_accuracy, serialize_trajectory, SpeedSummary};
use crate::types::{GpsPoint, LabelSource, LabeledJourney, TransportMode};

/// Raw sensor streams captured alongside a trajectory
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorCapture<'a> {
    pub accelerometer: &'a str,
    pub gyroscope: &'a str,
    pub barometer: &'a str,
}

/// Auto-labeling service over a journey store and a road classifier
pub struct AutoLabelingService<S, R> {
    store: Arc<S>,
    roads: R,
    config: LabelingConfig,
}

impl<S: JourneyStore, R: RoadClassifier> AutoLabelingService<S, R> {
    /// Create a service with default gates
    pub fn new(store: Arc<S>, roads: R) -> Self {
        Self::with_config(store, roads, LabelingConfig::default())
    }

    pub fn with_config(store: Arc<S>, roads: R, config: LabelingConfig) -> Self {
        Self {
            store,
            roads,
            config,
        }
    }

    /// Label a trajectory and persist the result.
    ///
    /// Returns the stored journey with its assigned id, or `None` when any
    /// gate rejects the trip, the road classifier fails, or the store rejects
    /// the insert.
    pub async fn auto_label_trajectory(
        &self,
        gps_trajectory: &[GpsPoint],
        accelerometer_data: &str,
        gyroscope_data: &str,
        barometer_data: &str,
        api_key: &str,
    ) -> Option<LabeledJourney> {
        let sensors = SensorCapture {
            accelerometer: accelerometer_data,
            gyroscope: gyroscope_data,
            barometer: barometer_data,
        };
        self.label_capture(gps_trajectory, sensors, api_key).await
    }

    /// [`auto_label_trajectory`](Self::auto_label_trajectory) with the sensor
    /// streams bundled
    pub async fn label_capture(
        &self,
        gps_trajectory: &[GpsPoint],
        sensors: SensorCapture<'_>,
        api_key: &str,
    ) -> Option<LabeledJourney> {
        let point_count = gps_trajectory.len();
        if point_count < self.config.min_gps_points {
            warn!(
                points = point_count,
                required = self.config.min_gps_points,
                "too few GPS points, skipping trip"
            );
            return None;
        }

        let (first, last) = (gps_trajectory.first()?, gps_trajectory.last()?);
        let (start_time, end_time) = (first.timestamp_ms, last.timestamp_ms);
        let duration_ms = end_time.saturating_sub(start_time);
        if duration_ms < self.config.min_journey_duration_ms {
            warn!(
                duration_ms,
                required_ms = self.config.min_journey_duration_ms,
                "trip too short, skipping"
            );
            return None;
        }

        let speeds = calculate_speeds(gps_trajectory, self.config.max_plausible_speed_mps);
        if speeds.is_empty() {
            warn!(points = point_count, "no usable speed samples, skipping trip");
            return None;
        }
        let summary = SpeedSummary::from_speeds(&speeds);
        debug!(
            avg = summary.avg,
            max = summary.max,
            variance = summary.variance,
            samples = speeds.len(),
            "speed summary"
        );

        let road_types = match self.roads.detect(gps_trajectory, api_key).await {
            Ok(hint) => hint,
            Err(e) => {
                warn!(error = %e, "road classification failed, trip not labeled");
                return None;
            }
        };

        let prediction = infer_transport_mode_with_confidence(&speeds, &road_types, duration_ms);
        debug!(
            mode = %prediction.mode,
            confidence = prediction.confidence,
            road_types = %road_types,
            "heuristic label"
        );

        if let Some(min_confidence) = self.config.min_confidence {
            if prediction.confidence < min_confidence {
                warn!(
                    confidence = prediction.confidence,
                    min_confidence, "label confidence too low, skipping trip"
                );
                return None;
            }
        }

        let mut journey = LabeledJourney {
            id: 0,
            start_time,
            end_time,
            transport_mode: prediction.mode,
            label_source: LabelSource::AutoSnap,
            gps_trajectory: serialize_trajectory(gps_trajectory),
            gps_point_count: point_count,
            avg_speed: summary.avg,
            max_speed: summary.max,
            min_speed: summary.min,
            speed_variance: summary.variance,
            accelerometer_data: sensors.accelerometer.to_string(),
            gyroscope_data: sensors.gyroscope.to_string(),
            barometer_data: sensors.barometer.to_string(),
            road_types,
            snap_confidence: prediction.confidence,
            gps_accuracy: mean_accuracy(gps_trajectory),
            is_verified: false,
            verification_time: None,
            verification_notes: String::new(),
        };

        match self.store.insert(journey.clone()).await {
            Ok(id) => {
                journey.id = id;
                info!(
                    journey_id = id,
                    mode = %journey.transport_mode,
                    "stored auto-labeled journey"
                );
                Some(journey)
            }
            Err(e) => {
                error!(error = %e, "failed to store labeled journey");
                None
            }
        }
    }

    /// Apply a user-confirmed label to a stored journey.
    ///
    /// Returns whether the journey was updated. A missing journey or a store
    /// failure is logged and leaves the label untouched.
    pub async fn verify_label(
        &self,
        journey_id: i64,
        corrected_mode: TransportMode,
        notes: &str,
    ) -> bool {
        let mut journey = match self.store.get_journey_by_id(journey_id).await {
            Ok(Some(journey)) => journey,
            Ok(None) => {
                warn!(journey_id, "journey not found, nothing to verify");
                return false;
            }
            Err(e) => {
                error!(journey_id, error = %e, "failed to load journey for verification");
                return false;
            }
        };

        journey.mark_verified(
            corrected_mode,
            LabelSource::Verified,
            notes,
            Utc::now().timestamp_millis(),
        );
        let mode = journey.transport_mode.clone();

        match self.store.update(journey).await {
            Ok(()) => {
                info!(journey_id, mode = %mode, "journey label verified");
                true
            }
            Err(e) => {
                error!(journey_id, error = %e, "failed to store verified label");
                false
            }
        }
    }
}
