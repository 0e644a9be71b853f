//! Shared test fixtures and collaborator doubles

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::roads::{RoadClassifier, RoadsError};
use crate::store::{InMemoryJourneyStore, JourneyStore, StoreError};
use crate::types::{
    GpsPoint, LabelSource, LabeledJourney, ModeCount, SourceCount, TransportMode,
};

pub const ACCEL_JSON: &str = r#"[{"x":0.5,"y":0.3,"z":9.8},{"x":0.7,"y":0.1,"z":9.6}]"#;
pub const GYRO_JSON: &str = r#"[{"x":0.01,"y":0.02,"z":0.03},{"x":0.03,"y":0.02,"z":0.01}]"#;

pub fn sample_journey(mode: TransportMode, start_time: i64) -> LabeledJourney {
    LabeledJourney {
        id: 0,
        start_time,
        end_time: start_time + 600_000,
        transport_mode: mode,
        label_source: LabelSource::AutoSnap,
        gps_trajectory: "30.1,120.1,0|30.2,120.2,600000".to_string(),
        gps_point_count: 2,
        avg_speed: 9.5,
        max_speed: 14.0,
        min_speed: 2.0,
        speed_variance: 4.0,
        accelerometer_data: ACCEL_JSON.to_string(),
        gyroscope_data: GYRO_JSON.to_string(),
        barometer_data: "[]".to_string(),
        road_types: String::new(),
        snap_confidence: 0.55,
        gps_accuracy: 5.0,
        is_verified: false,
        verification_time: None,
        verification_notes: String::new(),
    }
}

pub fn verified_journey(mode: TransportMode, start_time: i64) -> LabeledJourney {
    let mut journey = sample_journey(mode.clone(), start_time);
    journey.mark_verified(mode, LabelSource::Verified, "", start_time + 700_000);
    journey
}

/// Straight northbound trajectory with a fix every `step_ms`.
///
/// `step_deg` of latitude per step; 0.0001° is ~11.1 m.
pub fn straight_trajectory(points: usize, step_ms: i64, step_deg: f64) -> Vec<GpsPoint> {
    (0..points)
        .map(|i| {
            GpsPoint::new(
                1.3 + step_deg * i as f64,
                103.8,
                1_700_000_000_000 + step_ms * i as i64,
            )
        })
        .collect()
}

/// Which store operations fail
#[derive(Debug, Default, Clone, Copy)]
pub struct StoreFailures {
    pub insert: bool,
    pub lookup: bool,
    pub update: bool,
    pub export_query: bool,
    pub counts: bool,
}

/// Store wrapper that injects failures into selected operations
#[derive(Debug, Default)]
pub struct FailingStore {
    pub inner: InMemoryJourneyStore,
    pub failures: StoreFailures,
}

impl FailingStore {
    pub fn new(failures: StoreFailures) -> Self {
        Self {
            inner: InMemoryJourneyStore::new(),
            failures,
        }
    }

    fn check(&self, fail: bool) -> Result<(), StoreError> {
        if fail {
            Err(StoreError::Unavailable("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl JourneyStore for FailingStore {
    async fn insert(&self, journey: LabeledJourney) -> Result<i64, StoreError> {
        self.check(self.failures.insert)?;
        self.inner.insert(journey).await
    }

    async fn update(&self, journey: LabeledJourney) -> Result<(), StoreError> {
        self.check(self.failures.update)?;
        self.inner.update(journey).await
    }

    async fn delete_by_id(&self, journey_id: i64) -> Result<(), StoreError> {
        self.inner.delete_by_id(journey_id).await
    }

    async fn get_journey_by_id(
        &self,
        journey_id: i64,
    ) -> Result<Option<LabeledJourney>, StoreError> {
        self.check(self.failures.lookup)?;
        self.inner.get_journey_by_id(journey_id).await
    }

    async fn get_unverified_journeys(&self) -> Result<Vec<LabeledJourney>, StoreError> {
        self.check(self.failures.export_query)?;
        self.inner.get_unverified_journeys().await
    }

    async fn get_verified_journeys_for_export(
        &self,
        limit: usize,
    ) -> Result<Vec<LabeledJourney>, StoreError> {
        self.check(self.failures.export_query)?;
        self.inner.get_verified_journeys_for_export(limit).await
    }

    async fn get_journeys_for_export(
        &self,
        limit: usize,
    ) -> Result<Vec<LabeledJourney>, StoreError> {
        self.check(self.failures.export_query)?;
        self.inner.get_journeys_for_export(limit).await
    }

    async fn get_total_count(&self) -> Result<u32, StoreError> {
        self.check(self.failures.counts)?;
        self.inner.get_total_count().await
    }

    async fn get_verified_count(&self) -> Result<u32, StoreError> {
        self.check(self.failures.counts)?;
        self.inner.get_verified_count().await
    }

    async fn get_count_by_transport_mode(&self, mode: &TransportMode) -> Result<u32, StoreError> {
        self.check(self.failures.counts)?;
        self.inner.get_count_by_transport_mode(mode).await
    }

    async fn get_transport_mode_distribution(&self) -> Result<Vec<ModeCount>, StoreError> {
        self.check(self.failures.counts)?;
        self.inner.get_transport_mode_distribution().await
    }

    async fn get_label_source_distribution(&self) -> Result<Vec<SourceCount>, StoreError> {
        self.check(self.failures.counts)?;
        self.inner.get_label_source_distribution().await
    }

    async fn get_average_speed_for_mode(
        &self,
        mode: &TransportMode,
    ) -> Result<Option<f64>, StoreError> {
        self.check(self.failures.counts)?;
        self.inner.get_average_speed_for_mode(mode).await
    }
}

/// Road classifier that always fails and counts its calls
#[derive(Debug, Default)]
pub struct FailingRoadClassifier {
    pub calls: AtomicUsize,
}

impl FailingRoadClassifier {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RoadClassifier for FailingRoadClassifier {
    async fn detect(&self, _trajectory: &[GpsPoint], _api_key: &str) -> Result<String, RoadsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RoadsError::Transport("network unreachable".to_string()))
    }
}
