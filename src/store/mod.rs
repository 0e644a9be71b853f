//! Journey persistence
//!
//! The labeling service and the exporter only see the [`JourneyStore`] trait.
//! [`InMemoryJourneyStore`] implements it with an optional JSON snapshot file.

mod memory;

pub use memory::InMemoryJourneyStore;

use std::future::Future;

use thiserror::Error;

use crate::types::{LabeledJourney, ModeCount, SourceCount, TransportMode};

/// Errors raised by a journey store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("journey {0} not found")]
    NotFound(i64),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Persistence collaborator for labeled journeys and aggregate counts.
///
/// List queries return journeys newest first (by `start_time`).
pub trait JourneyStore: Send + Sync {
    /// Insert a journey and return its assigned id
    fn insert(
        &self,
        journey: LabeledJourney,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;

    /// Replace a stored journey (matched by id)
    fn update(
        &self,
        journey: LabeledJourney,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete_by_id(&self, journey_id: i64) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_journey_by_id(
        &self,
        journey_id: i64,
    ) -> impl Future<Output = Result<Option<LabeledJourney>, StoreError>> + Send;

    fn get_unverified_journeys(
        &self,
    ) -> impl Future<Output = Result<Vec<LabeledJourney>, StoreError>> + Send;

    fn get_verified_journeys_for_export(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LabeledJourney>, StoreError>> + Send;

    fn get_journeys_for_export(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LabeledJourney>, StoreError>> + Send;

    fn get_total_count(&self) -> impl Future<Output = Result<u32, StoreError>> + Send;

    fn get_verified_count(&self) -> impl Future<Output = Result<u32, StoreError>> + Send;

    fn get_count_by_transport_mode(
        &self,
        mode: &TransportMode,
    ) -> impl Future<Output = Result<u32, StoreError>> + Send;

    /// Journey counts per transport mode, largest first
    fn get_transport_mode_distribution(
        &self,
    ) -> impl Future<Output = Result<Vec<ModeCount>, StoreError>> + Send;

    fn get_label_source_distribution(
        &self,
    ) -> impl Future<Output = Result<Vec<SourceCount>, StoreError>> + Send;

    /// Mean of `avg_speed` over journeys with the given mode
    fn get_average_speed_for_mode(
        &self,
        mode: &TransportMode,
    ) -> impl Future<Output = Result<Option<f64>, StoreError>> + Send;
}
