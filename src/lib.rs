//! Journey Labeler - Auto-labeling and feature extraction for transport-mode training data
//!
//! The labeler turns finished commute captures into labeled training rows through
//! a deterministic pipeline: trajectory gates → speed profile → road
//! classification → rule-table labeling → persistence, and later feature
//! extraction → CSV export.
//!
//! ## Modules
//!
//! - **Labeling**: [`AutoLabelingService`] labels trajectories and records user corrections
//! - **Features**: [`FeatureExtractor`] derives accelerometer, gyroscope and speed statistics
//! - **Export**: [`DataExporter`] writes training CSVs and data-quality reports

pub mod classifier;
pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod labeling;
pub mod roads;
pub mod sensor;
pub mod store;
pub mod trajectory;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use classifier::{infer_transport_mode_with_confidence, ModePrediction};
pub use config::PipelineConfig;
pub use error::LabelingError;
pub use export::{DataExporter, ExportScope, CSV_HEADER};
pub use features::FeatureExtractor;
pub use labeling::AutoLabelingService;
pub use roads::{RoadClassifier, SnapToRoadsClient, StaticRoadHint};
pub use store::{InMemoryJourneyStore, JourneyStore};
pub use types::{GpsPoint, JourneyFeatures, LabelSource, LabeledJourney, TransportMode};

/// Labeler version
pub const LABELER_VERSION: &str = env!("CARGO_PKG_VERSION");
