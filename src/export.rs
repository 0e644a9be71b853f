//! Training data export
//!
//! Writes labeled journeys as a fixed 22-column CSV for the training scripts
//! and renders a plain-text data-quality report.
//!
//! Public entry points never return errors: failures surface as the `-1`
//! row-count sentinel, a skipped row, or an error string in the report.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use tracing::{debug, error, info, warn};

use crate::config::ExportConfig;
use crate::error::LabelingError;
use crate::features::FeatureExtractor;
use crate::store::JourneyStore;
use crate::types::{JourneyCsvRecord, JourneyFeatures, LabeledJourney};

/// CSV header, one line
pub const CSV_HEADER: &str = "journeyId,timestamp,transportMode,labelSource,\
accelMeanX,accelMeanY,accelMeanZ,accelStdX,accelStdY,accelStdZ,accelMagnitude,\
gyroMeanX,gyroMeanY,gyroMeanZ,gyroStdX,gyroStdY,gyroStdZ,\
journeyDuration,\
gpsSpeedMean,gpsSpeedStd,gpsSpeedMax,\
isVerified\n";

/// Number of columns in every CSV line
pub const CSV_FIELD_COUNT: usize = 22;

/// Which journeys an export covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    /// Only human-verified journeys
    Verified,
    /// Every journey, including unverified auto labels
    All,
}

/// Build the CSV record; labels come from the journey, statistics from the
/// features
pub fn features_to_csv_record(
    journey: &LabeledJourney,
    features: &JourneyFeatures,
) -> JourneyCsvRecord {
    JourneyCsvRecord {
        journey_id: journey.id,
        timestamp: journey.start_time,
        transport_mode: journey.transport_mode.to_string(),
        label_source: journey.label_source.to_string(),
        accel_mean_x: features.accel_mean_x,
        accel_mean_y: features.accel_mean_y,
        accel_mean_z: features.accel_mean_z,
        accel_std_x: features.accel_std_x,
        accel_std_y: features.accel_std_y,
        accel_std_z: features.accel_std_z,
        accel_magnitude: features.accel_magnitude,
        gyro_mean_x: features.gyro_mean_x,
        gyro_mean_y: features.gyro_mean_y,
        gyro_mean_z: features.gyro_mean_z,
        gyro_std_x: features.gyro_std_x,
        gyro_std_y: features.gyro_std_y,
        gyro_std_z: features.gyro_std_z,
        journey_duration: features.journey_duration,
        gps_speed_mean: features.gps_speed_mean,
        gps_speed_std: features.gps_speed_std,
        gps_speed_max: features.gps_speed_max,
        is_verified: journey.is_verified,
    }
}

/// Render one CSV line (with trailing newline)
pub fn record_to_csv_line(record: &JourneyCsvRecord) -> String {
    format!(
        "{},{},{},{},\
         {:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},\
         {:.6},{:.6},{:.6},{:.6},{:.6},{:.6},\
         {:.2},\
         {:.4},{:.4},{:.4},\
         {}\n",
        record.journey_id,
        record.timestamp,
        record.transport_mode,
        record.label_source,
        record.accel_mean_x,
        record.accel_mean_y,
        record.accel_mean_z,
        record.accel_std_x,
        record.accel_std_y,
        record.accel_std_z,
        record.accel_magnitude,
        record.gyro_mean_x,
        record.gyro_mean_y,
        record.gyro_mean_z,
        record.gyro_std_x,
        record.gyro_std_y,
        record.gyro_std_z,
        record.journey_duration,
        record.gps_speed_mean,
        record.gps_speed_std,
        record.gps_speed_max,
        if record.is_verified { "1" } else { "0" },
    )
}

/// Labels are written unquoted, so they must not contain separators
fn check_label_field(journey_id: i64, name: &str, value: &str) -> Result<(), LabelingError> {
    if value.contains([',', '\n', '\r']) {
        return Err(LabelingError::InvalidRecord {
            journey_id,
            reason: format!("{} '{}' contains a CSV separator", name, value.escape_debug()),
        });
    }
    Ok(())
}

/// Extract features for one journey and render its CSV line
fn journey_to_csv_line(journey: &LabeledJourney) -> Result<String, LabelingError> {
    let features = FeatureExtractor::extract_features(journey);
    let record = features_to_csv_record(journey, &features);

    check_label_field(journey.id, "transportMode", &record.transport_mode)?;
    check_label_field(journey.id, "labelSource", &record.label_source)?;

    Ok(record_to_csv_line(&record))
}

/// Exporter for training CSVs and data-quality reports
pub struct DataExporter<S> {
    store: Arc<S>,
    config: ExportConfig,
}

impl<S: JourneyStore> DataExporter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, ExportConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: ExportConfig) -> Self {
        Self { store, config }
    }

    /// Export verified journeys only.
    ///
    /// Returns the number of rows written, `0` when there is nothing to
    /// export, or `-1` when the store query or the file write fails.
    pub async fn export_verified_data_to_csv(&self, output_file: impl AsRef<Path>) -> i64 {
        self.export_to_csv(output_file.as_ref(), ExportScope::Verified).await
    }

    /// Export every journey, including unverified auto labels
    pub async fn export_all_data_to_csv(&self, output_file: impl AsRef<Path>) -> i64 {
        self.export_to_csv(output_file.as_ref(), ExportScope::All).await
    }

    pub async fn export_to_csv(&self, output_file: &Path, scope: ExportScope) -> i64 {
        match self.try_export(output_file, scope).await {
            Ok(written) => written as i64,
            Err(e) => {
                error!(path = %output_file.display(), error = %e, "CSV export failed");
                -1
            }
        }
    }

    async fn try_export(
        &self,
        output_file: &Path,
        scope: ExportScope,
    ) -> Result<usize, LabelingError> {
        let limit = self.config.export_limit;
        let journeys = match scope {
            ExportScope::Verified => self.store.get_verified_journeys_for_export(limit).await?,
            ExportScope::All => self.store.get_journeys_for_export(limit).await?,
        };

        if journeys.is_empty() {
            warn!(?scope, "no journeys to export");
            return Ok(0);
        }
        info!(?scope, journeys = journeys.len(), "exporting journeys");

        let interval = self.config.progress_interval;
        let mut contents = String::from(CSV_HEADER);
        let mut written = 0usize;
        for journey in &journeys {
            match journey_to_csv_line(journey) {
                Ok(line) => {
                    contents.push_str(&line);
                    written += 1;
                    if interval > 0 && written % interval == 0 {
                        debug!(written, "export progress");
                    }
                }
                Err(e) => error!(journey_id = journey.id, error = %e, "skipping journey"),
            }
        }

        if let Some(parent) = output_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output_file, contents.as_bytes()).await?;

        info!(
            rows = written,
            size_kb = contents.len() / 1024,
            path = %output_file.display(),
            "CSV export complete"
        );
        Ok(written)
    }

    /// Render the data-quality report.
    ///
    /// A store failure yields a one-line error message instead of a report.
    pub async fn generate_data_report(&self) -> String {
        match self.try_generate_report().await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "failed to generate data report");
                format!("Report generation failed: {}", e)
            }
        }
    }

    async fn try_generate_report(&self) -> Result<String, LabelingError> {
        let total = self.store.get_total_count().await?;
        let verified = self.store.get_verified_count().await?;
        let modes = self.store.get_transport_mode_distribution().await?;
        let sources = self.store.get_label_source_distribution().await?;

        let percent = |count: u32| percentage(count, total);

        let mut report = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(report, "=== Training Data Report ===");
        let _ = writeln!(report, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(report);

        let _ = writeln!(report, "Overview:");
        let _ = writeln!(report, "- Total journeys: {}", total);
        let _ = writeln!(report, "- Verified: {} ({}%)", verified, percent(verified));
        let _ = writeln!(report, "- Pending verification: {}", total.saturating_sub(verified));
        let _ = writeln!(report);

        let _ = writeln!(report, "Transport mode distribution:");
        for row in &modes {
            let _ = writeln!(
                report,
                "- {}: {} ({}%)",
                row.transport_mode,
                row.count,
                percent(row.count)
            );
        }
        let _ = writeln!(report);

        let _ = writeln!(report, "Label source distribution:");
        for row in &sources {
            let _ = writeln!(
                report,
                "- {}: {} ({}%)",
                row.label_source,
                row.count,
                percent(row.count)
            );
        }
        let _ = writeln!(report);

        let _ = writeln!(report, "Quality assessment:");
        let volume_note = if total < 100 {
            "WARNING: small data volume (< 100 journeys), keep collecting"
        } else if total < 500 {
            "WARNING: moderate data volume (< 500 journeys), enough for a first model"
        } else {
            "OK: sufficient data volume (>= 500 journeys) for a production model"
        };
        let _ = writeln!(report, "- {}", volume_note);

        // Compared without dividing, so an empty store is safe
        if (verified as f64) < total as f64 * 0.8 {
            let _ = writeln!(
                report,
                "- WARNING: low verification rate (< 80%), verify more labels"
            );
        } else {
            let _ = writeln!(report, "- OK: high verification rate (>= 80%)");
        }

        if let Some(ratio) = class_balance_ratio(modes.iter().map(|row| row.count)) {
            if ratio > 5 {
                let _ = writeln!(
                    report,
                    "- WARNING: transport modes imbalanced (max/min ratio: {}), \
                     may hurt model quality",
                    ratio
                );
            } else {
                let _ = writeln!(report, "- OK: transport modes balanced");
            }
        }

        Ok(report)
    }
}

/// Integer percentage, widened so large stores cannot overflow
fn percentage(count: u32, total: u32) -> u64 {
    if total == 0 {
        return 0;
    }
    u64::from(count) * 100 / u64::from(total)
}

/// Integer max/min ratio of class counts; `None` with no classes, `0` when
/// the smallest class is empty
fn class_balance_ratio(counts: impl Iterator<Item = u32>) -> Option<u32> {
    let counts: Vec<u32> = counts.collect();
    let min = *counts.iter().min()?;
    let max = *counts.iter().max()?;
    Some(if min > 0 { max / min } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryJourneyStore;
    use crate::testing::{sample_journey, verified_journey, FailingStore, StoreFailures};
    use crate::types::{LabelSource, TransportMode};
    use pretty_assertions::assert_eq;

    fn sample_record() -> JourneyCsvRecord {
        JourneyCsvRecord {
            journey_id: 12,
            timestamp: 1_700_000_000_000,
            transport_mode: "BUS".to_string(),
            label_source: "VERIFIED".to_string(),
            accel_mean_x: 0.5,
            accel_mean_y: 0.25,
            accel_mean_z: 9.81,
            accel_std_x: 0.1,
            accel_std_y: 0.2,
            accel_std_z: 0.3,
            accel_magnitude: 9.9,
            gyro_mean_x: 0.01,
            gyro_mean_y: 0.02,
            gyro_mean_z: 0.03,
            gyro_std_x: 0.001,
            gyro_std_y: 0.002,
            gyro_std_z: 0.003,
            journey_duration: 600.0,
            gps_speed_mean: 9.5,
            gps_speed_std: 2.0,
            gps_speed_max: 14.0,
            is_verified: true,
        }
    }

    async fn store_with(journeys: Vec<LabeledJourney>) -> Arc<InMemoryJourneyStore> {
        let store = Arc::new(InMemoryJourneyStore::new());
        for journey in journeys {
            store.insert(journey).await.unwrap();
        }
        store
    }

    #[test]
    fn test_header_has_22_columns() {
        assert!(CSV_HEADER.ends_with('\n'));
        assert_eq!(CSV_HEADER.trim_end().split(',').count(), CSV_FIELD_COUNT);
        assert!(CSV_HEADER.starts_with("journeyId,timestamp,transportMode,labelSource,accelMeanX"));
        assert!(CSV_HEADER.ends_with("gpsSpeedMean,gpsSpeedStd,gpsSpeedMax,isVerified\n"));
    }

    #[test]
    fn test_record_to_csv_line_format() {
        let line = record_to_csv_line(&sample_record());

        assert_eq!(
            line,
            "12,1700000000000,BUS,VERIFIED,\
             0.500000,0.250000,9.810000,0.100000,0.200000,0.300000,9.900000,\
             0.010000,0.020000,0.030000,0.001000,0.002000,0.003000,\
             600.00,9.5000,2.0000,14.0000,1\n"
        );
        assert_eq!(line.trim_end().split(',').count(), CSV_FIELD_COUNT);
    }

    #[test]
    fn test_unverified_renders_zero() {
        let mut record = sample_record();
        record.is_verified = false;
        assert!(record_to_csv_line(&record).ends_with(",0\n"));
    }

    #[test]
    fn test_record_labels_come_from_journey() {
        let journey = verified_journey(TransportMode::Cycling, 5_000);
        let mut features = FeatureExtractor::extract_features(&journey);
        features.transport_mode = Some(TransportMode::Driving);

        let record = features_to_csv_record(&journey, &features);
        assert_eq!(record.transport_mode, "CYCLING");
        assert_eq!(record.label_source, "VERIFIED");
        assert!(record.is_verified);
        assert_eq!(record.timestamp, 5_000);
        assert_eq!(record.gps_speed_max, 14.0);
    }

    #[tokio::test]
    async fn test_export_verified_writes_header_and_rows() {
        let store = store_with(vec![
            verified_journey(TransportMode::Bus, 1_000),
            sample_journey(TransportMode::Walking, 2_000),
            verified_journey(TransportMode::Subway, 3_000),
        ])
        .await;
        let exporter = DataExporter::new(store);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out").join("verified.csv");

        assert_eq!(exporter.export_verified_data_to_csv(&path).await, 2);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(format!("{}\n", lines[0]), CSV_HEADER);
        for line in &lines[1..] {
            assert_eq!(line.split(',').count(), CSV_FIELD_COUNT);
            assert!(line.ends_with(",1"));
        }
        // newest first
        assert!(lines[1].contains(",SUBWAY,"));
    }

    #[tokio::test]
    async fn test_export_all_includes_unverified() {
        let store = store_with(vec![
            verified_journey(TransportMode::Bus, 1_000),
            sample_journey(TransportMode::Walking, 2_000),
        ])
        .await;
        let exporter = DataExporter::new(store);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all.csv");

        assert_eq!(exporter.export_all_data_to_csv(&path).await, 2);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 3);
        assert!(contents.contains(",WALKING,AUTO_SNAP,"));
    }

    #[tokio::test]
    async fn test_export_empty_returns_zero() {
        let exporter = DataExporter::new(Arc::new(InMemoryJourneyStore::new()));
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(
            exporter.export_verified_data_to_csv(dir.path().join("empty.csv")).await,
            0
        );
    }

    #[tokio::test]
    async fn test_export_store_failure_returns_sentinel() {
        let store = Arc::new(FailingStore::new(StoreFailures {
            export_query: true,
            ..Default::default()
        }));
        let exporter = DataExporter::new(store);
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(exporter.export_all_data_to_csv(dir.path().join("x.csv")).await, -1);
    }

    #[tokio::test]
    async fn test_export_skips_unrepresentable_rows() {
        let store = store_with(vec![
            verified_journey(TransportMode::Bus, 1_000),
            verified_journey(TransportMode::Other("BUS,EXPRESS".to_string()), 2_000),
            verified_journey(TransportMode::Walking, 3_000),
        ])
        .await;
        let exporter = DataExporter::new(store);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.csv");

        assert_eq!(exporter.export_verified_data_to_csv(&path).await, 2);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 3);
        assert!(!contents.contains("EXPRESS"));
    }

    #[tokio::test]
    async fn test_export_respects_limit() {
        let store = store_with(vec![
            sample_journey(TransportMode::Bus, 1_000),
            sample_journey(TransportMode::Bus, 2_000),
            sample_journey(TransportMode::Bus, 3_000),
        ])
        .await;
        let exporter = DataExporter::with_config(
            store,
            ExportConfig {
                export_limit: 2,
                progress_interval: 1,
            },
        );
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(exporter.export_all_data_to_csv(dir.path().join("limited.csv")).await, 2);
    }

    #[tokio::test]
    async fn test_report_for_empty_store() {
        let exporter = DataExporter::new(Arc::new(InMemoryJourneyStore::new()));
        let report = exporter.generate_data_report().await;

        assert!(report.contains("Total journeys: 0"));
        assert!(report.contains("Verified: 0 (0%)"));
        assert!(report.contains("small data"));
        assert!(report.contains("high verification rate"));
        assert!(!report.contains("balanced"));
    }

    #[tokio::test]
    async fn test_report_sections_and_notes() {
        let mut journeys = Vec::new();
        for i in 0..12 {
            journeys.push(sample_journey(TransportMode::Bus, i));
        }
        journeys.push(verified_journey(TransportMode::Walking, 100));
        journeys.push(verified_journey(TransportMode::Walking, 101));
        let exporter = DataExporter::new(store_with(journeys).await);

        let report = exporter.generate_data_report().await;

        assert!(report.contains("Total journeys: 14"));
        assert!(report.contains("Verified: 2 (14%)"));
        assert!(report.contains("Pending verification: 12"));
        assert!(report.contains("- BUS: 12 (85%)"));
        assert!(report.contains("- WALKING: 2 (14%)"));
        assert!(report.contains("- AUTO_SNAP: 12 (85%)"));
        assert!(report.contains("- VERIFIED: 2 (14%)"));
        assert!(report.contains("low verification rate"));
        assert!(report.contains("imbalanced (max/min ratio: 6)"));
    }

    #[tokio::test]
    async fn test_report_balanced_classes() {
        let store = store_with(vec![
            verified_journey(TransportMode::Bus, 1),
            verified_journey(TransportMode::Walking, 2),
            verified_journey(TransportMode::Cycling, 3),
        ])
        .await;
        let report = DataExporter::new(store).generate_data_report().await;

        assert!(report.contains("OK: transport modes balanced"));
        assert!(!report.contains("imbalanced"));
        assert!(report.contains("high verification rate"));
    }

    async fn report_for_count(count: i64) -> String {
        let journeys = (0..count)
            .map(|i| verified_journey(TransportMode::Bus, i))
            .collect();
        DataExporter::new(store_with(journeys).await)
            .generate_data_report()
            .await
    }

    #[tokio::test]
    async fn test_report_data_volume_tiers() {
        let report = report_for_count(99).await;
        assert!(report.contains("small data volume"));

        let report = report_for_count(100).await;
        assert!(report.contains("Total journeys: 100"));
        assert!(report.contains("moderate data volume"));
        assert!(!report.contains("small data volume"));

        let report = report_for_count(499).await;
        assert!(report.contains("moderate data volume"));

        let report = report_for_count(500).await;
        assert!(report.contains("Total journeys: 500"));
        assert!(report.contains("sufficient data volume"));
        assert!(!report.contains("moderate data volume"));
    }

    #[test]
    fn test_percentage_does_not_overflow() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(12, 14), 85);
        assert_eq!(percentage(u32::MAX, u32::MAX), 100);
        assert_eq!(percentage(u32::MAX / 2, u32::MAX), 49);
    }

    #[tokio::test]
    async fn test_report_failure_returns_message() {
        let store = Arc::new(FailingStore::new(StoreFailures {
            counts: true,
            ..Default::default()
        }));
        let report = DataExporter::new(store).generate_data_report().await;

        assert!(report.starts_with("Report generation failed:"));
        assert!(report.contains("injected failure"));
    }

    #[test]
    fn test_class_balance_ratio() {
        assert_eq!(class_balance_ratio(std::iter::empty()), None);
        assert_eq!(class_balance_ratio([12, 2].into_iter()), Some(6));
        // integer ratio: 11 / 2 == 5 is not above 5
        assert_eq!(class_balance_ratio([11, 2].into_iter()), Some(5));
        assert_eq!(class_balance_ratio([7, 0].into_iter()), Some(0));
    }

    #[test]
    fn test_label_source_display_matches_csv() {
        assert_eq!(LabelSource::Manual.to_string(), "MANUAL");
    }
}
