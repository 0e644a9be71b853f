//! Feature extraction
//!
//! This module derives the training feature vector from a labeled journey:
//! - Accelerometer mean/std per axis and average magnitude
//! - Gyroscope mean/std per axis
//! - Journey duration
//! - GPS speed statistics carried over from the journey's speed summary
//!
//! All statistics use population formulas (divide by N).

use tracing::debug;

use crate::sensor::{parse_sensor_stream, SensorSample};
use crate::types::{JourneyFeatures, LabeledJourney};

/// Accelerometer statistics
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccelerometerFeatures {
    pub mean_x: f64,
    pub mean_y: f64,
    pub mean_z: f64,
    pub std_x: f64,
    pub std_y: f64,
    pub std_z: f64,
    pub avg_magnitude: f64,
}

/// Gyroscope statistics
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GyroscopeFeatures {
    pub mean_x: f64,
    pub mean_y: f64,
    pub mean_z: f64,
    pub std_x: f64,
    pub std_y: f64,
    pub std_z: f64,
}

/// Per-axis mean and standard deviation shared by both motion sensors
struct AxisStats {
    mean: [f64; 3],
    std: [f64; 3],
}

fn axis_stats(samples: &[SensorSample]) -> AxisStats {
    let xs: Vec<f64> = samples.iter().map(|s| s.x).collect();
    let ys: Vec<f64> = samples.iter().map(|s| s.y).collect();
    let zs: Vec<f64> = samples.iter().map(|s| s.z).collect();

    AxisStats {
        mean: [mean(&xs), mean(&ys), mean(&zs)],
        std: [calculate_std(&xs), calculate_std(&ys), calculate_std(&zs)],
    }
}

/// Feature extractor for journey feature vectors
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Extract the feature vector for a journey.
    ///
    /// The accelerometer and gyroscope streams are parsed independently: a
    /// malformed stream zeroes only its own statistics.
    pub fn extract_features(journey: &LabeledJourney) -> JourneyFeatures {
        let accel_samples = parse_sensor_stream(&journey.accelerometer_data);
        let gyro_samples = parse_sensor_stream(&journey.gyroscope_data);

        debug!(
            journey_id = journey.id,
            accel_samples = accel_samples.len(),
            gyro_samples = gyro_samples.len(),
            "extracting journey features"
        );

        let accel = extract_accelerometer_features(&accel_samples);
        let gyro = extract_gyroscope_features(&gyro_samples);

        // Inverted timestamps produce a negative duration; left as-is
        let journey_duration = (journey.end_time as f64 - journey.start_time as f64) / 1000.0;

        JourneyFeatures {
            accel_mean_x: accel.mean_x,
            accel_mean_y: accel.mean_y,
            accel_mean_z: accel.mean_z,
            accel_std_x: accel.std_x,
            accel_std_y: accel.std_y,
            accel_std_z: accel.std_z,
            accel_magnitude: accel.avg_magnitude,

            gyro_mean_x: gyro.mean_x,
            gyro_mean_y: gyro.mean_y,
            gyro_mean_z: gyro.mean_z,
            gyro_std_x: gyro.std_x,
            gyro_std_y: gyro.std_y,
            gyro_std_z: gyro.std_z,

            journey_duration,

            gps_speed_mean: journey.avg_speed,
            gps_speed_std: journey.speed_variance.sqrt(),
            gps_speed_max: journey.max_speed,

            transport_mode: Some(journey.transport_mode.clone()),
        }
    }
}

/// Accelerometer statistics; all zeros for an empty stream
pub fn extract_accelerometer_features(samples: &[SensorSample]) -> AccelerometerFeatures {
    if samples.is_empty() {
        return AccelerometerFeatures::default();
    }

    let stats = axis_stats(samples);
    let magnitudes: Vec<f64> = samples.iter().map(SensorSample::magnitude).collect();

    AccelerometerFeatures {
        mean_x: stats.mean[0],
        mean_y: stats.mean[1],
        mean_z: stats.mean[2],
        std_x: stats.std[0],
        std_y: stats.std[1],
        std_z: stats.std[2],
        avg_magnitude: mean(&magnitudes),
    }
}

/// Gyroscope statistics; all zeros for an empty stream
pub fn extract_gyroscope_features(samples: &[SensorSample]) -> GyroscopeFeatures {
    if samples.is_empty() {
        return GyroscopeFeatures::default();
    }

    let stats = axis_stats(samples);

    GyroscopeFeatures {
        mean_x: stats.mean[0],
        mean_y: stats.mean[1],
        mean_z: stats.mean[2],
        std_x: stats.std[0],
        std_y: stats.std[1],
        std_z: stats.std[2],
    }
}

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance; 0 for fewer than two values
pub fn calculate_variance(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }

    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 for fewer than two values
pub fn calculate_std(values: &[f64]) -> f64 {
    calculate_variance(values).sqrt()
}
