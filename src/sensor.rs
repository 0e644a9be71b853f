//! Sensor stream parsing
//!
//! The capturing app stores accelerometer and gyroscope streams as a JSON array
//! of `{"x":..,"y":..,"z":..}` objects. The format is fixed: a value must follow
//! its field's colon with no whitespace, so the stream is scanned for
//! `"x":<number>` tokens rather than parsed as general JSON.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LabelingError;

/// One three-axis sensor reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SensorSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the reading
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

fn axis_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""([xyz])":([0-9.\-E+]+)"#).expect("axis pattern is a valid regex")
    })
}

/// Parse a sensor stream, reporting why it was rejected.
///
/// Values are collected per axis in order of appearance. Every axis must yield
/// at least one value; when counts differ the result is truncated to the
/// shortest axis.
pub fn try_parse_sensor_stream(json: &str) -> Result<Vec<SensorSample>, LabelingError> {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let mut zs = Vec::new();

    for caps in axis_pattern().captures_iter(json) {
        let raw = &caps[2];
        let value: f64 = raw
            .parse()
            .map_err(|_| LabelingError::SensorParse(format!("invalid number '{}'", raw)))?;

        match &caps[1] {
            "x" => xs.push(value),
            "y" => ys.push(value),
            _ => zs.push(value),
        }
    }

    if xs.is_empty() || ys.is_empty() || zs.is_empty() {
        return Err(LabelingError::SensorParse(format!(
            "missing axis values (x: {}, y: {}, z: {})",
            xs.len(),
            ys.len(),
            zs.len()
        )));
    }

    let len = xs.len().min(ys.len()).min(zs.len());
    Ok((0..len)
        .map(|i| SensorSample::new(xs[i], ys[i], zs[i]))
        .collect())
}

/// Parse a sensor stream, collapsing any malformed input to an empty list.
pub fn parse_sensor_stream(json: &str) -> Vec<SensorSample> {
    if json.trim().is_empty() {
        return Vec::new();
    }

    match try_parse_sensor_stream(json) {
        Ok(samples) => samples,
        Err(e) => {
            debug!(error = %e, "sensor stream rejected");
            Vec::new()
        }
    }
}
