//! Heuristic transport-mode classification
//!
//! Bootstrap labels come from an ordered rule table over the trip's average
//! speed, speed variability and the road-type hint. Rules are evaluated top to
//! bottom and the first match wins, so overlapping conditions resolve by
//! position (WALKING pre-empts SUBWAY for slow, jerky trips).

use serde::Serialize;

use crate::features::{calculate_std, mean};
use crate::types::TransportMode;

/// Inputs the rule predicates see
#[derive(Debug, Clone, Copy)]
pub struct SpeedProfile<'a> {
    /// Mean speed (m/s)
    pub avg_speed: f64,
    /// Population standard deviation of speed (m/s)
    pub speed_std: f64,
    /// Road-type hint, matched by plain substring search
    pub road_types: &'a str,
}

/// One row of the rule table
pub struct ModeRule {
    pub name: &'static str,
    pub predicate: fn(&SpeedProfile<'_>) -> bool,
    pub mode: TransportMode,
    pub confidence: f32,
}

/// Ordered rule table, first match wins
pub const MODE_RULES: &[ModeRule] = &[
    ModeRule {
        name: "fast_on_motorway",
        predicate: |p| p.avg_speed > 15.0 && p.road_types.contains("motorway|trunk"),
        mode: TransportMode::Driving,
        confidence: 0.95,
    },
    ModeRule {
        name: "medium_on_arterial",
        predicate: |p| {
            (8.0..=15.0).contains(&p.avg_speed) && p.road_types.contains("trunk|primary")
        },
        mode: TransportMode::Bus,
        confidence: 0.85,
    },
    ModeRule {
        name: "steady_on_cycleway",
        predicate: |p| p.speed_std < 3.0 && p.road_types.contains("cycleway"),
        mode: TransportMode::Cycling,
        confidence: 0.90,
    },
    ModeRule {
        name: "very_slow",
        predicate: |p| p.avg_speed < 3.0,
        mode: TransportMode::Walking,
        confidence: 0.85,
    },
    ModeRule {
        name: "variable_medium",
        predicate: |p| p.speed_std > 3.0 && (5.0..=12.0).contains(&p.avg_speed),
        mode: TransportMode::Subway,
        confidence: 0.75,
    },
];

/// Mode and confidence used when no rule matches
pub const FALLBACK_MODE: TransportMode = TransportMode::Unknown;
pub const FALLBACK_CONFIDENCE: f32 = 0.55;

/// Outcome of the heuristic classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModePrediction {
    pub mode: TransportMode,
    /// Fixed per-rule scalar, not a learned probability
    pub confidence: f32,
}

/// Classify a trip from its filtered speeds and road-type hint.
///
/// `duration_ms` is accepted for parity with the stored journey but no rule
/// reads it.
pub fn infer_transport_mode_with_confidence(
    speeds: &[f64],
    road_types: &str,
    _duration_ms: i64,
) -> ModePrediction {
    let profile = SpeedProfile {
        avg_speed: mean(speeds),
        speed_std: calculate_std(speeds),
        road_types,
    };

    classify_profile(&profile)
}

/// Evaluate the rule table against a precomputed profile
pub fn classify_profile(profile: &SpeedProfile<'_>) -> ModePrediction {
    MODE_RULES
        .iter()
        .find(|rule| (rule.predicate)(profile))
        .map(|rule| ModePrediction {
            mode: rule.mode.clone(),
            confidence: rule.confidence,
        })
        .unwrap_or(ModePrediction {
            mode: FALLBACK_MODE,
            confidence: FALLBACK_CONFIDENCE,
        })
}
