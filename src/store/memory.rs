use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::{JourneyStore, StoreError};
use crate::types::{LabelSource, LabeledJourney, ModeCount, SourceCount, TransportMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreSnapshot {
    next_id: i64,
    journeys: Vec<LabeledJourney>,
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        Self {
            next_id: 1,
            journeys: Vec::new(),
        }
    }
}

/// In-memory journey store with JSON snapshot persistence
#[derive(Debug, Default)]
pub struct InMemoryJourneyStore {
    state: RwLock<StoreSnapshot>,
}

impl InMemoryJourneyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load store state from JSON
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let mut snapshot: StoreSnapshot = serde_json::from_str(json)?;
        let max_id = snapshot.journeys.iter().map(|j| j.id).max().unwrap_or(0);
        snapshot.next_id = snapshot.next_id.max(max_id + 1);

        Ok(Self {
            state: RwLock::new(snapshot),
        })
    }

    /// Serialize store state to JSON
    pub async fn to_json(&self) -> Result<String, StoreError> {
        let state = self.state.read().await;
        Ok(serde_json::to_string_pretty(&*state)?)
    }

    /// Open a snapshot file; a missing file yields an empty store
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        match tokio::fs::read_to_string(path).await {
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no snapshot, starting empty store");
                Ok(Self::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the snapshot file, creating parent directories
    pub async fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = self.to_json().await?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    async fn newest_first<F>(&self, limit: usize, keep: F) -> Vec<LabeledJourney>
    where
        F: Fn(&LabeledJourney) -> bool,
    {
        let state = self.state.read().await;
        let mut journeys: Vec<LabeledJourney> =
            state.journeys.iter().filter(|&j| keep(j)).cloned().collect();
        journeys.sort_by_key(|j| Reverse(j.start_time));
        journeys.truncate(limit);
        journeys
    }
}

/// Counts are reported as `u32`; larger stores clamp instead of wrapping
fn saturating_count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl JourneyStore for InMemoryJourneyStore {
    async fn insert(&self, mut journey: LabeledJourney) -> Result<i64, StoreError> {
        let mut state = self.state.write().await;
        let id = state.next_id;
        state.next_id += 1;
        journey.id = id;
        state.journeys.push(journey);
        Ok(id)
    }

    async fn update(&self, journey: LabeledJourney) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let slot = state
            .journeys
            .iter_mut()
            .find(|j| j.id == journey.id)
            .ok_or(StoreError::NotFound(journey.id))?;
        *slot = journey;
        Ok(())
    }

    async fn delete_by_id(&self, journey_id: i64) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.journeys.retain(|j| j.id != journey_id);
        Ok(())
    }

    async fn get_journey_by_id(
        &self,
        journey_id: i64,
    ) -> Result<Option<LabeledJourney>, StoreError> {
        let state = self.state.read().await;
        Ok(state.journeys.iter().find(|j| j.id == journey_id).cloned())
    }

    async fn get_unverified_journeys(&self) -> Result<Vec<LabeledJourney>, StoreError> {
        Ok(self.newest_first(usize::MAX, |j| !j.is_verified).await)
    }

    async fn get_verified_journeys_for_export(
        &self,
        limit: usize,
    ) -> Result<Vec<LabeledJourney>, StoreError> {
        Ok(self.newest_first(limit, |j| j.is_verified).await)
    }

    async fn get_journeys_for_export(
        &self,
        limit: usize,
    ) -> Result<Vec<LabeledJourney>, StoreError> {
        Ok(self.newest_first(limit, |_| true).await)
    }

    async fn get_total_count(&self) -> Result<u32, StoreError> {
        let state = self.state.read().await;
        Ok(saturating_count(state.journeys.len()))
    }

    async fn get_verified_count(&self) -> Result<u32, StoreError> {
        let state = self.state.read().await;
        Ok(saturating_count(state.journeys.iter().filter(|j| j.is_verified).count()))
    }

    async fn get_count_by_transport_mode(&self, mode: &TransportMode) -> Result<u32, StoreError> {
        let state = self.state.read().await;
        Ok(saturating_count(
            state.journeys.iter().filter(|j| &j.transport_mode == mode).count(),
        ))
    }

    async fn get_transport_mode_distribution(&self) -> Result<Vec<ModeCount>, StoreError> {
        let state = self.state.read().await;
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for journey in &state.journeys {
            *counts.entry(journey.transport_mode.to_string()).or_default() += 1;
        }

        let mut distribution: Vec<ModeCount> = counts
            .into_iter()
            .map(|(mode, count)| ModeCount {
                transport_mode: TransportMode::from(mode),
                count: saturating_count(count),
            })
            .collect();
        // Stable sort keeps ties in label order
        distribution.sort_by_key(|row| Reverse(row.count));
        Ok(distribution)
    }

    async fn get_label_source_distribution(&self) -> Result<Vec<SourceCount>, StoreError> {
        let state = self.state.read().await;
        let sources = [LabelSource::AutoSnap, LabelSource::Manual, LabelSource::Verified];

        Ok(sources
            .into_iter()
            .map(|source| SourceCount {
                label_source: source,
                count: saturating_count(
                    state.journeys.iter().filter(|j| j.label_source == source).count(),
                ),
            })
            .filter(|row| row.count > 0)
            .collect())
    }

    async fn get_average_speed_for_mode(
        &self,
        mode: &TransportMode,
    ) -> Result<Option<f64>, StoreError> {
        let state = self.state.read().await;
        let speeds: Vec<f64> = state
            .journeys
            .iter()
            .filter(|j| &j.transport_mode == mode)
            .map(|j| j.avg_speed)
            .collect();

        if speeds.is_empty() {
            return Ok(None);
        }
        Ok(Some(speeds.iter().sum::<f64>() / speeds.len() as f64))
    }
}
