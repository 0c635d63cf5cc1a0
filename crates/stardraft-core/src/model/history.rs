use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::card::HeroId;

/// Longest series kept per hero. No algorithm looks past this window, so
/// older observations are dropped on insert.
pub const MAX_SERIES_LEN: usize = 53;

/// Per-hero history of numeric observations, most recent first.
///
/// Built from the external data feed once per optimization request and
/// treated as immutable input while scoring runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreHistory {
    series: HashMap<HeroId, Vec<f64>>,
}

impl ScoreHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a full series for `hero`, most recent observation first.
    /// Series longer than [`MAX_SERIES_LEN`] are truncated.
    pub fn insert(&mut self, hero: HeroId, mut observations: Vec<f64>) {
        observations.truncate(MAX_SERIES_LEN);
        self.series.insert(hero, observations);
    }

    /// Prepends one fresh observation to a hero's series.
    pub fn record(&mut self, hero: HeroId, observation: f64) {
        let entry = self.series.entry(hero).or_default();
        entry.insert(0, observation);
        entry.truncate(MAX_SERIES_LEN);
    }

    /// The hero's observations, most recent first. Unknown heroes read as
    /// an empty series.
    pub fn series(&self, hero: &HeroId) -> &[f64] {
        self.series.get(hero).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn heroes(&self) -> impl Iterator<Item = &HeroId> {
        self.series.keys()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
