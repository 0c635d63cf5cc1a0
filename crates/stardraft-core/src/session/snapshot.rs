use serde::{Deserialize, Serialize};

use crate::draft::DraftConfig;
use crate::model::card::HeroCard;
use crate::model::selection::DraftSelection;
use crate::projection::estimator::ScoreAlgorithm;

/// Serializable record of an accepted draft, handed to external storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftSnapshot {
    pub algorithm: String,
    pub config_fingerprint: u64,
    pub cards: Vec<HeroCard>,
    pub total_stars: u32,
    pub total_score: f64,
}

impl DraftSnapshot {
    pub fn capture(selection: &DraftSelection, config: &DraftConfig) -> Self {
        DraftSnapshot {
            algorithm: config.algorithm.id().to_string(),
            config_fingerprint: config.fingerprint(),
            cards: selection.cards().to_vec(),
            total_stars: selection.total_stars(),
            total_score: selection.total_score(),
        }
    }

    /// Rebuilds the selection. The star total is recomputed from the
    /// cards; the score is carried from capture time because history is
    /// not part of the payload.
    pub fn restore(self) -> DraftSelection {
        DraftSelection::new(self.cards, self.total_score)
    }

    /// Algorithm recorded at capture time. Ids written by other builds
    /// parse with the usual smoothing fallback.
    pub fn algorithm(&self) -> ScoreAlgorithm {
        ScoreAlgorithm::from_id(&self.algorithm)
    }

    pub fn to_json(selection: &DraftSelection, config: &DraftConfig) -> serde_json::Result<String> {
        let snapshot = Self::capture(selection, config);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
