pub mod cache;
pub mod ranking;
pub mod solver;

pub use cache::{CandidateCache, ScoreCache};
pub use ranking::{ScoredCard, rank_and_prune};
pub use solver::{ExactSolver, SolvedDraft, greedy_fill};

use core::fmt;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use crate::model::card::{CardId, HeroId};
use crate::model::selection::DraftSelection;
use crate::projection::estimator::ScoreAlgorithm;

/// Tuning for one optimization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftConfig {
    /// Projection applied to hero histories.
    pub algorithm: ScoreAlgorithm,
    /// Flat per-hero score replacements.
    pub overrides: HashMap<HeroId, f64>,
    /// Number of cards a valid draft must contain.
    pub deck_size: u32,
    /// Star total the draft should hit exactly and must never exceed.
    pub star_budget: u32,
    /// Most efficient cards kept per star bucket before the search.
    pub bucket_cap: usize,
    /// Candidates visible to each greedy fallback slot.
    pub greedy_pool: usize,
    /// How many stars below the budget the exact search may retreat.
    pub max_relaxation: u32,
}

impl DraftConfig {
    pub fn new(deck_size: u32, star_budget: u32) -> Self {
        DraftConfig {
            deck_size,
            star_budget,
            ..Default::default()
        }
    }

    /// Stable digest of every field that shapes the candidate list:
    /// algorithm, overrides, and the bucket cap. A cached list stays
    /// valid only while this digest and the pool size both hold still.
    /// Search targets are deliberately left out; they change per draft
    /// without touching the candidates.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.algorithm.id().hash(&mut hasher);
        self.bucket_cap.hash(&mut hasher);
        let mut overrides: Vec<(&HeroId, f64)> = self
            .overrides
            .iter()
            .map(|(hero, score)| (hero, *score))
            .collect();
        overrides.sort_by(|a, b| a.0.cmp(b.0));
        for (hero, score) in overrides {
            hero.as_str().hash(&mut hasher);
            score.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}

impl Default for DraftConfig {
    fn default() -> Self {
        DraftConfig {
            algorithm: ScoreAlgorithm::default(),
            overrides: HashMap::new(),
            deck_size: 5,
            star_budget: 15,
            bucket_cap: 5,
            greedy_pool: 120,
            max_relaxation: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    /// The pool had no usable cards after filtering.
    EmptyPool,
    /// Degenerate targets that cannot describe a draft.
    InvalidTargets { deck_size: u32, star_budget: u32 },
    /// No combination satisfied the targets under any search strategy.
    NoCombination { deck_size: u32, star_budget: u32 },
    /// A selection spent more stars than the ceiling allows.
    BudgetExceeded { total: u32, budget: u32 },
    /// The assembled selection had the wrong number of cards.
    WrongSize { expected: u32, actual: usize },
    /// The assembled selection repeated a card id.
    DuplicateCard(CardId),
}

impl fmt::Display for DraftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftError::EmptyPool => write!(f, "no scorable cards in the pool"),
            DraftError::InvalidTargets {
                deck_size,
                star_budget,
            } => write!(
                f,
                "unusable draft targets: {deck_size} cards at {star_budget} stars"
            ),
            DraftError::NoCombination {
                deck_size,
                star_budget,
            } => write!(
                f,
                "no combination of {deck_size} cards fits {star_budget} stars"
            ),
            DraftError::BudgetExceeded { total, budget } => write!(
                f,
                "selection spends {total} stars, over the {budget} star ceiling; rejected"
            ),
            DraftError::WrongSize { expected, actual } => {
                write!(f, "selection has {actual} cards, expected {expected}")
            }
            DraftError::DuplicateCard(id) => {
                write!(f, "card {id} appears more than once in the selection")
            }
        }
    }
}

impl std::error::Error for DraftError {}

/// Final gate on an assembled selection: exactly the requested number of
/// cards, no repeated card id, and never over the star ceiling.
pub fn validate_selection(
    selection: &DraftSelection,
    config: &DraftConfig,
) -> Result<(), DraftError> {
    if selection.len() != config.deck_size as usize {
        return Err(DraftError::WrongSize {
            expected: config.deck_size,
            actual: selection.len(),
        });
    }
    let mut seen = HashSet::with_capacity(selection.len());
    for id in selection.ids() {
        if !seen.insert(id) {
            return Err(DraftError::DuplicateCard(id));
        }
    }
    if selection.total_stars() > config.star_budget {
        return Err(DraftError::BudgetExceeded {
            total: selection.total_stars(),
            budget: config.star_budget,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{DraftConfig, DraftError, validate_selection};
    use crate::model::card::{CardId, HeroCard, HeroId};
    use crate::model::selection::DraftSelection;
    use crate::projection::estimator::ScoreAlgorithm;

    fn card(id: u32, stars: u8) -> HeroCard {
        HeroCard::new(CardId::new(id), HeroId::new("hero"), stars)
    }

    #[test]
    fn fingerprint_ignores_override_insertion_order() {
        let mut first = DraftConfig::default();
        first.overrides.insert(HeroId::new("ash"), 10.0);
        first.overrides.insert(HeroId::new("bram"), 20.0);
        let mut second = DraftConfig::default();
        second.overrides.insert(HeroId::new("bram"), 20.0);
        second.overrides.insert(HeroId::new("ash"), 10.0);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn fingerprint_tracks_algorithm_and_overrides() {
        let base = DraftConfig::default();
        let mut other_algorithm = base.clone();
        other_algorithm.algorithm = ScoreAlgorithm::Recent4;
        assert_ne!(base.fingerprint(), other_algorithm.fingerprint());

        let mut with_override = base.clone();
        with_override.overrides.insert(HeroId::new("ash"), 10.0);
        assert_ne!(base.fingerprint(), with_override.fingerprint());
    }

    #[test]
    fn fingerprint_ignores_targets_but_not_the_cap() {
        let base = DraftConfig::default();
        let mut other_targets = base.clone();
        other_targets.deck_size = 9;
        other_targets.star_budget = 40;
        other_targets.greedy_pool = 3;
        other_targets.max_relaxation = 0;
        assert_eq!(base.fingerprint(), other_targets.fingerprint());

        let mut other_cap = base.clone();
        other_cap.bucket_cap = 2;
        assert_ne!(base.fingerprint(), other_cap.fingerprint());
    }

    #[test]
    fn validate_rejects_wrong_size() {
        let config = DraftConfig::new(2, 10);
        let selection = DraftSelection::new(vec![card(1, 3)], 5.0);
        assert_eq!(
            validate_selection(&selection, &config),
            Err(DraftError::WrongSize {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let config = DraftConfig::new(2, 10);
        let selection = DraftSelection::new(vec![card(1, 3), card(1, 3)], 5.0);
        assert_eq!(
            validate_selection(&selection, &config),
            Err(DraftError::DuplicateCard(CardId::new(1)))
        );
    }

    #[test]
    fn validate_rejects_overspend() {
        let config = DraftConfig::new(2, 5);
        let selection = DraftSelection::new(vec![card(1, 3), card(2, 3)], 5.0);
        assert_eq!(
            validate_selection(&selection, &config),
            Err(DraftError::BudgetExceeded {
                total: 6,
                budget: 5
            })
        );
    }

    #[test]
    fn validate_accepts_exact_draft() {
        let config = DraftConfig::new(2, 6);
        let selection = DraftSelection::new(vec![card(1, 3), card(2, 3)], 5.0);
        assert_eq!(validate_selection(&selection, &config), Ok(()));
    }

    #[test]
    fn error_messages_name_the_limits() {
        let message = DraftError::BudgetExceeded {
            total: 21,
            budget: 19,
        }
        .to_string();
        assert!(message.contains("21"));
        assert!(message.contains("19"));
    }
}
