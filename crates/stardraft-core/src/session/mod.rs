pub mod snapshot;

pub use snapshot::DraftSnapshot;

use crate::draft::cache::{CandidateCache, ScoreCache};
use crate::draft::ranking::{ScoredCard, rank_and_prune};
use crate::draft::solver::{ExactSolver, SolvedDraft, greedy_fill};
use crate::draft::{DraftConfig, DraftError, validate_selection};
use crate::model::card::{HeroCard, HeroId};
use crate::model::history::ScoreHistory;
use crate::model::pool::CardPool;
use crate::model::selection::DraftSelection;
use crate::projection::estimator::{ScoreAlgorithm, estimate, resolve_card_score};
use crate::projection::policy::{ScorePolicies, ScorePolicy};

/// One caller's optimization context: the caches and scoring policies
/// that live across repeated drafts.
///
/// Sessions never lock; callers wanting parallel drafts run one session
/// each and keep every call on a single thread.
#[derive(Debug, Default)]
pub struct DraftSession {
    score_cache: ScoreCache,
    candidate_cache: CandidateCache,
    policies: ScorePolicies,
    last_pool_len: Option<usize>,
}

impl DraftSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policies(policies: ScorePolicies) -> Self {
        DraftSession {
            policies,
            ..Default::default()
        }
    }

    /// Registers a scoring rule for a hero. Candidate lists built before
    /// the rule existed no longer apply, so that cache drops; raw
    /// history projections stay valid.
    pub fn install_policy(&mut self, hero: HeroId, policy: Box<dyn ScorePolicy>) {
        self.policies.install(hero, policy);
        self.candidate_cache.invalidate();
    }

    /// Invalidation hook for external changes the session cannot see,
    /// e.g. a refreshed history feed or a pool edit that kept the length.
    pub fn clear_caches(&mut self) {
        self.score_cache.invalidate();
        self.candidate_cache.invalidate();
        self.last_pool_len = None;
    }

    /// Cached single-hero projection, for callers that surface per-hero
    /// scores outside a full draft.
    pub fn estimate(
        &mut self,
        hero: &HeroId,
        history: &ScoreHistory,
        algorithm: ScoreAlgorithm,
    ) -> f64 {
        cached_estimate(&mut self.score_cache, hero, history, algorithm)
    }

    /// Builds the best draft for the pool under the given configuration.
    ///
    /// Every card is scored (policy, then overrides, then the configured
    /// projection), the pool is ranked and pruned, and the search runs
    /// the exact budget first, relaxed budgets one star at a time, then
    /// the greedy fill. Whatever survives is validated against the hard
    /// ceiling before it is returned.
    pub fn optimize(
        &mut self,
        pool: &CardPool,
        history: &ScoreHistory,
        config: &DraftConfig,
    ) -> Result<DraftSelection, DraftError> {
        if config.deck_size == 0 || config.star_budget == 0 {
            return Err(DraftError::InvalidTargets {
                deck_size: config.deck_size,
                star_budget: config.star_budget,
            });
        }
        if pool.is_empty() {
            return Err(DraftError::EmptyPool);
        }
        self.refresh_for_pool(pool.len());

        let fingerprint = config.fingerprint();
        let candidates = match self.candidate_cache.lookup(fingerprint, pool.len()) {
            Some(cached) => cached.to_vec(),
            None => {
                let ranked = self.build_candidates(pool, history, config);
                self.candidate_cache
                    .store(fingerprint, pool.len(), ranked.clone());
                ranked
            }
        };
        if candidates.is_empty() {
            return Err(DraftError::EmptyPool);
        }

        let solved = run_exact(&candidates, config)
            .or_else(|| {
                greedy_fill(
                    &candidates,
                    config.star_budget,
                    config.deck_size,
                    config.greedy_pool,
                )
            })
            .ok_or(DraftError::NoCombination {
                deck_size: config.deck_size,
                star_budget: config.star_budget,
            })?;

        let selection = assemble(&candidates, &solved);
        validate_selection(&selection, config)?;
        Ok(selection)
    }

    pub fn score_cache_len(&self) -> usize {
        self.score_cache.len()
    }

    pub fn score_cache_hits(&self) -> u64 {
        self.score_cache.hits()
    }

    pub fn candidate_cache_warm(&self) -> bool {
        !self.candidate_cache.is_empty()
    }

    /// Pool length is the staleness signal: any change drops both caches.
    fn refresh_for_pool(&mut self, pool_len: usize) {
        match self.last_pool_len {
            Some(known) if known == pool_len => {}
            Some(_) => {
                self.score_cache.invalidate();
                self.candidate_cache.invalidate();
                self.last_pool_len = Some(pool_len);
            }
            None => self.last_pool_len = Some(pool_len),
        }
    }

    fn build_candidates(
        &mut self,
        pool: &CardPool,
        history: &ScoreHistory,
        config: &DraftConfig,
    ) -> Vec<ScoredCard> {
        let mut scored = Vec::with_capacity(pool.len());
        for card in pool.iter() {
            let score = self.score_card(card, history, config);
            scored.push(ScoredCard::new(card.clone(), score));
        }
        rank_and_prune(scored, config.bucket_cap)
    }

    /// Scores one card through the same resolution chain as
    /// [`project_card`], with the history projection served from the
    /// session cache.
    ///
    /// [`project_card`]: crate::projection::estimator::project_card
    fn score_card(&mut self, card: &HeroCard, history: &ScoreHistory, config: &DraftConfig) -> f64 {
        let cache = &mut self.score_cache;
        resolve_card_score(card, &self.policies, &config.overrides, || {
            cached_estimate(cache, &card.hero, history, config.algorithm)
        })
    }
}

/// Cache-through projection shared by [`DraftSession::estimate`] and
/// draft scoring.
fn cached_estimate(
    cache: &mut ScoreCache,
    hero: &HeroId,
    history: &ScoreHistory,
    algorithm: ScoreAlgorithm,
) -> f64 {
    if let Some(score) = cache.lookup(hero, algorithm) {
        return score;
    }
    let score = estimate(history.series(hero), algorithm);
    cache.store(hero.clone(), algorithm, score);
    score
}

/// Exact search at the full budget, then at most `max_relaxation`
/// single-star retreats, all sharing one memo. Any hit is checked
/// against the original ceiling before it is accepted.
fn run_exact(candidates: &[ScoredCard], config: &DraftConfig) -> Option<SolvedDraft> {
    let mut solver = ExactSolver::new(candidates, config.deck_size);
    let floor = config.star_budget.saturating_sub(config.max_relaxation);
    let mut target = config.star_budget;
    loop {
        if let Some(solved) = solver.solve(target, config.deck_size) {
            let spent: u32 = solved
                .indices
                .iter()
                .map(|&index| candidates[index].card.cost())
                .sum();
            if spent <= config.star_budget {
                return Some(solved);
            }
        }
        if target == floor {
            return None;
        }
        target -= 1;
    }
}

fn assemble(candidates: &[ScoredCard], solved: &SolvedDraft) -> DraftSelection {
    let cards = solved
        .indices
        .iter()
        .map(|&index| candidates[index].card.clone())
        .collect();
    DraftSelection::new(cards, solved.total_score)
}
