use std::collections::HashMap;

use crate::draft::ranking::ScoredCard;
use crate::model::card::HeroId;
use crate::projection::estimator::ScoreAlgorithm;

/// Memoized per-hero projections, keyed by hero and algorithm.
///
/// Owned by one session. The session drops the whole cache when the pool
/// changes; entries are never refreshed in place.
#[derive(Debug, Clone, Default)]
pub struct ScoreCache {
    entries: HashMap<HeroId, HashMap<ScoreAlgorithm, f64>>,
    hits: u64,
    misses: u64,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&mut self, hero: &HeroId, algorithm: ScoreAlgorithm) -> Option<f64> {
        let found = self
            .entries
            .get(hero)
            .and_then(|by_algorithm| by_algorithm.get(&algorithm))
            .copied();
        match found {
            Some(_) => self.hits += 1,
            None => self.misses += 1,
        }
        found
    }

    pub fn store(&mut self, hero: HeroId, algorithm: ScoreAlgorithm, score: f64) {
        self.entries.entry(hero).or_default().insert(algorithm, score);
    }

    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lifetime hit count for this session, kept across invalidations.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

/// The most recent ranked candidate list, reusable while the
/// configuration fingerprint and pool size both match.
#[derive(Debug, Clone, Default)]
pub struct CandidateCache {
    entry: Option<CandidateEntry>,
}

#[derive(Debug, Clone)]
struct CandidateEntry {
    fingerprint: u64,
    pool_len: usize,
    candidates: Vec<ScoredCard>,
}

impl CandidateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, fingerprint: u64, pool_len: usize) -> Option<&[ScoredCard]> {
        self.entry.as_ref().and_then(|entry| {
            (entry.fingerprint == fingerprint && entry.pool_len == pool_len)
                .then_some(entry.candidates.as_slice())
        })
    }

    pub fn store(&mut self, fingerprint: u64, pool_len: usize, candidates: Vec<ScoredCard>) {
        self.entry = Some(CandidateEntry {
            fingerprint,
            pool_len,
            candidates,
        });
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{CandidateCache, ScoreCache};
    use crate::draft::ranking::ScoredCard;
    use crate::model::card::{CardId, HeroCard, HeroId};
    use crate::projection::estimator::ScoreAlgorithm;

    #[test]
    fn score_cache_hits_after_store() {
        let mut cache = ScoreCache::new();
        let hero = HeroId::new("nova");
        assert_eq!(cache.lookup(&hero, ScoreAlgorithm::Recent4), None);
        cache.store(hero.clone(), ScoreAlgorithm::Recent4, 7.5);
        assert_eq!(cache.lookup(&hero, ScoreAlgorithm::Recent4), Some(7.5));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn score_cache_separates_algorithms() {
        let mut cache = ScoreCache::new();
        let hero = HeroId::new("nova");
        cache.store(hero.clone(), ScoreAlgorithm::Recent4, 7.5);
        cache.store(hero.clone(), ScoreAlgorithm::ConsistencyFloor, 2.0);
        assert_eq!(cache.len(), 2);
        assert_eq!(
            cache.lookup(&hero, ScoreAlgorithm::ConsistencyFloor),
            Some(2.0)
        );
    }

    #[test]
    fn score_cache_invalidate_empties_entries() {
        let mut cache = ScoreCache::new();
        cache.store(HeroId::new("nova"), ScoreAlgorithm::Recent4, 7.5);
        cache.invalidate();
        assert!(cache.is_empty());
        assert_eq!(cache.lookup(&HeroId::new("nova"), ScoreAlgorithm::Recent4), None);
    }

    #[test]
    fn candidate_cache_requires_matching_fingerprint_and_pool() {
        let mut cache = CandidateCache::new();
        let candidates = vec![ScoredCard::new(
            HeroCard::new(CardId::new(1), HeroId::new("nova"), 2),
            6.0,
        )];
        cache.store(42, 10, candidates);
        assert!(cache.lookup(42, 10).is_some());
        assert!(cache.lookup(42, 11).is_none());
        assert!(cache.lookup(43, 10).is_none());
        cache.invalidate();
        assert!(cache.lookup(42, 10).is_none());
        assert!(cache.is_empty());
    }
}
