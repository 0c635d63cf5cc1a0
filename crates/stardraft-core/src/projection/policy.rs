use core::fmt;
use std::collections::HashMap;

use crate::model::card::{HeroCard, HeroId};

/// Per-hero scoring rule consulted before overrides and history.
///
/// Returning `Some` replaces every other scoring path for that card;
/// returning `None` defers to the standard resolution.
pub trait ScorePolicy: Send {
    fn project(&self, card: &HeroCard, override_score: Option<f64>) -> Option<f64>;
}

/// Scores a hero only when fielded at exactly one star.
///
/// At one star the card is worth its override, or the configured fallback
/// when no override exists. At any other cost it scores 0 no matter what
/// the override says.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OneStarOnlyPolicy {
    fallback_score: f64,
}

impl OneStarOnlyPolicy {
    pub const fn new(fallback_score: f64) -> Self {
        OneStarOnlyPolicy { fallback_score }
    }
}

impl ScorePolicy for OneStarOnlyPolicy {
    fn project(&self, card: &HeroCard, override_score: Option<f64>) -> Option<f64> {
        if card.stars == 1 {
            Some(override_score.unwrap_or(self.fallback_score))
        } else {
            Some(0.0)
        }
    }
}

/// Per-hero policy registry owned by a session.
#[derive(Default)]
pub struct ScorePolicies {
    by_hero: HashMap<HeroId, Box<dyn ScorePolicy>>,
}

impl ScorePolicies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&mut self, hero: HeroId, policy: Box<dyn ScorePolicy>) {
        self.by_hero.insert(hero, policy);
    }

    pub fn get(&self, hero: &HeroId) -> Option<&dyn ScorePolicy> {
        self.by_hero.get(hero).map(|policy| policy.as_ref())
    }

    pub fn len(&self) -> usize {
        self.by_hero.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hero.is_empty()
    }
}

impl fmt::Debug for ScorePolicies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScorePolicies")
            .field("heroes", &self.by_hero.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{OneStarOnlyPolicy, ScorePolicies, ScorePolicy};
    use crate::model::card::{CardId, HeroCard, HeroId};

    fn specialist(stars: u8) -> HeroCard {
        HeroCard::new(CardId::new(1), HeroId::new("warden"), stars)
    }

    #[test]
    fn one_star_uses_override() {
        let policy = OneStarOnlyPolicy::new(25.0);
        assert_eq!(policy.project(&specialist(1), Some(40.0)), Some(40.0));
    }

    #[test]
    fn one_star_falls_back_without_override() {
        let policy = OneStarOnlyPolicy::new(25.0);
        assert_eq!(policy.project(&specialist(1), None), Some(25.0));
    }

    #[test]
    fn other_costs_score_zero_even_with_override() {
        let policy = OneStarOnlyPolicy::new(25.0);
        assert_eq!(policy.project(&specialist(2), Some(40.0)), Some(0.0));
        assert_eq!(policy.project(&specialist(5), None), Some(0.0));
    }

    #[test]
    fn registry_resolves_by_hero() {
        let mut policies = ScorePolicies::new();
        policies.install(HeroId::new("warden"), Box::new(OneStarOnlyPolicy::new(25.0)));
        assert!(policies.get(&HeroId::new("warden")).is_some());
        assert!(policies.get(&HeroId::new("nova")).is_none());
        assert_eq!(policies.len(), 1);
    }
}
