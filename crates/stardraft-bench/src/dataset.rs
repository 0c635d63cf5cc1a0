use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use stardraft_core::model::{CardId, CardPool, HeroCard, HeroId, ScoreHistory};

use crate::config::DatasetConfig;

/// One synthetic draft scenario: a card pool plus the score history
/// backing it.
#[derive(Debug, Clone)]
pub struct TrialDataset {
    pub pool: CardPool,
    pub history: ScoreHistory,
}

/// Generate a deterministic dataset for one trial. The same seed and
/// config always produce the same pool and history.
pub fn generate(seed: u64, config: &DatasetConfig) -> TrialDataset {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut history = ScoreHistory::new();
    let mut roster = Vec::with_capacity(config.heroes);
    for index in 0..config.heroes {
        let hero = HeroId::new(format!("hero{index:03}"));
        // A few heroes have no track record at all; the projections must
        // cope with an empty series.
        if rng.gen_ratio(1, 12) {
            history.insert(hero.clone(), Vec::new());
        } else {
            let base: f64 = rng.gen_range(5.0..60.0);
            let weeks = (0..config.history_weeks)
                .map(|_| (base + rng.gen_range(-8.0..8.0)).max(0.0))
                .collect();
            history.insert(hero.clone(), weeks);
        }
        roster.push(hero);
    }

    let mut cards = Vec::with_capacity(config.pool_size);
    for index in 0..config.pool_size {
        let hero = roster[rng.gen_range(0..roster.len())].clone();
        let stars = rng.gen_range(1..=5);
        let mut card = HeroCard::new(CardId::new(index as u32), hero, stars);
        if rng.gen_ratio(1, 20) {
            card = card.with_override(rng.gen_range(10.0..80.0));
        }
        cards.push(card);
    }

    TrialDataset {
        pool: CardPool::with_cards(cards),
        history,
    }
}
