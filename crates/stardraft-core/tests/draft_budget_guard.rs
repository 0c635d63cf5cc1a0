use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use stardraft_core::draft::DraftConfig;
use stardraft_core::model::{CardId, CardPool, HeroCard, HeroId, ScoreHistory};
use stardraft_core::session::DraftSession;

fn pool_card(id: u32, stars: u8) -> HeroCard {
    HeroCard::new(CardId::new(id), HeroId::new(format!("hero{id:02}")), stars)
}

/// Best achievable score over every subset of exactly `picks` cards whose
/// costs sum to exactly `star_budget`. Exhaustive, for cross-checking the
/// optimizer on small pools.
fn best_exact_score(items: &[(u32, f64)], picks: usize, star_budget: u32) -> Option<f64> {
    let mut best = None;
    walk_subsets(items, 0, picks, i64::from(star_budget), 0.0, &mut best);
    best
}

fn walk_subsets(
    items: &[(u32, f64)],
    index: usize,
    picks_left: usize,
    stars_left: i64,
    score: f64,
    best: &mut Option<f64>,
) {
    if picks_left == 0 {
        if stars_left == 0 && best.is_none_or(|current| score > current) {
            *best = Some(score);
        }
        return;
    }
    if index == items.len() || stars_left < 0 {
        return;
    }
    let (cost, item_score) = items[index];
    walk_subsets(
        items,
        index + 1,
        picks_left - 1,
        stars_left - i64::from(cost),
        score + item_score,
        best,
    );
    walk_subsets(items, index + 1, picks_left, stars_left, score, best);
}

/// Ten cards, two per star cost, five picks, nineteen stars. The optimum
/// is reachable exactly, so the optimizer must land on nineteen and match
/// the brute-force score.
#[test]
fn ten_card_pool_hits_nineteen_exactly() {
    let stars = [1u8, 1, 2, 2, 3, 3, 4, 4, 5, 5];
    let scores = [3.0, 2.0, 7.0, 5.0, 11.0, 9.0, 14.0, 12.0, 17.0, 13.0];
    let cards: Vec<HeroCard> = stars
        .iter()
        .enumerate()
        .map(|(index, &cost)| pool_card(index as u32, cost))
        .collect();
    let mut config = DraftConfig::new(5, 19);
    for (card, score) in cards.iter().zip(scores) {
        config.overrides.insert(card.hero.clone(), score);
    }
    let items: Vec<(u32, f64)> = cards.iter().map(HeroCard::cost).zip(scores).collect();
    let expected =
        best_exact_score(&items, 5, 19).expect("a five-card nineteen-star subset exists");

    let pool = CardPool::with_cards(cards);
    let mut session = DraftSession::new();
    let selection = session
        .optimize(&pool, &ScoreHistory::new(), &config)
        .expect("optimizer should find the exact draft");

    assert_eq!(selection.total_stars(), 19);
    assert_eq!(selection.len(), 5);
    assert_eq!(
        selection.total_score(),
        expected,
        "optimizer score should match the brute-force optimum, got {:?}",
        selection.cards()
    );
}

/// The ceiling holds across every search path, exact, relaxed, or greedy:
/// no accepted draft may ever spend more than the requested budget.
#[test]
fn randomized_drafts_never_breach_the_ceiling() {
    let mut session = DraftSession::new();
    for seed in 0..200u64 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let pool_size = rng.gen_range(6..=14);
        let mut cards = Vec::with_capacity(pool_size);
        let mut config = DraftConfig::default();
        for index in 0..pool_size {
            let card = pool_card(index as u32, rng.gen_range(1..=5));
            config
                .overrides
                .insert(card.hero.clone(), rng.gen_range(1..=100) as f64);
            cards.push(card);
        }
        config.deck_size = rng.gen_range(1..=5);
        config.star_budget = rng.gen_range(config.deck_size..=25);
        let pool = CardPool::with_cards(cards);

        match session.optimize(&pool, &ScoreHistory::new(), &config) {
            Ok(selection) => {
                assert_eq!(
                    selection.len(),
                    config.deck_size as usize,
                    "seed {seed}: wrong deck size"
                );
                assert!(
                    selection.total_stars() <= config.star_budget,
                    "seed {seed}: {} stars spent against a {} budget: {:?}",
                    selection.total_stars(),
                    config.star_budget,
                    selection.cards()
                );
                let ids: HashSet<CardId> = selection.ids().collect();
                assert_eq!(
                    ids.len(),
                    selection.len(),
                    "seed {seed}: duplicate card in {:?}",
                    selection.cards()
                );
            }
            Err(_) => {}
        }
    }
}

/// Whenever some subset lands the budget exactly, the optimizer must do
/// so too, at the brute-force-optimal score.
#[test]
fn exact_budget_wins_whenever_it_is_reachable() {
    let mut session = DraftSession::new();
    for seed in 0..120u64 {
        let mut rng = SmallRng::seed_from_u64(9_000 + seed);
        let pool_size = rng.gen_range(6..=12);
        let mut cards = Vec::with_capacity(pool_size);
        let mut scores = HashMap::new();
        let mut config = DraftConfig::default();
        // An oversized cap keeps pruning out of the picture so the
        // brute-force comparison is apples to apples.
        config.bucket_cap = 99;
        for index in 0..pool_size {
            let card = pool_card(index as u32, rng.gen_range(1..=5));
            let score = rng.gen_range(1..=100) as f64;
            scores.insert(card.hero.clone(), score);
            config.overrides.insert(card.hero.clone(), score);
            cards.push(card);
        }
        config.deck_size = rng.gen_range(2..=4);
        config.star_budget = rng.gen_range(config.deck_size..=20);

        let pool = CardPool::with_cards(cards);
        let items: Vec<(u32, f64)> = pool
            .iter()
            .map(|card| (card.cost(), scores[&card.hero]))
            .collect();
        let Some(expected) = best_exact_score(
            &items,
            config.deck_size as usize,
            config.star_budget,
        ) else {
            continue;
        };

        let selection = session
            .optimize(&pool, &ScoreHistory::new(), &config)
            .unwrap_or_else(|error| {
                panic!("seed {seed}: exact draft exists but optimizer failed: {error}")
            });
        assert_eq!(
            selection.total_stars(),
            config.star_budget,
            "seed {seed}: exact budget was reachable"
        );
        assert_eq!(
            selection.total_score(),
            expected,
            "seed {seed}: optimizer missed the optimum, got {:?}",
            selection.cards()
        );
    }
}

/// When the budget cannot be landed exactly, the draft settles on the
/// nearest reachable total underneath it.
#[test]
fn relaxed_draft_lands_under_the_original_budget() {
    let stars = [2u8, 2, 2, 4, 4];
    let cards: Vec<HeroCard> = stars
        .iter()
        .enumerate()
        .map(|(index, &cost)| pool_card(index as u32, cost))
        .collect();
    let mut config = DraftConfig::new(3, 9);
    for card in &cards {
        config.overrides.insert(card.hero.clone(), 10.0);
    }
    let pool = CardPool::with_cards(cards);
    let mut session = DraftSession::new();

    // Three picks can spend 6, 8, or 10 stars; 9 is unreachable, 10 is
    // over the ceiling, so relaxation settles on 8.
    let selection = session
        .optimize(&pool, &ScoreHistory::new(), &config)
        .expect("relaxed draft should exist");
    assert_eq!(selection.total_stars(), 8);
    assert!(selection.total_stars() <= config.star_budget);
}
