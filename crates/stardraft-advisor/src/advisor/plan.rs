use tracing::{Level, event};

use crate::advisor::AdvisorContext;
use stardraft_core::draft::{DraftConfig, DraftError};
use stardraft_core::model::DraftSelection;
use stardraft_core::projection::ScoreAlgorithm;
use stardraft_core::session::DraftSession;

/// One answered draft request: the picked cards plus how the request was
/// interpreted.
#[derive(Debug, Clone)]
pub struct DraftPlan {
    pub selection: DraftSelection,
    pub algorithm: ScoreAlgorithm,
    /// Stars left unspent under the requested budget.
    pub budget_slack: u32,
}

pub struct DraftPlanner;

impl DraftPlanner {
    pub fn recommend(
        session: &mut DraftSession,
        ctx: &AdvisorContext<'_>,
    ) -> Result<DraftPlan, DraftError> {
        let config = config_for(ctx);
        match session.optimize(ctx.pool, ctx.history, &config) {
            Ok(selection) => {
                let plan = DraftPlan {
                    budget_slack: config.star_budget - selection.total_stars(),
                    algorithm: config.algorithm,
                    selection,
                };
                log_draft_decision(
                    ctx,
                    &config,
                    &plan,
                    session.score_cache_len(),
                    session.score_cache_hits(),
                );
                Ok(plan)
            }
            Err(error) => {
                tracing::warn!(
                    target: "stardraft_advisor::draft_decision",
                    deck_size = ctx.deck_size,
                    star_budget = ctx.star_budget,
                    profile = ?ctx.profile,
                    pool_size = ctx.pool.len(),
                    reason = %error,
                    message = "no draft available for request"
                );
                Err(error)
            }
        }
    }
}

fn config_for(ctx: &AdvisorContext<'_>) -> DraftConfig {
    let mut config = DraftConfig::new(ctx.deck_size, ctx.star_budget);
    config.algorithm = ctx.profile.algorithm();
    config.bucket_cap = ctx.features.bucket_cap();
    if ctx.features.strict_budget() {
        config.max_relaxation = 0;
    }
    config
}

fn log_draft_decision(
    ctx: &AdvisorContext<'_>,
    config: &DraftConfig,
    plan: &DraftPlan,
    cached_scores: usize,
    cache_hits: u64,
) {
    if !tracing::enabled!(Level::INFO) || !draft_logging_enabled() {
        return;
    }

    let picked: Vec<String> = plan
        .selection
        .cards()
        .iter()
        .map(|card| format!("{card}"))
        .collect();

    event!(
        target: "stardraft_advisor::draft_decision",
        Level::INFO,
        profile = ?ctx.profile,
        algorithm = %plan.algorithm,
        deck_size = ctx.deck_size,
        star_budget = ctx.star_budget,
        bucket_cap = config.bucket_cap,
        strict_budget = ctx.features.strict_budget(),
        max_relaxation = config.max_relaxation,
        pool_size = ctx.pool.len(),
        cards = ?picked,
        total_stars = plan.selection.total_stars(),
        total_score = plan.selection.total_score(),
        budget_slack = plan.budget_slack,
        cached_scores,
        cache_hits,
    );
}

fn draft_logging_enabled() -> bool {
    std::env::var("STARDRAFT_DRAFT_DETAILS")
        .map(|raw| matches!(raw.trim(), "1" | "true" | "TRUE" | "on" | "ON"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::DraftPlanner;
    use crate::advisor::{AdvisorContext, AdvisorFeatures, AdvisorProfile};
    use stardraft_core::draft::DraftError;
    use stardraft_core::model::{CardId, CardPool, HeroCard, HeroId, ScoreHistory};
    use stardraft_core::projection::ScoreAlgorithm;
    use stardraft_core::session::DraftSession;
    use std::sync::Mutex;

    static DRAFT_ENV_GUARD: Mutex<()> = Mutex::new(());

    fn build_pool(cards: &[(u8, f64)]) -> (CardPool, ScoreHistory) {
        let mut history = ScoreHistory::new();
        let cards = cards
            .iter()
            .enumerate()
            .map(|(index, &(cost, score))| {
                let hero = HeroId::new(format!("hero{index:02}"));
                history.insert(hero.clone(), vec![score]);
                HeroCard::new(CardId::new(index as u32), hero, cost)
            })
            .collect();
        (CardPool::with_cards(cards), history)
    }

    #[test]
    fn recommend_blends_profile_into_the_draft() {
        let (pool, history) = build_pool(&[(2, 10.0), (2, 10.0), (4, 10.0)]);
        let ctx = AdvisorContext::new(
            &pool,
            &history,
            3,
            9,
            AdvisorProfile::Steady,
            AdvisorFeatures::default(),
        );
        let mut session = DraftSession::new();

        let plan = DraftPlanner::recommend(&mut session, &ctx).expect("draft should exist");
        assert_eq!(plan.algorithm, ScoreAlgorithm::ConsistencyMedian);
        // 2 + 2 + 4 = 8 stars; the exact nine is unreachable.
        assert_eq!(plan.selection.total_stars(), 8);
        assert_eq!(plan.budget_slack, 1);
    }

    #[test]
    fn strict_budget_turns_relaxation_off() {
        let cards = [(2, 12.0), (2, 12.0), (2, 12.0), (4, 10.0), (4, 10.0)];
        let (pool, history) = build_pool(&cards);
        let mut session = DraftSession::new();

        // Relaxation walks the budget down to eight, where the best draft
        // is two cheap cards plus one heavy one.
        let relaxed_ctx = AdvisorContext::new(
            &pool,
            &history,
            3,
            9,
            AdvisorProfile::Balanced,
            AdvisorFeatures::default(),
        );
        let relaxed =
            DraftPlanner::recommend(&mut session, &relaxed_ctx).expect("relaxed draft");
        assert_eq!(relaxed.selection.total_stars(), 8);
        assert_eq!(relaxed.selection.total_score(), 34.0);

        // With relaxation off the exact nine fails outright and the greedy
        // rescue stacks the three highest scorers instead.
        let strict_ctx = AdvisorContext::new(
            &pool,
            &history,
            3,
            9,
            AdvisorProfile::Balanced,
            AdvisorFeatures::new(true, 5),
        );
        let strict = DraftPlanner::recommend(&mut session, &strict_ctx).expect("greedy rescue");
        assert_eq!(strict.selection.total_stars(), 6);
        assert_eq!(strict.selection.total_score(), 36.0);
        assert_eq!(strict.budget_slack, 3);
    }

    #[test]
    fn recommend_surfaces_draft_failures() {
        let pool = CardPool::new();
        let history = ScoreHistory::new();
        let ctx = AdvisorContext::new(
            &pool,
            &history,
            3,
            9,
            AdvisorProfile::Balanced,
            AdvisorFeatures::default(),
        );
        let mut session = DraftSession::new();

        let error = DraftPlanner::recommend(&mut session, &ctx)
            .expect_err("empty pool cannot produce a draft");
        assert!(matches!(error, DraftError::EmptyPool));
    }

    #[test]
    fn draft_logging_disabled_without_env() {
        let _guard = DRAFT_ENV_GUARD.lock().unwrap();
        unsafe {
            std::env::remove_var("STARDRAFT_DRAFT_DETAILS");
        }
        assert!(!super::draft_logging_enabled());
    }

    #[test]
    fn draft_logging_enabled_with_env_flag() {
        let _guard = DRAFT_ENV_GUARD.lock().unwrap();
        unsafe {
            std::env::set_var("STARDRAFT_DRAFT_DETAILS", "true");
        }
        assert!(super::draft_logging_enabled());
        unsafe {
            std::env::remove_var("STARDRAFT_DRAFT_DETAILS");
        }
    }
}
