use core::fmt;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::card::{HeroCard, HeroId};
use crate::model::history::ScoreHistory;
use crate::projection::policy::ScorePolicies;

/// Smoothing factor for the default projection.
pub const SMOOTHING_ALPHA: f64 = 0.3;

const RECENT_SHORT_WINDOW: usize = 4;
const RECENT_LONG_WINDOW: usize = 6;
const PROJECTION_WEIGHTS: [f64; 5] = [0.3, 0.2, 0.175, 0.15, 0.125];

/// Selectable projection over a hero's observation series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreAlgorithm {
    /// Mean of the four most recent observations.
    Recent4,
    /// Mean of the six most recent observations.
    Recent6,
    /// Mean of the six most recent observations after dropping the single
    /// highest, so one spike week does not inflate the projection.
    Recent6TrimOutlier,
    /// Fixed-weight mean of the five most recent observations.
    Weighted,
    /// Worst of the six most recent observations.
    ConsistencyFloor,
    /// Median of the six most recent observations.
    ConsistencyMedian,
    /// Exponential smoothing over the whole series, alpha 0.3.
    ExponentialSmoothing,
}

impl ScoreAlgorithm {
    pub const ALL: [ScoreAlgorithm; 7] = [
        ScoreAlgorithm::Recent4,
        ScoreAlgorithm::Recent6,
        ScoreAlgorithm::Recent6TrimOutlier,
        ScoreAlgorithm::Weighted,
        ScoreAlgorithm::ConsistencyFloor,
        ScoreAlgorithm::ConsistencyMedian,
        ScoreAlgorithm::ExponentialSmoothing,
    ];

    /// Parses a textual algorithm id. Unknown ids fall back to
    /// [`ScoreAlgorithm::ExponentialSmoothing`] so a stale stored
    /// configuration still produces a draft.
    pub fn from_id(id: &str) -> ScoreAlgorithm {
        match id.trim().to_ascii_lowercase().as_str() {
            "recent4" => ScoreAlgorithm::Recent4,
            "recent6" => ScoreAlgorithm::Recent6,
            "recent6_trim_outlier" | "recent6exclude1" => ScoreAlgorithm::Recent6TrimOutlier,
            "weighted" => ScoreAlgorithm::Weighted,
            "consistency_floor" => ScoreAlgorithm::ConsistencyFloor,
            "consistency_median" => ScoreAlgorithm::ConsistencyMedian,
            _ => ScoreAlgorithm::ExponentialSmoothing,
        }
    }

    pub const fn id(self) -> &'static str {
        match self {
            ScoreAlgorithm::Recent4 => "recent4",
            ScoreAlgorithm::Recent6 => "recent6",
            ScoreAlgorithm::Recent6TrimOutlier => "recent6_trim_outlier",
            ScoreAlgorithm::Weighted => "weighted",
            ScoreAlgorithm::ConsistencyFloor => "consistency_floor",
            ScoreAlgorithm::ConsistencyMedian => "consistency_median",
            ScoreAlgorithm::ExponentialSmoothing => "exponential_smoothing",
        }
    }
}

impl Default for ScoreAlgorithm {
    fn default() -> Self {
        ScoreAlgorithm::ExponentialSmoothing
    }
}

impl fmt::Display for ScoreAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Projects a single score from an observation series, most recent first.
/// An empty series projects 0.
pub fn estimate(series: &[f64], algorithm: ScoreAlgorithm) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    match algorithm {
        ScoreAlgorithm::Recent4 => recent_mean(series, RECENT_SHORT_WINDOW),
        ScoreAlgorithm::Recent6 => recent_mean(series, RECENT_LONG_WINDOW),
        ScoreAlgorithm::Recent6TrimOutlier => trimmed_mean(series, RECENT_LONG_WINDOW, 1),
        ScoreAlgorithm::Weighted => weighted_recent(series),
        ScoreAlgorithm::ConsistencyFloor => floor_of_recent(series, RECENT_LONG_WINDOW),
        ScoreAlgorithm::ConsistencyMedian => median_of_recent(series, RECENT_LONG_WINDOW),
        ScoreAlgorithm::ExponentialSmoothing => exponential_smoothing(series, SMOOTHING_ALPHA),
    }
}

/// Everything card scoring needs for one optimization pass.
pub struct ProjectionInput<'a> {
    pub history: &'a ScoreHistory,
    pub overrides: &'a HashMap<HeroId, f64>,
    pub policies: &'a ScorePolicies,
    pub algorithm: ScoreAlgorithm,
}

/// Projects one card. Resolution order: per-hero policy, pinned card
/// override, configured hero override, then the selected algorithm over
/// the hero's history.
pub fn project_card(input: &ProjectionInput<'_>, card: &HeroCard) -> f64 {
    resolve_card_score(card, input.policies, input.overrides, || {
        estimate(input.history.series(&card.hero), input.algorithm)
    })
}

/// The one resolution chain behind [`project_card`] and session scoring.
/// `fallback` supplies the history projection and runs only when no
/// policy or override claims the card.
pub(crate) fn resolve_card_score<F>(
    card: &HeroCard,
    policies: &ScorePolicies,
    overrides: &HashMap<HeroId, f64>,
    fallback: F,
) -> f64
where
    F: FnOnce() -> f64,
{
    let override_score = card
        .override_score
        .or_else(|| overrides.get(&card.hero).copied());
    if let Some(policy) = policies.get(&card.hero)
        && let Some(score) = policy.project(card, override_score)
    {
        return score;
    }
    if let Some(score) = override_score {
        return score;
    }
    fallback()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn recent_mean(series: &[f64], window: usize) -> f64 {
    mean(&series[..series.len().min(window)])
}

/// Mean of the first `window` observations after dropping `exclude`
/// outliers: `exclude / 2` (rounded down) from the low end, the rest from
/// the high end. Excluding one therefore removes only the single highest
/// value. The asymmetry for odd counts is intentional and relied on by
/// callers. Falls back to the plain mean when nothing would remain.
fn trimmed_mean(series: &[f64], window: usize, exclude: usize) -> f64 {
    let take = &series[..series.len().min(window)];
    if take.len() <= 1 || take.len() <= exclude {
        return mean(take);
    }
    let mut sorted = take.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let low = exclude / 2;
    let high = exclude - low;
    mean(&sorted[low..sorted.len() - high])
}

/// Fixed-weight mean over up to five observations. With fewer than five,
/// only the matching weights contribute to the denominator, so short
/// series are not dragged toward zero.
fn weighted_recent(series: &[f64]) -> f64 {
    let mut weighted = 0.0;
    let mut applied = 0.0;
    for (value, weight) in series.iter().zip(PROJECTION_WEIGHTS.iter()) {
        weighted += value * weight;
        applied += weight;
    }
    if applied == 0.0 {
        return 0.0;
    }
    weighted / applied
}

fn floor_of_recent(series: &[f64], window: usize) -> f64 {
    series[..series.len().min(window)]
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min)
}

fn median_of_recent(series: &[f64], window: usize) -> f64 {
    let take = &series[..series.len().min(window)];
    let mut sorted = take.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// S1 is the most recent observation; each older observation folds in as
/// `alpha * x + (1 - alpha) * s`. The final smoothed value is returned.
fn exponential_smoothing(series: &[f64], alpha: f64) -> f64 {
    let mut smoothed = match series.first() {
        Some(first) => *first,
        None => return 0.0,
    };
    for value in &series[1..] {
        smoothed = alpha * value + (1.0 - alpha) * smoothed;
    }
    smoothed
}
