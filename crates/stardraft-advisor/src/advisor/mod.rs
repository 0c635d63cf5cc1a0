mod plan;

pub use plan::{DraftPlan, DraftPlanner};

use stardraft_core::model::{CardPool, ScoreHistory};
use stardraft_core::projection::ScoreAlgorithm;
use std::sync::OnceLock;

/// Risk appetite applied to a draft request. Each profile maps to one of
/// the projection algorithms: a steady profile trusts the median of a
/// longer window, a bold one chases the hottest recent form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisorProfile {
    Steady,
    Balanced,
    Bold,
}

impl Default for AdvisorProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

impl AdvisorProfile {
    pub fn from_env() -> Self {
        static CACHED: OnceLock<AdvisorProfile> = OnceLock::new();
        *CACHED.get_or_init(|| {
            std::env::var("STARDRAFT_PROFILE")
                .map(|raw| Self::from_label(&raw))
                .unwrap_or_default()
        })
    }

    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "steady" => AdvisorProfile::Steady,
            "safe" => AdvisorProfile::Steady,
            "balanced" => AdvisorProfile::Balanced,
            "default" => AdvisorProfile::Balanced,
            "bold" => AdvisorProfile::Bold,
            "hot" => AdvisorProfile::Bold,
            _ => AdvisorProfile::default(),
        }
    }

    pub const fn algorithm(self) -> ScoreAlgorithm {
        match self {
            AdvisorProfile::Steady => ScoreAlgorithm::ConsistencyMedian,
            AdvisorProfile::Balanced => ScoreAlgorithm::ExponentialSmoothing,
            AdvisorProfile::Bold => ScoreAlgorithm::Recent4,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AdvisorFeatures {
    strict_budget: bool,
    bucket_cap: usize,
}

impl AdvisorFeatures {
    pub const fn new(strict_budget: bool, bucket_cap: usize) -> Self {
        Self {
            strict_budget,
            bucket_cap,
        }
    }

    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    pub const fn strict_budget(self) -> bool {
        self.strict_budget
    }

    pub const fn bucket_cap(self) -> usize {
        self.bucket_cap
    }

    fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let strict_budget = read("STARDRAFT_STRICT_BUDGET")
            .map(|raw| matches!(raw.trim(), "1" | "true" | "TRUE" | "on" | "ON"))
            .unwrap_or(false);

        let bucket_cap = read("STARDRAFT_BUCKET_CAP")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|value| (1..=50).contains(value))
            .unwrap_or(5);

        Self {
            strict_budget,
            bucket_cap,
        }
    }
}

impl Default for AdvisorFeatures {
    fn default() -> Self {
        Self {
            strict_budget: false,
            bucket_cap: 5,
        }
    }
}

/// Everything a planner needs to answer one draft request.
pub struct AdvisorContext<'a> {
    pub pool: &'a CardPool,
    pub history: &'a ScoreHistory,
    pub deck_size: u32,
    pub star_budget: u32,
    pub profile: AdvisorProfile,
    pub features: AdvisorFeatures,
}

impl<'a> AdvisorContext<'a> {
    pub fn new(
        pool: &'a CardPool,
        history: &'a ScoreHistory,
        deck_size: u32,
        star_budget: u32,
        profile: AdvisorProfile,
        features: AdvisorFeatures,
    ) -> Self {
        Self {
            pool,
            history,
            deck_size,
            star_budget,
            profile,
            features,
        }
    }
}
