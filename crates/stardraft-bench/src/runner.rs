use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use stardraft_advisor::{AdvisorContext, AdvisorFeatures, AdvisorProfile, DraftPlanner};
use stardraft_core::draft::DraftConfig;
use stardraft_core::model::HeroId;
use stardraft_core::projection::{OneStarOnlyPolicy, ScoreAlgorithm, ScorePolicies};
use stardraft_core::session::DraftSession;

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{BenchmarkConfig, DraftTargets, ResolvedOutputs, StrategyConfig};
use crate::dataset::{self, TrialDataset};

/// Score granted to a one-star specialist copy that carries no override.
const ONE_STAR_FALLBACK_SCORE: f64 = 25.0;

/// Primary entry point for orchestrating benchmark runs.
pub struct BenchRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    strategies: Vec<StrategyBlueprint>,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub trials: usize,
    pub strategies: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub plot_path: Option<PathBuf>,
    pub telemetry_path: Option<PathBuf>,
}

impl BenchRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let strategies = StrategyBlueprint::from_configs(&config.strategies)?;

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            strategies,
        })
    }

    /// Execute every trial, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;
        if !self.outputs.plots_dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.outputs.plots_dir)?;
        }

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.dataset.seed.unwrap_or(0));
        let mut rows_written = 0usize;
        let mut analytics = AnalyticsCollector::new(&self.config)?;
        let mut sessions: Vec<DraftSession> = self
            .strategies
            .iter()
            .map(StrategyBlueprint::spawn_session)
            .collect();

        for trial_index in 0..self.config.dataset.trials {
            let trial_seed = rng.next_u64();
            let dataset = dataset::generate(trial_seed, &self.config.dataset);

            let mut outcomes = Vec::with_capacity(self.strategies.len());
            for (blueprint, session) in self.strategies.iter().zip(sessions.iter_mut()) {
                // Every trial pool has the same length, so the length-based
                // staleness check alone would keep serving old scores.
                session.clear_caches();
                let outcome =
                    execute_strategy(session, blueprint, &dataset, &self.config.draft);

                if self.logging_enabled && tracing::enabled!(Level::INFO) {
                    event!(
                        target: "stardraft_bench::trial",
                        Level::INFO,
                        run_id = %self.config.run_id,
                        trial_index = trial_index as u32,
                        strategy = %outcome.strategy,
                        solved = outcome.solved,
                        total_stars = outcome.total_stars,
                        total_score = outcome.total_score,
                        solve_ms = outcome.solve_ms
                    );
                }

                outcomes.push(outcome);
            }

            analytics.record_trial(trial_index, &outcomes)?;
            rows_written += write_trial_rows(
                &mut writer,
                &self.config,
                trial_index,
                trial_seed,
                &outcomes,
            )?;
        }

        writer.flush()?;

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;
        let plot_path = match summary.render_plot(&self.outputs.plots_dir) {
            Ok(path) => Some(path),
            Err(err) => {
                eprintln!("WARN: {}", err);
                None
            }
        };

        let telemetry_path = if self.logging_enabled {
            let telemetry_dir = self
                .outputs
                .summary_md
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            Some(telemetry_dir.join("telemetry.jsonl"))
        } else {
            None
        };

        Ok(RunSummary {
            trials: self.config.dataset.trials,
            strategies: self.strategies.len(),
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            plot_path,
            telemetry_path,
        })
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Run one strategy against one trial dataset. Draft failures become rows,
/// not errors; the bench keeps going.
fn execute_strategy(
    session: &mut DraftSession,
    blueprint: &StrategyBlueprint,
    dataset: &TrialDataset,
    targets: &DraftTargets,
) -> StrategyOutcome {
    let start = Instant::now();
    let result = match &blueprint.implementation {
        StrategyImplementation::Algorithm {
            algorithm,
            overrides,
        } => {
            let mut config = DraftConfig::new(targets.deck_size, targets.star_budget);
            config.algorithm = *algorithm;
            config.overrides = overrides.clone();
            config.bucket_cap = targets.bucket_cap;
            session.optimize(&dataset.pool, &dataset.history, &config)
        }
        StrategyImplementation::Profile(profile) => {
            let ctx = AdvisorContext::new(
                &dataset.pool,
                &dataset.history,
                targets.deck_size,
                targets.star_budget,
                *profile,
                AdvisorFeatures::new(false, targets.bucket_cap),
            );
            DraftPlanner::recommend(session, &ctx).map(|plan| plan.selection)
        }
    };
    let solve_ms = start.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(selection) => StrategyOutcome {
            strategy: blueprint.name.clone(),
            solved: true,
            total_stars: selection.total_stars(),
            total_score: selection.total_score(),
            budget_slack: targets.star_budget - selection.total_stars(),
            cards: selection
                .cards()
                .iter()
                .map(|card| card.to_string())
                .collect(),
            failure: None,
            solve_ms,
            cached_scores: session.score_cache_len(),
        },
        Err(error) => StrategyOutcome {
            strategy: blueprint.name.clone(),
            solved: false,
            total_stars: 0,
            total_score: 0.0,
            budget_slack: 0,
            cards: Vec::new(),
            failure: Some(error.to_string()),
            solve_ms,
            cached_scores: session.score_cache_len(),
        },
    }
}

fn write_trial_rows(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    trial_index: usize,
    trial_seed: u64,
    outcomes: &[StrategyOutcome],
) -> Result<usize, RunnerError> {
    let trial_id = format!("T{trial_index:05}");

    let mut rows_written = 0usize;
    for outcome in outcomes {
        let row = TrialLogRow {
            run_id: config.run_id.clone(),
            trial_id: trial_id.clone(),
            trial_index,
            trial_seed,
            strategy: outcome.strategy.clone(),
            solved: outcome.solved,
            total_stars: outcome.total_stars,
            total_score: outcome.total_score,
            budget_slack: outcome.budget_slack,
            cards: outcome.cards.clone(),
            failure: outcome.failure.clone(),
            solve_ms: outcome.solve_ms,
            cached_scores: outcome.cached_scores,
        };

        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;
    }

    Ok(rows_written)
}

/// Result of one (trial, strategy) pairing.
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    pub strategy: String,
    pub solved: bool,
    pub total_stars: u32,
    pub total_score: f64,
    pub budget_slack: u32,
    pub cards: Vec<String>,
    pub failure: Option<String>,
    pub solve_ms: f64,
    pub cached_scores: usize,
}

#[derive(Serialize)]
struct TrialLogRow {
    run_id: String,
    trial_id: String,
    trial_index: usize,
    trial_seed: u64,
    strategy: String,
    solved: bool,
    total_stars: u32,
    total_score: f64,
    budget_slack: u32,
    cards: Vec<String>,
    failure: Option<String>,
    solve_ms: f64,
    cached_scores: usize,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Strategy(#[from] StrategyError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("strategy '{name}' sets both algorithm and profile")]
    ConflictingKinds { name: String },
    #[error("unknown algorithm '{value}' for strategy '{name}'")]
    UnknownAlgorithm { name: String, value: String },
    #[error("unknown profile '{value}' for strategy '{name}'")]
    UnknownProfile { name: String, value: String },
}

#[derive(Debug)]
struct StrategyBlueprint {
    name: String,
    implementation: StrategyImplementation,
    one_star_specialists: Vec<HeroId>,
}

#[derive(Debug)]
enum StrategyImplementation {
    Algorithm {
        algorithm: ScoreAlgorithm,
        overrides: HashMap<HeroId, f64>,
    },
    Profile(AdvisorProfile),
}

impl StrategyBlueprint {
    fn from_configs(configs: &[StrategyConfig]) -> Result<Vec<Self>, StrategyError> {
        configs.iter().map(Self::from_config).collect()
    }

    fn from_config(config: &StrategyConfig) -> Result<Self, StrategyError> {
        let implementation = match (&config.algorithm, &config.profile) {
            (Some(_), Some(_)) => {
                return Err(StrategyError::ConflictingKinds {
                    name: config.name.clone(),
                });
            }
            (None, Some(label)) => {
                StrategyImplementation::Profile(parse_profile(&config.name, label)?)
            }
            (raw, None) => {
                let algorithm = match raw {
                    Some(text) => parse_algorithm(&config.name, text)?,
                    None => ScoreAlgorithm::default(),
                };
                let overrides = config
                    .overrides
                    .iter()
                    .map(|(hero, score)| (HeroId::new(hero.clone()), *score))
                    .collect();
                StrategyImplementation::Algorithm {
                    algorithm,
                    overrides,
                }
            }
        };

        Ok(Self {
            name: config.name.clone(),
            implementation,
            one_star_specialists: config
                .one_star_specialists
                .iter()
                .map(|hero| HeroId::new(hero.clone()))
                .collect(),
        })
    }

    fn spawn_session(&self) -> DraftSession {
        if self.one_star_specialists.is_empty() {
            return DraftSession::new();
        }

        let mut policies = ScorePolicies::new();
        for hero in &self.one_star_specialists {
            policies.install(
                hero.clone(),
                Box::new(OneStarOnlyPolicy::new(ONE_STAR_FALLBACK_SCORE)),
            );
        }
        DraftSession::with_policies(policies)
    }
}

fn parse_algorithm(name: &str, raw: &str) -> Result<ScoreAlgorithm, StrategyError> {
    let text = raw.trim().to_ascii_lowercase();
    if let Some(algorithm) = ScoreAlgorithm::ALL.iter().find(|a| a.id() == text) {
        return Ok(*algorithm);
    }
    if text == "recent6exclude1" {
        return Ok(ScoreAlgorithm::Recent6TrimOutlier);
    }
    Err(StrategyError::UnknownAlgorithm {
        name: name.to_string(),
        value: raw.to_string(),
    })
}

fn parse_profile(name: &str, raw: &str) -> Result<AdvisorProfile, StrategyError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "steady" | "safe" => Ok(AdvisorProfile::Steady),
        "balanced" | "default" => Ok(AdvisorProfile::Balanced),
        "bold" | "hot" => Ok(AdvisorProfile::Bold),
        _ => Err(StrategyError::UnknownProfile {
            name: name.to_string(),
            value: raw.to_string(),
        }),
    }
}
