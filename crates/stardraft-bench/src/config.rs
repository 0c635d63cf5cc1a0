use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

use stardraft_core::model::MAX_SERIES_LEN;

const DEFAULT_TRIALS: usize = 32;
const DEFAULT_HISTORY_WEEKS: usize = 8;
const DEFAULT_BUCKET_CAP: usize = 5;
const DEFAULT_SOLVE_BUDGET_MS: u64 = 50;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root benchmark configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub dataset: DatasetConfig,
    pub strategies: Vec<StrategyConfig>,
    pub draft: DraftTargets,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: BenchmarkConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.dataset.validate()?;
        self.draft.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.metrics.validate(&self.strategies)?;
        self.logging.normalize();
        validate_strategies(&self.strategies)?;
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
            plots_dir: resolve_template(&self.run_id, &self.outputs.plots_dir),
        }
    }
}

/// Synthetic dataset configuration block.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DatasetConfig {
    pub seed: Option<u64>,
    pub pool_size: usize,
    pub heroes: usize,
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default = "default_history_weeks")]
    pub history_weeks: usize,
}

impl DatasetConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.pool_size == 0 {
            return Err(ValidationError::InvalidField {
                field: "dataset.pool_size".to_string(),
                message: "pool size must be greater than zero".to_string(),
            });
        }

        if self.heroes == 0 {
            return Err(ValidationError::InvalidField {
                field: "dataset.heroes".to_string(),
                message: "hero roster must not be empty".to_string(),
            });
        }

        if self.trials == 0 {
            return Err(ValidationError::InvalidField {
                field: "dataset.trials".to_string(),
                message: "number of trials must be greater than zero".to_string(),
            });
        }

        if self.history_weeks == 0 || self.history_weeks > MAX_SERIES_LEN {
            return Err(ValidationError::InvalidField {
                field: "dataset.history_weeks".to_string(),
                message: format!("history weeks must be between 1 and {MAX_SERIES_LEN}"),
            });
        }

        Ok(())
    }
}

fn default_trials() -> usize {
    DEFAULT_TRIALS
}

fn default_history_weeks() -> usize {
    DEFAULT_HISTORY_WEEKS
}

/// Definition of a benchmark participant. A strategy names either a
/// projection algorithm directly or an advisor profile; never both.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StrategyConfig {
    pub name: String,
    #[serde(default)]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub overrides: HashMap<String, f64>,
    #[serde(default)]
    pub one_star_specialists: Vec<String>,
}

/// Draft targets shared by every strategy in the run.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DraftTargets {
    pub deck_size: u32,
    pub star_budget: u32,
    #[serde(default = "default_bucket_cap")]
    pub bucket_cap: usize,
}

impl DraftTargets {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.deck_size == 0 {
            return Err(ValidationError::InvalidField {
                field: "draft.deck_size".to_string(),
                message: "deck size must be greater than zero".to_string(),
            });
        }

        if self.star_budget < self.deck_size {
            return Err(ValidationError::InvalidField {
                field: "draft.star_budget".to_string(),
                message: "star budget cannot cover one star per deck slot".to_string(),
            });
        }

        if self.bucket_cap == 0 {
            return Err(ValidationError::InvalidField {
                field: "draft.bucket_cap".to_string(),
                message: "bucket cap must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

fn default_bucket_cap() -> usize {
    DEFAULT_BUCKET_CAP
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
    pub plots_dir: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
            ("outputs.plots_dir", &self.plots_dir),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Metrics configuration block.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MetricsConfig {
    #[serde(default)]
    pub baseline: Option<String>,
    #[serde(default = "default_solve_budget_ms")]
    pub solve_budget_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            baseline: None,
            solve_budget_ms: DEFAULT_SOLVE_BUDGET_MS,
        }
    }
}

impl MetricsConfig {
    fn validate(&self, strategies: &[StrategyConfig]) -> Result<(), ValidationError> {
        let Some(baseline) = self.baseline.as_ref() else {
            return Err(ValidationError::InvalidField {
                field: "metrics.baseline".to_string(),
                message: "baseline strategy must be specified".to_string(),
            });
        };

        if !strategies.iter().any(|s| &s.name == baseline) {
            return Err(ValidationError::InvalidField {
                field: "metrics.baseline".to_string(),
                message: format!("baseline strategy '{baseline}' is not defined in strategies list"),
            });
        }

        if self.solve_budget_ms == 0 {
            return Err(ValidationError::InvalidField {
                field: "metrics.solve_budget_ms".to_string(),
                message: "solve budget must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

fn default_solve_budget_ms() -> u64 {
    DEFAULT_SOLVE_BUDGET_MS
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    #[serde(default)]
    pub draft_details: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
            draft_details: false,
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }

    /// Publishes the process-wide flags downstream telemetry gates read.
    /// Must run before any worker threads exist.
    pub(crate) fn export_env(&self, run_id: &str) {
        unsafe {
            std::env::set_var("STARDRAFT_DEBUG_LOGS", "1");
            std::env::set_var("STARDRAFT_BENCH_RUN_ID", run_id);
            if self.draft_details {
                std::env::set_var("STARDRAFT_DRAFT_DETAILS", "1");
            }
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn validate_strategies(strategies: &[StrategyConfig]) -> Result<(), ValidationError> {
    if strategies.is_empty() {
        return Err(ValidationError::InvalidField {
            field: "strategies".to_string(),
            message: "at least one strategy must be specified".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for strategy in strategies {
        if strategy.name.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "strategies.name".to_string(),
                message: "strategy name must not be empty".to_string(),
            });
        }

        if !strategy
            .name
            .chars()
            .all(|c| RUN_ID_ALLOWED.contains(c) || c == '/')
        {
            return Err(ValidationError::InvalidField {
                field: format!("strategies[{}].name", strategy.name),
                message: "strategy name contains invalid characters".to_string(),
            });
        }

        if !seen.insert(strategy.name.clone()) {
            return Err(ValidationError::InvalidField {
                field: "strategies".to_string(),
                message: format!("strategy name '{}' defined more than once", strategy.name),
            });
        }

        if strategy.algorithm.is_some() && strategy.profile.is_some() {
            return Err(ValidationError::InvalidField {
                field: format!("strategies[{}]", strategy.name),
                message: "a strategy may set either algorithm or profile, not both".to_string(),
            });
        }

        if strategy.profile.is_some() && !strategy.overrides.is_empty() {
            return Err(ValidationError::InvalidField {
                field: format!("strategies[{}].overrides", strategy.name),
                message: "profile strategies draft without score overrides".to_string(),
            });
        }

        for (hero, score) in &strategy.overrides {
            if !score.is_finite() {
                return Err(ValidationError::InvalidField {
                    field: format!("strategies[{}].overrides.{hero}", strategy.name),
                    message: "override score must be a finite number".to_string(),
                });
            }
        }
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
    pub plots_dir: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
