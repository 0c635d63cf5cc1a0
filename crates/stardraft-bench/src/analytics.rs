use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use serde::Serialize;
use stardraft_core::AppInfo;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::{BenchmarkConfig, StrategyConfig};
use crate::runner::StrategyOutcome;

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("baseline strategy '{0}' not present in benchmark results")]
    MissingBaseline(String),
    #[error("strategy '{0}' appears in results but missing from configuration")]
    UnknownStrategy(String),
    #[error("baseline '{0}' missing for trial {1}")]
    MissingBaselineTrial(String, usize),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render plot: {0}")]
    Plot(String),
}

pub struct AnalyticsCollector {
    baseline: String,
    strategies: HashMap<String, StrategyAccumulator>,
    comparisons: HashMap<String, ComparisonAccumulator>,
    strategy_order: Vec<String>,
    solve_budget_ms: u64,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Result<Self, AnalyticsError> {
        let baseline = config
            .metrics
            .baseline
            .clone()
            .ok_or_else(|| AnalyticsError::MissingBaseline("<unset>".into()))?;

        let mut strategies = HashMap::new();
        let mut order = Vec::new();
        for strategy in &config.strategies {
            strategies.insert(
                strategy.name.clone(),
                StrategyAccumulator::new(strategy.clone(), config.metrics.solve_budget_ms),
            );
            order.push(strategy.name.clone());
        }

        Ok(Self {
            baseline,
            strategies,
            comparisons: HashMap::new(),
            strategy_order: order,
            solve_budget_ms: config.metrics.solve_budget_ms,
        })
    }

    pub fn record_trial(
        &mut self,
        trial_index: usize,
        outcomes: &[StrategyOutcome],
    ) -> Result<(), AnalyticsError> {
        let baseline = outcomes
            .iter()
            .find(|outcome| outcome.strategy == self.baseline)
            .ok_or_else(|| {
                AnalyticsError::MissingBaselineTrial(self.baseline.clone(), trial_index)
            })?;

        for outcome in outcomes {
            let acc = self
                .strategies
                .get_mut(&outcome.strategy)
                .ok_or_else(|| AnalyticsError::UnknownStrategy(outcome.strategy.clone()))?;
            acc.record_trial(outcome);
        }

        // Score deltas only make sense on trials both drafts solved.
        if baseline.solved {
            for outcome in outcomes {
                if outcome.strategy == self.baseline || !outcome.solved {
                    continue;
                }
                self.comparisons
                    .entry(outcome.strategy.clone())
                    .or_insert_with(ComparisonAccumulator::new)
                    .record(outcome.total_score - baseline.total_score);
            }
        }

        Ok(())
    }

    pub fn finalize(mut self) -> Result<AnalyticsSummary, AnalyticsError> {
        let mut reports = Vec::new();
        for name in &self.strategy_order {
            if let Some(acc) = self.strategies.remove(name) {
                reports.push(acc.into_report());
            }
        }

        let mut comparisons = Vec::new();
        for report in &reports {
            if report.name == self.baseline {
                comparisons.push(ComparisonReport {
                    strategy: report.name.clone(),
                    p_value: 1.0,
                    sample_size: report.trials,
                });
                continue;
            }
            if let Some(comp) = self.comparisons.remove(&report.name) {
                let (p_value, sample_size) = comp.wilcoxon_signed_rank();
                comparisons.push(ComparisonReport {
                    strategy: report.name.clone(),
                    p_value,
                    sample_size,
                });
            } else {
                comparisons.push(ComparisonReport {
                    strategy: report.name.clone(),
                    p_value: 1.0,
                    sample_size: 0,
                });
            }
        }

        Ok(AnalyticsSummary {
            baseline: self.baseline,
            strategies: reports,
            comparisons,
            solve_budget_ms: self.solve_budget_ms,
        }
        .enrich())
    }
}

struct StrategyAccumulator {
    config: StrategyConfig,
    trials: u32,
    solved: u32,
    solved_scores: Vec<f64>,
    total_ms: f64,
    solve_budget_ms: u64,
}

impl StrategyAccumulator {
    fn new(config: StrategyConfig, solve_budget_ms: u64) -> Self {
        Self {
            config,
            trials: 0,
            solved: 0,
            solved_scores: Vec::new(),
            total_ms: 0.0,
            solve_budget_ms,
        }
    }

    fn record_trial(&mut self, outcome: &StrategyOutcome) {
        self.trials += 1;
        self.total_ms += outcome.solve_ms;
        if outcome.solved {
            self.solved += 1;
            self.solved_scores.push(outcome.total_score);
        }
    }

    fn into_report(self) -> StrategyReport {
        let mean_score = if self.solved_scores.is_empty() {
            0.0
        } else {
            self.solved_scores.iter().sum::<f64>() / self.solved_scores.len() as f64
        };

        let (ci_low, ci_high) = confidence_interval(&self.solved_scores);

        let mean_ms = if self.trials == 0 {
            0.0
        } else {
            self.total_ms / f64::from(self.trials)
        };

        let solve_rate = if self.trials == 0 {
            0.0
        } else {
            f64::from(self.solved) / f64::from(self.trials)
        };

        StrategyReport {
            name: self.config.name.clone(),
            projection: strategy_label(&self.config),
            trials: self.trials as usize,
            solved: self.solved as usize,
            solve_rate,
            mean_score,
            ci95: (ci_low, ci_high),
            mean_solve_ms: mean_ms,
            delta_vs_baseline: 0.0, // Filled later once we know the baseline report
            over_budget: mean_ms > self.solve_budget_ms as f64,
        }
    }
}

fn strategy_label(config: &StrategyConfig) -> String {
    if let Some(profile) = config.profile.as_ref() {
        return format!("profile:{profile}");
    }
    config
        .algorithm
        .clone()
        .unwrap_or_else(|| "exponential_smoothing".to_string())
}

#[derive(Clone)]
struct ComparisonAccumulator {
    diffs: Vec<f64>,
}

impl ComparisonAccumulator {
    fn new() -> Self {
        Self { diffs: Vec::new() }
    }

    fn record(&mut self, diff: f64) {
        self.diffs.push(diff);
    }

    fn wilcoxon_signed_rank(self) -> (f64, usize) {
        let diffs: Vec<f64> = self
            .diffs
            .into_iter()
            .filter(|d| d.abs() > f64::EPSILON)
            .collect();
        let n = diffs.len();
        if n == 0 {
            return (1.0, 0);
        }

        let mut paired: Vec<(f64, f64)> =
            diffs.into_iter().map(|d| (d.abs(), d.signum())).collect();
        paired.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Rank handling with ties
        let mut ranks = Vec::with_capacity(n);
        let mut tie_sizes = Vec::new();
        let mut i = 0;
        while i < paired.len() {
            let mut j = i;
            while j + 1 < paired.len() && (paired[j + 1].0 - paired[i].0).abs() < 1e-12 {
                j += 1;
            }
            let rank = (i + j + 2) as f64 / 2.0;
            for k in i..=j {
                ranks.push((rank, paired[k].1));
            }
            if j > i {
                tie_sizes.push(j - i + 1);
            }
            i = j + 1;
        }

        let w_plus: f64 = ranks
            .iter()
            .filter(|(_, sign)| *sign > 0.0)
            .map(|(rank, _)| *rank)
            .sum();
        let w_minus: f64 = ranks
            .iter()
            .filter(|(_, sign)| *sign < 0.0)
            .map(|(rank, _)| *rank)
            .sum();

        let w = w_plus.min(w_minus);
        let n_f = n as f64;
        let mean_w = n_f * (n_f + 1.0) / 4.0;

        // Variance with tie correction
        let tie_adjustment: f64 = tie_sizes
            .into_iter()
            .map(|count| {
                let c = count as f64;
                (c.powi(3) - c) / 48.0
            })
            .sum();
        let variance_w = n_f * (n_f + 1.0) * (2.0 * n_f + 1.0) / 24.0 - tie_adjustment;
        if variance_w <= 0.0 {
            return (1.0, n);
        }

        let z = ((w - mean_w).abs() - 0.5) / variance_w.sqrt();
        let normal = Normal::new(0.0, 1.0).expect("unit normal");
        let p = 2.0 * (1.0 - normal.cdf(z));
        (p.clamp(0.0, 1.0), n)
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: String,
    pub strategies: Vec<StrategyReport>,
    pub comparisons: Vec<ComparisonReport>,
    pub solve_budget_ms: u64,
}

impl AnalyticsSummary {
    pub fn enrich(mut self) -> Self {
        let baseline_mean = self
            .strategies
            .iter()
            .find(|report| report.name == self.baseline)
            .map(|report| report.mean_score)
            .unwrap_or(0.0);

        for report in &mut self.strategies {
            report.delta_vs_baseline = report.mean_score - baseline_mean;
        }

        self
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Draft Benchmark Summary\n\n");
        rows.push_str(&format!(
            "Engine: {} {}\n",
            AppInfo::name(),
            AppInfo::version()
        ));
        rows.push_str(&format!(
            "Solve budget: {} ms average per draft\n\n",
            self.solve_budget_ms
        ));
        rows.push_str("| Strategy | Projection | Trials | Solve % | Mean score | Δ vs baseline | 95% CI | Avg ms/draft | Over Budget | p-value |\n");
        rows.push_str("|----------|------------|--------|---------|------------|----------------|--------|---------------|-------------|---------|\n");

        for report in &self.strategies {
            let comparison = self
                .comparisons
                .iter()
                .find(|c| c.strategy == report.name)
                .map(|c| c.p_value)
                .unwrap_or(1.0);

            rows.push_str(&format!(
                "| {name} | {projection} | {trials} | {solve:.1}% | {mean:.3} | {delta:+.3} | [{ci_low:.3}, {ci_high:.3}] | {ms:.2} | {over_budget} | {pval:.3} |\n",
                name = report.name,
                projection = report.projection,
                trials = report.trials,
                solve = report.solve_rate * 100.0,
                mean = report.mean_score,
                delta = report.delta_vs_baseline,
                ci_low = report.ci95.0,
                ci_high = report.ci95.1,
                ms = report.mean_solve_ms,
                over_budget = if report.over_budget { "Yes" } else { "No" },
                pval = comparison,
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }

    pub fn render_plot(&self, dir: impl AsRef<Path>) -> Result<PathBuf, AnalyticsError> {
        let dir = dir.as_ref();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| AnalyticsError::Io {
                context: "creating plots directory",
                source: e,
            })?;
        }

        let output_path = dir.join("delta_score.png");
        let baseline = self.baseline.clone();
        let strategies_snapshot = self.strategies.clone();

        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let plot_attempt = std::panic::catch_unwind(move || {
            let root = BitMapBackend::new(&output_path, (800, 480)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            let mut strategies = strategies_snapshot;
            strategies.sort_by(|a, b| a.delta_vs_baseline.total_cmp(&b.delta_vs_baseline));

            let y_range_min = strategies
                .iter()
                .map(|s| s.delta_vs_baseline)
                .fold(0.0f64, |acc, v| acc.min(v));
            let y_range_max = strategies
                .iter()
                .map(|s| s.delta_vs_baseline)
                .fold(0.0f64, |acc, v| acc.max(v));
            let margin = ((y_range_max - y_range_min).abs() * 0.1).max(0.2);

            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .caption(
                    "Score delta vs baseline (higher is better)",
                    ("sans-serif", 22),
                )
                .set_label_area_size(LabelAreaPosition::Left, 50)
                .set_label_area_size(LabelAreaPosition::Bottom, 60)
                .build_cartesian_2d(
                    0..strategies.len(),
                    (y_range_min - margin)..(y_range_max + margin),
                )
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .configure_mesh()
                .disable_mesh()
                .y_desc("Δ mean score vs baseline")
                .x_desc("Strategy")
                .x_label_formatter(&|idx| {
                    strategies
                        .get(*idx)
                        .map(|report| report.name.clone())
                        .unwrap_or_default()
                })
                .draw()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .draw_series(strategies.iter().enumerate().map(|(idx, report)| {
                    let color = if report.name == baseline {
                        &BLUE
                    } else if report.delta_vs_baseline >= 0.0 {
                        &GREEN
                    } else {
                        &RED
                    };
                    Rectangle::new(
                        [(idx, 0.0), (idx + 1, report.delta_vs_baseline)],
                        color.filled(),
                    )
                }))
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(chart);

            root.present()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(root);

            Ok(output_path)
        });

        std::panic::set_hook(prev_hook);

        match plot_attempt {
            Ok(result) => result,
            Err(_) => Err(AnalyticsError::Plot(
                "plotters panicked while rendering (missing font support?)".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub name: String,
    pub projection: String,
    pub trials: usize,
    pub solved: usize,
    pub solve_rate: f64,
    pub mean_score: f64,
    pub ci95: (f64, f64),
    pub mean_solve_ms: f64,
    #[serde(skip)]
    pub delta_vs_baseline: f64,
    #[serde(skip)]
    pub over_budget: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub strategy: String,
    pub p_value: f64,
    pub sample_size: usize,
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = points.iter().sum::<f64>() / points.len() as f64;
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}

#[cfg(test)]
mod tests {
    use super::{AnalyticsCollector, ComparisonAccumulator, confidence_interval};
    use crate::config::BenchmarkConfig;
    use crate::runner::StrategyOutcome;

    fn collector_config() -> BenchmarkConfig {
        let yaml = r#"
run_id: "analytics_test"
dataset:
  seed: 1
  pool_size: 10
  heroes: 5
strategies:
  - name: "base"
    algorithm: "exponential_smoothing"
  - name: "rival"
    algorithm: "recent4"
draft:
  deck_size: 3
  star_budget: 9
outputs:
  jsonl: "out/{run_id}/trials.jsonl"
  summary_md: "out/{run_id}/summary.md"
  plots_dir: "out/{run_id}/plots"
metrics:
  baseline: "base"
"#;
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(yaml).expect("parse");
        cfg.validate().expect("validate");
        cfg
    }

    fn outcome(strategy: &str, solved: bool, score: f64, ms: f64) -> StrategyOutcome {
        StrategyOutcome {
            strategy: strategy.to_string(),
            solved,
            total_stars: if solved { 9 } else { 0 },
            total_score: score,
            budget_slack: 0,
            cards: Vec::new(),
            failure: None,
            solve_ms: ms,
            cached_scores: 0,
        }
    }

    #[test]
    fn confidence_interval_handles_degenerate_samples() {
        assert_eq!(confidence_interval(&[]), (0.0, 0.0));
        assert_eq!(confidence_interval(&[4.0]), (4.0, 4.0));
        let (low, high) = confidence_interval(&[10.0, 10.0, 10.0]);
        assert_eq!(low, 10.0);
        assert_eq!(high, 10.0);
    }

    #[test]
    fn wilcoxon_flags_one_sided_shifts() {
        let mut comp = ComparisonAccumulator::new();
        for diff in 1..=10 {
            comp.record(f64::from(diff));
        }
        let (p, n) = comp.wilcoxon_signed_rank();
        assert_eq!(n, 10);
        assert!(p < 0.05, "expected significance, got p={p}");
    }

    #[test]
    fn wilcoxon_stays_quiet_on_symmetric_diffs() {
        let mut comp = ComparisonAccumulator::new();
        for diff in [1.0, -1.0, 2.0, -2.0] {
            comp.record(diff);
        }
        let (p, n) = comp.wilcoxon_signed_rank();
        assert_eq!(n, 4);
        assert!(p > 0.9, "symmetric diffs should not be significant, p={p}");
    }

    #[test]
    fn wilcoxon_ignores_zero_diffs() {
        let mut comp = ComparisonAccumulator::new();
        comp.record(0.0);
        comp.record(0.0);
        let (p, n) = comp.wilcoxon_signed_rank();
        assert_eq!((p, n), (1.0, 0));
    }

    #[test]
    fn collector_tracks_deltas_and_solve_rates() {
        let config = collector_config();
        let mut collector = AnalyticsCollector::new(&config).expect("collector");

        let trials = [
            vec![outcome("base", true, 50.0, 1.0), outcome("rival", true, 56.0, 2.0)],
            vec![outcome("base", true, 40.0, 1.0), outcome("rival", true, 47.0, 2.0)],
            vec![outcome("base", true, 60.0, 1.0), outcome("rival", false, 0.0, 2.0)],
        ];
        for (index, outcomes) in trials.iter().enumerate() {
            collector.record_trial(index, outcomes).expect("record");
        }

        let summary = collector.finalize().expect("finalize");
        let base = summary
            .strategies
            .iter()
            .find(|s| s.name == "base")
            .expect("base report");
        let rival = summary
            .strategies
            .iter()
            .find(|s| s.name == "rival")
            .expect("rival report");

        assert_eq!(base.delta_vs_baseline, 0.0);
        assert_eq!(base.mean_score, 50.0);
        assert_eq!(base.solve_rate, 1.0);
        // Rival solved 2 of 3 trials at scores 56 and 47.
        assert_eq!(rival.solved, 2);
        assert!((rival.mean_score - 51.5).abs() < 1e-9);
        assert!((rival.delta_vs_baseline - 1.5).abs() < 1e-9);

        let rival_comparison = summary
            .comparisons
            .iter()
            .find(|c| c.strategy == "rival")
            .expect("rival comparison");
        // Only the two mutually solved trials feed the signed-rank test.
        assert_eq!(rival_comparison.sample_size, 2);
    }

    #[test]
    fn summary_markdown_names_engine_and_strategies() {
        let config = collector_config();
        let mut collector = AnalyticsCollector::new(&config).expect("collector");
        let outcomes = vec![
            outcome("base", true, 50.0, 1.0),
            outcome("rival", true, 56.0, 2.0),
        ];
        collector.record_trial(0, &outcomes).expect("record");
        let summary = collector.finalize().expect("finalize");

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("summary.md");
        summary.write_markdown(&path).expect("write summary");

        let written = std::fs::read_to_string(&path).expect("summary readable");
        assert!(written.starts_with("# Draft Benchmark Summary"));
        assert!(written.contains(&format!(
            "Engine: {} {}",
            super::AppInfo::name(),
            super::AppInfo::version()
        )));
        assert!(written.contains("| base |"));
        assert!(written.contains("| rival |"));
    }

    #[test]
    fn collector_rejects_unknown_strategy_rows() {
        let config = collector_config();
        let mut collector = AnalyticsCollector::new(&config).expect("collector");
        let outcomes = vec![
            outcome("base", true, 50.0, 1.0),
            outcome("imposter", true, 50.0, 1.0),
        ];
        let err = collector
            .record_trial(0, &outcomes)
            .expect_err("unknown strategy");
        assert!(matches!(
            err,
            super::AnalyticsError::UnknownStrategy(name) if name == "imposter"
        ));
    }
}
