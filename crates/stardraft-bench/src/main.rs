use std::path::PathBuf;

use clap::Parser;

use stardraft_bench::config::{BenchmarkConfig, ResolvedOutputs};
use stardraft_bench::logging::init_logging;
use stardraft_bench::runner::BenchRunner;
use stardraft_core::AppInfo;

/// Draft strategy benchmarking harness.
#[derive(Debug, Parser)]
#[command(
    name = "stardraft-bench",
    author,
    version,
    about = "Deterministic draft strategy benchmark harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/stardraft.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of trials to draft.
    #[arg(long, value_name = "TRIALS")]
    trials: Option<usize>,

    /// Override the RNG seed for dataset generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Exit after validating the configuration (no trials are run).
    #[arg(long)]
    validate_only: bool,

    /// Enable detailed draft telemetry regardless of config (forces STARDRAFT_DRAFT_DETAILS=1).
    #[arg(long)]
    log_draft_details: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(trials) = cli.trials {
        config.dataset.trials = trials;
    }

    if let Some(seed) = cli.seed {
        config.dataset.seed = Some(seed);
    }

    if cli.log_draft_details {
        config.logging.draft_details = true;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let strategy_count = config.strategies.len();
    let run_id = config.run_id.clone();
    let trials = config.dataset.trials;

    println!(
        "{} {}: loaded configuration '{run_id}' with {strategy_count} strateg{} ({trials} trials)",
        AppInfo::name(),
        AppInfo::version(),
        if strategy_count == 1 { "y" } else { "ies" }
    );

    let _logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let runner = BenchRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: benchmark execution skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Benchmark complete for '{run_id}': {} trials × {} strategies → {} rows at {}",
        summary.trials,
        summary.strategies,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(plot_path) = summary.plot_path.as_ref() {
        println!("Score delta plot: {}", plot_path.display());
    }
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
