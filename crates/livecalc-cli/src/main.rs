//! Standalone valuation runner: loads a portfolio and assumption tables
//! from local files, generates stochastic scenarios, runs the valuation
//! kernel, and writes the resulting statistics as JSON.

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;

use livecalc_core::csv_io::{
    load_expense_assumptions, load_lapse_table, load_mortality_table, load_policies,
};
use livecalc_kernel::{generate_scenarios, run_valuation, ProjectionConfig, ScenarioGeneratorParams};

/// Runs a stochastic life-insurance valuation over a local portfolio.
#[derive(Parser, Debug)]
#[command(name = "livecalc", version, about, long_about = None)]
struct Args {
    /// Path to the policy portfolio CSV.
    #[arg(long)]
    policies: PathBuf,

    /// Path to the mortality table CSV.
    #[arg(long)]
    mortality: PathBuf,

    /// Path to the lapse table CSV.
    #[arg(long)]
    lapse: PathBuf,

    /// Path to the expense assumptions CSV.
    #[arg(long)]
    expenses: PathBuf,

    /// Number of Monte Carlo scenarios to generate.
    #[arg(long, default_value_t = 1000)]
    scenarios: usize,

    /// Random seed for scenario generation.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Initial short rate for the scenario generator.
    #[arg(long = "initial-rate", default_value_t = 0.04)]
    initial_rate: f64,

    /// Drift term for the scenario generator.
    #[arg(long, default_value_t = 0.0)]
    drift: f64,

    /// Volatility for the scenario generator.
    #[arg(long, default_value_t = 0.015)]
    volatility: f64,

    /// Minimum clamp for generated rates.
    #[arg(long = "min-rate", default_value_t = 0.0)]
    min_rate: f64,

    /// Maximum clamp for generated rates.
    #[arg(long = "max-rate", default_value_t = 0.20)]
    max_rate: f64,

    /// Mortality stress multiplier applied to every qx.
    #[arg(long = "mortality-mult", default_value_t = 1.0)]
    mortality_mult: f64,

    /// Lapse stress multiplier applied to every lapse rate.
    #[arg(long = "lapse-mult", default_value_t = 1.0)]
    lapse_mult: f64,

    /// Expense stress multiplier applied to every expense component.
    #[arg(long = "expense-mult", default_value_t = 1.0)]
    expense_mult: f64,

    /// Output path for the JSON result. Defaults to stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Args {
    fn validate(&self) -> Result<()> {
        for (flag, path) in [
            ("--policies", &self.policies),
            ("--mortality", &self.mortality),
            ("--lapse", &self.lapse),
            ("--expenses", &self.expenses),
        ] {
            if !path.is_file() {
                bail!("{flag} path does not exist or is not a file: {}", path.display());
            }
        }
        if self.scenarios == 0 {
            bail!("--scenarios must be greater than zero");
        }
        if !(0.0..=1.0).contains(&self.initial_rate) {
            bail!("--initial-rate must be between 0.0 and 1.0");
        }
        if self.volatility < 0.0 {
            bail!("--volatility must be non-negative");
        }
        if self.min_rate > self.max_rate {
            bail!("--min-rate must not exceed --max-rate");
        }
        for (flag, mult) in [
            ("--mortality-mult", self.mortality_mult),
            ("--lapse-mult", self.lapse_mult),
            ("--expense-mult", self.expense_mult),
        ] {
            if mult <= 0.0 {
                bail!("{flag} must be greater than zero");
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ValuationReport {
    mean: f64,
    stddev: f64,
    p50: f64,
    p75: f64,
    p90: f64,
    p95: f64,
    p99: f64,
    cte_95: f64,
    num_scenarios: usize,
    num_policies: usize,
    udf_failures: u64,
    execution_ms: u128,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    args.validate().context("invalid arguments")?;

    tracing::info!(
        scenarios = args.scenarios,
        seed = args.seed,
        initial_rate = args.initial_rate,
        drift = args.drift,
        volatility = args.volatility,
        "starting valuation run"
    );

    tracing::debug!(path = %args.policies.display(), "loading policies");
    let policies = load_policies(&args.policies).context("failed to load policies")?;
    tracing::debug!(path = %args.mortality.display(), "loading mortality table");
    let mortality = load_mortality_table(&args.mortality).context("failed to load mortality table")?;
    tracing::debug!(path = %args.lapse.display(), "loading lapse table");
    let lapse = load_lapse_table(&args.lapse).context("failed to load lapse table")?;
    tracing::debug!(path = %args.expenses.display(), "loading expense assumptions");
    let expense = load_expense_assumptions(&args.expenses).context("failed to load expense assumptions")?;

    let num_policies = policies.len();
    tracing::info!(num_policies, "portfolio loaded");

    let scenario_params = ScenarioGeneratorParams {
        initial_rate: args.initial_rate,
        drift: args.drift,
        volatility: args.volatility,
        min_rate: args.min_rate,
        max_rate: args.max_rate,
    };
    let scenarios = generate_scenarios(args.scenarios, &scenario_params, args.seed);

    let config = ProjectionConfig {
        mortality_multiplier: args.mortality_mult,
        lapse_multiplier: args.lapse_mult,
        expense_multiplier: args.expense_mult,
        retain_scenario_npvs: false,
        ..ProjectionConfig::default()
    };

    let started = Instant::now();
    let result = run_valuation(&policies, &mortality, &lapse, &expense, &scenarios, &config);
    let execution_ms = started.elapsed().as_millis();

    tracing::info!(
        mean = result.stats.mean,
        stddev = result.stats.stddev,
        p50 = result.stats.p50,
        p95 = result.stats.p95,
        cte_95 = result.stats.cte_95,
        execution_ms,
        "valuation complete"
    );

    let report = ValuationReport {
        mean: result.stats.mean,
        stddev: result.stats.stddev,
        p50: result.stats.p50,
        p75: result.stats.p75,
        p90: result.stats.p90,
        p95: result.stats.p95,
        p99: result.stats.p99,
        cte_95: result.stats.cte_95,
        num_scenarios: args.scenarios,
        num_policies,
        udf_failures: result.udf_failures,
        execution_ms,
    };
    let json = serde_json::to_string_pretty(&report).context("failed to serialize result")?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write output to {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote result");
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            writeln!(lock, "{json}").context("failed to write result to stdout")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args(dir: &std::path::Path) -> Args {
        Args {
            policies: dir.join("policies.csv"),
            mortality: dir.join("mortality.csv"),
            lapse: dir.join("lapse.csv"),
            expenses: dir.join("expenses.csv"),
            scenarios: 1000,
            seed: 42,
            initial_rate: 0.04,
            drift: 0.0,
            volatility: 0.015,
            min_rate: 0.0,
            max_rate: 0.20,
            mortality_mult: 1.0,
            lapse_mult: 1.0,
            expense_mult: 1.0,
            output: None,
        }
    }

    #[test]
    fn rejects_missing_input_files() {
        let dir = std::env::temp_dir().join("livecalc-cli-test-missing");
        let args = base_args(&dir);
        let err = args.validate().unwrap_err();
        assert!(err.to_string().contains("--policies"));
    }

    #[test]
    fn rejects_zero_scenarios() {
        let dir = std::env::temp_dir();
        let mut args = base_args(&dir);
        // Bypass file-existence failure by pointing at a file guaranteed to exist.
        args.policies = std::env::current_exe().unwrap();
        args.mortality = args.policies.clone();
        args.lapse = args.policies.clone();
        args.expenses = args.policies.clone();
        args.scenarios = 0;
        let err = args.validate().unwrap_err();
        assert!(err.to_string().contains("--scenarios"));
    }

    #[test]
    fn rejects_inverted_rate_bounds() {
        let dir = std::env::temp_dir();
        let mut args = base_args(&dir);
        args.policies = std::env::current_exe().unwrap();
        args.mortality = args.policies.clone();
        args.lapse = args.policies.clone();
        args.expenses = args.policies.clone();
        args.min_rate = 0.5;
        args.max_rate = 0.1;
        let err = args.validate().unwrap_err();
        assert!(err.to_string().contains("--min-rate"));
    }

    #[test]
    fn rejects_non_positive_multiplier() {
        let dir = std::env::temp_dir();
        let mut args = base_args(&dir);
        args.policies = std::env::current_exe().unwrap();
        args.mortality = args.policies.clone();
        args.lapse = args.policies.clone();
        args.expenses = args.policies.clone();
        args.expense_mult = 0.0;
        let err = args.validate().unwrap_err();
        assert!(err.to_string().contains("--expense-mult"));
    }
}
