//! TradeLab CLI — run, optimize, and benchmark commands.
//!
//! Commands:
//! - `run`: backtest one configuration from a TOML file or from flags
//! - `optimize`: search one strategy's parameter space (TPE or grid)
//! - `benchmark`: tune every classical strategy and rank them
//!
//! Each command accepts `--config`; flags given on the command line win over
//! the file's `[search]` and `[output]` values.
//!
//! Logging goes to stderr; set `RUST_LOG` to override the default
//! `tradelab=info` filter.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use tradelab_core::domain::PriceTable;
use tradelab_core::indicators::IndicatorCache;
use tradelab_core::signals::StrategyKind;
use tradelab_runner::config::{MethodName, OutputSection};
use tradelab_runner::data_loader::{default_data_path, load_price_table};
use tradelab_runner::export::{
    export_best_params_csv, export_json, export_ranked_csv, export_summary_csv,
    export_trades_csv, write_file,
};
use tradelab_runner::{
    optimize, run_backtest, run_benchmark, run_from_file, BacktestResult, BenchmarkSettings,
    ParamSet, ParamValue, RunFile, ScoringConfig, SearchOverrides, SearchReport, SearchSection,
    StrategyScore, TrialConfig,
};

#[derive(Parser)]
#[command(name = "tradelab", about = "TradeLab CLI: strategy backtesting and optimisation")]
struct Cli {
    /// Log at debug level unless RUST_LOG is set.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one configuration and write its trades.
    Run {
        /// Path to a TOML run file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Price CSV. Overrides the run file; defaults to $DATA_FILE.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Strategy to run when no --config is given.
        #[arg(long)]
        strategy: Option<StrategyKind>,

        /// Strategy parameter as name=value (repeatable).
        #[arg(long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,

        #[arg(long, default_value_t = 5.0)]
        sl_pct: f64,

        #[arg(long, default_value_t = 10.0)]
        tp_pct: f64,

        #[arg(long)]
        trailing_stop_pct: Option<f64>,

        #[arg(long)]
        position_size: Option<f64>,

        /// Trades CSV output. Defaults to the run file's `output.trades`.
        #[arg(long)]
        trades: Option<PathBuf>,

        /// Also write the full result as JSON.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Search a strategy's parameter space.
    Optimize {
        /// TOML run file supplying data, strategy, scoring, search and output.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Price CSV. Overrides the run file; defaults to $DATA_FILE.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Strategy to search. Defaults to the run file's strategy, else sma.
        #[arg(long)]
        strategy: Option<StrategyKind>,

        /// Search method: tpe or grid (default tpe).
        #[arg(long)]
        method: Option<MethodName>,

        /// Trial budget (default 300).
        #[arg(long)]
        trials: Option<usize>,

        /// TPE seed (default 42).
        #[arg(long)]
        seed: Option<u64>,

        /// Follow up with a small grid around the best result.
        #[arg(long, default_value_t = false)]
        refine: bool,

        #[arg(long)]
        results: Option<PathBuf>,

        #[arg(long)]
        best_params: Option<PathBuf>,
    },
    /// Tune every classical strategy and rank them by total return.
    Benchmark {
        /// TOML run file supplying data, seed and `output.summary`.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Price CSV. Overrides the run file; defaults to $DATA_FILE.
        #[arg(long)]
        data: Option<PathBuf>,

        /// TPE trials per strategy.
        #[arg(long, default_value_t = 50)]
        trials: usize,

        /// TPE seed (default 42).
        #[arg(long)]
        seed: Option<u64>,

        /// Skip the classifier strategy.
        #[arg(long, default_value_t = false)]
        no_ml: bool,

        #[arg(long)]
        summary: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            data,
            strategy,
            params,
            sl_pct,
            tp_pct,
            trailing_stop_pct,
            position_size,
            trades,
            json,
        } => {
            let (result, output) = match config {
                Some(path) => {
                    let mut file = RunFile::from_file(&path)?;
                    if let Some(data) = data {
                        file.data.path = data;
                    }
                    (run_from_file(&file)?, file.output)
                }
                None => {
                    let kind = strategy
                        .ok_or_else(|| anyhow!("one of --config or --strategy is required"))?;
                    let mut params = ParamSet::parse_pairs(params.iter().map(String::as_str))?;
                    params.insert("sl_pct", ParamValue::Float(sl_pct));
                    params.insert("tp_pct", ParamValue::Float(tp_pct));
                    if let Some(t) = trailing_stop_pct {
                        params.insert("trailing_stop_pct", ParamValue::Float(t));
                    }
                    if let Some(size) = position_size {
                        params.insert("position_size", ParamValue::Float(size));
                    }
                    let trial = TrialConfig::from_params(kind, &params)
                        .map_err(|reason| anyhow!("configuration rejected: {reason}"))?;
                    let mut table = load_table(data)?;
                    IndicatorCache::annotate(&mut table, &trial.strategy.indicator_request());
                    let result = run_backtest(&table, &trial, &ScoringConfig::default())?;
                    (result, OutputSection::default())
                }
            };

            print_summary(&result);
            let trades_path = trades.unwrap_or(output.trades);
            write_file(&trades_path, &export_trades_csv(&result.trades)?)?;
            println!("Trades saved to: {}", trades_path.display());
            if let Some(json_path) = json {
                write_file(&json_path, &export_json(&result)?)?;
                println!("Result saved to: {}", json_path.display());
            }
            Ok(())
        }
        Commands::Optimize {
            config,
            data,
            strategy,
            method,
            trials,
            seed,
            refine,
            results,
            best_params,
        } => {
            let file = load_run_file(config)?;
            let kind = strategy
                .or_else(|| file.as_ref().map(|f| f.strategy.kind()))
                .unwrap_or(StrategyKind::Sma);
            let overrides = SearchOverrides {
                method,
                trials,
                seed,
                refine,
            };
            let (data, settings, scoring, output) = match file {
                Some(f) => (
                    data.or(Some(f.data.path)),
                    f.search.with_overrides(&overrides),
                    f.scoring,
                    f.output,
                ),
                None => (
                    data,
                    SearchSection::default().with_overrides(&overrides),
                    ScoringConfig::default(),
                    OutputSection::default(),
                ),
            };
            let results = results.unwrap_or(output.results);
            let best_params = best_params.unwrap_or(output.best_params);

            let mut table = load_table(data)?;
            let report = optimize(&mut table, kind, &settings, &scoring);
            write_optimize_outputs(kind, &report, &results, &best_params)
        }
        Commands::Benchmark {
            config,
            data,
            trials,
            seed,
            no_ml,
            summary,
        } => {
            let file = load_run_file(config)?;
            let (data, file_seed, output) = match file {
                Some(f) => (data.or(Some(f.data.path)), Some(f.search.seed), f.output),
                None => (data, None, OutputSection::default()),
            };
            let summary = summary.unwrap_or(output.summary);

            let mut table = load_table(data)?;
            let defaults = BenchmarkSettings::default();
            let settings = BenchmarkSettings {
                trials,
                seed: seed.or(file_seed).unwrap_or(defaults.seed),
                include_classifier: !no_ml,
                ..defaults
            };
            let scores = run_benchmark(&mut table, &settings);

            println!();
            println!("{:<14} {:>14}", "Strategy", "Total Return %");
            println!("{}", "-".repeat(29));
            for s in &scores {
                println!("{:<14} {:>14.2}", s.strategy.label(), s.score);
            }
            write_file(&summary, &export_summary_csv(&scores)?)?;
            println!("Summary saved to: {}", summary.display());
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "tradelab=debug" } else { "tradelab=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_table(data: Option<PathBuf>) -> Result<PriceTable> {
    let path = data.unwrap_or_else(default_data_path);
    load_price_table(&path).with_context(|| format!("failed to load {}", path.display()))
}

fn load_run_file(config: Option<PathBuf>) -> Result<Option<RunFile>> {
    config
        .map(|path| RunFile::from_file(&path))
        .transpose()
        .map_err(Into::into)
}

fn write_optimize_outputs(
    kind: StrategyKind,
    report: &SearchReport,
    results_path: &Path,
    best_params_path: &Path,
) -> Result<()> {
    write_file(results_path, &export_ranked_csv(report)?)?;
    println!("Ranked results saved to: {}", results_path.display());

    let best = match report.best() {
        Some(best) => {
            println!("Best {kind} parameters: {} (total return {:.2}%)", best.params, best.score);
            StrategyScore {
                strategy: kind,
                params: best.params.clone(),
                score: best.score,
                trades: 0,
            }
        }
        None => {
            warn!(
                strategy = %kind,
                pruned = report.pruned,
                failed = report.failed,
                "no trial completed"
            );
            StrategyScore {
                strategy: kind,
                params: ParamSet::new(),
                score: 0.0,
                trades: 0,
            }
        }
    };
    write_file(best_params_path, &export_best_params_csv(&[best])?)?;
    println!("Best parameters saved to: {}", best_params_path.display());
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!("Strategy:       {}", result.config.strategy.kind().label());
    if let (Some(start), Some(end)) = (result.start, result.end) {
        println!("Period:         {start} to {end}");
    }
    println!("Bars:           {}", result.bar_count);
    println!("Trades:         {}", m.trade_count);
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:.2}%", m.total_return);
    println!("Avg Trade:      {:.3}%", m.avg_trade);
    println!("Sharpe:         {:.3}", m.sharpe);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown);
    println!("Win Rate:       {:.1}%", m.win_rate * 100.0);
    println!("Profit Factor:  {:.2}", m.profit_factor);
    println!("Avg Bars Held:  {:.1}", m.avg_bars_held);
    println!();
}
