//! Backtest runner — wires together data, indicators, signals, engine, and metrics.
//!
//! Entry points:
//! - `run_backtest()`: takes a pre-loaded price table. Used by search and benchmark.
//! - `run_from_file()`: loads the data a `RunFile` names, then runs. Used by the CLI.
//! - `optimize()`: one strategy's search under `[search]` settings, with the
//!   optional refined grid afterwards. Used by the CLI.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use tradelab_core::domain::{PriceTable, Trade};
use tradelab_core::engine::ConfigError;
use tradelab_core::indicators::IndicatorCache;
use tradelab_core::signals::StrategyKind;

use crate::config::{RunConfigError, RunFile, SearchSection};
use crate::data_loader::{load_price_table, LoadError};
use crate::grid::refine_around;
use crate::metrics::{PerformanceMetrics, ScoringConfig};
use crate::params::TrialConfig;
use crate::search::{evaluate, grid_search, search, SearchReport, TrialError};
use crate::search_space::SearchSpace;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] RunConfigError),
    #[error("invalid risk config: {0}")]
    Risk(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("backtest failed: {0}")]
    Trial(#[from] TrialError),
}

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub config: TrialConfig,
    pub config_hash: String,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<Trade>,
    pub bar_count: usize,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run one configuration on an already loaded table.
///
/// Missing indicator columns are computed for this run only; `table` is not
/// modified.
pub fn run_backtest(
    table: &PriceTable,
    config: &TrialConfig,
    scoring: &ScoringConfig,
) -> Result<BacktestResult, RunError> {
    let eval = evaluate(table, config, scoring)?;
    info!(
        strategy = %config.strategy.kind(),
        trades = eval.metrics.trade_count,
        total_return = eval.metrics.total_return,
        win_rate = eval.metrics.win_rate,
        "backtest complete"
    );
    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        config: config.clone(),
        config_hash: config.config_hash(),
        metrics: eval.metrics,
        trades: eval.trades,
        bar_count: table.len(),
        start: table.bars().first().map(|b| b.timestamp),
        end: table.bars().last().map(|b| b.timestamp),
    })
}

/// Load the file's data, fill its strategy's indicators, and run it.
pub fn run_from_file(file: &RunFile) -> Result<BacktestResult, RunError> {
    let config = TrialConfig::new(file.strategy.clone(), file.risk()?);
    let mut table = load_price_table(&file.data.path)?;
    IndicatorCache::annotate(&mut table, &config.strategy.indicator_request());
    run_backtest(&table, &config, &file.scoring)
}

/// Search `kind`'s default space with `settings`, caching its indicators on
/// `table` first.
///
/// With `settings.refine`, the returned report ranks the grid around the
/// best result instead of the initial search.
pub fn optimize(
    table: &mut PriceTable,
    kind: StrategyKind,
    settings: &SearchSection,
    scoring: &ScoringConfig,
) -> SearchReport {
    let space = SearchSpace::for_kind(kind);
    IndicatorCache::annotate(table, &space.indicator_request());
    let report = search(table, &space, settings.trials, &settings.search_method(), scoring);

    let neighbourhood = report
        .best()
        .filter(|_| settings.refine)
        .map(|best| refine_around(&space, &best.params));
    match neighbourhood {
        Some(neighbourhood) => {
            info!(candidates = neighbourhood.len(), "refining around best result");
            grid_search(table, kind, neighbourhood, usize::MAX, scoring)
        }
        None => report,
    }
}
