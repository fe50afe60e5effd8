//! TradeLab Runner — data loading, scoring, parameter search, benchmarking, export.
//!
//! This crate builds on `tradelab-core` to provide:
//! - CSV loading with cleaning (sorting, de-duplication, bad-row removal)
//! - Single-backtest runner and performance metrics
//! - Typed search spaces with structural pruning
//! - Grid and TPE parameter search
//! - Cross-strategy benchmark
//! - TOML run configuration and CSV/JSON export

pub mod benchmark;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod grid;
pub mod metrics;
pub mod params;
pub mod runner;
pub mod search;
pub mod search_space;
pub mod tpe;

pub use benchmark::{run_benchmark, BenchmarkSettings, StrategyScore};
pub use config::{RunConfigError, RunFile, SearchOverrides, SearchSection};
pub use data_loader::{load_bars, load_price_table, LoadError, LoadedBars};
pub use grid::refine_around;
pub use metrics::{PerformanceMetrics, ScoringConfig};
pub use params::{ParamSet, ParamValue, PruneReason, TrialConfig};
pub use runner::{optimize, run_backtest, run_from_file, BacktestResult, RunError};
pub use search::{
    evaluate, grid_search, search, Evaluation, RankedTrial, SearchMethod, SearchReport, TrialError,
    TrialOutcome,
};
pub use search_space::{ParamSpec, SearchSpace};
pub use tpe::{TpeSampler, TpeSettings};
