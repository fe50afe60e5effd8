//! Parameter search driver — proposes trials, prunes, evaluates, ranks.
//!
//! Two backends share one trial pipeline:
//! - `SearchMethod::Grid`: every grid point of the space, evaluated in
//!   parallel with rayon.
//! - `SearchMethod::Tpe`: sequential Bayesian suggestions from `TpeSampler`.
//!
//! A trial that fails (e.g. an indicator column that is all NaN because the
//! data is shorter than its window) is logged and counted; the search goes on.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use tradelab_core::domain::{PriceTable, Trade};
use tradelab_core::engine::{simulate_signals, ConfigError, EngineError};
use tradelab_core::indicators::IndicatorCache;
use tradelab_core::signals::{SignalError, StrategyKind};

use crate::grid;
use crate::metrics::{PerformanceMetrics, ScoringConfig};
use crate::params::{ParamSet, PruneReason, TrialConfig};
use crate::search_space::SearchSpace;
use crate::tpe::{TpeSampler, TpeSettings};

/// Grid candidates evaluated per parallel batch.
const GRID_BATCH: usize = 4096;

/// Fresh TPE suggestions tried before a repeated configuration is accepted
/// as a spent trial.
const MAX_RESUGGEST: usize = 16;

/// Errors from evaluating a single trial.
#[derive(Debug, Error)]
pub enum TrialError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("signal error: {0}")]
    Signal(#[from] SignalError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Trades and metrics of one evaluated configuration.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub trades: Vec<Trade>,
    pub metrics: PerformanceMetrics,
}

impl Evaluation {
    /// The quantity searches maximise: total net return.
    pub fn score(&self) -> f64 {
        self.metrics.total_return
    }
}

/// Signals → engine → scorer for one configuration.
///
/// Columns the table lacks (MACD and stochastic tuples are never
/// precomputed for a whole space) are computed on a private copy.
pub fn evaluate(
    table: &PriceTable,
    trial: &TrialConfig,
    scoring: &ScoringConfig,
) -> Result<Evaluation, TrialError> {
    trial.strategy.validate()?;
    let provider = trial.strategy.provider();
    let complete = provider
        .required_columns()
        .iter()
        .all(|c| table.has_column(c));

    let local;
    let table = if complete {
        table
    } else {
        let mut copy = PriceTable::new(table.bars().to_vec());
        IndicatorCache::annotate(&mut copy, &provider.indicator_request());
        local = copy;
        &local
    };

    let signals = provider.signals(table)?;
    let trades = simulate_signals(table, &signals, &trial.risk)?;
    let metrics = PerformanceMetrics::compute(&trades, scoring);
    Ok(Evaluation { trades, metrics })
}

// ─── Trials ─────────────────────────────────────────────────────────

/// What happened to one proposed parameter set.
#[derive(Debug)]
pub enum TrialOutcome {
    Completed {
        params: ParamSet,
        config: TrialConfig,
        score: f64,
    },
    Pruned {
        params: ParamSet,
        reason: PruneReason,
    },
    Failed {
        params: ParamSet,
        error: TrialError,
    },
}

// ─── Search ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum SearchMethod {
    Grid,
    Tpe(TpeSettings),
}

impl SearchMethod {
    pub fn tpe(seed: u64) -> Self {
        SearchMethod::Tpe(TpeSettings::with_seed(seed))
    }

    pub fn name(&self) -> &'static str {
        match self {
            SearchMethod::Grid => "grid",
            SearchMethod::Tpe(_) => "tpe",
        }
    }
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown search method '{0}' (expected 'grid' or 'tpe')")]
pub struct UnknownMethod(pub String);

impl FromStr for SearchMethod {
    type Err = UnknownMethod;

    /// Parses the method name; TPE gets default settings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(SearchMethod::Grid),
            "tpe" | "bayes" | "bayesian" => Ok(SearchMethod::Tpe(TpeSettings::default())),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// One completed trial in a ranking.
#[derive(Debug, Clone, Serialize)]
pub struct RankedTrial {
    pub params: ParamSet,
    pub config: TrialConfig,
    pub score: f64,
}

/// Completed trials ranked by score, best first, plus bookkeeping.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub kind: StrategyKind,
    pub method: String,
    pub ranked: Vec<RankedTrial>,
    pub pruned: usize,
    pub failed: usize,
    /// TPE suggestions that repeated an already evaluated configuration.
    pub duplicates: usize,
}

impl SearchReport {
    fn new(kind: StrategyKind, method: &SearchMethod) -> Self {
        Self {
            kind,
            method: method.name().to_string(),
            ranked: Vec::new(),
            pruned: 0,
            failed: 0,
            duplicates: 0,
        }
    }

    pub fn best(&self) -> Option<&RankedTrial> {
        self.ranked.first()
    }

    /// Trials that were proposed, whatever their outcome.
    pub fn trials(&self) -> usize {
        self.ranked.len() + self.pruned + self.failed + self.duplicates
    }

    fn record(&mut self, outcome: TrialOutcome) {
        match outcome {
            TrialOutcome::Completed {
                params,
                config,
                score,
            } => self.ranked.push(RankedTrial {
                params,
                config,
                score,
            }),
            TrialOutcome::Pruned { params, reason } => {
                debug!(%params, %reason, "trial pruned");
                self.pruned += 1;
            }
            TrialOutcome::Failed { params, error } => {
                warn!(%params, %error, "trial failed");
                self.failed += 1;
            }
        }
    }

    /// Stable sort, so equal scores keep proposal order.
    fn finish(mut self) -> Self {
        self.ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        info!(
            strategy = %self.kind,
            method = %self.method,
            completed = self.ranked.len(),
            pruned = self.pruned,
            failed = self.failed,
            best = self.best().map(|t| t.score),
            "search finished"
        );
        self
    }
}

/// Search `space` for the best-scoring configuration.
///
/// `budget` caps the trials evaluated (grid) or proposed (TPE). The table
/// should already carry `space.indicator_request()`.
pub fn search(
    table: &PriceTable,
    space: &SearchSpace,
    budget: usize,
    method: &SearchMethod,
    scoring: &ScoringConfig,
) -> SearchReport {
    info!(
        strategy = %space.kind,
        method = %method,
        budget,
        grid_size = space.grid_size(),
        "starting search"
    );
    match method {
        SearchMethod::Grid => {
            grid_search(table, space.kind, grid::enumerate(space), budget, scoring)
        }
        SearchMethod::Tpe(settings) => tpe_search(table, space, budget, settings, scoring),
    }
}

/// Evaluate explicit candidates (a grid, or a refined neighbourhood) in
/// parallel. Pruned candidates do not count against `budget`.
pub fn grid_search(
    table: &PriceTable,
    kind: StrategyKind,
    candidates: impl IntoIterator<Item = ParamSet>,
    budget: usize,
    scoring: &ScoringConfig,
) -> SearchReport {
    let method = SearchMethod::Grid;
    let mut report = SearchReport::new(kind, &method);
    let mut batch: Vec<(ParamSet, TrialConfig)> = Vec::with_capacity(GRID_BATCH);
    let mut accepted = 0usize;

    let flush = |batch: &mut Vec<(ParamSet, TrialConfig)>, report: &mut SearchReport| {
        let outcomes: Vec<TrialOutcome> = batch
            .par_drain(..)
            .map(|(params, config)| match evaluate(table, &config, scoring) {
                Ok(eval) => TrialOutcome::Completed {
                    score: eval.score(),
                    params,
                    config,
                },
                Err(error) => TrialOutcome::Failed { params, error },
            })
            .collect();
        for outcome in outcomes {
            report.record(outcome);
        }
    };

    for params in candidates {
        if accepted >= budget {
            break;
        }
        match TrialConfig::from_params(kind, &params) {
            Ok(config) => {
                accepted += 1;
                batch.push((params, config));
                if batch.len() >= GRID_BATCH {
                    flush(&mut batch, &mut report);
                }
            }
            Err(reason) => report.record(TrialOutcome::Pruned { params, reason }),
        }
    }
    flush(&mut batch, &mut report);
    report.finish()
}

fn tpe_search(
    table: &PriceTable,
    space: &SearchSpace,
    budget: usize,
    settings: &TpeSettings,
    scoring: &ScoringConfig,
) -> SearchReport {
    let method = SearchMethod::Tpe(settings.clone());
    let mut report = SearchReport::new(space.kind, &method);
    let mut sampler = TpeSampler::new(space.clone(), settings.clone());
    let mut seen: HashSet<String> = HashSet::new();

    for trial in 0..budget {
        let mut candidate = None;
        for _ in 0..MAX_RESUGGEST {
            let params = sampler.suggest();
            match TrialConfig::from_params(space.kind, &params) {
                Ok(config) if seen.contains(&config.config_hash()) => continue,
                Ok(config) => {
                    candidate = Some(Ok((params, config)));
                    break;
                }
                Err(reason) => {
                    candidate = Some(Err((params, reason)));
                    break;
                }
            }
        }

        match candidate {
            None => report.duplicates += 1,
            Some(Err((params, reason))) => {
                report.record(TrialOutcome::Pruned { params, reason })
            }
            Some(Ok((params, config))) => {
                seen.insert(config.config_hash());
                let outcome = match evaluate(table, &config, scoring) {
                    Ok(eval) => {
                        let score = eval.score();
                        sampler.observe(params.clone(), score);
                        debug!(trial, score, %params, "trial completed");
                        TrialOutcome::Completed {
                            params,
                            config,
                            score,
                        }
                    }
                    Err(error) => TrialOutcome::Failed { params, error },
                };
                report.record(outcome);
            }
        }
    }
    report.finish()
}
