//! Benchmark — tune every classical strategy, then compare them side by side.
//!
//! Each classical family is searched with TPE under the search scoring, and
//! its best configuration is re-run and scored under the report scoring. The
//! classifier strategy is not tuned; it runs once with default parameters.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use tradelab_core::domain::PriceTable;
use tradelab_core::indicators::IndicatorCache;
use tradelab_core::signals::StrategyKind;

use crate::metrics::ScoringConfig;
use crate::params::{ParamSet, TrialConfig};
use crate::search::{evaluate, search, SearchMethod};
use crate::search_space::SearchSpace;
use crate::tpe::TpeSettings;

/// Best score one strategy family reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyScore {
    pub strategy: StrategyKind,
    pub params: ParamSet,
    pub score: f64,
    pub trades: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkSettings {
    /// TPE trials per strategy.
    pub trials: usize,
    pub seed: u64,
    pub include_classifier: bool,
    /// Scoring the searches maximise.
    pub search_scoring: ScoringConfig,
    /// Scoring of the reported re-run.
    pub report_scoring: ScoringConfig,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            trials: 50,
            seed: 42,
            include_classifier: true,
            search_scoring: ScoringConfig::default(),
            report_scoring: ScoringConfig::frictionless(),
        }
    }
}

/// Strategies tuned by the benchmark.
pub const CLASSICAL: [StrategyKind; 8] = [
    StrategyKind::Sma,
    StrategyKind::Rsi,
    StrategyKind::Breakout,
    StrategyKind::Bollinger,
    StrategyKind::Momentum,
    StrategyKind::VolExpansion,
    StrategyKind::Macd,
    StrategyKind::Stochastic,
];

/// Run the benchmark. Indicator columns each search needs are added to
/// `table`. Results are sorted by score, best first.
pub fn run_benchmark(
    table: &mut PriceTable,
    settings: &BenchmarkSettings,
) -> Vec<StrategyScore> {
    let mut scores = Vec::new();
    let method = SearchMethod::Tpe(TpeSettings::with_seed(settings.seed));

    for kind in CLASSICAL {
        let space = SearchSpace::for_kind(kind);
        IndicatorCache::annotate(table, &space.indicator_request());
        let report = search(
            table,
            &space,
            settings.trials,
            &method,
            &settings.search_scoring,
        );

        let Some(best) = report.best() else {
            warn!(strategy = %kind, "no completed trials; scoring 0");
            scores.push(zero_score(kind, ParamSet::new()));
            continue;
        };
        scores.push(rescore(table, kind, best.params.clone(), &best.config, settings));
    }

    if settings.include_classifier {
        let kind = StrategyKind::RandomForest;
        match TrialConfig::from_params(kind, &ParamSet::new()) {
            Ok(config) => {
                IndicatorCache::annotate(table, &config.strategy.indicator_request());
                scores.push(rescore(table, kind, ParamSet::new(), &config, settings));
            }
            Err(reason) => {
                warn!(strategy = %kind, %reason, "default classifier config rejected");
                scores.push(zero_score(kind, ParamSet::new()));
            }
        }
    }

    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    for s in &scores {
        info!(
            strategy = s.strategy.label(),
            total_return = s.score,
            trades = s.trades,
            "benchmark result"
        );
    }
    scores
}

fn rescore(
    table: &PriceTable,
    kind: StrategyKind,
    params: ParamSet,
    config: &TrialConfig,
    settings: &BenchmarkSettings,
) -> StrategyScore {
    match evaluate(table, config, &settings.report_scoring) {
        Ok(eval) => StrategyScore {
            strategy: kind,
            params,
            score: eval.score(),
            trades: eval.metrics.trade_count,
        },
        Err(error) => {
            warn!(strategy = %kind, %error, "re-evaluation failed; scoring 0");
            zero_score(kind, params)
        }
    }
}

fn zero_score(kind: StrategyKind, params: ParamSet) -> StrategyScore {
    StrategyScore {
        strategy: kind,
        params,
        score: 0.0,
        trades: 0,
    }
}
