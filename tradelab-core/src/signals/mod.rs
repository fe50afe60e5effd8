//! Signal providers — indicator-annotated price table in, entry/exit flags out.
//!
//! Each strategy family is one variant of the closed `StrategyConfig` enum and
//! one `SignalProvider` implementation. Providers are pure: they read shifted
//! indicator columns (see `indicators::cache`) plus the current bar's OHLC and
//! produce two boolean vectors aligned 1:1 with the bars.
//!
//! A comparison that involves a NaN operand is false, so warmup bars never
//! signal.

pub mod bollinger;
pub mod breakout;
pub mod classifier;
pub mod ma_crossover;
pub mod macd;
pub mod momentum;
pub mod rsi_threshold;
pub mod stochastic;
pub mod vol_expansion;

pub use bollinger::BollingerReversion;
pub use breakout::Breakout;
pub use classifier::ClassifierProbability;
pub use ma_crossover::MaCrossover;
pub use macd::MacdCrossover;
pub use momentum::MomentumImpulse;
pub use rsi_threshold::RsiThreshold;
pub use stochastic::StochasticCross;
pub use vol_expansion::VolatilityExpansion;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PriceTable;
use crate::engine::ConfigError;
use crate::indicators::IndicatorRequest;
use crate::model::ModelError;

/// Errors raised while turning a price table into signals.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("missing indicator column '{column}' (absent or entirely NaN)")]
    MissingIndicator { column: String },

    #[error("classifier: {0}")]
    Model(#[from] ModelError),
}

/// Entry and exit flags, one per bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signals {
    pub entries: Vec<bool>,
    pub exits: Vec<bool>,
}

impl Signals {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.iter().filter(|&&e| e).count()
    }
}

/// A strategy family that emits entry/exit flags.
///
/// Providers never see engine state: the signature takes only the price table.
pub trait SignalProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Indicator columns this configuration needs the cache to compute.
    fn indicator_request(&self) -> IndicatorRequest;

    /// Column names read by `signals`, in lookup order.
    fn required_columns(&self) -> Vec<String>;

    fn signals(&self, table: &PriceTable) -> Result<Signals, SignalError>;
}

// ─── Column lookup and crossing helpers ─────────────────────────────

/// Fetch a required column, failing if it is absent or entirely NaN.
pub(crate) fn require<'a>(table: &'a PriceTable, column: &str) -> Result<&'a [f64], SignalError> {
    let missing = || SignalError::MissingIndicator {
        column: column.to_string(),
    };
    let series = table.column(column).ok_or_else(missing)?;
    if !series.is_empty() && series.iter().all(|v| v.is_nan()) {
        return Err(missing());
    }
    Ok(series)
}

/// Flags where `pred(prev, cur)` holds; bar 0 has no predecessor and is false.
pub(crate) fn pairwise(series: &[f64], pred: impl Fn(f64, f64) -> bool) -> Vec<bool> {
    let mut out = vec![false; series.len()];
    for i in 1..series.len() {
        out[i] = pred(series[i - 1], series[i]);
    }
    out
}

/// `a[i] > b[i] && a[i-1] <= b[i-1]`
pub fn crosses_above(a: &[f64], b: &[f64]) -> Vec<bool> {
    let mut out = vec![false; a.len()];
    for i in 1..a.len() {
        out[i] = a[i] > b[i] && a[i - 1] <= b[i - 1];
    }
    out
}

/// `a[i] < b[i] && a[i-1] >= b[i-1]`
pub fn crosses_below(a: &[f64], b: &[f64]) -> Vec<bool> {
    let mut out = vec![false; a.len()];
    for i in 1..a.len() {
        out[i] = a[i] < b[i] && a[i - 1] >= b[i - 1];
    }
    out
}

pub(crate) fn check_window(name: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidParameter {
            name: name.to_string(),
            reason: "window must be >= 1".into(),
        });
    }
    Ok(())
}

pub(crate) fn check_finite(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::InvalidParameter {
            name: name.to_string(),
            reason: format!("must be finite, got {value}"),
        });
    }
    Ok(())
}

// ─── Strategy selection ─────────────────────────────────────────────

/// Fieldless strategy family tag, used by search spaces and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Sma,
    Rsi,
    Breakout,
    Bollinger,
    Momentum,
    VolExpansion,
    Macd,
    Stochastic,
    RandomForest,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 9] = [
        StrategyKind::Sma,
        StrategyKind::Rsi,
        StrategyKind::Breakout,
        StrategyKind::Bollinger,
        StrategyKind::Momentum,
        StrategyKind::VolExpansion,
        StrategyKind::Macd,
        StrategyKind::Stochastic,
        StrategyKind::RandomForest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Sma => "sma",
            StrategyKind::Rsi => "rsi",
            StrategyKind::Breakout => "breakout",
            StrategyKind::Bollinger => "bollinger",
            StrategyKind::Momentum => "momentum",
            StrategyKind::VolExpansion => "vol_expansion",
            StrategyKind::Macd => "macd",
            StrategyKind::Stochastic => "stochastic",
            StrategyKind::RandomForest => "random_forest",
        }
    }

    /// Display label used in benchmark summaries.
    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::Sma => "SMA",
            StrategyKind::Rsi => "RSI",
            StrategyKind::Breakout => "Breakout",
            StrategyKind::Bollinger => "Bollinger",
            StrategyKind::Momentum => "Momentum",
            StrategyKind::VolExpansion => "VolExpansion",
            StrategyKind::Macd => "MACD",
            StrategyKind::Stochastic => "Stochastic",
            StrategyKind::RandomForest => "RandomForest",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown strategy '{0}' (expected one of: sma, rsi, breakout, bollinger, momentum, vol_expansion, macd, stochastic, random_forest)")]
pub struct UnknownStrategy(pub String);

impl FromStr for StrategyKind {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.as_str() == lowered)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

/// A fully parameterised strategy, tagged by `strategy` when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyConfig {
    Sma(MaCrossover),
    Rsi(RsiThreshold),
    Breakout(Breakout),
    Bollinger(BollingerReversion),
    Momentum(MomentumImpulse),
    VolExpansion(VolatilityExpansion),
    Macd(MacdCrossover),
    Stochastic(StochasticCross),
    RandomForest(ClassifierProbability),
}

impl StrategyConfig {
    /// Default parameters for a strategy family.
    pub fn default_for(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Sma => StrategyConfig::Sma(MaCrossover::default()),
            StrategyKind::Rsi => StrategyConfig::Rsi(RsiThreshold::default()),
            StrategyKind::Breakout => StrategyConfig::Breakout(Breakout::default()),
            StrategyKind::Bollinger => StrategyConfig::Bollinger(BollingerReversion::default()),
            StrategyKind::Momentum => StrategyConfig::Momentum(MomentumImpulse::default()),
            StrategyKind::VolExpansion => {
                StrategyConfig::VolExpansion(VolatilityExpansion::default())
            }
            StrategyKind::Macd => StrategyConfig::Macd(MacdCrossover::default()),
            StrategyKind::Stochastic => StrategyConfig::Stochastic(StochasticCross::default()),
            StrategyKind::RandomForest => {
                StrategyConfig::RandomForest(ClassifierProbability::default())
            }
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyConfig::Sma(_) => StrategyKind::Sma,
            StrategyConfig::Rsi(_) => StrategyKind::Rsi,
            StrategyConfig::Breakout(_) => StrategyKind::Breakout,
            StrategyConfig::Bollinger(_) => StrategyKind::Bollinger,
            StrategyConfig::Momentum(_) => StrategyKind::Momentum,
            StrategyConfig::VolExpansion(_) => StrategyKind::VolExpansion,
            StrategyConfig::Macd(_) => StrategyKind::Macd,
            StrategyConfig::Stochastic(_) => StrategyKind::Stochastic,
            StrategyConfig::RandomForest(_) => StrategyKind::RandomForest,
        }
    }

    pub fn provider(&self) -> &dyn SignalProvider {
        match self {
            StrategyConfig::Sma(p) => p,
            StrategyConfig::Rsi(p) => p,
            StrategyConfig::Breakout(p) => p,
            StrategyConfig::Bollinger(p) => p,
            StrategyConfig::Momentum(p) => p,
            StrategyConfig::VolExpansion(p) => p,
            StrategyConfig::Macd(p) => p,
            StrategyConfig::Stochastic(p) => p,
            StrategyConfig::RandomForest(p) => p,
        }
    }

    /// Reject parameters that can never produce a column or a comparison.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            StrategyConfig::Sma(p) => p.validate(),
            StrategyConfig::Rsi(p) => p.validate(),
            StrategyConfig::Breakout(p) => p.validate(),
            StrategyConfig::Bollinger(p) => p.validate(),
            StrategyConfig::Momentum(p) => p.validate(),
            StrategyConfig::VolExpansion(p) => p.validate(),
            StrategyConfig::Macd(p) => p.validate(),
            StrategyConfig::Stochastic(p) => p.validate(),
            StrategyConfig::RandomForest(p) => p.validate(),
        }
    }

    pub fn indicator_request(&self) -> IndicatorRequest {
        self.provider().indicator_request()
    }

    pub fn signals(&self, table: &PriceTable) -> Result<Signals, SignalError> {
        self.provider().signals(table)
    }
}

/// Bars for signal tests: one day apart, OHLC built around the given closes.
#[cfg(test)]
pub(crate) fn table_from(closes: &[f64]) -> PriceTable {
    PriceTable::new(crate::indicators::make_bars(closes))
}
