//! Parameter values, parameter sets, and the trial configurations built from them.
//!
//! A `ParamSet` is what a search backend proposes: a flat map of names to
//! values. `TrialConfig::from_params` turns it into a typed strategy + risk
//! configuration, or a `PruneReason` when the combination can never be a
//! meaningful backtest. Pruning is decided before any `RiskConfig` is built or
//! any bar is simulated.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradelab_core::engine::{ConfigError, RiskConfig};
use tradelab_core::signals::{
    BollingerReversion, Breakout, ClassifierProbability, MaCrossover, MacdCrossover,
    MomentumImpulse, RsiThreshold, StochasticCross, StrategyConfig, StrategyKind,
    VolatilityExpansion,
};

/// Stop-loss percent used when a parameter set does not carry `sl_pct`.
pub const DEFAULT_SL_PCT: f64 = 5.0;
/// Take-profit percent used when a parameter set does not carry `tp_pct`.
pub const DEFAULT_TP_PCT: f64 = 10.0;

// ─── Values ─────────────────────────────────────────────────────────

/// A single parameter value. `None` is a legal choice (e.g. "no trend filter").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    None,
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            ParamValue::Int(i) => Some(i as f64),
            ParamValue::Float(f) => Some(f),
            ParamValue::None => None,
        }
    }

    /// Integer view; a float with no fractional part also counts.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            ParamValue::Int(i) => Some(i),
            ParamValue::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ParamValue::None)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::None => f.write_str("none"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid parameter value '{0}' (expected an integer, a number, or 'none')")]
pub struct ParamParseError(pub String);

impl FromStr for ParamValue {
    type Err = ParamParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("none") || trimmed.eq_ignore_ascii_case("null") {
            return Ok(ParamValue::None);
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Ok(ParamValue::Int(i));
        }
        trimmed
            .parse::<f64>()
            .map(ParamValue::Float)
            .map_err(|_| ParamParseError(s.to_string()))
    }
}

// ─── Parameter sets ─────────────────────────────────────────────────

/// Named parameter values proposed for one trial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSet(BTreeMap<String, ParamValue>);

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.0.insert(name.into(), value);
    }

    /// Builder form of `insert`.
    pub fn with(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.0.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse `name=value` pairs as given on the command line.
    pub fn parse_pairs<'a>(
        pairs: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ParamParseError> {
        let mut set = ParamSet::new();
        for pair in pairs {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| ParamParseError(pair.to_string()))?;
            set.insert(name.trim(), value.parse()?);
        }
        Ok(set)
    }

    fn window(&self, name: &str, default: usize) -> Result<usize, PruneReason> {
        match self.get(name) {
            None => Ok(default),
            Some(value) => to_window(name, value),
        }
    }

    fn optional_window(
        &self,
        name: &str,
        default: Option<usize>,
    ) -> Result<Option<usize>, PruneReason> {
        match self.get(name) {
            None => Ok(default),
            Some(ParamValue::None) => Ok(None),
            Some(value) => to_window(name, value).map(Some),
        }
    }

    fn number(&self, name: &str, default: f64) -> Result<f64, PruneReason> {
        match self.get(name) {
            None => Ok(default),
            Some(value) => value
                .as_f64()
                .ok_or_else(|| PruneReason::invalid(name, "must be a number")),
        }
    }

    fn optional_number(&self, name: &str) -> Result<Option<f64>, PruneReason> {
        match self.get(name) {
            None | Some(ParamValue::None) => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| PruneReason::invalid(name, "must be a number")),
        }
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

fn to_window(name: &str, value: ParamValue) -> Result<usize, PruneReason> {
    value
        .as_i64()
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| PruneReason::invalid(name, format!("must be a non-negative integer, got {value}")))
}

// ─── Pruning ────────────────────────────────────────────────────────

/// Why a candidate was discarded without being simulated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PruneReason {
    StopLossNotBelowTakeProfit { sl_pct: f64, tp_pct: f64 },
    FastNotBelowSlow { fast: usize, slow: usize },
    SmoothingLongerThanLookback { k_period: usize, d_period: usize },
    ExitThresholdAboveEntry { entry: f64, exit: f64 },
    NonPositiveTrailingStop(f64),
    InvalidParameter { name: String, reason: String },
}

impl PruneReason {
    fn invalid(name: &str, reason: impl Into<String>) -> Self {
        PruneReason::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for PruneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PruneReason::StopLossNotBelowTakeProfit { sl_pct, tp_pct } => {
                write!(f, "sl_pct ({sl_pct}) must be below tp_pct ({tp_pct})")
            }
            PruneReason::FastNotBelowSlow { fast, slow } => {
                write!(f, "fast window ({fast}) must be below slow window ({slow})")
            }
            PruneReason::SmoothingLongerThanLookback { k_period, d_period } => {
                write!(f, "d_period ({d_period}) exceeds k_period ({k_period})")
            }
            PruneReason::ExitThresholdAboveEntry { entry, exit } => {
                write!(f, "exit_threshold ({exit}) exceeds entry_threshold ({entry})")
            }
            PruneReason::NonPositiveTrailingStop(v) => {
                write!(f, "trailing_stop_pct must be positive, got {v}")
            }
            PruneReason::InvalidParameter { name, reason } => write!(f, "{name}: {reason}"),
        }
    }
}

impl From<ConfigError> for PruneReason {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::StopLossNotBelowTakeProfit { sl_pct, tp_pct } => {
                PruneReason::StopLossNotBelowTakeProfit { sl_pct, tp_pct }
            }
            ConfigError::NonPositiveTrailingStop(v) => PruneReason::NonPositiveTrailingStop(v),
            ConfigError::InvalidPositionSize(v) => PruneReason::invalid(
                "position_size",
                format!("must be finite and positive, got {v}"),
            ),
            ConfigError::InvalidParameter { name, reason } => {
                PruneReason::InvalidParameter { name, reason }
            }
        }
    }
}

// ─── Trial configuration ────────────────────────────────────────────

/// Everything one backtest needs besides the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialConfig {
    pub strategy: StrategyConfig,
    pub risk: RiskConfig,
}

impl TrialConfig {
    pub fn new(strategy: StrategyConfig, risk: RiskConfig) -> Self {
        Self { strategy, risk }
    }

    /// Build the trial a parameter set describes, or say why it is pruned.
    ///
    /// Parameters absent from `params` take the strategy's defaults (and
    /// `DEFAULT_SL_PCT` / `DEFAULT_TP_PCT` for the risk rules).
    pub fn from_params(kind: StrategyKind, params: &ParamSet) -> Result<Self, PruneReason> {
        let sl_pct = params.number("sl_pct", DEFAULT_SL_PCT)?;
        let tp_pct = params.number("tp_pct", DEFAULT_TP_PCT)?;
        if sl_pct >= tp_pct {
            return Err(PruneReason::StopLossNotBelowTakeProfit { sl_pct, tp_pct });
        }
        let trailing = params.optional_number("trailing_stop_pct")?;
        if let Some(t) = trailing {
            if !(t > 0.0) {
                return Err(PruneReason::NonPositiveTrailingStop(t));
            }
        }
        let position_size = params.number("position_size", 1.0)?;

        let strategy = strategy_from_params(kind, params)?;
        strategy.validate()?;
        let risk = RiskConfig::new(sl_pct, tp_pct, trailing, position_size)?;
        Ok(Self { strategy, risk })
    }

    /// Stable identity of this configuration: BLAKE3 over its JSON form.
    pub fn config_hash(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }
}

fn strategy_from_params(
    kind: StrategyKind,
    params: &ParamSet,
) -> Result<StrategyConfig, PruneReason> {
    let config = match kind {
        StrategyKind::Sma => {
            let d = MaCrossover::default();
            let fast = params.window("sma_fast", d.fast)?;
            let slow = params.window("sma_slow", d.slow)?;
            if fast >= slow {
                return Err(PruneReason::FastNotBelowSlow { fast, slow });
            }
            StrategyConfig::Sma(MaCrossover {
                fast,
                slow,
                trend: params.optional_window("sma_trend", d.trend)?,
            })
        }
        StrategyKind::Rsi => {
            let d = RsiThreshold::default();
            StrategyConfig::Rsi(RsiThreshold {
                period: params.window("period", d.period)?,
                oversold: params.number("oversold", d.oversold)?,
            })
        }
        StrategyKind::Breakout => {
            let d = Breakout::default();
            StrategyConfig::Breakout(Breakout {
                lookback: params.window("lookback", d.lookback)?,
                atr_period: params.window("atr_period", d.atr_period)?,
                atr_mult: params.number("atr_mult", d.atr_mult)?,
            })
        }
        StrategyKind::Bollinger => {
            let d = BollingerReversion::default();
            StrategyConfig::Bollinger(BollingerReversion {
                period: params.window("period", d.period)?,
                nstd: params.number("nstd", d.nstd)?,
            })
        }
        StrategyKind::Momentum => {
            let d = MomentumImpulse::default();
            StrategyConfig::Momentum(MomentumImpulse {
                window: params.window("window", d.window)?,
                threshold: params.number("threshold", d.threshold)?,
            })
        }
        StrategyKind::VolExpansion => {
            let d = VolatilityExpansion::default();
            StrategyConfig::VolExpansion(VolatilityExpansion {
                vol_window: params.window("vol_window", d.vol_window)?,
                vol_threshold: params.number("vol_threshold", d.vol_threshold)?,
            })
        }
        StrategyKind::Macd => {
            let d = MacdCrossover::default();
            let fast = params.window("fast", d.fast)?;
            let slow = params.window("slow", d.slow)?;
            if fast >= slow {
                return Err(PruneReason::FastNotBelowSlow { fast, slow });
            }
            StrategyConfig::Macd(MacdCrossover {
                fast,
                slow,
                signal: params.window("signal", d.signal)?,
            })
        }
        StrategyKind::Stochastic => {
            let d = StochasticCross::default();
            let k_period = params.window("k_period", d.k_period)?;
            let d_period = params.window("d_period", d.d_period)?;
            if d_period > k_period {
                return Err(PruneReason::SmoothingLongerThanLookback { k_period, d_period });
            }
            StrategyConfig::Stochastic(StochasticCross {
                k_period,
                d_period,
                oversold: params.number("oversold", d.oversold)?,
            })
        }
        StrategyKind::RandomForest => {
            let d = ClassifierProbability::default();
            let entry = params.number("entry_threshold", d.entry_threshold)?;
            let exit = params.number("exit_threshold", d.exit_threshold)?;
            if exit > entry {
                return Err(PruneReason::ExitThresholdAboveEntry { entry, exit });
            }
            StrategyConfig::RandomForest(ClassifierProbability {
                entry_threshold: entry,
                exit_threshold: exit,
                n_estimators: params.window("n_estimators", d.n_estimators)?,
                max_depth: params.window("max_depth", d.max_depth)?,
                train_fraction: params.number("train_fraction", d.train_fraction)?,
                seed: params.window("seed", d.seed as usize)? as u64,
            })
        }
    };
    Ok(config)
}
