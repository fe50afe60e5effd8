//! Typed search spaces: which parameters a strategy search may vary, and how.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tradelab_core::indicators::IndicatorRequest;
use tradelab_core::signals::{StrategyConfig, StrategyKind};

use crate::params::{ParamSet, ParamValue};

/// Points used when a float range without a step is enumerated for a grid.
pub const FLOAT_GRID_POINTS: usize = 5;

/// Domain of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSpec {
    /// `low..=high` in increments of `step`.
    Int { low: i64, high: i64, step: i64 },
    /// Continuous range, or a stepped one when `step` is set.
    Float {
        low: f64,
        high: f64,
        step: Option<f64>,
    },
    Choice(Vec<ParamValue>),
}

impl ParamSpec {
    pub fn int(low: i64, high: i64, step: i64) -> Self {
        ParamSpec::Int { low, high, step }
    }

    pub fn float(low: f64, high: f64) -> Self {
        ParamSpec::Float {
            low,
            high,
            step: None,
        }
    }

    pub fn stepped(low: f64, high: f64, step: f64) -> Self {
        ParamSpec::Float {
            low,
            high,
            step: Some(step),
        }
    }

    /// Every value a grid enumerates for this parameter, ascending.
    pub fn grid_values(&self) -> Vec<ParamValue> {
        match self {
            ParamSpec::Int { low, high, step } => {
                let step = (*step).max(1) as usize;
                (*low..=*high).step_by(step).map(ParamValue::Int).collect()
            }
            ParamSpec::Float {
                low,
                high,
                step: Some(step),
            } => (0..=float_steps(*low, *high, *step))
                .map(|k| ParamValue::Float(round_decimal(low + k as f64 * step)))
                .collect(),
            ParamSpec::Float {
                low,
                high,
                step: None,
            } => {
                let span = high - low;
                (0..FLOAT_GRID_POINTS)
                    .map(|k| {
                        let frac = k as f64 / (FLOAT_GRID_POINTS - 1) as f64;
                        ParamValue::Float(round_decimal(low + frac * span))
                    })
                    .collect()
            }
            ParamSpec::Choice(values) => values.clone(),
        }
    }

    /// Draw a value uniformly from the domain.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ParamValue {
        match self {
            ParamSpec::Int { low, high, step } => {
                let step = (*step).max(1);
                let steps = (high - low).max(0) / step;
                ParamValue::Int(low + rng.gen_range(0..=steps) * step)
            }
            ParamSpec::Float {
                low,
                high,
                step: Some(step),
            } => {
                let k = rng.gen_range(0..=float_steps(*low, *high, *step));
                ParamValue::Float(round_decimal(low + k as f64 * step))
            }
            ParamSpec::Float {
                low,
                high,
                step: None,
            } => {
                if high > low {
                    ParamValue::Float(rng.gen_range(*low..=*high))
                } else {
                    ParamValue::Float(*low)
                }
            }
            ParamSpec::Choice(values) => values.choose(rng).copied().unwrap_or(ParamValue::None),
        }
    }

    /// Numeric bounds, `None` for choice parameters.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self {
            ParamSpec::Int { low, high, .. } => Some((*low as f64, *high as f64)),
            ParamSpec::Float { low, high, .. } => Some((*low, *high)),
            ParamSpec::Choice(_) => None,
        }
    }

    /// Clamp `x` into the domain and snap it onto the step lattice.
    pub fn snap(&self, x: f64) -> ParamValue {
        match self {
            ParamSpec::Int { low, high, step } => {
                let step = (*step).max(1);
                let steps = (high - low).max(0) / step;
                let k = ((x - *low as f64) / step as f64).round().clamp(0.0, steps as f64);
                ParamValue::Int(low + k as i64 * step)
            }
            ParamSpec::Float {
                low,
                high,
                step: Some(step),
            } => {
                let steps = float_steps(*low, *high, *step) as f64;
                let k = ((x - low) / step).round().clamp(0.0, steps);
                ParamValue::Float(round_decimal(low + k * step))
            }
            ParamSpec::Float {
                low,
                high,
                step: None,
            } => ParamValue::Float(x.clamp(*low, high.max(*low))),
            ParamSpec::Choice(values) => values
                .iter()
                .copied()
                .min_by(|a, b| {
                    let da = a.as_f64().map_or(f64::INFINITY, |v| (v - x).abs());
                    let db = b.as_f64().map_or(f64::INFINITY, |v| (v - x).abs());
                    da.total_cmp(&db)
                })
                .unwrap_or(ParamValue::None),
        }
    }
}

fn float_steps(low: f64, high: f64, step: f64) -> usize {
    if step <= 0.0 || high <= low {
        return 0;
    }
    ((high - low) / step + 1e-9).floor() as usize
}

/// Strip float noise from stepped values (0.1 * 3 → 0.3).
fn round_decimal(v: f64) -> f64 {
    (v * 1e9).round() / 1e9
}

/// Ordered parameter domains for one strategy family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub kind: StrategyKind,
    params: Vec<(String, ParamSpec)>,
}

impl SearchSpace {
    /// An empty space; parameters not added keep their defaults.
    pub fn new(kind: StrategyKind) -> Self {
        Self {
            kind,
            params: Vec::new(),
        }
    }

    /// Add (or replace) a parameter.
    pub fn with(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        let name = name.into();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = spec,
            None => self.params.push((name, spec)),
        }
        self
    }

    /// The standard space searched for each strategy family.
    pub fn for_kind(kind: StrategyKind) -> Self {
        let space = SearchSpace::new(kind);
        let space = match kind {
            StrategyKind::Sma => {
                return space
                    .with("sma_fast", ParamSpec::int(5, 50, 5))
                    .with("sma_slow", ParamSpec::int(100, 250, 5))
                    .with(
                        "sma_trend",
                        ParamSpec::Choice(vec![
                            ParamValue::None,
                            ParamValue::Int(200),
                            ParamValue::Int(300),
                            ParamValue::Int(400),
                        ]),
                    )
                    .with("sl_pct", ParamSpec::int(5, 10, 1))
                    .with("tp_pct", ParamSpec::int(15, 25, 5))
                    .with("position_size", ParamSpec::float(0.01, 0.2))
                    .with("trailing_stop_pct", ParamSpec::float(0.5, 10.0));
            }
            StrategyKind::Rsi => space
                .with("period", ParamSpec::int(7, 21, 1))
                .with("oversold", ParamSpec::int(20, 40, 5)),
            StrategyKind::Breakout => space
                .with("lookback", ParamSpec::int(20, 100, 5))
                .with("atr_period", ParamSpec::int(7, 21, 1))
                .with("atr_mult", ParamSpec::float(0.5, 2.0)),
            StrategyKind::Bollinger => space
                .with("period", ParamSpec::int(10, 30, 2))
                .with("nstd", ParamSpec::stepped(1.5, 3.0, 0.1)),
            StrategyKind::Momentum => space
                .with("window", ParamSpec::int(5, 20, 1))
                .with("threshold", ParamSpec::stepped(0.01, 0.05, 0.01)),
            StrategyKind::VolExpansion => space
                .with("vol_window", ParamSpec::int(20, 100, 5))
                .with("vol_threshold", ParamSpec::stepped(0.6, 1.0, 0.05)),
            StrategyKind::Macd => space
                .with("fast", ParamSpec::int(5, 20, 1))
                .with("slow", ParamSpec::int(21, 50, 1))
                .with("signal", ParamSpec::int(5, 20, 1)),
            StrategyKind::Stochastic => space
                .with("k_period", ParamSpec::int(5, 30, 1))
                .with("d_period", ParamSpec::int(3, 10, 1))
                .with("oversold", ParamSpec::int(20, 40, 5)),
            StrategyKind::RandomForest => space
                .with("entry_threshold", ParamSpec::stepped(0.5, 0.8, 0.05))
                .with("exit_threshold", ParamSpec::stepped(0.2, 0.5, 0.05)),
        };
        space
            .with("sl_pct", ParamSpec::int(5, 10, 1))
            .with("tp_pct", ParamSpec::int(10, 25, 5))
    }

    pub fn params(&self) -> &[(String, ParamSpec)] {
        &self.params
    }

    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Number of grid points, saturating.
    pub fn grid_size(&self) -> usize {
        self.params
            .iter()
            .fold(1usize, |acc, (_, s)| acc.saturating_mul(s.grid_values().len()))
    }

    /// One uniform draw of every parameter.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ParamSet {
        let mut set = ParamSet::new();
        for (name, spec) in &self.params {
            set.insert(name.clone(), spec.sample(rng));
        }
        set
    }

    /// Every indicator column a search over this space can touch.
    ///
    /// MACD and stochastic columns are keyed by parameter tuples whose
    /// product is too large to precompute; trials compute those on demand.
    pub fn indicator_request(&self) -> IndicatorRequest {
        let mut req = IndicatorRequest::new();
        match self.kind {
            StrategyKind::Sma => {
                req.sma.extend(self.windows("sma_fast", 10));
                req.sma.extend(self.windows("sma_slow", 100));
                req.sma.extend(self.windows("sma_trend", 0));
            }
            StrategyKind::Rsi => req.rsi.extend(self.windows("period", 14)),
            StrategyKind::Breakout => {
                req.hmax.extend(self.windows("lookback", 50));
                req.atr.extend(self.windows("atr_period", 14));
            }
            StrategyKind::Bollinger => req.bollinger.extend(self.windows("period", 20)),
            StrategyKind::Momentum => req.impulse.extend(self.windows("window", 10)),
            StrategyKind::VolExpansion => req.vol.extend(self.windows("vol_window", 50)),
            StrategyKind::Macd | StrategyKind::Stochastic => {}
            StrategyKind::RandomForest => {
                req = StrategyConfig::default_for(StrategyKind::RandomForest).indicator_request();
            }
        }
        req
    }

    /// Positive integer values a window parameter can take; `default` when
    /// the parameter is not searched (0 means none).
    fn windows(&self, name: &str, default: usize) -> Vec<usize> {
        match self.get(name) {
            Some(spec) => spec
                .grid_values()
                .into_iter()
                .filter_map(|v| v.as_i64())
                .filter(|&w| w > 0)
                .map(|w| w as usize)
                .collect(),
            None if default > 0 => vec![default],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn int_grid_respects_step() {
        let values = ParamSpec::int(5, 50, 5).grid_values();
        assert_eq!(values.len(), 10);
        assert_eq!(values[0], ParamValue::Int(5));
        assert_eq!(values[9], ParamValue::Int(50));
    }

    #[test]
    fn stepped_float_grid_is_clean() {
        let values = ParamSpec::stepped(1.5, 3.0, 0.1).grid_values();
        assert_eq!(values.len(), 16);
        assert_eq!(values[3], ParamValue::Float(1.8));
        assert_eq!(values[15], ParamValue::Float(3.0));
    }

    #[test]
    fn continuous_float_grid_has_fixed_points() {
        let values = ParamSpec::float(0.0, 1.0).grid_values();
        assert_eq!(values.len(), FLOAT_GRID_POINTS);
        assert_eq!(values[0], ParamValue::Float(0.0));
        assert_eq!(values[FLOAT_GRID_POINTS - 1], ParamValue::Float(1.0));
    }

    #[test]
    fn samples_stay_on_lattice() {
        let mut rng = StdRng::seed_from_u64(7);
        let spec = ParamSpec::int(100, 250, 5);
        for _ in 0..200 {
            let v = spec.sample(&mut rng).as_i64().unwrap();
            assert!((100..=250).contains(&v));
            assert_eq!(v % 5, 0);
        }
    }

    #[test]
    fn snap_clamps_and_rounds() {
        let spec = ParamSpec::int(5, 50, 5);
        assert_eq!(spec.snap(12.0), ParamValue::Int(10));
        assert_eq!(spec.snap(13.0), ParamValue::Int(15));
        assert_eq!(spec.snap(-40.0), ParamValue::Int(5));
        assert_eq!(spec.snap(1e6), ParamValue::Int(50));
        assert_eq!(ParamSpec::float(0.5, 2.0).snap(3.0), ParamValue::Float(2.0));
    }

    #[test]
    fn default_spaces_cover_every_kind() {
        for kind in StrategyKind::ALL {
            let space = SearchSpace::for_kind(kind);
            assert!(space.get("sl_pct").is_some(), "{kind} has no sl_pct");
            assert!(space.get("tp_pct").is_some(), "{kind} has no tp_pct");
            assert!(space.grid_size() > 1);
        }
    }

    #[test]
    fn sma_space_matches_known_ranges() {
        let space = SearchSpace::for_kind(StrategyKind::Sma);
        assert_eq!(
            space.names(),
            vec![
                "sma_fast",
                "sma_slow",
                "sma_trend",
                "sl_pct",
                "tp_pct",
                "position_size",
                "trailing_stop_pct"
            ]
        );
        assert_eq!(space.get("tp_pct"), Some(&ParamSpec::int(15, 25, 5)));
    }

    #[test]
    fn indicator_request_unions_windows() {
        let req = SearchSpace::for_kind(StrategyKind::Sma).indicator_request();
        // 10 fast + 31 slow + 3 trend windows, with 200 shared by slow and trend
        assert_eq!(req.sma.len(), 10 + 31 + 2);
        assert!(req.sma.contains(&400));

        let rsi = SearchSpace::for_kind(StrategyKind::Rsi).indicator_request();
        assert_eq!(rsi.rsi.len(), 15);

        assert!(SearchSpace::for_kind(StrategyKind::Macd)
            .indicator_request()
            .is_empty());
    }

    #[test]
    fn with_replaces_existing_parameter() {
        let space = SearchSpace::for_kind(StrategyKind::Rsi).with("period", ParamSpec::int(5, 6, 1));
        assert_eq!(space.len(), 4);
        assert_eq!(space.get("period"), Some(&ParamSpec::int(5, 6, 1)));
    }
}
