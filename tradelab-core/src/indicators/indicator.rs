//! Indicator trait and named indicator values container.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! They are computed once per price table by the indicator cache and read
//! by signal providers as named columns. No recomputation per trial.

use crate::domain::Bar;
use std::collections::HashMap;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Column name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the raw (unshifted) indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;

    /// Bars the cache shifts the raw series forward before storing it.
    ///
    /// An indicator that already excludes the current bar's range (or needs a
    /// second lag, like a smoothed line of a shifted series) overrides this.
    fn cache_shift(&self) -> usize {
        1
    }
}

/// Container for named indicator series.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named indicator series.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Get the full series for a named indicator.
    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    /// Sorted series names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.series.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
