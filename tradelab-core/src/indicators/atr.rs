//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR is the simple rolling mean of the true range over `period` bars.
//! Lookback: period - 1.

use super::{rolling, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// Compute the True Range series from bars.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let range = bar.high - bar.low;
            if i == 0 {
                return range;
            }
            let pc = bars[i - 1].close;
            if range.is_nan() || pc.is_nan() {
                f64::NAN
            } else {
                range.max((bar.high - pc).abs()).max((bar.low - pc).abs())
            }
        })
        .collect()
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling::mean(&true_range(bars), self.period)
    }
}
