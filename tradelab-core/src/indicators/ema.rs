//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (span + 1).
//! Seed: the first finite input value (no SMA warmup window), leading NaNs skipped.
//! Lookback: 0.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    name: String,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            name: format!("ema_{span}"),
        }
    }
}

/// Exponentially weighted mean of an arbitrary series.
///
/// Leading NaNs stay NaN; the recursion starts at the first finite value.
/// A NaN after the seed taints every later value.
pub fn ewm(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return result;
    };

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev = values[start];
    result[start] = prev;
    for i in (start + 1)..n {
        if values[i].is_nan() {
            return result;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }
    result
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        ewm(&closes, self.span)
    }
}
