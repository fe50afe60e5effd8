//! Historical volatility: rolling sample stddev of one-bar close returns.
//!
//! vol[t] = std(pct_change(close)[t-window+1..=t]), ddof = 1.
//! Lookback: window (the first return needs a previous close).

use super::{rolling, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Volatility {
    window: usize,
    name: String,
}

impl Volatility {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "Volatility window must be >= 1");
        Self {
            window,
            name: format!("vol_{window}"),
        }
    }
}

impl Indicator for Volatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let returns = rolling::pct_change(&closes, 1);
        rolling::sample_std(&returns, self.window)
    }
}
