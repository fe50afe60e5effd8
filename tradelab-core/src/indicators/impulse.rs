//! Fractional return over a lookback window.
//!
//! impulse[t] = close[t] / close[t-window] - 1
//! Lookback: window.

use super::{rolling, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Impulse {
    window: usize,
    name: String,
}

impl Impulse {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "Impulse window must be >= 1");
        Self {
            window,
            name: format!("impulse_{window}"),
        }
    }
}

impl Indicator for Impulse {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        rolling::pct_change(&closes, self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn impulse_basic() {
        let bars = make_bars(&[100.0, 110.0, 105.0, 115.5]);
        let imp = Impulse::new(2).compute(&bars);
        assert!(imp[0].is_nan());
        assert!(imp[1].is_nan());
        assert_approx(imp[2], 0.05, DEFAULT_EPSILON);
        assert_approx(imp[3], 0.05, DEFAULT_EPSILON);
    }
}
