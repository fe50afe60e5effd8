//! Highest close over a lookback window.
//!
//! hmax[t] = max(close[t-window+1..=t])
//! Closes are used rather than highs so the level is comparable with the
//! close that confirms a breakout.
//! Lookback: window - 1.

use super::{rolling, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct RollingHigh {
    window: usize,
    name: String,
}

impl RollingHigh {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "RollingHigh window must be >= 1");
        Self {
            window,
            name: format!("hmax_{window}"),
        }
    }
}

impl Indicator for RollingHigh {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        rolling::max(&closes, self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn tracks_highest_close() {
        let bars = make_bars(&[5.0, 7.0, 6.0, 4.0, 3.0]);
        let hmax = RollingHigh::new(3).compute(&bars);
        assert!(hmax[1].is_nan());
        assert_eq!(hmax[2..], [7.0, 7.0, 6.0]);
    }
}
