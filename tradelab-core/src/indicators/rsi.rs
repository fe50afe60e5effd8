//! Relative Strength Index (RSI).
//!
//! Simple-average variant: average gain and average loss are plain rolling
//! means of the last `period` close-to-close changes (no Wilder smoothing).
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge case: avg_loss == 0 → NaN (no defined ratio).

use super::{rolling, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut gains = vec![f64::NAN; n];
        let mut losses = vec![f64::NAN; n];
        for i in 1..n {
            let change = bars[i].close - bars[i - 1].close;
            if change.is_nan() {
                continue;
            }
            gains[i] = change.max(0.0);
            losses[i] = (-change).max(0.0);
        }

        let avg_gain = rolling::mean(&gains, self.period);
        let avg_loss = rolling::mean(&losses, self.period);

        avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(&g, &l)| {
                if g.is_nan() || l.is_nan() || l == 0.0 {
                    f64::NAN
                } else {
                    100.0 - 100.0 / (1.0 + g / l)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn rsi_simple_average() {
        // changes: +2, -1, +3, -2
        let bars = make_bars(&[10.0, 12.0, 11.0, 14.0, 12.0]);
        let result = Rsi::new(2).compute(&bars);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        // window {+2,-1}: gain 1.0, loss 0.5 → rs 2 → 66.67
        assert_approx(result[2], 100.0 - 100.0 / 3.0, DEFAULT_EPSILON);
        // window {-1,+3}: gain 1.5, loss 0.5 → rs 3 → 75
        assert_approx(result[3], 75.0, DEFAULT_EPSILON);
        // window {+3,-2}: gain 1.5, loss 1.0 → rs 1.5 → 60
        assert_approx(result[4], 60.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_no_losses_is_nan() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0]);
        let result = Rsi::new(2).compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let bars = make_bars(&[13.0, 12.0, 11.0, 10.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[3], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 14);
    }
}
