//! Stochastic oscillator — %K and %D.
//!
//! %K[t] = (close[t] - min(low[t-k..t])) / (max(high[t-k..t]) - min(low[t-k..t])) * 100
//! %D[t] = mean(%K[t-d..t])
//! The range window ends at the previous bar, so %K is stored unshifted; %D
//! keeps the usual one-bar cache shift. A zero-width range gives NaN.
//! Lookback: k for %K, k + d for %D (after the cache shift).

use super::{rolling, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    d_period: Option<usize>,
    name: String,
}

impl Stochastic {
    pub fn k(k_period: usize) -> Self {
        assert!(k_period >= 1, "Stochastic k_period must be >= 1");
        Self {
            k_period,
            d_period: None,
            name: k_name(k_period),
        }
    }

    pub fn d(k_period: usize, d_period: usize) -> Self {
        assert!(
            k_period >= 1 && d_period >= 1,
            "Stochastic periods must be >= 1"
        );
        Self {
            k_period,
            d_period: Some(d_period),
            name: d_name(k_period, d_period),
        }
    }

    fn percent_k(&self, bars: &[Bar]) -> Vec<f64> {
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let low_n = rolling::shift(&rolling::min(&lows, self.k_period), 1);
        let high_n = rolling::shift(&rolling::max(&highs, self.k_period), 1);

        bars.iter()
            .zip(low_n.iter().zip(&high_n))
            .map(|(bar, (&lo, &hi))| {
                let range = hi - lo;
                if range.is_nan() || range == 0.0 {
                    f64::NAN
                } else {
                    (bar.close - lo) / range * 100.0
                }
            })
            .collect()
    }
}

pub fn k_name(k_period: usize) -> String {
    format!("stoch_k_{k_period}")
}

pub fn d_name(k_period: usize, d_period: usize) -> String {
    format!("stoch_d_{k_period}_{d_period}")
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.d_period {
            None => self.k_period,
            Some(d) => self.k_period + d - 1,
        }
    }

    fn cache_shift(&self) -> usize {
        match self.d_period {
            None => 0,
            Some(_) => 1,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let k = self.percent_k(bars);
        match self.d_period {
            None => k,
            Some(d) => rolling::mean(&k, d),
        }
    }
}
