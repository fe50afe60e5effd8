//! Bollinger inputs — rolling mean and rolling sample stddev of close.
//!
//! Two series (separate Indicator instances):
//! - Mean: `bbm_{period}`
//! - Std:  `bbs_{period}`
//!
//! Bands are assembled by the signal provider (`mean - nstd * std`), so one
//! cached pair serves every band width in a sweep.
//! Lookback: period - 1.

use super::{rolling, Indicator};
use crate::domain::Bar;

/// Which Bollinger input series to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Mean,
    Std,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn mean(period: usize) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            period,
            band: BollingerBand::Mean,
            name: format!("bbm_{period}"),
        }
    }

    pub fn std(period: usize) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            period,
            band: BollingerBand::Std,
            name: format!("bbs_{period}"),
        }
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        match self.band {
            BollingerBand::Mean => rolling::mean(&closes, self.period),
            BollingerBand::Std => rolling::sample_std(&closes, self.period),
        }
    }
}
