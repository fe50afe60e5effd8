//! MACD — difference of two close EMAs and its signal line.
//!
//! Two series (separate Indicator instances):
//! - Line:   `macd_{fast}_{slow}` = EMA(close, fast) - EMA(close, slow)
//! - Signal: `macd_signal_{fast}_{slow}_{signal}` = EMA(line, signal)
//!
//! EMAs seed at the first close (see `ema::ewm`), so there is no warmup gap.
//! The signal line is smoothed from the already-lagged line, so the cache
//! stores it two bars late.

use super::ema::{ewm, Ema};
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Line,
    Signal,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn line(fast: usize, slow: usize) -> Self {
        assert!(fast >= 1 && slow >= 1, "MACD spans must be >= 1");
        Self {
            fast,
            slow,
            signal: 0,
            line: MacdLine::Line,
            name: line_name(fast, slow),
        }
    }

    pub fn signal(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(
            fast >= 1 && slow >= 1 && signal >= 1,
            "MACD spans must be >= 1"
        );
        Self {
            fast,
            slow,
            signal,
            line: MacdLine::Signal,
            name: signal_name(fast, slow, signal),
        }
    }

    fn macd_line(&self, bars: &[Bar]) -> Vec<f64> {
        let fast = Ema::new(self.fast).compute(bars);
        let slow = Ema::new(self.slow).compute(bars);
        fast.iter().zip(&slow).map(|(f, s)| f - s).collect()
    }
}

/// Column name of the MACD line.
pub fn line_name(fast: usize, slow: usize) -> String {
    format!("macd_{fast}_{slow}")
}

/// Column name of the MACD signal line.
pub fn signal_name(fast: usize, slow: usize, signal: usize) -> String {
    format!("macd_signal_{fast}_{slow}_{signal}")
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn cache_shift(&self) -> usize {
        match self.line {
            MacdLine::Line => 1,
            MacdLine::Signal => 2,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let line = self.macd_line(bars);
        match self.line {
            MacdLine::Line => line,
            MacdLine::Signal => ewm(&line, self.signal),
        }
    }
}
