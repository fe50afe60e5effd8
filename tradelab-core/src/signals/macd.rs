//! MACD line / signal line crossover.

use serde::{Deserialize, Serialize};

use super::{check_window, crosses_above, crosses_below, require, SignalError, SignalProvider, Signals};
use crate::domain::PriceTable;
use crate::engine::ConfigError;
use crate::indicators::{macd, IndicatorRequest};

/// # Indicator dependencies
/// - `macd_{fast}_{slow}`
/// - `macd_signal_{fast}_{slow}_{signal}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdCrossover {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdCrossover {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

impl MacdCrossover {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_window("fast", self.fast)?;
        check_window("slow", self.slow)?;
        check_window("signal", self.signal)
    }
}

impl SignalProvider for MacdCrossover {
    fn name(&self) -> &str {
        "macd_crossover"
    }

    fn indicator_request(&self) -> IndicatorRequest {
        let mut req = IndicatorRequest::new();
        req.macd.insert((self.fast, self.slow, self.signal));
        req
    }

    fn required_columns(&self) -> Vec<String> {
        vec![
            macd::line_name(self.fast, self.slow),
            macd::signal_name(self.fast, self.slow, self.signal),
        ]
    }

    fn signals(&self, table: &PriceTable) -> Result<Signals, SignalError> {
        let line = require(table, &macd::line_name(self.fast, self.slow))?;
        let signal = require(table, &macd::signal_name(self.fast, self.slow, self.signal))?;
        Ok(Signals {
            entries: crosses_above(line, signal),
            exits: crosses_below(line, signal),
        })
    }
}
