//! Volatility-adjusted breakout above the rolling high.

use serde::{Deserialize, Serialize};

use super::{check_finite, check_window, require, SignalError, SignalProvider, Signals};
use crate::domain::PriceTable;
use crate::engine::ConfigError;
use crate::indicators::IndicatorRequest;

/// Entry: `close > hmax + atr_mult * atr`. Exit: `close < hmax`.
///
/// Both columns are shifted, so `hmax` is the highest close of the
/// `lookback` bars before the current one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Breakout {
    pub lookback: usize,
    pub atr_period: usize,
    pub atr_mult: f64,
}

impl Default for Breakout {
    fn default() -> Self {
        Self {
            lookback: 50,
            atr_period: 14,
            atr_mult: 1.0,
        }
    }
}

impl Breakout {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_window("lookback", self.lookback)?;
        check_window("atr_period", self.atr_period)?;
        check_finite("atr_mult", self.atr_mult)
    }
}

impl SignalProvider for Breakout {
    fn name(&self) -> &str {
        "breakout"
    }

    fn indicator_request(&self) -> IndicatorRequest {
        let mut req = IndicatorRequest::new();
        req.hmax.insert(self.lookback);
        req.atr.insert(self.atr_period);
        req
    }

    fn required_columns(&self) -> Vec<String> {
        vec![
            format!("hmax_{}", self.lookback),
            format!("atr_{}", self.atr_period),
        ]
    }

    fn signals(&self, table: &PriceTable) -> Result<Signals, SignalError> {
        let hmax = require(table, &format!("hmax_{}", self.lookback))?;
        let atr = require(table, &format!("atr_{}", self.atr_period))?;

        let n = table.len();
        let mut entries = vec![false; n];
        let mut exits = vec![false; n];
        for (i, bar) in table.bars().iter().enumerate() {
            entries[i] = bar.close > hmax[i] + self.atr_mult * atr[i];
            exits[i] = bar.close < hmax[i];
        }
        Ok(Signals { entries, exits })
    }
}
