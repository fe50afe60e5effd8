//! RSI oversold recovery: enter on a cross back above the oversold level.

use serde::{Deserialize, Serialize};

use super::{check_finite, check_window, pairwise, require, SignalError, SignalProvider, Signals};
use crate::domain::PriceTable;
use crate::engine::ConfigError;
use crate::indicators::IndicatorRequest;

/// RSI level that marks the exit when crossed from below.
pub const RSI_MIDLINE: f64 = 50.0;

/// Entry: `rsi[i-1] <= oversold && rsi[i] > oversold`.
/// Exit: the same crossing of the 50 midline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiThreshold {
    pub period: usize,
    pub oversold: f64,
}

impl Default for RsiThreshold {
    fn default() -> Self {
        Self {
            period: 14,
            oversold: 30.0,
        }
    }
}

impl RsiThreshold {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_window("period", self.period)?;
        check_finite("oversold", self.oversold)
    }

    fn key(&self) -> String {
        format!("rsi_{}", self.period)
    }
}

impl SignalProvider for RsiThreshold {
    fn name(&self) -> &str {
        "rsi_threshold"
    }

    fn indicator_request(&self) -> IndicatorRequest {
        let mut req = IndicatorRequest::new();
        req.rsi.insert(self.period);
        req
    }

    fn required_columns(&self) -> Vec<String> {
        vec![self.key()]
    }

    fn signals(&self, table: &PriceTable) -> Result<Signals, SignalError> {
        let rsi = require(table, &self.key())?;
        let oversold = self.oversold;
        Ok(Signals {
            entries: pairwise(rsi, |prev, cur| prev <= oversold && cur > oversold),
            exits: pairwise(rsi, |prev, cur| prev <= RSI_MIDLINE && cur > RSI_MIDLINE),
        })
    }
}
