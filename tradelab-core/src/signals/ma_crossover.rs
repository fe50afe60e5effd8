//! Moving-average crossover — golden cross entry, optional trend filter.
//!
//! Enters when the fast SMA crosses above the slow SMA (and, when a trend
//! window is set, the close sits above the trend SMA). Exits on any bar where
//! the fast SMA is below the slow SMA.

use serde::{Deserialize, Serialize};

use super::{check_window, crosses_above, require, SignalError, SignalProvider, Signals};
use crate::domain::PriceTable;
use crate::engine::ConfigError;
use crate::indicators::IndicatorRequest;

/// # Indicator dependencies
/// - `sma_{fast}`, `sma_{slow}`
/// - `sma_{trend}` when `trend` is set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaCrossover {
    pub fast: usize,
    pub slow: usize,
    pub trend: Option<usize>,
}

impl Default for MaCrossover {
    fn default() -> Self {
        Self {
            fast: 10,
            slow: 100,
            trend: None,
        }
    }
}

impl MaCrossover {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_window("fast", self.fast)?;
        check_window("slow", self.slow)?;
        if let Some(trend) = self.trend {
            check_window("trend", trend)?;
        }
        Ok(())
    }

    fn fast_key(&self) -> String {
        format!("sma_{}", self.fast)
    }

    fn slow_key(&self) -> String {
        format!("sma_{}", self.slow)
    }
}

impl SignalProvider for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn indicator_request(&self) -> IndicatorRequest {
        let mut req = IndicatorRequest::new();
        req.sma.extend([self.fast, self.slow]);
        req.sma.extend(self.trend);
        req
    }

    fn required_columns(&self) -> Vec<String> {
        let mut cols = vec![self.fast_key(), self.slow_key()];
        cols.extend(self.trend.map(|t| format!("sma_{t}")));
        cols
    }

    fn signals(&self, table: &PriceTable) -> Result<Signals, SignalError> {
        let fast = require(table, &self.fast_key())?;
        let slow = require(table, &self.slow_key())?;
        let trend = match self.trend {
            Some(t) => Some(require(table, &format!("sma_{t}"))?),
            None => None,
        };

        let mut entries = crosses_above(fast, slow);
        if let Some(trend) = trend {
            for (i, bar) in table.bars().iter().enumerate() {
                entries[i] = entries[i] && bar.close > trend[i];
            }
        }
        let exits = fast.iter().zip(slow).map(|(f, s)| f < s).collect();

        Ok(Signals { entries, exits })
    }
}
