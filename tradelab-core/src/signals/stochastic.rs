//! Stochastic oscillator %K recovery from oversold.

use serde::{Deserialize, Serialize};

use super::{check_finite, check_window, pairwise, require, SignalError, SignalProvider, Signals};
use crate::domain::PriceTable;
use crate::engine::ConfigError;
use crate::indicators::{stochastic, IndicatorRequest};

const STOCH_MIDLINE: f64 = 50.0;

/// Entry: `%K[i-1] < oversold && %K[i] > oversold`.
/// Exit: `%K[i-1] >= 50 && %K[i] < 50`.
///
/// %D is computed and required alongside %K but does not gate either signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StochasticCross {
    pub k_period: usize,
    pub d_period: usize,
    pub oversold: f64,
}

impl Default for StochasticCross {
    fn default() -> Self {
        Self {
            k_period: 14,
            d_period: 3,
            oversold: 20.0,
        }
    }
}

impl StochasticCross {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_window("k_period", self.k_period)?;
        check_window("d_period", self.d_period)?;
        check_finite("oversold", self.oversold)
    }
}

impl SignalProvider for StochasticCross {
    fn name(&self) -> &str {
        "stochastic_cross"
    }

    fn indicator_request(&self) -> IndicatorRequest {
        let mut req = IndicatorRequest::new();
        req.stochastic.insert((self.k_period, self.d_period));
        req
    }

    fn required_columns(&self) -> Vec<String> {
        vec![
            stochastic::k_name(self.k_period),
            stochastic::d_name(self.k_period, self.d_period),
        ]
    }

    fn signals(&self, table: &PriceTable) -> Result<Signals, SignalError> {
        let k = require(table, &stochastic::k_name(self.k_period))?;
        require(table, &stochastic::d_name(self.k_period, self.d_period))?;
        let oversold = self.oversold;
        Ok(Signals {
            entries: pairwise(k, |prev, cur| prev < oversold && cur > oversold),
            exits: pairwise(k, |prev, cur| prev >= STOCH_MIDLINE && cur < STOCH_MIDLINE),
        })
    }
}
