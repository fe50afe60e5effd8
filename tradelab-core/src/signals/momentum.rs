//! Momentum impulse: enter on a strong w-bar return, exit once it turns negative.

use serde::{Deserialize, Serialize};

use super::{check_finite, check_window, require, SignalError, SignalProvider, Signals};
use crate::domain::PriceTable;
use crate::engine::ConfigError;
use crate::indicators::IndicatorRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumImpulse {
    pub window: usize,
    /// Fractional return, e.g. 0.02 for +2%.
    pub threshold: f64,
}

impl Default for MomentumImpulse {
    fn default() -> Self {
        Self {
            window: 10,
            threshold: 0.02,
        }
    }
}

impl MomentumImpulse {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_window("window", self.window)?;
        check_finite("threshold", self.threshold)
    }
}

impl SignalProvider for MomentumImpulse {
    fn name(&self) -> &str {
        "momentum_impulse"
    }

    fn indicator_request(&self) -> IndicatorRequest {
        let mut req = IndicatorRequest::new();
        req.impulse.insert(self.window);
        req
    }

    fn required_columns(&self) -> Vec<String> {
        vec![format!("impulse_{}", self.window)]
    }

    fn signals(&self, table: &PriceTable) -> Result<Signals, SignalError> {
        let impulse = require(table, &format!("impulse_{}", self.window))?;
        Ok(Signals {
            entries: impulse.iter().map(|&m| m > self.threshold).collect(),
            exits: impulse.iter().map(|&m| m < 0.0).collect(),
        })
    }
}
