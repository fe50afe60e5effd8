//! Risk configuration — stop-loss, take-profit, trailing stop and position size.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected configuration values. Raised at construction, never mid-run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("stop-loss {sl_pct}% must be strictly below take-profit {tp_pct}%")]
    StopLossNotBelowTakeProfit { sl_pct: f64, tp_pct: f64 },

    #[error("trailing stop must be positive, got {0}%")]
    NonPositiveTrailingStop(f64),

    #[error("position size must be finite and positive, got {0}")]
    InvalidPositionSize(f64),

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
}

/// Price-based exit rules applied to every position.
///
/// Percentages are in percent units (`5.0` = 5%). Construct with
/// [`RiskConfig::new`]; deserialization goes through the same checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RiskConfigFile")]
pub struct RiskConfig {
    #[serde(rename = "sl_pct")]
    stop_loss_pct: f64,
    #[serde(rename = "tp_pct")]
    take_profit_pct: f64,
    trailing_stop_pct: Option<f64>,
    position_size: f64,
}

impl RiskConfig {
    pub fn new(
        stop_loss_pct: f64,
        take_profit_pct: f64,
        trailing_stop_pct: Option<f64>,
        position_size: f64,
    ) -> Result<Self, ConfigError> {
        for (name, value) in [("sl_pct", stop_loss_pct), ("tp_pct", take_profit_pct)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name: name.into(),
                    reason: format!("must be a finite, non-negative percentage, got {value}"),
                });
            }
        }
        if stop_loss_pct >= take_profit_pct {
            return Err(ConfigError::StopLossNotBelowTakeProfit {
                sl_pct: stop_loss_pct,
                tp_pct: take_profit_pct,
            });
        }
        if let Some(trail) = trailing_stop_pct {
            if !(trail > 0.0 && trail.is_finite()) {
                return Err(ConfigError::NonPositiveTrailingStop(trail));
            }
        }
        if !(position_size.is_finite() && position_size > 0.0) {
            return Err(ConfigError::InvalidPositionSize(position_size));
        }
        Ok(Self {
            stop_loss_pct,
            take_profit_pct,
            trailing_stop_pct,
            position_size,
        })
    }

    /// Fixed stop/target with unit size and no trailing stop.
    pub fn fixed(stop_loss_pct: f64, take_profit_pct: f64) -> Result<Self, ConfigError> {
        Self::new(stop_loss_pct, take_profit_pct, None, 1.0)
    }

    pub fn stop_loss_pct(&self) -> f64 {
        self.stop_loss_pct
    }

    pub fn take_profit_pct(&self) -> f64 {
        self.take_profit_pct
    }

    pub fn trailing_stop_pct(&self) -> Option<f64> {
        self.trailing_stop_pct
    }

    pub fn position_size(&self) -> f64 {
        self.position_size
    }

    pub fn stop_price(&self, entry: f64) -> f64 {
        entry * (1.0 - self.stop_loss_pct / 100.0)
    }

    pub fn take_profit_price(&self, entry: f64) -> f64 {
        entry * (1.0 + self.take_profit_pct / 100.0)
    }

    /// Trailing level for a reference price, if a trailing stop is configured.
    pub fn trailing_level(&self, reference: f64) -> Option<f64> {
        self.trailing_stop_pct
            .map(|trail| reference * (1.0 - trail / 100.0))
    }
}

/// On-disk shape of a [`RiskConfig`], validated by `TryFrom`.
#[derive(Deserialize)]
struct RiskConfigFile {
    sl_pct: f64,
    tp_pct: f64,
    #[serde(default)]
    trailing_stop_pct: Option<f64>,
    #[serde(default = "default_position_size")]
    position_size: f64,
}

fn default_position_size() -> f64 {
    1.0
}

impl TryFrom<RiskConfigFile> for RiskConfig {
    type Error = ConfigError;

    fn try_from(file: RiskConfigFile) -> Result<Self, Self::Error> {
        RiskConfig::new(
            file.sl_pct,
            file.tp_pct,
            file.trailing_stop_pct,
            file.position_size,
        )
    }
}
