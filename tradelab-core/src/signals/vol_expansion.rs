//! Long while realised volatility is above a threshold.

use serde::{Deserialize, Serialize};

use super::{check_finite, check_window, require, SignalError, SignalProvider, Signals};
use crate::domain::PriceTable;
use crate::engine::ConfigError;
use crate::indicators::IndicatorRequest;

/// Entry: `vol > vol_threshold`. Exit: `vol < vol_threshold`.
///
/// Warmup bars stay NaN and never signal; values are not back-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityExpansion {
    pub vol_window: usize,
    pub vol_threshold: f64,
}

impl Default for VolatilityExpansion {
    fn default() -> Self {
        Self {
            vol_window: 50,
            vol_threshold: 0.8,
        }
    }
}

impl VolatilityExpansion {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_window("vol_window", self.vol_window)?;
        check_finite("vol_threshold", self.vol_threshold)
    }
}

impl SignalProvider for VolatilityExpansion {
    fn name(&self) -> &str {
        "vol_expansion"
    }

    fn indicator_request(&self) -> IndicatorRequest {
        let mut req = IndicatorRequest::new();
        req.vol.insert(self.vol_window);
        req
    }

    fn required_columns(&self) -> Vec<String> {
        vec![format!("vol_{}", self.vol_window)]
    }

    fn signals(&self, table: &PriceTable) -> Result<Signals, SignalError> {
        let vol = require(table, &format!("vol_{}", self.vol_window))?;
        let threshold = self.vol_threshold;
        Ok(Signals {
            entries: vol.iter().map(|&v| v > threshold).collect(),
            exits: vol.iter().map(|&v| v < threshold).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::table_from;

    #[test]
    fn above_enters_below_exits() {
        let mut table = table_from(&[1.0; 4]);
        table.insert_column("vol_5", vec![f64::NAN, 0.9, 0.8, 0.5]);
        let strat = VolatilityExpansion {
            vol_window: 5,
            vol_threshold: 0.8,
        };
        let sig = strat.signals(&table).unwrap();
        assert_eq!(sig.entries, vec![false, true, false, false]);
        assert_eq!(sig.exits, vec![false, false, false, true]);
    }
}
