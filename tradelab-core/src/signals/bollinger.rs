//! Bollinger band mean reversion — buy below the lower band, exit at the mean.

use serde::{Deserialize, Serialize};

use super::{check_finite, check_window, require, SignalError, SignalProvider, Signals};
use crate::domain::PriceTable;
use crate::engine::ConfigError;
use crate::indicators::IndicatorRequest;

/// Entry: `close < bbm - nstd * bbs`. Exit: `close > bbm`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BollingerReversion {
    pub period: usize,
    pub nstd: f64,
}

impl Default for BollingerReversion {
    fn default() -> Self {
        Self {
            period: 20,
            nstd: 2.0,
        }
    }
}

impl BollingerReversion {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_window("period", self.period)?;
        check_finite("nstd", self.nstd)
    }
}

impl SignalProvider for BollingerReversion {
    fn name(&self) -> &str {
        "bollinger_reversion"
    }

    fn indicator_request(&self) -> IndicatorRequest {
        let mut req = IndicatorRequest::new();
        req.bollinger.insert(self.period);
        req
    }

    fn required_columns(&self) -> Vec<String> {
        vec![format!("bbm_{}", self.period), format!("bbs_{}", self.period)]
    }

    fn signals(&self, table: &PriceTable) -> Result<Signals, SignalError> {
        let mean = require(table, &format!("bbm_{}", self.period))?;
        let std = require(table, &format!("bbs_{}", self.period))?;

        let (entries, exits) = table
            .bars()
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let lower = mean[i] - self.nstd * std[i];
                (bar.close < lower, bar.close > mean[i])
            })
            .unzip();
        Ok(Signals { entries, exits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::table_from;

    #[test]
    fn lower_band_entry_mean_exit() {
        let mut table = table_from(&[100.0, 95.0, 89.0, 101.0]);
        table.insert_column("bbm_20", vec![f64::NAN, 100.0, 100.0, 100.0]);
        table.insert_column("bbs_20", vec![f64::NAN, 5.0, 5.0, 5.0]);
        let sig = BollingerReversion::default().signals(&table).unwrap();
        assert_eq!(sig.entries, vec![false, false, true, false]);
        assert_eq!(sig.exits, vec![false, false, false, true]);
    }
}
