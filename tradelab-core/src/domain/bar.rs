//! The fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLCV bar at a single timestamp.
///
/// Bars are intraday-capable (the reference data set is 15-minute candles),
/// so the timestamp carries a time component. `volume` is 0.0 when the source
/// has no volume column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// High at or above low; the loader drops bars that fail this.
    pub fn has_ordered_range(&self) -> bool {
        self.high >= self.low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_bar() -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(9, 15, 0)
                .unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn ordered_range() {
        assert!(sample_bar().has_ordered_range());
        let mut flat = sample_bar();
        flat.high = 98.0;
        assert!(flat.has_ordered_range());
    }

    #[test]
    fn inverted_range_is_detected() {
        let mut bar = sample_bar();
        bar.high = 97.0; // below low
        assert!(!bar.has_ordered_range());
    }
}
