//! PriceTable — bars plus the named indicator columns attached to them.

use super::Bar;
use crate::indicators::IndicatorValues;

/// A cleaned, time-ordered bar series with named indicator columns.
///
/// Every column has exactly one value per bar. The table is mutated only while
/// the indicator cache annotates it; simulations borrow it immutably, so any
/// number of trials can share one table across threads.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    bars: Vec<Bar>,
    columns: IndicatorValues,
}

impl PriceTable {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self {
            bars,
            columns: IndicatorValues::new(),
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Full series for a named column, if present.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get_series(name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.get_series(name).is_some()
    }

    /// Names of all attached columns, sorted.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.names()
    }

    /// Attach (or replace) a named column.
    ///
    /// # Panics
    /// If `values.len()` differs from the number of bars.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        assert_eq!(
            values.len(),
            self.bars.len(),
            "column '{name}' length must match bar count"
        );
        self.columns.insert(name, values);
    }
}
