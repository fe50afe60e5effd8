//! Indicator cache — computes requested indicator columns once per price table.
//!
//! Every cached column is shifted forward by `Indicator::cache_shift()` bars
//! (one unless the indicator says otherwise): the value stored at bar `i` was
//! computed from bars `0..i` only. A signal evaluated at bar `i` (and an entry
//! filled at `close[i]`) therefore never sees an indicator that includes bar
//! `i` itself. Stochastic %K is the one exception: it compares `close[i]` with
//! the range of the bars before `i`.

use std::collections::BTreeSet;

use tracing::{debug, info};

use super::{
    rolling, Atr, Bollinger, Impulse, Indicator, Macd, RollingHigh, Rsi, Sma, Stochastic,
    Volatility,
};
use crate::domain::PriceTable;

/// The set of indicator windows a strategy (or a whole search space) needs.
///
/// Requests are plain sets, so merging the requests of many trial
/// configurations yields each column exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndicatorRequest {
    pub sma: BTreeSet<usize>,
    pub rsi: BTreeSet<usize>,
    pub atr: BTreeSet<usize>,
    pub vol: BTreeSet<usize>,
    pub impulse: BTreeSet<usize>,
    pub hmax: BTreeSet<usize>,
    pub bollinger: BTreeSet<usize>,
    /// (fast, slow, signal)
    pub macd: BTreeSet<(usize, usize, usize)>,
    /// (k_period, d_period)
    pub stochastic: BTreeSet<(usize, usize)>,
}

impl IndicatorRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union `other` into `self`.
    pub fn merge(&mut self, other: &IndicatorRequest) {
        self.sma.extend(&other.sma);
        self.rsi.extend(&other.rsi);
        self.atr.extend(&other.atr);
        self.vol.extend(&other.vol);
        self.impulse.extend(&other.impulse);
        self.hmax.extend(&other.hmax);
        self.bollinger.extend(&other.bollinger);
        self.macd.extend(&other.macd);
        self.stochastic.extend(&other.stochastic);
    }

    pub fn is_empty(&self) -> bool {
        self.indicators().is_empty()
    }

    /// Expand the request into concrete indicator instances.
    ///
    /// Zero windows are skipped; they can never produce a column.
    pub fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        let mut out: Vec<Box<dyn Indicator>> = Vec::new();
        let valid = |w: &&usize| **w >= 1;

        out.extend(self.sma.iter().filter(valid).map(|&w| boxed(Sma::new(w))));
        out.extend(self.rsi.iter().filter(valid).map(|&p| boxed(Rsi::new(p))));
        out.extend(self.atr.iter().filter(valid).map(|&p| boxed(Atr::new(p))));
        out.extend(self.vol.iter().filter(valid).map(|&w| boxed(Volatility::new(w))));
        out.extend(self.impulse.iter().filter(valid).map(|&w| boxed(Impulse::new(w))));
        out.extend(self.hmax.iter().filter(valid).map(|&w| boxed(RollingHigh::new(w))));
        for &p in self.bollinger.iter().filter(valid) {
            out.push(boxed(Bollinger::mean(p)));
            out.push(boxed(Bollinger::std(p)));
        }
        for &(fast, slow, signal) in &self.macd {
            if fast >= 1 && slow >= 1 && signal >= 1 {
                out.push(boxed(Macd::line(fast, slow)));
                out.push(boxed(Macd::signal(fast, slow, signal)));
            }
        }
        for &(k, d) in &self.stochastic {
            if k >= 1 && d >= 1 {
                out.push(boxed(Stochastic::k(k)));
                out.push(boxed(Stochastic::d(k, d)));
            }
        }
        out
    }
}

fn boxed<I: Indicator + 'static>(indicator: I) -> Box<dyn Indicator> {
    Box::new(indicator)
}

/// Computes and attaches shifted indicator columns to a `PriceTable`.
pub struct IndicatorCache;

impl IndicatorCache {
    /// Compute every requested column not already present on `table`.
    ///
    /// Returns the number of newly computed columns.
    pub fn annotate(table: &mut PriceTable, request: &IndicatorRequest) -> usize {
        let mut computed = 0;
        for indicator in request.indicators() {
            if table.has_column(indicator.name()) {
                continue;
            }
            let raw = indicator.compute(table.bars());
            let shifted = rolling::shift(&raw, indicator.cache_shift());
            debug!(
                column = indicator.name(),
                lookback = indicator.lookback(),
                shift = indicator.cache_shift(),
                "cached indicator"
            );
            table.insert_column(indicator.name().to_string(), shifted);
            computed += 1;
        }
        if computed > 0 {
            info!(computed, bars = table.len(), "indicator cache ready");
        }
        computed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn columns_are_shifted_one_bar() {
        let mut table = PriceTable::new(make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]));
        let mut req = IndicatorRequest::new();
        req.sma.insert(2);
        IndicatorCache::annotate(&mut table, &req);

        let sma = table.column("sma_2").unwrap();
        // raw sma_2 = [NaN, 10.5, 11.5, 12.5, 13.5]; shifted by one
        assert!(sma[0].is_nan());
        assert!(sma[1].is_nan());
        assert_approx(sma[2], 10.5, DEFAULT_EPSILON);
        assert_approx(sma[4], 12.5, DEFAULT_EPSILON);
    }

    #[test]
    fn merged_requests_compute_each_column_once() {
        let mut a = IndicatorRequest::new();
        a.sma.extend([5, 10]);
        a.bollinger.insert(20);
        let mut b = IndicatorRequest::new();
        b.sma.extend([10, 20]);
        b.macd.insert((12, 26, 9));
        a.merge(&b);

        assert_eq!(a.sma.len(), 3);
        // 3 sma + bbm/bbs + macd line/signal
        assert_eq!(a.indicators().len(), 7);

        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let mut table = PriceTable::new(make_bars(&closes));
        assert_eq!(IndicatorCache::annotate(&mut table, &a), 7);
        // second pass finds everything cached
        assert_eq!(IndicatorCache::annotate(&mut table, &a), 0);
        assert!(table.has_column("macd_signal_12_26_9"));
        assert!(table.has_column("bbs_20"));
    }

    #[test]
    fn cached_stochastic_uses_current_close_against_prior_range() {
        let mut bars = make_bars(&[15.0, 15.0, 11.0, 19.0, 12.0]);
        for b in bars.iter_mut() {
            b.low = 10.0;
            b.high = 20.0;
        }
        let mut table = PriceTable::new(bars);
        let mut req = IndicatorRequest::new();
        req.stochastic.insert((3, 1));
        IndicatorCache::annotate(&mut table, &req);

        let k = table.column("stoch_k_3").unwrap();
        assert!(k[2].is_nan());
        assert_approx(k[3], 90.0, DEFAULT_EPSILON);
        assert_approx(k[4], 20.0, DEFAULT_EPSILON);

        // %D over one bar is %K a bar late
        let d = table.column("stoch_d_3_1").unwrap();
        assert!(d[3].is_nan());
        assert_approx(d[4], 90.0, DEFAULT_EPSILON);
    }

    #[test]
    fn zero_windows_are_ignored() {
        let mut req = IndicatorRequest::new();
        req.sma.insert(0);
        req.stochastic.insert((0, 3));
        assert!(req.is_empty());
    }
}
