//! Look-ahead contamination tests.
//!
//! Invariant: no indicator or signal value at bar t may depend on price data
//! from bar t+1 or later.
//!
//! Method: compute on a truncated series (bars 0..100) and the full series
//! (bars 0..200) and assert bars 0..100 are identical. Signals are also
//! checked by perturbing indicator columns after a cut point.

use chrono::NaiveDate;
use tradelab_core::domain::{Bar, PriceTable};
use tradelab_core::indicators::*;
use tradelab_core::signals::{StrategyConfig, StrategyKind};

/// Generate N bars of synthetic OHLCV data with realistic variation.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        // Deterministic pseudo-random walk using a simple LCG
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05; // -5.0 to +5.0
        price += change;
        price = price.max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        let high = open.max(close) + 2.0;
        let low = open.min(close) - 2.0;

        bars.push(Bar {
            timestamp: base + chrono::Duration::minutes(15 * i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0 + i as f64 * 100.0,
        });
    }

    bars
}

fn same_value(t: f64, f: f64) -> bool {
    (t.is_nan() && f.is_nan()) || (t - f).abs() < 1e-10
}

/// Assert that the indicator produces identical values for bars 0..truncated_len
/// whether computed on a truncated or full series.
fn assert_no_lookahead(indicator: &dyn Indicator, full_bars: &[Bar], truncated_len: usize) {
    let truncated = &full_bars[..truncated_len];
    let full_result = indicator.compute(full_bars);
    let truncated_result = indicator.compute(truncated);

    assert_eq!(truncated_result.len(), truncated_len, "{}", indicator.name());
    assert_eq!(full_result.len(), full_bars.len(), "{}", indicator.name());

    for i in 0..truncated_len {
        let (t, f) = (truncated_result[i], full_result[i]);
        assert!(
            same_value(t, f),
            "{}: look-ahead contamination at bar {i}: truncated={t}, full={f}",
            indicator.name()
        );
    }
}

// ── Indicators ───────────────────────────────────────────────────────

#[test]
fn lookahead_sma() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Sma::new(10), &bars, 100);
    assert_no_lookahead(&Sma::new(50), &bars, 100);
}

#[test]
fn lookahead_ema() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Ema::new(12), &bars, 100);
}

#[test]
fn lookahead_rsi() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Rsi::new(14), &bars, 100);
}

#[test]
fn lookahead_atr() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Atr::new(14), &bars, 100);
}

#[test]
fn lookahead_volatility_and_impulse() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Volatility::new(20), &bars, 100);
    assert_no_lookahead(&Impulse::new(10), &bars, 100);
}

#[test]
fn lookahead_rolling_high() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&RollingHigh::new(30), &bars, 100);
}

#[test]
fn lookahead_bollinger() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Bollinger::mean(20), &bars, 100);
    assert_no_lookahead(&Bollinger::std(20), &bars, 100);
}

#[test]
fn lookahead_macd() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Macd::line(12, 26), &bars, 100);
    assert_no_lookahead(&Macd::signal(12, 26, 9), &bars, 100);
}

#[test]
fn lookahead_stochastic() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Stochastic::k(14), &bars, 100);
    assert_no_lookahead(&Stochastic::d(14, 3), &bars, 100);
}

// ── Cache shift ──────────────────────────────────────────────────────

#[test]
fn cached_value_at_bar_t_ignores_bar_t() {
    // Changing only the last bar must not change any cached column.
    let bars = make_test_bars(120);
    let mut altered = bars.clone();
    let last = altered.len() - 1;
    altered[last].close *= 3.0;
    altered[last].high *= 3.0;

    let mut request = IndicatorRequest::new();
    for kind in StrategyKind::ALL {
        request.merge(&StrategyConfig::default_for(kind).indicator_request());
    }

    let mut a = PriceTable::new(bars);
    let mut b = PriceTable::new(altered);
    IndicatorCache::annotate(&mut a, &request);
    IndicatorCache::annotate(&mut b, &request);

    for name in a.column_names() {
        let (ca, cb) = (a.column(name).unwrap(), b.column(name).unwrap());
        // %K reads the current close by construction
        let checked = if name.starts_with("stoch_k_") { last } else { ca.len() };
        for i in 0..checked {
            assert!(same_value(ca[i], cb[i]), "{name} differs at bar {i}");
        }
    }
}

#[test]
fn cached_stochastic_k_ignores_current_bar_range() {
    let bars = make_test_bars(120);
    let mut altered = bars.clone();
    let last = altered.len() - 1;
    altered[last].high *= 3.0;
    altered[last].low *= 0.5;

    let mut request = IndicatorRequest::new();
    request.stochastic.insert((14, 3));
    let mut a = PriceTable::new(bars);
    let mut b = PriceTable::new(altered);
    IndicatorCache::annotate(&mut a, &request);
    IndicatorCache::annotate(&mut b, &request);

    for name in ["stoch_k_14", "stoch_d_14_3"] {
        let (ca, cb) = (a.column(name).unwrap(), b.column(name).unwrap());
        for i in 0..ca.len() {
            assert!(same_value(ca[i], cb[i]), "{name} differs at bar {i}");
        }
    }
}

// ── Signals ──────────────────────────────────────────────────────────

fn classical_configs() -> Vec<StrategyConfig> {
    StrategyKind::ALL
        .into_iter()
        .filter(|k| *k != StrategyKind::RandomForest)
        .map(StrategyConfig::default_for)
        .collect()
}

#[test]
fn truncated_and_full_signals_agree() {
    let bars = make_test_bars(400);
    for cfg in classical_configs() {
        let request = cfg.indicator_request();
        let mut full = PriceTable::new(bars.clone());
        let mut truncated = PriceTable::new(bars[..250].to_vec());
        IndicatorCache::annotate(&mut full, &request);
        IndicatorCache::annotate(&mut truncated, &request);

        let sf = cfg.signals(&full).unwrap();
        let st = cfg.signals(&truncated).unwrap();
        assert_eq!(sf.entries[..250], st.entries[..], "{} entries", cfg.kind());
        assert_eq!(sf.exits[..250], st.exits[..], "{} exits", cfg.kind());
    }
}

#[test]
fn perturbing_later_indicator_values_leaves_earlier_signals_unchanged() {
    let bars = make_test_bars(400);
    let cut = 250;
    for cfg in classical_configs() {
        let mut table = PriceTable::new(bars.clone());
        IndicatorCache::annotate(&mut table, &cfg.indicator_request());
        let baseline = cfg.signals(&table).unwrap();

        let mut perturbed = PriceTable::new(bars.clone());
        for name in table.column_names() {
            let mut values = table.column(name).unwrap().to_vec();
            for v in values.iter_mut().skip(cut + 1) {
                *v = *v * 1.7 + 13.0;
            }
            perturbed.insert_column(name, values);
        }
        let after = cfg.signals(&perturbed).unwrap();

        assert_eq!(
            baseline.entries[..=cut],
            after.entries[..=cut],
            "{} entries",
            cfg.kind()
        );
        assert_eq!(baseline.exits[..=cut], after.exits[..=cut], "{} exits", cfg.kind());
    }
}
