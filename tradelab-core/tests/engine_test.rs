//! Integration tests for the trade simulation engine.
//!
//! Tests:
//! 1. Trailing-stop scenario: ratcheted floor survives a higher high
//! 2. RSI scenario: signal provider → engine, entry at the oversold cross
//! 3. Tie-break: stop-loss beats take-profit on the same bar
//! 4. Forced exit: entry on the final bar yields exactly one trade
//! 5. Config rejection

use chrono::{NaiveDate, NaiveDateTime};
use tradelab_core::domain::{Bar, ExitReason, PriceTable};
use tradelab_core::engine::{simulate, simulate_signals, ConfigError, RiskConfig};
use tradelab_core::signals::{RsiThreshold, SignalProvider};

fn ts(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn bar(day: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: ts(day),
        open,
        high,
        low,
        close,
        volume: 1000.0,
    }
}

// ── 1. Trailing stop ─────────────────────────────────────────────────

#[test]
fn trailing_stop_exits_at_floor_from_earlier_high() {
    let bars = vec![
        bar(1, 100.0, 100.0, 100.0, 100.0),
        bar(2, 102.0, 110.0, 101.0, 108.0),
        bar(3, 107.0, 111.0, 104.0, 106.0),
    ];
    let risk = RiskConfig::new(0.0, 100.0, Some(5.0), 1.0).unwrap();
    let trades = simulate(&bars, &[true, false, false], &[false; 3], &risk).unwrap();

    assert_eq!(trades.len(), 1);
    let t = &trades[0];
    assert_eq!(t.exit_reason(), ExitReason::StopLoss);
    assert!((t.exit_price() - 104.5).abs() < 1e-9);
    assert_eq!(t.entry_time(), ts(1));
    assert_eq!(t.exit_time(), ts(3));
    assert_eq!(t.exit_bar(), 2);
}

// ── 2. RSI scenario ──────────────────────────────────────────────────

#[test]
fn rsi_oversold_cross_enters_and_trade_closes_on_final_bar() {
    let closes = [10.0, 11.0, 12.0, 13.0, 14.0];
    let bars: Vec<Bar> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| bar(i as u32 + 1, c - 0.2, c + 0.2, c - 0.4, c))
        .collect();
    let mut table = PriceTable::new(bars);
    table.insert_column("rsi_14", vec![25.0, 28.0, 35.0, 45.0, 55.0]);

    let strat = RsiThreshold {
        period: 14,
        oversold: 30.0,
    };
    let signals = strat.signals(&table).unwrap();
    let risk = RiskConfig::fixed(50.0, 100.0).unwrap();
    let trades = simulate_signals(&table, &signals, &risk).unwrap();

    assert_eq!(trades.len(), 1);
    let t = &trades[0];
    assert_eq!(t.entry_bar(), 2);
    assert_eq!(t.entry_price(), 12.0);
    assert_eq!(t.exit_bar(), 4);
    assert_eq!(t.exit_price(), 14.0);
    // RSI crosses the midline on the final bar, before end-of-data liquidation
    assert_eq!(t.exit_reason(), ExitReason::Signal);
    assert!((t.pct_change() - 16.666_666_666).abs() < 1e-6);
}

// ── 3. Tie-break ─────────────────────────────────────────────────────

#[test]
fn stop_wins_when_bar_spans_stop_and_target() {
    let bars = vec![
        bar(1, 100.0, 100.5, 99.5, 100.0),
        bar(2, 100.0, 130.0, 80.0, 100.0),
    ];
    let risk = RiskConfig::fixed(5.0, 10.0).unwrap();
    let trades = simulate(&bars, &[true, false], &[false, false], &risk).unwrap();

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].exit_reason(), ExitReason::StopLoss);
    assert!((trades[0].exit_price() - 95.0).abs() < 1e-9);
}

#[test]
fn no_exit_check_on_entry_bar() {
    // Entry bar's own range touches both levels; nothing happens until bar 1.
    let bars = vec![
        bar(1, 100.0, 150.0, 50.0, 100.0),
        bar(2, 100.0, 101.0, 99.0, 100.5),
    ];
    let risk = RiskConfig::fixed(5.0, 10.0).unwrap();
    let trades = simulate(&bars, &[true, false], &[false, false], &risk).unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].exit_reason(), ExitReason::EndOfData);
    assert_eq!(trades[0].exit_price(), 100.5);
}

// ── 4. Forced exit ───────────────────────────────────────────────────

#[test]
fn entry_on_final_bar_emits_exactly_one_trade() {
    let bars = vec![
        bar(1, 100.0, 101.0, 99.0, 100.0),
        bar(2, 100.0, 101.0, 99.0, 100.0),
        bar(3, 100.0, 103.0, 99.0, 102.0),
    ];
    let risk = RiskConfig::new(5.0, 10.0, None, 0.25).unwrap();
    let trades = simulate(&bars, &[false, false, true], &[false; 3], &risk).unwrap();

    assert_eq!(trades.len(), 1);
    let t = &trades[0];
    assert_eq!(t.exit_reason(), ExitReason::EndOfData);
    assert_eq!(t.entry_price(), 102.0);
    assert_eq!(t.exit_price(), 102.0);
    assert_eq!(t.entry_time(), t.exit_time());
    assert_eq!(t.quantity(), 0.25);
}

#[test]
fn trades_are_time_ordered_and_non_overlapping() {
    let bars: Vec<Bar> = (0..20)
        .map(|i| {
            let c = 100.0 + (i % 5) as f64;
            bar(i + 1, c, c + 1.0, c - 1.0, c)
        })
        .collect();
    let entries: Vec<bool> = (0..20).map(|i| i % 3 == 0).collect();
    let exits: Vec<bool> = (0..20).map(|i| i % 4 == 0).collect();
    let risk = RiskConfig::fixed(20.0, 40.0).unwrap();
    let trades = simulate(&bars, &entries, &exits, &risk).unwrap();

    assert!(!trades.is_empty());
    for pair in trades.windows(2) {
        assert!(pair[0].exit_bar() < pair[1].entry_bar());
    }
    for t in &trades {
        assert!(t.entry_time() <= t.exit_time());
    }
}

// ── 5. Rejection ─────────────────────────────────────────────────────

#[test]
fn inverted_stop_and_target_is_rejected() {
    assert!(matches!(
        RiskConfig::fixed(10.0, 5.0),
        Err(ConfigError::StopLossNotBelowTakeProfit { .. })
    ));
}

#[test]
fn zero_trailing_stop_is_rejected() {
    assert!(matches!(
        RiskConfig::new(5.0, 10.0, Some(0.0), 1.0),
        Err(ConfigError::NonPositiveTrailingStop(_))
    ));
}
