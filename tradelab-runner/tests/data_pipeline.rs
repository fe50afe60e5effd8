//! Integration tests for the data pipeline: CSV on disk through to a backtest.

use std::io::Write;
use std::path::Path;

use tempfile::TempDir;
use tradelab_core::domain::Bar;
use tradelab_core::engine::RiskConfig;
use tradelab_core::indicators::IndicatorCache;
use tradelab_core::signals::{StrategyConfig, StrategyKind};
use tradelab_runner::data_loader::{generate_synthetic_bars, load_bars, load_price_table};
use tradelab_runner::{run_backtest, LoadError, ScoringConfig, TrialConfig};

fn write_exchange_csv(path: &Path, bars: &[Bar]) {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "Open time,Open,High,Low,Close,Volume").unwrap();
    for b in bars {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            b.timestamp.format("%Y-%m-%d %H:%M:%S%.6f"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        )
        .unwrap();
    }
}

#[test]
fn exchange_export_loads_and_backtests() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prices.csv");
    let bars = generate_synthetic_bars(600, 11);
    write_exchange_csv(&path, &bars);

    let mut table = load_price_table(&path).unwrap();
    assert_eq!(table.len(), 600);
    assert_eq!(table.bars()[0].timestamp, bars[0].timestamp);
    assert_eq!(table.bars()[599].close, bars[599].close);

    let config = TrialConfig::new(
        StrategyConfig::default_for(StrategyKind::Bollinger),
        RiskConfig::fixed(5.0, 10.0).unwrap(),
    );
    IndicatorCache::annotate(&mut table, &config.strategy.indicator_request());
    let result = run_backtest(&table, &config, &ScoringConfig::default()).unwrap();
    assert_eq!(result.bar_count, 600);
    for pair in result.trades.windows(2) {
        assert!(pair[0].exit_bar() <= pair[1].entry_bar());
    }
}

#[test]
fn shuffled_file_is_cleaned_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("messy.csv");
    let mut bars = generate_synthetic_bars(50, 4);
    bars.reverse();
    let dup = bars[10].clone();
    bars.push(dup);
    write_exchange_csv(&path, &bars);

    let loaded = load_bars(&path).unwrap();
    assert_eq!(loaded.bars.len(), 50);
    assert_eq!(loaded.stats.duplicates, 1);
    for pair in loaded.bars.windows(2) {
        assert!(pair[0].timestamp < pair[1].timestamp);
    }
}

#[test]
fn missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let err = load_bars(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, LoadError::NotFound { .. }));
}
