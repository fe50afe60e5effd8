//! A TOML run file on disk, run end to end and exported.

use std::io::Write;

use tempfile::TempDir;
use tradelab_core::domain::PriceTable;
use tradelab_core::signals::StrategyKind;
use tradelab_runner::data_loader::generate_synthetic_bars;
use tradelab_runner::export::{export_json, export_trades_csv, import_json, write_file};
use tradelab_runner::{
    optimize, run_from_file, RunConfigError, RunError, RunFile, SearchOverrides,
};

fn write_plain_csv(dir: &TempDir, n: usize) -> std::path::PathBuf {
    let path = dir.path().join("bars.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "timestamp,open,high,low,close,volume").unwrap();
    for b in generate_synthetic_bars(n, 8) {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        )
        .unwrap();
    }
    path
}

#[test]
fn run_file_backtests_and_round_trips_json() {
    let dir = TempDir::new().unwrap();
    let data = write_plain_csv(&dir, 700);
    let config_path = dir.path().join("run.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
            [data]
            path = "{}"

            [strategy]
            strategy = "momentum"
            window = 8

            [risk]
            sl_pct = 3.0
            tp_pct = 6.0
            trailing_stop_pct = 1.0
            "#,
            data.display()
        ),
    )
    .unwrap();

    let file = RunFile::from_file(&config_path).unwrap();
    let result = run_from_file(&file).unwrap();
    assert_eq!(result.config.strategy.kind(), StrategyKind::Momentum);
    assert_eq!(result.config.risk.trailing_stop_pct(), Some(1.0));
    assert_eq!(result.bar_count, 700);

    let json_path = dir.path().join("results/run.json");
    write_file(&json_path, &export_json(&result).unwrap()).unwrap();
    let back = import_json(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(back.config_hash, result.config_hash);
    assert_eq!(back.trades.len(), result.trades.len());

    let trades_csv = export_trades_csv(&result.trades).unwrap();
    assert_eq!(trades_csv.lines().count(), result.trades.len() + 1);
}

#[test]
fn unreadable_config_path_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let err = RunFile::from_file(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, RunConfigError::Read { .. }));
}

#[test]
fn missing_data_surfaces_as_data_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("run.toml");
    std::fs::write(
        &config_path,
        "[data]\npath = \"missing.csv\"\n\n[strategy]\nstrategy = \"bollinger\"\n",
    )
    .unwrap();
    let file = RunFile::from_file(&config_path).unwrap();
    assert!(matches!(run_from_file(&file), Err(RunError::Data(_))));
}

fn rsi_file(search: &str) -> RunFile {
    RunFile::from_toml(&format!(
        r#"
        [strategy]
        strategy = "rsi"

        [search]
        {search}
        "#
    ))
    .unwrap()
}

#[test]
fn search_section_selects_method_budget_and_refinement() {
    let bars = generate_synthetic_bars(1500, 8);

    let grid = rsi_file("method = \"grid\"\ntrials = 6");
    let mut table = PriceTable::new(bars.clone());
    let report = optimize(&mut table, grid.strategy.kind(), &grid.search, &grid.scoring);
    assert_eq!(report.method, "grid");
    assert_eq!(report.ranked.len() + report.failed, 6);

    let tpe = rsi_file("trials = 6\nseed = 5");
    let mut table = PriceTable::new(bars.clone());
    let report = optimize(&mut table, tpe.strategy.kind(), &tpe.search, &tpe.scoring);
    assert_eq!(report.method, "tpe");
    assert_eq!(report.trials(), 6);

    // refinement ranks the grid around the TPE winner instead
    let refined = rsi_file("trials = 6\nseed = 5\nrefine = true");
    let mut table = PriceTable::new(bars.clone());
    let report = optimize(&mut table, refined.strategy.kind(), &refined.search, &refined.scoring);
    assert_eq!(report.method, "grid");
    assert!(report.best().is_some());

    // a command-line method beats the file's
    let overrides = SearchOverrides {
        method: Some("grid".parse().unwrap()),
        trials: Some(4),
        ..SearchOverrides::default()
    };
    let settings = tpe.search.clone().with_overrides(&overrides);
    let mut table = PriceTable::new(bars);
    let report = optimize(&mut table, StrategyKind::Rsi, &settings, &tpe.scoring);
    assert_eq!(report.method, "grid");
    assert_eq!(report.ranked.len() + report.failed, 4);
}
