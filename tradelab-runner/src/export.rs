//! JSON results and CSV tables for trades, rankings, and summaries.
//!
//! Every CSV writer renders into memory and returns the text; `write_file`
//! puts it on disk.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tradelab_core::domain::Trade;

use crate::benchmark::StrategyScore;
use crate::runner::{BacktestResult, SCHEMA_VERSION};
use crate::search::SearchReport;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Trade tape.
///
/// Columns: entry_time, exit_time, entry, exit, qty, pct_change, exit_reason
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "entry_time",
        "exit_time",
        "entry",
        "exit",
        "qty",
        "pct_change",
        "exit_reason",
    ])?;
    for t in trades {
        wtr.write_record([
            &t.entry_time().to_string(),
            &t.exit_time().to_string(),
            &format!("{:.6}", t.entry_price()),
            &format!("{:.6}", t.exit_price()),
            &format!("{:.6}", t.quantity()),
            &format!("{:.6}", t.pct_change()),
            t.exit_reason().as_str(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Ranked search results, best first: one column per parameter, then
/// `total_return`. Parameters are listed in first-seen order.
pub fn export_ranked_csv(report: &SearchReport) -> Result<String> {
    let mut names: Vec<&str> = Vec::new();
    for trial in &report.ranked {
        for (name, _) in trial.params.iter() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header: Vec<&str> = names.clone();
    header.push("total_return");
    wtr.write_record(&header)?;

    for trial in &report.ranked {
        let mut row: Vec<String> = names
            .iter()
            .map(|n| trial.params.get(n).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        row.push(format!("{:.6}", trial.score));
        wtr.write_record(&row)?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Best parameters per strategy. Columns: strategy, params (JSON), score
pub fn export_best_params_csv(scores: &[StrategyScore]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["strategy", "params", "score"])?;
    for s in scores {
        let params =
            serde_json::to_string(&s.params).context("failed to serialize parameters")?;
        wtr.write_record([s.strategy.as_str(), &params, &format!("{:.6}", s.score)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Benchmark summary. Columns: strategy, total_return
pub fn export_summary_csv(scores: &[StrategyScore]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["strategy", "total_return"])?;
    for s in scores {
        wtr.write_record([s.strategy.label(), &format!("{:.6}", s.score)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write `content` to `path`, creating parent directories.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}
