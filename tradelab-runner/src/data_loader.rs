//! CSV bar loading and cleaning.
//!
//! Accepts either a plain header (`timestamp,open,high,low,close[,volume]`)
//! or an exchange export header (`Open time,Open,High,Low,Close[,Volume]`);
//! header matching is case-insensitive. Cleaning policy:
//! 1. Rows whose timestamp or OHLC does not parse are dropped
//! 2. Rows are sorted ascending by timestamp
//! 3. Duplicate timestamps keep the first row seen
//! 4. Bars with `high < low` are dropped
//!
//! Synthetic bars are a developer-only fallback for trying the pipeline
//! without a data file.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{info, warn};
use tradelab_core::domain::{Bar, PriceTable};

/// Data file used when neither the CLI nor a config names one.
pub const DEFAULT_DATA_FILE: &str = "data/btc_15m_data_2018_to_2025.csv";

/// Environment variable overriding [`DEFAULT_DATA_FILE`].
pub const DATA_FILE_ENV: &str = "DATA_FILE";

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("invalid CSV format in {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    #[error("missing expected column '{column}' in {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("no usable bars in {}", path.display())]
    Empty { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `$DATA_FILE` if set, else [`DEFAULT_DATA_FILE`].
pub fn default_data_path() -> PathBuf {
    std::env::var_os(DATA_FILE_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
}

/// What cleaning removed, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningStats {
    pub rows_read: usize,
    pub unparseable: usize,
    pub duplicates: usize,
    pub inverted_range: usize,
}

#[derive(Debug)]
pub struct LoadedBars {
    pub bars: Vec<Bar>,
    pub stats: CleaningStats,
}

/// Load and clean bars from a CSV file.
pub fn load_bars(path: &Path) -> Result<LoadedBars, LoadError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    let loaded = read_bars(file, path)?;
    info!(
        path = %path.display(),
        bars = loaded.bars.len(),
        first = %loaded.bars[0].timestamp,
        last = %loaded.bars[loaded.bars.len() - 1].timestamp,
        "price data loaded"
    );
    Ok(loaded)
}

/// [`load_bars`] wrapped into a fresh `PriceTable`.
pub fn load_price_table(path: &Path) -> Result<PriceTable, LoadError> {
    Ok(PriceTable::new(load_bars(path)?.bars))
}

struct ColumnMap {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

fn resolve_columns(headers: &csv::StringRecord, path: &Path) -> Result<ColumnMap, LoadError> {
    let names: Vec<String> = headers.iter().map(|h| h.trim().to_ascii_lowercase()).collect();
    let find = |aliases: &[&str]| names.iter().position(|n| aliases.contains(&n.as_str()));
    let require = |aliases: &[&str]| {
        find(aliases).ok_or_else(|| LoadError::MissingColumn {
            path: path.to_path_buf(),
            column: aliases[0].to_string(),
        })
    };

    Ok(ColumnMap {
        timestamp: require(&["timestamp", "open time", "date", "datetime"])?,
        open: require(&["open"])?,
        high: require(&["high"])?,
        low: require(&["low"])?,
        close: require(&["close"])?,
        volume: find(&["volume"]),
    })
}

/// Parse and clean bars from any CSV reader. `path` is only used in errors.
pub fn read_bars<R: Read>(reader: R, path: &Path) -> Result<LoadedBars, LoadError> {
    let format_err = |e: csv::Error| LoadError::Format {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().map_err(format_err)?.clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::Format {
            path: path.to_path_buf(),
            reason: "no header row".into(),
        });
    }
    let cols = resolve_columns(&headers, path)?;

    let mut stats = CleaningStats::default();
    let mut bars = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(format_err)?;
        stats.rows_read += 1;
        match parse_row(&record, &cols) {
            Some(bar) => bars.push(bar),
            None => stats.unparseable += 1,
        }
    }

    bars.sort_by_key(|b| b.timestamp);
    let before = bars.len();
    bars.dedup_by_key(|b| b.timestamp);
    stats.duplicates = before - bars.len();

    let before = bars.len();
    bars.retain(Bar::has_ordered_range);
    stats.inverted_range = before - bars.len();

    if stats.unparseable + stats.duplicates + stats.inverted_range > 0 {
        warn!(
            path = %path.display(),
            unparseable = stats.unparseable,
            duplicates = stats.duplicates,
            inverted_range = stats.inverted_range,
            "dropped rows while cleaning price data"
        );
    }
    if bars.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(LoadedBars { bars, stats })
}

fn parse_row(record: &csv::StringRecord, cols: &ColumnMap) -> Option<Bar> {
    let num = |idx: usize| -> Option<f64> {
        record
            .get(idx)?
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    };
    Some(Bar {
        timestamp: parse_timestamp(record.get(cols.timestamp)?)?,
        open: num(cols.open)?,
        high: num(cols.high)?,
        low: num(cols.low)?,
        close: num(cols.close)?,
        volume: cols.volume.and_then(num).unwrap_or(0.0),
    })
}

/// Epoch values above this are milliseconds, below it seconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Parse RFC 3339, `%Y-%m-%d %H:%M:%S[.f]`, `%Y-%m-%dT%H:%M:%S[.f]`,
/// `%Y-%m-%d %H:%M`, `%Y-%m-%d`, or an integer epoch (s or ms).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(epoch) = s.parse::<i64>() {
        let dt = if epoch.abs() > EPOCH_MILLIS_THRESHOLD {
            DateTime::from_timestamp_millis(epoch)
        } else {
            DateTime::from_timestamp(epoch, 0)
        };
        return dt.map(|d| d.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Generate `n` synthetic 15-minute bars: a seeded random walk from 100.0.
pub fn generate_synthetic_bars(n: usize, seed: u64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2018, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();

    let mut price = 100.0_f64;
    (0..n)
        .map(|i| {
            let ret: f64 = rng.gen_range(-0.01..0.01);
            let open = price;
            let close = (price * (1.0 + ret)).max(0.01);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.004));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.004));
            price = close;
            Bar {
                timestamp: start + chrono::Duration::minutes(15 * i as i64),
                open,
                high,
                low,
                close,
                volume: rng.gen_range(10.0..500.0),
            }
        })
        .collect()
}
