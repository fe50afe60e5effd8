//! TOML run configuration.
//!
//! ```toml
//! [data]
//! path = "data/btc_15m_data_2018_to_2025.csv"
//!
//! [strategy]
//! strategy = "rsi"
//! period = 14
//! oversold = 30
//!
//! [risk]
//! sl_pct = 5.0
//! tp_pct = 10.0
//!
//! [search]
//! method = "tpe"
//! trials = 300
//!
//! [output]
//! trades = "out/trades.csv"
//! ```
//!
//! Every section except `[strategy]` is optional. Command-line flags take
//! precedence over `[search]` and `[output]` values.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradelab_core::engine::{ConfigError, RiskConfig};
use tradelab_core::signals::StrategyConfig;

use crate::data_loader::default_data_path;
use crate::metrics::ScoringConfig;
use crate::params::{DEFAULT_SL_PCT, DEFAULT_TP_PCT};
use crate::search::{SearchMethod, UnknownMethod};
use crate::tpe::TpeSettings;

pub const DEFAULT_RESULTS_FILE: &str = "results_live.csv";
pub const DEFAULT_SUMMARY_FILE: &str = "summary_live.csv";
pub const DEFAULT_BEST_PARAMS_FILE: &str = "best_params.csv";
pub const DEFAULT_TRADES_FILE: &str = "trades.csv";
pub const DEFAULT_TRIALS: usize = 300;

#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSection {
    pub path: PathBuf,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodName {
    #[default]
    Tpe,
    Grid,
}

impl FromStr for MethodName {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<SearchMethod>()? {
            SearchMethod::Grid => Ok(MethodName::Grid),
            SearchMethod::Tpe(_) => Ok(MethodName::Tpe),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub method: MethodName,
    pub trials: usize,
    pub seed: u64,
    /// Run a refined grid around the best result afterwards.
    pub refine: bool,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            method: MethodName::Tpe,
            trials: DEFAULT_TRIALS,
            seed: 42,
            refine: false,
        }
    }
}

/// Search settings given on the command line.
#[derive(Debug, Clone, Default)]
pub struct SearchOverrides {
    pub method: Option<MethodName>,
    pub trials: Option<usize>,
    pub seed: Option<u64>,
    /// Only turns refinement on; a run file's `refine = true` stands.
    pub refine: bool,
}

impl SearchSection {
    pub fn search_method(&self) -> SearchMethod {
        match self.method {
            MethodName::Grid => SearchMethod::Grid,
            MethodName::Tpe => SearchMethod::Tpe(TpeSettings::with_seed(self.seed)),
        }
    }

    pub fn with_overrides(mut self, overrides: &SearchOverrides) -> Self {
        if let Some(method) = overrides.method {
            self.method = method;
        }
        if let Some(trials) = overrides.trials {
            self.trials = trials;
        }
        if let Some(seed) = overrides.seed {
            self.seed = seed;
        }
        self.refine |= overrides.refine;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub results: PathBuf,
    pub summary: PathBuf,
    pub best_params: PathBuf,
    pub trades: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            results: DEFAULT_RESULTS_FILE.into(),
            summary: DEFAULT_SUMMARY_FILE.into(),
            best_params: DEFAULT_BEST_PARAMS_FILE.into(),
            trades: DEFAULT_TRADES_FILE.into(),
        }
    }
}

/// A complete run file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFile {
    #[serde(default)]
    pub data: DataSection,
    pub strategy: StrategyConfig,
    /// Absent means `DEFAULT_SL_PCT` / `DEFAULT_TP_PCT`, no trailing stop.
    #[serde(default)]
    pub risk: Option<RiskConfig>,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub output: OutputSection,
}

impl RunFile {
    pub fn from_file(path: &Path) -> Result<Self, RunConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| RunConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, RunConfigError> {
        let file: RunFile = toml::from_str(content)?;
        file.strategy.validate()?;
        Ok(file)
    }

    pub fn risk(&self) -> Result<RiskConfig, ConfigError> {
        match &self.risk {
            Some(risk) => Ok(risk.clone()),
            None => RiskConfig::fixed(DEFAULT_SL_PCT, DEFAULT_TP_PCT),
        }
    }
}
