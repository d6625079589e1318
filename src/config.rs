//! Dashboard Configuration Module
//! Loads data source, view defaults and hexagon layer settings from TOML.
//!
//! ```toml
//! [data]
//! path = "Motor_Vehicle_Collisions_-_Crashes.csv"
//! row_limit = 100000
//!
//! [view]
//! default_hour = 1
//! default_threshold = 0
//! raw_rows_limit = 1000
//!
//! [hexagon]
//! radius_m = 100.0
//! elevation_scale = 4.0
//! elevation_range = [0.0, 1000.0]
//!
//! [export]
//! width = 1200
//! height = 500
//! open_after_export = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "COLLISIONS_CONFIG";
/// Environment variable overriding `data.path`.
pub const DATA_ENV: &str = "COLLISIONS_DATA";
/// Environment variable overriding `data.row_limit`.
pub const ROWS_ENV: &str = "COLLISIONS_ROWS";
/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "collisions.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

/// Top-level dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data: DataConfig,
    pub view: ViewConfig,
    pub hexagon: HexagonConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// CSV file with the crash records
    pub path: PathBuf,
    /// Maximum number of rows read from the CSV
    pub row_limit: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("Motor_Vehicle_Collisions_-_Crashes.csv"),
            row_limit: 100_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub default_hour: u32,
    pub default_threshold: u32,
    /// Rows rendered in the raw data table
    pub raw_rows_limit: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_hour: 1,
            default_threshold: 0,
            raw_rows_limit: 1000,
        }
    }
}

/// Hexagon density layer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HexagonConfig {
    pub radius_m: f64,
    pub elevation_scale: f64,
    pub elevation_range: [f64; 2],
}

impl Default for HexagonConfig {
    fn default() -> Self {
        Self {
            radius_m: 100.0,
            elevation_scale: 4.0,
            elevation_range: [0.0, 1000.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub width: u32,
    pub height: u32,
    pub open_after_export: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 500,
            open_after_export: false,
        }
    }
}

impl DashboardConfig {
    /// Parse a TOML document; missing sections and fields keep their defaults.
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a config file from an explicit path.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Resolve the configuration for this process.
    ///
    /// `$COLLISIONS_CONFIG` wins, then `collisions.toml` in the working
    /// directory, then built-in defaults. Environment overrides apply last.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    Self::from_file(local)?
                } else {
                    tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };

        config.apply_overrides(
            std::env::var(DATA_ENV).ok(),
            std::env::var(ROWS_ENV).ok(),
        )?;
        Ok(config)
    }

    /// Apply `COLLISIONS_DATA` / `COLLISIONS_ROWS` style overrides.
    pub fn apply_overrides(
        &mut self,
        data_path: Option<String>,
        row_limit: Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(path) = data_path {
            self.data.path = PathBuf::from(path);
        }
        if let Some(rows) = row_limit {
            self.data.row_limit = rows
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv {
                    name: ROWS_ENV,
                    value: rows.clone(),
                })?;
        }
        Ok(())
    }
}
