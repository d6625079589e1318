//! CSV Data Loader Module
//! Reads crash records with Polars, normalizes them into a `CollisionTable`
//! and memoizes the result per row limit.

use super::table::columns::*;
use super::table::CollisionTable;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Columns that must exist after name normalization.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    CRASH_DATE,
    CRASH_TIME,
    LATITUDE,
    LONGITUDE,
    INJURED_PERSONS,
    INJURED_PEDESTRIANS,
    INJURED_CYCLISTS,
    INJURED_MOTORISTS,
    ON_STREET_NAME,
];

const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read collision data from {}: {reason}", path.display())]
    DataSource { path: PathBuf, reason: String },
    #[error("Collision data is missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },
}

impl LoaderError {
    fn data_source(path: &Path, reason: impl ToString) -> Self {
        LoaderError::DataSource {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Loads the collision CSV and keeps one table per row limit.
///
/// The memo table is owned by the loader: a second `load` with the same
/// limit hands back the same shared table without touching the file.
pub struct CollisionLoader {
    source: PathBuf,
    cache: HashMap<usize, Arc<CollisionTable>>,
}

impl CollisionLoader {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            cache: HashMap::new(),
        }
    }

    /// Point the loader at another CSV. Drops every cached table.
    pub fn set_source(&mut self, source: impl Into<PathBuf>) {
        self.source = source.into();
        self.clear();
    }

    /// Load at most `row_limit` rows, reusing a cached table when present.
    pub fn load(&mut self, row_limit: usize) -> Result<Arc<CollisionTable>, LoaderError> {
        if let Some(table) = self.cache.get(&row_limit) {
            tracing::debug!(row_limit, "Collision table cache hit");
            return Ok(Arc::clone(table));
        }

        let started = Instant::now();
        let table = Arc::new(read_collisions(&self.source, row_limit)?);
        tracing::info!(
            path = %self.source.display(),
            row_limit,
            rows = table.height(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Loaded collision data"
        );

        self.cache.insert(row_limit, Arc::clone(&table));
        Ok(table)
    }

    pub fn is_cached(&self, row_limit: usize) -> bool {
        self.cache.contains_key(&row_limit)
    }

    /// Forget the table for one row limit. Returns whether one was cached.
    pub fn invalidate(&mut self, row_limit: usize) -> bool {
        self.cache.remove(&row_limit).is_some()
    }

    /// Forget every cached table.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

/// Read and normalize up to `row_limit` rows from a CSV file, bypassing any cache.
pub fn read_collisions(path: &Path, row_limit: usize) -> Result<CollisionTable, LoaderError> {
    if !path.is_file() {
        return Err(LoaderError::data_source(path, "file not found"));
    }

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_n_rows(Some(row_limit))
        .with_infer_schema_length(Some(10000))
        .with_ignore_errors(true)
        .finish()
        .and_then(|lazy| lazy.collect())
        .map_err(|e| LoaderError::data_source(path, e))?;

    prepare_frame(df).map_err(|e| match e {
        PrepareError::Schema(missing) => LoaderError::Schema { missing },
        PrepareError::Polars(e) => LoaderError::data_source(path, e),
    })
}

enum PrepareError {
    Schema(Vec<String>),
    Polars(PolarsError),
}

impl From<PolarsError> for PrepareError {
    fn from(e: PolarsError) -> Self {
        PrepareError::Polars(e)
    }
}

/// Lowercase, trim and underscore a raw CSV header.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Combine a crash date and time into one timestamp.
pub fn parse_crash_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = date.trim();
    // ISO exports carry a midnight time on the date column.
    let date = date.split_once(['T', ' ']).map(|(d, _)| d).unwrap_or(date);
    let date = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(date, f).ok())?;
    let time = TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(time.trim(), f).ok())?;
    Some(date.and_time(time))
}

fn prepare_frame(df: DataFrame) -> Result<CollisionTable, PrepareError> {
    let (existing, renamed): (Vec<String>, Vec<String>) = df
        .get_column_names()
        .iter()
        .map(|name| (name.to_string(), normalize_column_name(name)))
        .filter(|(old, new)| old != new)
        .unzip();
    // Renaming inside the plan keeps the lazy schema in step with the headers.
    let df = df.lazy().rename(existing, renamed, true).collect()?;

    let present = df.get_column_names();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !present.iter().any(|name| name.as_str() == **required))
        .map(|s| s.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PrepareError::Schema(missing));
    }

    let mut casts = vec![
        col(LATITUDE).cast(DataType::Float64),
        col(LONGITUDE).cast(DataType::Float64),
        col(ON_STREET_NAME).cast(DataType::String),
    ];
    casts.extend(INJURY_COUNTS.iter().map(|c| col(*c).cast(DataType::Int64)));
    let df = df.lazy().with_columns(casts).collect()?;

    // Rows without coordinates are unusable on every map view.
    let lat_present = df.column(LATITUDE)?.is_not_null();
    let lon_present = df.column(LONGITUDE)?.is_not_null();
    let mask = &lat_present & &lon_present;
    let located = df.filter(&mask)?;
    let dropped = df.height() - located.height();
    if dropped > 0 {
        tracing::debug!(dropped, "Dropped rows without coordinates");
    }

    let dates = located.column(CRASH_DATE)?.cast(&DataType::String)?;
    let times = located.column(CRASH_TIME)?.cast(&DataType::String)?;
    let stamps: Vec<Option<i64>> = dates
        .str()?
        .into_iter()
        .zip(times.str()?.into_iter())
        .map(|pair| match pair {
            (Some(date), Some(time)) => parse_crash_timestamp(date, time),
            _ => None,
        })
        .map(|dt| dt.map(|dt| dt.and_utc().timestamp_millis()))
        .collect();
    let date_time = Column::new(DATE_TIME.into(), stamps)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

    let mut combined = located.drop(CRASH_DATE)?.drop(CRASH_TIME)?;
    combined.insert_column(0, date_time)?;

    let mask = combined.column(DATE_TIME)?.is_not_null();
    let table = combined.filter(&mask)?;
    let unparsed = combined.height() - table.height();
    if unparsed > 0 {
        tracing::warn!(unparsed, "Dropped rows with unparseable crash date/time");
    }

    Ok(CollisionTable::from_frame(table))
}
