//! Collision Table Module
//! Typed view over the normalized crash-record DataFrame.

use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Normalized column names.
pub mod columns {
    pub const DATE_TIME: &str = "date/time";
    pub const CRASH_DATE: &str = "crash_date";
    pub const CRASH_TIME: &str = "crash_time";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const INJURED_PERSONS: &str = "injured_persons";
    pub const INJURED_PEDESTRIANS: &str = "injured_pedestrians";
    pub const INJURED_CYCLISTS: &str = "injured_cyclists";
    pub const INJURED_MOTORISTS: &str = "injured_motorists";
    pub const ON_STREET_NAME: &str = "on_street_name";

    /// Integer injury count columns
    pub const INJURY_COUNTS: [&str; 4] = [
        INJURED_PERSONS,
        INJURED_PEDESTRIANS,
        INJURED_CYCLISTS,
        INJURED_MOTORISTS,
    ];
}

use columns::*;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Plot coordinates: x = longitude, y = latitude.
    pub fn to_plot(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// Category of injured people used for the street ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VictimCategory {
    #[default]
    Pedestrians,
    Cyclists,
    Motorists,
}

impl VictimCategory {
    pub const ALL: [VictimCategory; 3] = [
        VictimCategory::Pedestrians,
        VictimCategory::Cyclists,
        VictimCategory::Motorists,
    ];

    /// Injury count column backing this category.
    pub fn column(self) -> &'static str {
        match self {
            VictimCategory::Pedestrians => INJURED_PEDESTRIANS,
            VictimCategory::Cyclists => INJURED_CYCLISTS,
            VictimCategory::Motorists => INJURED_MOTORISTS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VictimCategory::Pedestrians => "Pedestrians",
            VictimCategory::Cyclists => "Cyclists",
            VictimCategory::Motorists => "Motorists",
        }
    }
}

/// One reported crash.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionRecord {
    pub date_time: NaiveDateTime,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub injured_persons: i64,
    pub injured_pedestrians: i64,
    pub injured_cyclists: i64,
    pub injured_motorists: i64,
    pub on_street_name: Option<String>,
}

/// Immutable table of collision records.
///
/// Columns are lowercase, `date/time` holds a millisecond `Datetime`,
/// coordinates are `Float64` and injury counts `Int64`. Filter stages return
/// new tables; the wrapped frame is never mutated after construction.
#[derive(Debug, Clone)]
pub struct CollisionTable {
    df: DataFrame,
}

impl CollisionTable {
    /// Wrap an already normalized frame.
    pub(crate) fn from_frame(df: DataFrame) -> Self {
        Self { df }
    }

    /// Build a table from typed records, using the loader's column layout.
    pub fn from_records(records: &[CollisionRecord]) -> PolarsResult<Self> {
        let stamps: Vec<i64> = records
            .iter()
            .map(|r| r.date_time.and_utc().timestamp_millis())
            .collect();
        let date_time = Column::new(DATE_TIME.into(), stamps)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

        let latitudes: Vec<Option<f64>> = records.iter().map(|r| r.latitude).collect();
        let longitudes: Vec<Option<f64>> = records.iter().map(|r| r.longitude).collect();
        let streets: Vec<Option<String>> =
            records.iter().map(|r| r.on_street_name.clone()).collect();

        let df = DataFrame::new(vec![
            date_time,
            Column::new(LATITUDE.into(), latitudes),
            Column::new(LONGITUDE.into(), longitudes),
            Column::new(
                INJURED_PERSONS.into(),
                records.iter().map(|r| r.injured_persons).collect::<Vec<i64>>(),
            ),
            Column::new(
                INJURED_PEDESTRIANS.into(),
                records.iter().map(|r| r.injured_pedestrians).collect::<Vec<i64>>(),
            ),
            Column::new(
                INJURED_CYCLISTS.into(),
                records.iter().map(|r| r.injured_cyclists).collect::<Vec<i64>>(),
            ),
            Column::new(
                INJURED_MOTORISTS.into(),
                records.iter().map(|r| r.injured_motorists).collect::<Vec<i64>>(),
            ),
            Column::new(ON_STREET_NAME.into(), streets),
        ])?;

        Ok(Self { df })
    }

    /// Underlying DataFrame (read-only).
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    #[cfg(test)]
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Coordinates of every record with both latitude and longitude.
    pub fn coordinates(&self) -> Vec<GeoPoint> {
        frame_coordinates(&self.df)
    }

    /// Materialize up to `limit` records (all when `None`).
    pub fn records(&self, limit: Option<usize>) -> Vec<CollisionRecord> {
        match self.try_records(limit) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to materialize collision records");
                Vec::new()
            }
        }
    }

    fn try_records(&self, limit: Option<usize>) -> PolarsResult<Vec<CollisionRecord>> {
        let df = match limit {
            Some(n) => self.df.head(Some(n)),
            None => self.df.clone(),
        };

        let stamps = df.column(DATE_TIME)?.cast(&DataType::Int64)?;
        let stamps = stamps.i64()?;
        let latitudes = df.column(LATITUDE)?.f64()?;
        let longitudes = df.column(LONGITUDE)?.f64()?;
        let persons = df.column(INJURED_PERSONS)?.i64()?;
        let pedestrians = df.column(INJURED_PEDESTRIANS)?.i64()?;
        let cyclists = df.column(INJURED_CYCLISTS)?.i64()?;
        let motorists = df.column(INJURED_MOTORISTS)?.i64()?;
        let streets = df.column(ON_STREET_NAME)?.str()?;

        let mut records = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            // Rows without a timestamp are not representable as records.
            let Some(date_time) = stamps
                .get(i)
                .and_then(DateTime::from_timestamp_millis)
                .map(|dt| dt.naive_utc())
            else {
                continue;
            };

            records.push(CollisionRecord {
                date_time,
                latitude: latitudes.get(i),
                longitude: longitudes.get(i),
                injured_persons: persons.get(i).unwrap_or(0),
                injured_pedestrians: pedestrians.get(i).unwrap_or(0),
                injured_cyclists: cyclists.get(i).unwrap_or(0),
                injured_motorists: motorists.get(i).unwrap_or(0),
                on_street_name: streets.get(i).map(|s| s.to_string()),
            });
        }

        Ok(records)
    }
}

/// Non-null (latitude, longitude) pairs of any frame carrying both columns.
pub fn frame_coordinates(df: &DataFrame) -> Vec<GeoPoint> {
    let (Ok(lat), Ok(lon)) = (df.column(LATITUDE), df.column(LONGITUDE)) else {
        return Vec::new();
    };
    let (Ok(lat), Ok(lon)) = (lat.f64(), lon.f64()) else {
        return Vec::new();
    };

    lat.into_iter()
        .zip(lon.into_iter())
        .filter_map(|(la, lo)| Some(GeoPoint::new(la?, lo?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::{at, record};

    #[test]
    fn test_from_records_schema() {
        let table = CollisionTable::from_records(&[record(at(8, 15)), record(at(9, 0))]).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.column_names()[0], DATE_TIME);
        assert!(table
            .column_names()
            .iter()
            .all(|name| name == &name.to_lowercase()));
        assert_eq!(
            table.frame().column(DATE_TIME).unwrap().dtype(),
            &DataType::Datetime(TimeUnit::Milliseconds, None)
        );
    }

    #[test]
    fn test_records_roundtrip_fields() {
        let mut rec = record(at(14, 58));
        rec.on_street_name = Some("BROADWAY".to_string());
        rec.injured_cyclists = 2;
        let table = CollisionTable::from_records(&[rec.clone()]).unwrap();

        let records = table.records(None);
        assert_eq!(records, vec![rec]);
    }

    #[test]
    fn test_records_limit() {
        let records: Vec<_> = (0..10).map(|m| record(at(3, m))).collect();
        let table = CollisionTable::from_records(&records).unwrap();
        assert_eq!(table.records(Some(4)).len(), 4);
    }

    #[test]
    fn test_coordinates_skip_nulls() {
        let mut missing = record(at(1, 0));
        missing.longitude = None;
        let table = CollisionTable::from_records(&[record(at(1, 1)), missing]).unwrap();
        assert_eq!(table.coordinates().len(), 1);
    }

    #[test]
    fn test_category_columns() {
        assert_eq!(VictimCategory::Cyclists.column(), INJURED_CYCLISTS);
        assert_eq!(VictimCategory::default(), VictimCategory::Pedestrians);
        assert_eq!(VictimCategory::ALL.len(), 3);
    }
}
