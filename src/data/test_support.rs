//! Fixtures shared by the data module tests.

use super::table::CollisionRecord;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};

pub const HEADER: &str = "CRASH_DATE,CRASH_TIME,LATITUDE,LONGITUDE,INJURED_PERSONS,\
INJURED_PEDESTRIANS,INJURED_CYCLISTS,INJURED_MOTORISTS,ON_STREET_NAME";

/// Timestamp on a fixed day.
pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 9, 11)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .unwrap()
}

/// Uninjured crash in Manhattan at the given time.
pub fn record(date_time: NaiveDateTime) -> CollisionRecord {
    CollisionRecord {
        date_time,
        latitude: Some(40.7580),
        longitude: Some(-73.9855),
        injured_persons: 0,
        injured_pedestrians: 0,
        injured_cyclists: 0,
        injured_motorists: 0,
        on_street_name: None,
    }
}

/// Write a CSV fixture with the standard header.
pub fn write_csv(dir: &Path, rows: &[&str]) -> PathBuf {
    let path = dir.join("crashes.csv");
    let mut content = String::from(HEADER);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    std::fs::write(&path, content).unwrap();
    path
}
