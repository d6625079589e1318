//! Data Processor Module
//! Filter stages over the collision table. Every stage is total: a Polars
//! failure is logged and degrades to an empty result.

use super::table::columns::*;
use super::table::{CollisionTable, GeoPoint, VictimCategory};
use polars::prelude::*;
use serde::Serialize;

/// Number of minute buckets in the histogram
pub const MINUTES_PER_HOUR: usize = 60;

/// Number of streets in the ranking
pub const TOP_STREETS: usize = 5;

/// Crash counts per minute of the hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinuteHistogram {
    counts: Vec<u32>,
}

impl Default for MinuteHistogram {
    fn default() -> Self {
        Self {
            counts: vec![0; MINUTES_PER_HOUR],
        }
    }
}

impl MinuteHistogram {
    fn record(&mut self, minute: i32) {
        if let Some(slot) = usize::try_from(minute)
            .ok()
            .and_then(|m| self.counts.get_mut(m))
        {
            *slot += 1;
        }
    }

    /// (minute, count) pairs for minutes 0..59 in order.
    pub fn buckets(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(minute, &count)| (minute as u32, count))
    }

    #[cfg(test)]
    pub fn count(&self, minute: u32) -> u32 {
        self.counts.get(minute as usize).copied().unwrap_or(0)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// One row of the dangerous-streets ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreetCount {
    pub street: String,
    pub count: i64,
}

/// Handles the dashboard's filter stages.
pub struct CollisionProcessor;

impl CollisionProcessor {
    /// Locations of crashes with at least `threshold` injured persons.
    ///
    /// Output columns: ["latitude", "longitude"]
    pub fn injury_locations(table: &CollisionTable, threshold: u32) -> DataFrame {
        let lazy = table
            .frame()
            .clone()
            .lazy()
            .filter(col(INJURED_PERSONS).gt_eq(lit(threshold as i64)))
            .select([col(LATITUDE), col(LONGITUDE)])
            .filter(col(LATITUDE).is_not_null().and(col(LONGITUDE).is_not_null()));

        collect_or_empty(lazy, "injury_locations")
    }

    /// Injury locations as points, ready for the map.
    pub fn injury_points(table: &CollisionTable, threshold: u32) -> Vec<GeoPoint> {
        super::table::frame_coordinates(&Self::injury_locations(table, threshold))
    }

    /// Records whose timestamp falls in hour `hour`.
    pub fn filter_by_hour(table: &CollisionTable, hour: u32) -> CollisionTable {
        let lazy = table
            .frame()
            .clone()
            .lazy()
            .filter(hour_of(DATE_TIME).eq(lit(hour as i32)));

        match lazy.collect() {
            Ok(df) => CollisionTable::from_frame(df),
            Err(e) => {
                tracing::warn!(stage = "filter_by_hour", error = %e, "Filter stage failed");
                CollisionTable::from_frame(table.frame().clear())
            }
        }
    }

    /// Per-minute crash counts of the records with hour in `hour..=hour + 1`.
    ///
    /// Fed with the hour-filtered table, so the upper hour only matters when
    /// callers pass a wider table.
    pub fn minute_histogram(hour_table: &CollisionTable, hour: u32) -> MinuteHistogram {
        let lower = hour as i32;
        let upper = lower + 1;
        let lazy = hour_table
            .frame()
            .clone()
            .lazy()
            .filter(
                hour_of(DATE_TIME)
                    .gt_eq(lit(lower))
                    .and(hour_of(DATE_TIME).lt_eq(lit(upper))),
            )
            .select([col(DATE_TIME)
                .dt()
                .minute()
                .cast(DataType::Int32)
                .alias("minute")]);

        let df = collect_or_empty(lazy, "minute_histogram");
        let mut histogram = MinuteHistogram::default();
        if let Ok(minutes) = df.column("minute").and_then(|c| c.i32()) {
            for minute in minutes.into_iter().flatten() {
                histogram.record(minute);
            }
        }
        histogram
    }

    /// Top streets by injured people of `category`, highest count first.
    ///
    /// Ties keep table order. Streets that are null or blank are skipped.
    pub fn top_streets(original: &CollisionTable, category: VictimCategory) -> Vec<StreetCount> {
        let count_col = category.column();
        let lazy = original
            .frame()
            .clone()
            .lazy()
            .filter(col(count_col).gt_eq(lit(1i64)))
            .select([col(ON_STREET_NAME), col(count_col)])
            .sort(
                [count_col],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .filter(col(ON_STREET_NAME).is_not_null());

        let df = collect_or_empty(lazy, "top_streets");
        let (Ok(streets), Ok(counts)) = (
            df.column(ON_STREET_NAME).and_then(|c| c.str()),
            df.column(count_col).and_then(|c| c.i64()),
        ) else {
            return Vec::new();
        };

        streets
            .into_iter()
            .zip(counts.into_iter())
            .filter_map(|(street, count)| {
                let street = street?.trim();
                if street.is_empty() {
                    return None;
                }
                Some(StreetCount {
                    street: street.to_string(),
                    count: count?,
                })
            })
            .take(TOP_STREETS)
            .collect()
    }
}

fn hour_of(column: &str) -> Expr {
    col(column).dt().hour().cast(DataType::Int32)
}

fn collect_or_empty(lazy: LazyFrame, stage: &'static str) -> DataFrame {
    match lazy.collect() {
        Ok(df) => df,
        Err(e) => {
            tracing::warn!(stage, error = %e, "Filter stage failed, returning empty result");
            DataFrame::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::CollisionRecord;
    use crate::data::test_support::{at, record};
    use chrono::Timelike;
    use proptest::prelude::*;

    fn hours_table(hours: &[u32]) -> CollisionTable {
        let records: Vec<_> = hours.iter().map(|&h| record(at(h, 30))).collect();
        CollisionTable::from_records(&records).unwrap()
    }

    #[test]
    fn test_hour_filter_scenario() {
        let table = hours_table(&[7, 8, 8, 9]);
        let filtered = CollisionProcessor::filter_by_hour(&table, 8);

        assert_eq!(filtered.height(), 2);
        assert!(filtered
            .records(None)
            .iter()
            .all(|r| r.date_time.hour() == 8));
        // The source table is untouched
        assert_eq!(table.height(), 4);
    }

    #[test]
    fn test_top_streets_scenario() {
        let records: Vec<CollisionRecord> = [0, 2, 1, 0, 3]
            .iter()
            .zip(["A", "B", "C", "D", "E"])
            .map(|(&cyclists, street)| {
                let mut r = record(at(12, 0));
                r.injured_cyclists = cyclists;
                r.on_street_name = Some(street.to_string());
                r
            })
            .collect();
        let table = CollisionTable::from_records(&records).unwrap();

        let top = CollisionProcessor::top_streets(&table, VictimCategory::Cyclists);
        let pairs: Vec<(&str, i64)> = top.iter().map(|s| (s.street.as_str(), s.count)).collect();
        assert_eq!(pairs, vec![("E", 3), ("B", 2), ("C", 1)]);
    }

    #[test]
    fn test_top_streets_empty_category() {
        let table = hours_table(&[1, 2, 3]);
        assert!(CollisionProcessor::top_streets(&table, VictimCategory::Motorists).is_empty());
    }

    #[test]
    fn test_top_streets_skips_missing_names_and_truncates() {
        let mut records = Vec::new();
        for i in 0..8 {
            let mut r = record(at(5, i));
            r.injured_pedestrians = 10 - i as i64;
            r.on_street_name = match i {
                0 => None,
                1 => Some("   ".to_string()),
                _ => Some(format!("STREET {i} ")),
            };
            records.push(r);
        }
        let table = CollisionTable::from_records(&records).unwrap();

        let top = CollisionProcessor::top_streets(&table, VictimCategory::Pedestrians);
        assert_eq!(top.len(), TOP_STREETS);
        assert_eq!(top[0].street, "STREET 2");
        assert_eq!(top[0].count, 8);
    }

    #[test]
    fn test_top_streets_ties_keep_table_order() {
        let records: Vec<_> = ["FIRST", "SECOND", "THIRD"]
            .iter()
            .map(|name| {
                let mut r = record(at(0, 0));
                r.injured_motorists = 1;
                r.on_street_name = Some(name.to_string());
                r
            })
            .collect();
        let table = CollisionTable::from_records(&records).unwrap();

        let top = CollisionProcessor::top_streets(&table, VictimCategory::Motorists);
        let names: Vec<_> = top.iter().map(|s| s.street.as_str()).collect();
        assert_eq!(names, vec!["FIRST", "SECOND", "THIRD"]);
    }

    #[test]
    fn test_minute_histogram_buckets() {
        let records = vec![
            record(at(8, 0)),
            record(at(8, 0)),
            record(at(8, 59)),
            record(at(8, 17)),
        ];
        let table = CollisionTable::from_records(&records).unwrap();
        let histogram = CollisionProcessor::minute_histogram(&table, 8);

        assert_eq!(histogram.len(), MINUTES_PER_HOUR);
        assert_eq!(histogram.count(0), 2);
        assert_eq!(histogram.count(17), 1);
        assert_eq!(histogram.count(59), 1);
        assert_eq!(histogram.total(), 4);
        assert_eq!(histogram.max_count(), 2);
    }

    #[test]
    fn test_minute_histogram_window_includes_next_hour() {
        let table = CollisionTable::from_records(&[
            record(at(8, 5)),
            record(at(9, 5)),
            record(at(10, 5)),
        ])
        .unwrap();

        let histogram = CollisionProcessor::minute_histogram(&table, 8);
        assert_eq!(histogram.count(5), 2);
    }

    #[test]
    fn test_minute_histogram_empty_table() {
        let table = CollisionTable::from_records(&[]).unwrap();
        let histogram = CollisionProcessor::minute_histogram(&table, 3);
        assert_eq!(histogram.len(), MINUTES_PER_HOUR);
        assert_eq!(histogram.total(), 0);
    }

    #[test]
    fn test_injury_locations_columns() {
        let mut hurt = record(at(1, 0));
        hurt.injured_persons = 4;
        let table = CollisionTable::from_records(&[hurt, record(at(1, 1))]).unwrap();

        let locations = CollisionProcessor::injury_locations(&table, 3);
        assert_eq!(locations.height(), 1);
        let names: Vec<String> = locations
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec![LATITUDE.to_string(), LONGITUDE.to_string()]);
    }

    #[derive(Debug, Clone)]
    struct Crash {
        hour: u32,
        minute: u32,
        persons: i64,
        pedestrians: i64,
        cyclists: i64,
        motorists: i64,
        street: Option<u8>,
    }

    fn crash_strategy() -> impl Strategy<Value = Crash> {
        (
            0u32..24,
            0u32..60,
            0i64..20,
            0i64..4,
            0i64..4,
            0i64..4,
            proptest::option::of(0u8..6),
        )
            .prop_map(
                |(hour, minute, persons, pedestrians, cyclists, motorists, street)| Crash {
                    hour,
                    minute,
                    persons,
                    pedestrians,
                    cyclists,
                    motorists,
                    street,
                },
            )
    }

    fn build_table(crashes: &[Crash]) -> CollisionTable {
        let records: Vec<_> = crashes
            .iter()
            .enumerate()
            .map(|(i, c)| CollisionRecord {
                date_time: at(c.hour, c.minute),
                // Unique coordinates make every record identifiable
                latitude: Some(40.0 + i as f64 * 0.001),
                longitude: Some(-74.0 + i as f64 * 0.001),
                injured_persons: c.persons,
                injured_pedestrians: c.pedestrians,
                injured_cyclists: c.cyclists,
                injured_motorists: c.motorists,
                on_street_name: c.street.map(|s| format!("STREET {s}")),
            })
            .collect();
        CollisionTable::from_records(&records).unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_injury_filter_is_threshold_subset(
            crashes in proptest::collection::vec(crash_strategy(), 0..40),
            threshold in 0u32..20,
        ) {
            let table = build_table(&crashes);
            let points = CollisionProcessor::injury_points(&table, threshold);
            let all = table.coordinates();
            let records = table.records(None);

            let expected = records.iter().filter(|r| r.injured_persons >= threshold as i64).count();
            prop_assert_eq!(points.len(), expected);
            for point in &points {
                let idx = all.iter().position(|p| p == point);
                prop_assert!(idx.is_some());
                prop_assert!(records[idx.unwrap()].injured_persons >= threshold as i64);
            }
        }

        #[test]
        fn prop_hour_filter_partitions_table(
            crashes in proptest::collection::vec(crash_strategy(), 0..40),
        ) {
            let table = build_table(&crashes);
            let mut total = 0;
            for hour in 0..24 {
                let filtered = CollisionProcessor::filter_by_hour(&table, hour);
                prop_assert!(filtered.records(None).iter().all(|r| r.date_time.hour() == hour));
                total += filtered.height();
            }
            prop_assert_eq!(total, table.height());
        }

        #[test]
        fn prop_histogram_counts_window(
            crashes in proptest::collection::vec(crash_strategy(), 0..40),
            hour in 0u32..24,
        ) {
            let table = build_table(&crashes);
            let hour_table = CollisionProcessor::filter_by_hour(&table, hour);
            let histogram = CollisionProcessor::minute_histogram(&hour_table, hour);

            let minutes: Vec<u32> = histogram.buckets().map(|(m, _)| m).collect();
            prop_assert_eq!(minutes, (0..60).collect::<Vec<u32>>());
            prop_assert_eq!(histogram.total(), hour_table.height() as u64);
        }

        #[test]
        fn prop_top_streets_sorted_and_bounded(
            crashes in proptest::collection::vec(crash_strategy(), 0..40),
        ) {
            let table = build_table(&crashes);
            for category in VictimCategory::ALL {
                let top = CollisionProcessor::top_streets(&table, category);
                prop_assert!(top.len() <= TOP_STREETS);
                prop_assert!(top.windows(2).all(|w| w[0].count >= w[1].count));
                prop_assert!(top.iter().all(|s| s.count >= 1 && !s.street.is_empty()));
            }
        }
    }
}
