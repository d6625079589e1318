//! Dashboard Module
//! One render pass: every derived product the dashboard shows, computed from
//! the original table and the current user selections.

use crate::config::HexagonConfig;
use crate::data::{
    hexagon_bins, midpoint, CollisionProcessor, CollisionRecord, CollisionTable, GeoPoint,
    HexBin, MinuteHistogram, StreetCount, VictimCategory,
};
use serde::{Deserialize, Serialize};

/// Largest value of the injured-persons slider
pub const MAX_INJURY_THRESHOLD: u32 = 19;
pub const HOURS_PER_DAY: u32 = 24;

/// User selections driving the filter stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams {
    pub injury_threshold: u32,
    pub hour: u32,
    pub category: VictimCategory,
    pub show_raw: bool,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            injury_threshold: 0,
            hour: 1,
            category: VictimCategory::Pedestrians,
            show_raw: false,
        }
    }
}

impl FilterParams {
    /// Keep threshold and hour inside the ranges the widgets offer.
    pub fn clamped(self) -> Self {
        Self {
            injury_threshold: self.injury_threshold.min(MAX_INJURY_THRESHOLD),
            hour: self.hour.min(HOURS_PER_DAY - 1),
            ..self
        }
    }

    /// "H:00 and H+1:00", wrapping at midnight.
    pub fn hour_range_label(&self) -> String {
        format!("{}:00 and {}:00", self.hour, (self.hour + 1) % HOURS_PER_DAY)
    }
}

/// Everything rendered for one set of selections.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub params: FilterParams,
    pub original_rows: usize,
    /// Crash locations passing the injury threshold
    pub injury_points: Vec<GeoPoint>,
    /// Working table narrowed to the selected hour
    pub hour_table: CollisionTable,
    pub midpoint: Option<GeoPoint>,
    pub hexagons: Vec<HexBin>,
    pub histogram: MinuteHistogram,
    pub top_streets: Vec<StreetCount>,
    /// Hour-filtered records, only materialized when raw data is shown
    pub raw_records: Vec<CollisionRecord>,
}

impl DashboardView {
    /// Run every filter stage for `params`.
    ///
    /// `original` is never narrowed: the injury map and the street ranking
    /// read it directly, the time-of-day sections read `hour_table`.
    pub fn compute(
        original: &CollisionTable,
        params: FilterParams,
        hexagon: &HexagonConfig,
        raw_rows_limit: usize,
    ) -> Self {
        let params = params.clamped();

        let injury_points = CollisionProcessor::injury_points(original, params.injury_threshold);
        let hour_table = CollisionProcessor::filter_by_hour(original, params.hour);
        let midpoint = midpoint(&hour_table);
        let hexagons = match midpoint {
            Some(center) => hexagon_bins(&hour_table.coordinates(), center, hexagon),
            None => Vec::new(),
        };
        let histogram = CollisionProcessor::minute_histogram(&hour_table, params.hour);
        let top_streets = CollisionProcessor::top_streets(original, params.category);
        let raw_records = if params.show_raw {
            hour_table.records(Some(raw_rows_limit))
        } else {
            Vec::new()
        };

        tracing::debug!(
            threshold = params.injury_threshold,
            hour = params.hour,
            category = params.category.label(),
            injury_points = injury_points.len(),
            hour_rows = hour_table.height(),
            hexagons = hexagons.len(),
            "Dashboard view computed"
        );

        Self {
            params,
            original_rows: original.height(),
            injury_points,
            hour_table,
            midpoint,
            hexagons,
            histogram,
            top_streets,
            raw_records,
        }
    }

    /// Serializable summary of the view for export.
    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            params: self.params,
            original_rows: self.original_rows,
            injury_locations: self.injury_points.len(),
            hour_rows: self.hour_table.height(),
            midpoint: self.midpoint,
            hexagon_count: self.hexagons.len(),
            minutes: self
                .histogram
                .buckets()
                .map(|(minute, crashes)| MinuteCount { minute, crashes })
                .collect(),
            top_streets: self.top_streets.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinuteCount {
    pub minute: u32,
    pub crashes: u32,
}

/// JSON export of a dashboard view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSnapshot {
    pub params: FilterParams,
    pub original_rows: usize,
    pub injury_locations: usize,
    pub hour_rows: usize,
    pub midpoint: Option<GeoPoint>,
    pub hexagon_count: usize,
    pub minutes: Vec<MinuteCount>,
    pub top_streets: Vec<StreetCount>,
}
