//! Geospatial helpers: midpoint and hexagonal density binning.

use super::table::{CollisionTable, GeoPoint};
use crate::config::HexagonConfig;
use rayon::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::HashMap;

const METERS_PER_DEGREE_LAT: f64 = 110_574.0;
const METERS_PER_DEGREE_LON: f64 = 111_320.0;

/// Number of color steps used to shade hexagons
pub const COLOR_STEPS: usize = 6;

/// A hexagonal bin of crash locations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HexBin {
    pub center: GeoPoint,
    /// Six corners, counter-clockwise
    pub corners: Vec<GeoPoint>,
    pub count: u32,
    pub elevation: f64,
    /// Quantized color index in `0..COLOR_STEPS`
    pub color_bin: usize,
}

/// Mean coordinate of a table; `None` when it has no located records.
pub fn midpoint(table: &CollisionTable) -> Option<GeoPoint> {
    points_midpoint(&table.coordinates())
}

pub fn points_midpoint(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    let latitude = points.iter().map(|p| p.latitude).mean();
    let longitude = points.iter().map(|p| p.longitude).mean();
    Some(GeoPoint::new(latitude, longitude))
}

/// Local equirectangular projection around an origin, in meters.
#[derive(Debug, Clone, Copy)]
struct Projection {
    origin: GeoPoint,
    lon_scale: f64,
}

impl Projection {
    fn new(origin: GeoPoint) -> Self {
        Self {
            origin,
            lon_scale: METERS_PER_DEGREE_LON * origin.latitude.to_radians().cos(),
        }
    }

    fn forward(&self, p: GeoPoint) -> (f64, f64) {
        (
            (p.longitude - self.origin.longitude) * self.lon_scale,
            (p.latitude - self.origin.latitude) * METERS_PER_DEGREE_LAT,
        )
    }

    fn inverse(&self, x: f64, y: f64) -> GeoPoint {
        GeoPoint::new(
            self.origin.latitude + y / METERS_PER_DEGREE_LAT,
            self.origin.longitude + x / self.lon_scale,
        )
    }
}

/// Pointy-top axial coordinate of the hexagon containing (x, y).
fn axial_cell(x: f64, y: f64, radius: f64) -> (i64, i64) {
    let q = (3f64.sqrt() / 3.0 * x - y / 3.0) / radius;
    let r = (2.0 / 3.0 * y) / radius;
    cube_round(q, r)
}

fn cube_round(q: f64, r: f64) -> (i64, i64) {
    let s = -q - r;
    let (mut rq, mut rr, rs) = (q.round(), r.round(), s.round());
    let (dq, dr, ds) = ((rq - q).abs(), (rr - r).abs(), (rs - s).abs());
    if dq > dr && dq > ds {
        rq = -rr - rs;
    } else if dr > ds {
        rr = -rq - rs;
    }
    (rq as i64, rr as i64)
}

fn cell_center(q: i64, r: i64, radius: f64) -> (f64, f64) {
    let (q, r) = (q as f64, r as f64);
    (radius * 3f64.sqrt() * (q + r / 2.0), radius * 1.5 * r)
}

/// Bin points into hexagons of `config.radius_m` around `origin`.
///
/// Bins come back sorted by descending count.
pub fn hexagon_bins(points: &[GeoPoint], origin: GeoPoint, config: &HexagonConfig) -> Vec<HexBin> {
    let radius = config.radius_m;
    if points.is_empty() || !radius.is_finite() || radius <= 0.0 {
        return Vec::new();
    }

    let projection = Projection::new(origin);
    let counts: HashMap<(i64, i64), u32> = points
        .par_iter()
        .fold(HashMap::new, |mut acc, p| {
            let (x, y) = projection.forward(*p);
            *acc.entry(axial_cell(x, y, radius)).or_insert(0) += 1;
            acc
        })
        .reduce(HashMap::new, |mut merged, part| {
            for (cell, count) in part {
                *merged.entry(cell).or_insert(0) += count;
            }
            merged
        });

    let max = counts.values().copied().max().unwrap_or(0);
    let min = counts.values().copied().min().unwrap_or(0);
    let [low, high] = config.elevation_range;

    let mut cells: Vec<((i64, i64), u32)> = counts.into_iter().collect();
    cells.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    cells
        .into_iter()
        .map(|((q, r), count)| {
            let (cx, cy) = cell_center(q, r, radius);
            let corners = (0..6)
                .map(|i| {
                    let angle = (60.0 * i as f64 - 30.0).to_radians();
                    projection.inverse(cx + radius * angle.cos(), cy + radius * angle.sin())
                })
                .collect();

            HexBin {
                center: projection.inverse(cx, cy),
                corners,
                count,
                elevation: elevation(count, max, low, high, config.elevation_scale),
                color_bin: color_bin(count, min, max),
            }
        })
        .collect()
}

fn elevation(count: u32, max: u32, low: f64, high: f64, scale: f64) -> f64 {
    if max == 0 {
        return low;
    }
    low + count as f64 / max as f64 * (high - low) * scale
}

fn color_bin(count: u32, min: u32, max: u32) -> usize {
    if max <= min {
        return 0;
    }
    let t = (count - min) as f64 / (max - min) as f64;
    ((t * COLOR_STEPS as f64) as usize).min(COLOR_STEPS - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::{at, record};

    fn times_square() -> GeoPoint {
        GeoPoint::new(40.7580, -73.9855)
    }

    #[test]
    fn test_midpoint_mean() {
        let mut a = record(at(1, 0));
        a.latitude = Some(40.0);
        a.longitude = Some(-74.0);
        let mut b = record(at(1, 0));
        b.latitude = Some(41.0);
        b.longitude = Some(-73.0);
        let table = CollisionTable::from_records(&[a, b]).unwrap();

        let mid = midpoint(&table).unwrap();
        assert!((mid.latitude - 40.5).abs() < 1e-9);
        assert!((mid.longitude + 73.5).abs() < 1e-9);
    }

    #[test]
    fn test_midpoint_empty() {
        let table = CollisionTable::from_records(&[]).unwrap();
        assert!(midpoint(&table).is_none());
    }

    #[test]
    fn test_same_spot_lands_in_one_bin() {
        let points = vec![times_square(); 5];
        let bins = hexagon_bins(&points, times_square(), &HexagonConfig::default());

        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 5);
        assert_eq!(bins[0].corners.len(), 6);
        assert!((bins[0].center.latitude - 40.7580).abs() < 1e-6);
        // Single bin reaches the top of the range, scaled
        assert!((bins[0].elevation - 4000.0).abs() < 1e-9);
    }

    #[test]
    fn test_bins_sorted_and_conserve_counts() {
        let origin = times_square();
        let mut points = vec![origin; 3];
        // ~1.1 km north, well outside a 100 m hexagon
        points.push(GeoPoint::new(origin.latitude + 0.01, origin.longitude));
        points.push(GeoPoint::new(origin.latitude - 0.02, origin.longitude + 0.02));

        let bins = hexagon_bins(&points, origin, &HexagonConfig::default());
        assert_eq!(bins.len(), 3);
        assert_eq!(bins.iter().map(|b| b.count).sum::<u32>(), 5);
        assert!(bins.windows(2).all(|w| w[0].count >= w[1].count));
        assert_eq!(bins[0].color_bin, COLOR_STEPS - 1);
        assert_eq!(bins[2].color_bin, 0);
    }

    #[test]
    fn test_corners_within_radius() {
        let origin = times_square();
        let bins = hexagon_bins(&[origin], origin, &HexagonConfig::default());
        let projection = Projection::new(origin);
        let (cx, cy) = projection.forward(bins[0].center);
        for corner in &bins[0].corners {
            let (x, y) = projection.forward(*corner);
            let distance = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
            assert!((distance - 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_invalid_radius() {
        let config = HexagonConfig {
            radius_m: 0.0,
            ..HexagonConfig::default()
        };
        assert!(hexagon_bins(&[times_square()], times_square(), &config).is_empty());
    }
}
