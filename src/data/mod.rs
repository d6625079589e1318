//! Data module - CSV loading, filter stages and geospatial binning

mod geo;
mod loader;
mod processor;
mod table;

#[cfg(test)]
pub(crate) mod test_support;

pub use geo::{hexagon_bins, midpoint, HexBin, COLOR_STEPS};
pub use loader::{CollisionLoader, LoaderError};
pub use processor::{CollisionProcessor, MinuteHistogram, StreetCount};
pub use table::{CollisionRecord, CollisionTable, GeoPoint, VictimCategory};
