//! Collisions Dashboard - Motor Vehicle Collision Explorer
//!
//! Loads NYC crash reports from CSV and lets the user explore them by
//! injury count, time of day and victim category.

mod charts;
mod config;
mod dashboard;
mod data;
mod gui;

use config::DashboardConfig;
use eframe::egui;
use gui::DashboardApp;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = DashboardConfig::load()?;
    tracing::info!(
        path = %config.data.path.display(),
        row_limit = config.data.row_limit,
        "Starting collisions dashboard"
    );

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1200.0, 700.0])
            .with_title("NYC Motor Vehicle Collisions"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "NYC Motor Vehicle Collisions",
        options,
        Box::new(move |cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("Dashboard window failed: {e}"))
}
