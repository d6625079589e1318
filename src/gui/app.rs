//! Collisions Dashboard Main Application
//! Main window with control panel and dashboard viewer.

use crate::charts::StaticChartRenderer;
use crate::config::DashboardConfig;
use crate::dashboard::DashboardView;
use crate::data::{CollisionLoader, CollisionTable, LoaderError};
use crate::gui::{ControlPanel, ControlPanelAction, DashboardViewer};
use egui::SidePanel;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;

/// CSV loading result from background thread.
///
/// The loader travels with the result so its memo table keeps one owner.
struct LoadResult {
    loader: CollisionLoader,
    row_limit: usize,
    table: Result<Arc<CollisionTable>, LoaderError>,
}

/// Main application window.
pub struct DashboardApp {
    config: DashboardConfig,
    /// `None` while a background load owns it
    loader: Option<CollisionLoader>,
    /// Unfiltered table; every render pass starts from it
    original: Option<Arc<CollisionTable>>,
    control_panel: ControlPanel,
    viewer: DashboardViewer,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        Self::with_config(config)
    }

    fn with_config(config: DashboardConfig) -> Self {
        let params = crate::dashboard::FilterParams {
            hour: config.view.default_hour,
            injury_threshold: config.view.default_threshold,
            ..Default::default()
        }
        .clamped();

        let mut app = Self {
            loader: Some(CollisionLoader::new(config.data.path.clone())),
            original: None,
            control_panel: ControlPanel::new(
                params,
                config.data.row_limit,
                Some(config.data.path.clone()),
            ),
            viewer: DashboardViewer::new(),
            load_rx: None,
            config,
        };

        app.start_load();
        app
    }

    /// Load the table for the panel's row limit, in the background unless cached.
    fn start_load(&mut self) {
        let row_limit = self.control_panel.row_limit;
        let Some(mut loader) = self.loader.take() else {
            return; // Already loading
        };

        if loader.is_cached(row_limit) {
            let table = loader.load(row_limit);
            self.loader = Some(loader);
            self.apply_table(row_limit, table);
            return;
        }

        self.control_panel.is_loading = true;
        self.control_panel.export_enabled = false;
        self.control_panel.set_progress(
            0.0,
            &format!("Loading up to {} rows...", row_limit),
        );

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let table = loader.load(row_limit);
            let _ = tx.send(LoadResult {
                loader,
                row_limit,
                table,
            });
        });
    }

    /// Drop the memo entry for the panel's row limit and read the file again.
    fn reload(&mut self) {
        let row_limit = self.control_panel.row_limit;
        if let Some(loader) = self.loader.as_mut() {
            if loader.invalidate(row_limit) {
                tracing::debug!(row_limit, "Invalidated cached collision table");
            }
        }
        self.start_load();
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(result) => {
                self.loader = Some(result.loader);
                self.control_panel.is_loading = false;
                self.apply_table(result.row_limit, result.table);
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => {
                self.load_rx = Some(rx);
            }
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                tracing::warn!("Loader thread exited without a result");
                self.control_panel.is_loading = false;
                self.loader = Some(CollisionLoader::new(self.config.data.path.clone()));
                self.control_panel
                    .set_progress(0.0, "Error: loader thread stopped unexpectedly");
            }
        }
    }

    fn apply_table(&mut self, row_limit: usize, table: Result<Arc<CollisionTable>, LoaderError>) {
        match table {
            Ok(table) => {
                self.control_panel.set_progress(
                    100.0,
                    &format!(
                        "Loaded {} collisions (row limit {})",
                        table.height(),
                        row_limit
                    ),
                );
                self.original = Some(table);
                self.recompute();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Collision data unavailable");
                self.original = None;
                self.control_panel.export_enabled = false;
                self.control_panel.set_progress(0.0, &format!("Error: {}", e));
                self.viewer.set_error(e.to_string());
            }
        }
    }

    /// Re-run the filter stages for the current selections.
    fn recompute(&mut self) {
        let Some(original) = &self.original else {
            return;
        };

        let view = DashboardView::compute(
            original,
            self.control_panel.params,
            &self.config.hexagon,
            self.config.view.raw_rows_limit,
        );
        self.viewer.set_view(view);
        self.control_panel.export_enabled = true;
    }

    /// Handle CSV file selection
    fn handle_browse_csv(&mut self) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.viewer.clear();
            self.original = None;
            loader.set_source(path.clone());
            self.config.data.path = path.clone();
            self.control_panel.csv_path = Some(path);
            self.start_load();
        }
    }

    /// Handle chart export - histogram PNG plus JSON summary
    fn handle_export(&mut self) {
        let Some(view) = &self.viewer.view else {
            self.control_panel.set_progress(0.0, "No view to export");
            return;
        };

        let output_path = match rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(format!("collisions_hour_{:02}.png", view.params.hour))
            .save_file()
        {
            Some(path) => path,
            None => return, // User cancelled
        };

        let export = &self.config.export;
        match StaticChartRenderer::export_view(view, &output_path, export.width, export.height) {
            Ok(json_path) => {
                self.control_panel.set_progress(
                    100.0,
                    &format!(
                        "Exported {} and {}",
                        output_path.display(),
                        json_path.display()
                    ),
                );
                if export.open_after_export {
                    if let Err(e) = open::that(&output_path) {
                        tracing::warn!(error = %e, "Failed to open exported chart");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Export failed");
                self.control_panel
                    .set_progress(0.0, &format!("Export error: {}", e));
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        // Request repaint while loading
        if self.control_panel.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::Reload => self.reload(),
                        ControlPanelAction::FiltersChanged => self.recompute(),
                        ControlPanelAction::Export => self.handle_export(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Dashboard
        egui::CentralPanel::default().show(ctx, |ui| {
            self.viewer.show(ui);
        });
    }
}
