//! Control Panel Widget
//! Left side panel with the data source and every dashboard filter.

use crate::dashboard::{FilterParams, HOURS_PER_DAY, MAX_INJURY_THRESHOLD};
use crate::data::VictimCategory;
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// Largest row limit offered by the loader widget
const MAX_ROW_LIMIT: usize = 2_000_000;

/// Left side control panel with file selection and filter controls.
pub struct ControlPanel {
    pub params: FilterParams,
    pub row_limit: usize,
    pub csv_path: Option<PathBuf>,
    pub progress: f32,
    pub status: String,
    pub is_loading: bool,
    pub export_enabled: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            params: FilterParams::default(),
            row_limit: 100_000,
            csv_path: None,
            progress: 0.0,
            status: "Ready".to_string(),
            is_loading: false,
            export_enabled: false,
        }
    }
}

impl ControlPanel {
    pub fn new(params: FilterParams, row_limit: usize, csv_path: Option<PathBuf>) -> Self {
        Self {
            params,
            row_limit,
            csv_path,
            ..Self::default()
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;
        let before = self.params;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🚗 NYC Collisions")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Motor vehicle collision explorer")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.csv_path.is_some() {
                            Color32::WHITE
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add_enabled_ui(!self.is_loading, |ui| {
                            if ui.button("📂 Browse").clicked() {
                                action = ControlPanelAction::BrowseCsv;
                            }
                        });
                    });
                });

                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    ui.label("Row limit:");
                    ui.add(
                        egui::DragValue::new(&mut self.row_limit)
                            .range(1..=MAX_ROW_LIMIT)
                            .speed(1000),
                    );
                    ui.add_enabled_ui(!self.is_loading, |ui| {
                        if ui.button("⟳ Load").clicked() {
                            action = ControlPanelAction::Reload;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filter Section =====
        ui.label(RichText::new("🔧 Filters").size(14.0).strong());
        ui.add_space(8.0);

        let label_width = 110.0;
        let combo_width = 150.0;

        ui.label("Number of persons injured in vehicle collisions:");
        ui.add(egui::Slider::new(
            &mut self.params.injury_threshold,
            0..=MAX_INJURY_THRESHOLD,
        ));

        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Hour to look at:"));
            ComboBox::from_id_salt("hour")
                .width(combo_width)
                .selected_text(format!("{}:00", self.params.hour))
                .show_ui(ui, |ui| {
                    for hour in 0..HOURS_PER_DAY {
                        ui.selectable_value(&mut self.params.hour, hour, format!("{hour}:00"));
                    }
                });
        });

        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Affected type:"));
            ComboBox::from_id_salt("victim_category")
                .width(combo_width)
                .selected_text(self.params.category.label())
                .show_ui(ui, |ui| {
                    for category in VictimCategory::ALL {
                        ui.selectable_value(&mut self.params.category, category, category.label());
                    }
                });
        });

        ui.add_space(8.0);
        ui.checkbox(&mut self.params.show_raw, "Show Raw Data");

        if self.params != before && action == ControlPanelAction::None {
            action = ControlPanelAction::FiltersChanged;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled, |ui| {
                let button = egui::Button::new(RichText::new("📄 Export Chart").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Export;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.is_loading),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.starts_with("Loaded") || self.status.starts_with("Exported") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    Reload,
    FiltersChanged,
    Export,
}
