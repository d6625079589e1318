//! Dashboard Viewer Widget
//! Right side scrollable panel with one card per dashboard section.

use crate::charts::ChartPlotter;
use crate::dashboard::DashboardView;
use egui::{Color32, RichText, ScrollArea};

const CARD_SPACING: f32 = 15.0;
const MAP_HEIGHT: f32 = 420.0;
const CHART_HEIGHT: f32 = 300.0;
const ACCENT: Color32 = Color32::from_rgb(100, 149, 237);

/// Scrollable dashboard display area.
#[derive(Default)]
pub struct DashboardViewer {
    pub view: Option<DashboardView>,
    /// Fatal load error; replaces every section when set
    pub error: Option<String>,
}

impl DashboardViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.view = None;
        self.error = None;
    }

    pub fn set_view(&mut self, view: DashboardView) {
        self.view = Some(view);
        self.error = None;
    }

    pub fn set_error(&mut self, message: String) {
        self.view = None;
        self.error = Some(message);
    }

    /// Draw the dashboard sections top to bottom
    pub fn show(&self, ui: &mut egui::Ui) {
        if let Some(error) = &self.error {
            ui.centered_and_justified(|ui| {
                ui.label(
                    RichText::new(format!("⚠ {error}"))
                        .size(18.0)
                        .color(Color32::from_rgb(220, 53, 69)),
                );
            });
            return;
        }

        let Some(view) = &self.view else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.label(
                    RichText::new("Motor Vehicle Collisions in New York City")
                        .size(24.0)
                        .strong(),
                );
                ui.label(
                    RichText::new(format!(
                        "{} collisions loaded. Adjust the filters on the left to explore them.",
                        view.original_rows
                    ))
                    .color(Color32::GRAY),
                );
                ui.add_space(CARD_SPACING);

                Self::card(ui, "Where are the most people injured in NYC?", |ui| {
                    ui.label(format!(
                        "{} collisions with at least {} injured",
                        view.injury_points.len(),
                        view.params.injury_threshold
                    ));
                    ChartPlotter::draw_point_map(ui, &view.injury_points, MAP_HEIGHT);
                });

                Self::card(
                    ui,
                    "How many collisions occurred during a given time of day?",
                    |ui| {
                        ui.label(format!(
                            "Vehicle collisions between {}",
                            view.params.hour_range_label()
                        ));
                        match view.midpoint {
                            Some(midpoint) => {
                                ChartPlotter::draw_hexagon_legend(ui, &view.hexagons);
                                ChartPlotter::draw_hexagon_map(
                                    ui,
                                    &view.hexagons,
                                    midpoint,
                                    MAP_HEIGHT,
                                );
                            }
                            None => {
                                ui.label(
                                    RichText::new("No collisions recorded in this hour")
                                        .color(Color32::GRAY),
                                );
                            }
                        }
                    },
                );

                Self::card(
                    ui,
                    &format!(
                        "Breakdown by minute between {}",
                        view.params.hour_range_label()
                    ),
                    |ui| {
                        ui.label(format!("{} crashes in this window", view.histogram.total()));
                        ChartPlotter::draw_minute_chart(ui, &view.histogram, CHART_HEIGHT);
                    },
                );

                Self::card(ui, "Top 5 dangerous streets by affected type", |ui| {
                    ui.label(format!("Affected type: {}", view.params.category.label()));
                    ChartPlotter::draw_top_streets(
                        ui,
                        &view.top_streets,
                        view.params.category.column(),
                    );
                });

                if view.params.show_raw {
                    Self::card(ui, "Raw Data", |ui| {
                        ChartPlotter::draw_raw_table(
                            ui,
                            &view.raw_records,
                            view.hour_table.height(),
                        );
                    });
                }
            });
    }

    fn card(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.5, ACCENT))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(title).size(18.0).strong().color(ACCENT));
                ui.add_space(8.0);
                add_contents(ui);
            });
        ui.add_space(CARD_SPACING);
    }
}
