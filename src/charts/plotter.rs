//! Chart Plotter Module
//! Interactive dashboard sections drawn with egui_plot.

use crate::data::{CollisionRecord, GeoPoint, HexBin, MinuteHistogram, StreetCount, COLOR_STEPS};
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Plot, PlotPoints, Points, Polygon};

pub const POINT_COLOR: Color32 = Color32::from_rgb(200, 30, 0);
pub const BAR_COLOR: Color32 = Color32::from_rgb(131, 201, 255);

/// Hexagon shades, lowest to highest density
pub const HEX_PALETTE: [Color32; COLOR_STEPS] = [
    Color32::from_rgb(1, 152, 189),
    Color32::from_rgb(73, 227, 206),
    Color32::from_rgb(216, 254, 181),
    Color32::from_rgb(254, 237, 177),
    Color32::from_rgb(254, 173, 84),
    Color32::from_rgb(209, 55, 78),
];

/// Degrees of latitude shown around the midpoint of the density view
const HEX_VIEW_SPAN: f64 = 0.08;

/// Draws the dashboard charts.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn hex_color(bin: &HexBin) -> Color32 {
        HEX_PALETTE[bin.color_bin.min(COLOR_STEPS - 1)]
    }

    /// Scatter map of crash locations (x: longitude, y: latitude).
    pub fn draw_point_map(ui: &mut egui::Ui, points: &[GeoPoint], height: f32) {
        Plot::new("injury_map")
            .height(height)
            .data_aspect(1.0)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                let plot_points: PlotPoints = points.iter().map(|p| p.to_plot()).collect();
                plot_ui.points(
                    Points::new(plot_points)
                        .radius(1.5)
                        .color(POINT_COLOR.gamma_multiply(0.6))
                        .name("Collisions"),
                );
            });
    }

    /// Hexagonal density view centered on `midpoint`.
    pub fn draw_hexagon_map(
        ui: &mut egui::Ui,
        hexagons: &[HexBin],
        midpoint: GeoPoint,
        height: f32,
    ) {
        Plot::new("hexagon_map")
            .height(height)
            .data_aspect(1.0)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .allow_scroll(false)
            .include_x(midpoint.longitude - HEX_VIEW_SPAN)
            .include_x(midpoint.longitude + HEX_VIEW_SPAN)
            .include_y(midpoint.latitude - HEX_VIEW_SPAN)
            .include_y(midpoint.latitude + HEX_VIEW_SPAN)
            .show(ui, |plot_ui| {
                // Draw sparse bins first so dense ones stay on top
                for bin in hexagons.iter().rev() {
                    let color = Self::hex_color(bin);
                    let corners: PlotPoints = bin.corners.iter().map(|c| c.to_plot()).collect();
                    plot_ui.polygon(
                        Polygon::new(corners)
                            .fill_color(color.gamma_multiply(0.8))
                            .stroke(egui::Stroke::new(0.5, color))
                            .name(format!("{} crashes, elevation {:.0}", bin.count, bin.elevation)),
                    );
                }

                plot_ui.points(
                    Points::new(PlotPoints::new(vec![midpoint.to_plot()]))
                        .radius(4.0)
                        .color(Color32::BLACK)
                        .name("Midpoint"),
                );
            });
    }

    /// Density legend: one swatch per color step.
    pub fn draw_hexagon_legend(ui: &mut egui::Ui, hexagons: &[HexBin]) {
        let max = hexagons.first().map(|b| b.count).unwrap_or(0);
        let max_elevation = hexagons.first().map(|b| b.elevation).unwrap_or(0.0);
        ui.horizontal(|ui| {
            ui.label(RichText::new("Low").size(12.0));
            for color in HEX_PALETTE {
                let (rect, _) = ui.allocate_exact_size(egui::vec2(18.0, 12.0), egui::Sense::hover());
                ui.painter().rect_filled(rect, 2.0, color);
            }
            ui.label(RichText::new("High").size(12.0));
            ui.add_space(12.0);
            ui.label(
                RichText::new(format!(
                    "{} hexagons, densest {} crashes (elevation {:.0})",
                    hexagons.len(),
                    max,
                    max_elevation
                ))
                .size(12.0)
                .color(Color32::GRAY),
            );
        });
    }

    /// Bar chart of crashes per minute.
    pub fn draw_minute_chart(ui: &mut egui::Ui, histogram: &MinuteHistogram, height: f32) {
        let bars: Vec<Bar> = histogram
            .buckets()
            .map(|(minute, crashes)| {
                Bar::new(minute as f64, crashes as f64)
                    .width(0.8)
                    .name(format!("Minute {minute}"))
            })
            .collect();

        Plot::new("minute_chart")
            .height(height)
            .x_axis_label("Minute")
            .y_axis_label("Crashes")
            .include_x(-0.5)
            .include_x(59.5)
            .include_y(0.0)
            .allow_scroll(false)
            .allow_drag(false)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(BAR_COLOR).name("Crashes"));
            });
    }

    /// Ranked table of the most dangerous streets.
    pub fn draw_top_streets(ui: &mut egui::Ui, streets: &[StreetCount], count_label: &str) {
        if streets.is_empty() {
            ui.label(RichText::new("No injuries recorded for this category").color(Color32::GRAY));
            return;
        }

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("top_streets")
                    .striped(true)
                    .min_col_width(60.0)
                    .spacing([16.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("#").strong());
                        ui.label(RichText::new("on_street_name").strong());
                        ui.label(RichText::new(count_label).strong());
                        ui.end_row();

                        for (rank, street) in streets.iter().enumerate() {
                            ui.label((rank + 1).to_string());
                            ui.label(&street.street);
                            ui.label(street.count.to_string());
                            ui.end_row();
                        }
                    });
            });
    }

    /// Raw records of the hour-filtered table.
    pub fn draw_raw_table(ui: &mut egui::Ui, records: &[CollisionRecord], total: usize) {
        ui.label(
            RichText::new(format!("Showing {} of {} rows", records.len(), total))
                .size(12.0)
                .color(Color32::GRAY),
        );

        let row_height = 18.0;
        egui::ScrollArea::both()
            .id_salt("raw_data")
            .max_height(320.0)
            .show_rows(ui, row_height, records.len() + 1, |ui, row_range| {
                egui::Grid::new("raw_data_grid")
                    .striped(true)
                    .spacing([12.0, 2.0])
                    .show(ui, |ui| {
                        for row in row_range {
                            if row == 0 {
                                for header in [
                                    "date/time",
                                    "latitude",
                                    "longitude",
                                    "injured_persons",
                                    "injured_pedestrians",
                                    "injured_cyclists",
                                    "injured_motorists",
                                    "on_street_name",
                                ] {
                                    ui.label(RichText::new(header).strong());
                                }
                                ui.end_row();
                                continue;
                            }

                            let r = &records[row - 1];
                            ui.label(r.date_time.format("%Y-%m-%d %H:%M").to_string());
                            ui.label(Self::fmt_coord(r.latitude));
                            ui.label(Self::fmt_coord(r.longitude));
                            ui.label(r.injured_persons.to_string());
                            ui.label(r.injured_pedestrians.to_string());
                            ui.label(r.injured_cyclists.to_string());
                            ui.label(r.injured_motorists.to_string());
                            ui.label(r.on_street_name.as_deref().unwrap_or("-"));
                            ui.end_row();
                        }
                    });
            });
    }

    fn fmt_coord(value: Option<f64>) -> String {
        value.map(|v| format!("{:.6}", v)).unwrap_or_else(|| "-".to_string())
    }
}
