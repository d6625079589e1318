//! Static Chart Renderer
//! Draws the per-minute crash histogram with plotters and writes the view
//! export (PNG chart + JSON summary).

use crate::dashboard::DashboardView;
use crate::data::MinuteHistogram;
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BAR_COLOR: RGBColor = RGBColor(131, 201, 255);

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Chart drawing failed: {0}")]
    Draw(String),
    #[error("Chart size {width}x{height} has no pixels")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("Pixel buffer does not match {width}x{height}")]
    BufferSize { width: u32, height: u32 },
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialize view: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the minute histogram as a bar chart and return PNG bytes.
    pub fn render_minute_histogram_png(
        histogram: &MinuteHistogram,
        caption: &str,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyCanvas { width, height });
        }
        let mut buffer = vec![0u8; (width as usize) * (height as usize) * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let y_max = Self::y_axis_max(histogram);
            let mut chart = ChartBuilder::on(&root)
                .caption(caption, ("sans-serif", 22))
                .margin(15)
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d((0u32..59u32).into_segmented(), 0u32..y_max)
                .map_err(draw_err)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_desc("Minute")
                .y_desc("Crashes")
                .draw()
                .map_err(draw_err)?;

            chart
                .draw_series(
                    Histogram::vertical(&chart)
                        .style(BAR_COLOR.filled())
                        .margin(1)
                        .data(histogram.buckets()),
                )
                .map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }

        Self::encode_png(buffer, width, height)
    }

    /// Headroom above the tallest bar, never a zero-height axis.
    pub fn y_axis_max(histogram: &MinuteHistogram) -> u32 {
        let max = histogram.max_count();
        max + max / 10 + 1
    }

    /// Encode a packed RGB buffer as PNG.
    pub fn encode_png(buffer: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        let image = RgbImage::from_raw(width, height, buffer)
            .ok_or(RenderError::BufferSize { width, height })?;
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Write the view summary as pretty JSON.
    pub fn write_snapshot(view: &DashboardView, path: &Path) -> Result<(), RenderError> {
        let json = serde_json::to_string_pretty(&view.snapshot())?;
        std::fs::write(path, json).map_err(|source| RenderError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Export the histogram chart to `png_path` and the summary next to it.
    ///
    /// Returns the path of the JSON summary.
    pub fn export_view(
        view: &DashboardView,
        png_path: &Path,
        width: u32,
        height: u32,
    ) -> Result<PathBuf, RenderError> {
        let caption = format!(
            "Breakdown by minute between {}",
            view.params.hour_range_label()
        );
        let png = Self::render_minute_histogram_png(&view.histogram, &caption, width, height)?;
        std::fs::write(png_path, png).map_err(|source| RenderError::Write {
            path: png_path.to_path_buf(),
            source,
        })?;

        let json_path = png_path.with_extension("json");
        Self::write_snapshot(view, &json_path)?;

        tracing::info!(
            png = %png_path.display(),
            json = %json_path.display(),
            "Exported dashboard view"
        );
        Ok(json_path)
    }
}
