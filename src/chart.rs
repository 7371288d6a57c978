//! Bar charts for `GRAPH:` directives.
//!
//! Drawing is an injected capability ([`ChartRenderer`]); the default
//! [`RasterBarChart`] paints bars, grid and axes into a PNG with the `image`
//! crate. Titles and category labels are laid out as document text, placed
//! with the same [`BarGeometry`] the rasteriser uses.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::error::ChartError;
use crate::markup::ChartSeries;
use crate::style::Color;

/// What the caller asks a chart renderer to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub title: String,
    /// `#RRGGBB`.
    pub bar_color: String,
    pub width_px: u32,
    pub height_px: u32,
}

impl ChartStyle {
    pub fn new(title: impl Into<String>, bar_color: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            bar_color: bar_color.into(),
            width_px: 800,
            height_px: 400,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.width_px == 0 {
            return 0.5;
        }
        self.height_px as f32 / self.width_px as f32
    }
}

/// Produces encoded image bytes (PNG or JPEG) for one series.
pub trait ChartRenderer {
    fn render_bar_chart(&self, series: &ChartSeries, style: &ChartStyle)
        -> Result<Vec<u8>, ChartError>;
}

/// Horizontal placement of bars, as fractions of the image width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarGeometry {
    pub plot_left: f32,
    pub plot_right: f32,
    pub plot_top: f32,
    pub plot_bottom: f32,
    /// Share of each category slot covered by its bar.
    pub bar_fill: f32,
}

impl Default for BarGeometry {
    fn default() -> Self {
        Self {
            plot_left: 0.08,
            plot_right: 0.97,
            plot_top: 0.06,
            plot_bottom: 0.94,
            bar_fill: 0.7,
        }
    }
}

impl BarGeometry {
    /// `(left, right)` edge of each bar as a fraction of the image width.
    pub fn bar_spans(&self, count: usize) -> Vec<(f32, f32)> {
        if count == 0 {
            return Vec::new();
        }
        let slot = (self.plot_right - self.plot_left) / count as f32;
        let pad = slot * (1.0 - self.bar_fill) / 2.0;
        (0..count)
            .map(|i| {
                let start = self.plot_left + slot * i as f32;
                (start + pad, start + slot - pad)
            })
            .collect()
    }

    /// Center of each bar as a fraction of the image width.
    pub fn bar_centers(&self, count: usize) -> Vec<f32> {
        self.bar_spans(count)
            .into_iter()
            .map(|(l, r)| (l + r) / 2.0)
            .collect()
    }
}

/// Default chart renderer: flat bars on a light grid, PNG output.
#[derive(Debug, Clone, Default)]
pub struct RasterBarChart {
    pub geometry: BarGeometry,
}

const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const AXIS: Rgb<u8> = Rgb([90, 90, 90]);
const GRID_LINES: u32 = 4;

impl ChartRenderer for RasterBarChart {
    fn render_bar_chart(
        &self,
        series: &ChartSeries,
        style: &ChartStyle,
    ) -> Result<Vec<u8>, ChartError> {
        if series.is_empty() {
            return Err(ChartError::Empty);
        }
        let color = Color::from_hex(&style.bar_color)
            .ok_or_else(|| ChartError::Encode(format!("bad bar color {:?}", style.bar_color)))?;
        let bar = Rgb(color.to_rgb8());

        let (w, h) = (style.width_px.max(16), style.height_px.max(16));
        let mut img = RgbImage::from_pixel(w, h, Rgb([255, 255, 255]));

        let g = &self.geometry;
        let px = |frac: f32, total: u32| ((frac * total as f32).round() as u32).min(total - 1);
        let (left, right) = (px(g.plot_left, w), px(g.plot_right, w));
        let (top, bottom) = (px(g.plot_top, h), px(g.plot_bottom, h));
        let plot_h = bottom.saturating_sub(top) as f64;

        for i in 1..=GRID_LINES {
            let y = bottom - (plot_h * f64::from(i) / f64::from(GRID_LINES)) as u32;
            fill_rect(&mut img, left, y, right, y + 1, GRID);
        }

        let max = series.max_value();
        for (point, (l, r)) in series.points.iter().zip(g.bar_spans(series.len())) {
            // NaN draws nothing; +inf is clamped to the tallest finite bar.
            let value = if point.value.is_nan() { 0.0 } else { point.value.min(max) };
            if value <= 0.0 || max <= 0.0 {
                continue;
            }
            let bar_h = (plot_h * value / max).round() as u32;
            fill_rect(&mut img, px(l, w), bottom - bar_h, px(r, w), bottom, bar);
        }

        fill_rect(&mut img, left, top, left + 2, bottom + 1, AXIS);
        fill_rect(&mut img, left, bottom, right, bottom + 2, AXIS);

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| ChartError::Encode(e.to_string()))?;
        Ok(bytes)
    }
}

/// Fill `[x0, x1) × [y0, y1)`, clipped to the image.
fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    for y in y0.min(h)..y1.min(h) {
        for x in x0.min(w)..x1.min(w) {
            img.put_pixel(x, y, color);
        }
    }
}
