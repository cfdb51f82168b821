//! Choropleth Renderer
//! Draws each region filled by its Choice A ratio.
//!
//! Layout:
//! 1. Optional caption centered at the top
//! 2. Regions projected with longitude scaled by cos(mean latitude)
//! 3. Optional vertical colour bar on the right, 0% at the bottom

use crate::charts::map_data::{MapRow, MapTable};
use geo::{BoundingRect, LineString, Rect};
use log::{info, warn};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

const BACKGROUND: RGBColor = RGBColor(255, 255, 255);
const OUTLINE: RGBColor = RGBColor(255, 255, 255);
const MISSING: RGBColor = RGBColor(200, 200, 200); // NaN ratio
const LABEL: RGBColor = RGBColor(0, 0, 0);

// Viridis anchors at 0, 0.25, 0.5, 0.75, 1
const RAMP: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

const LEGEND_WIDTH: i32 = 90;
const LEGEND_STEPS: i32 = 50;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to draw: the map table has no regions")]
    Empty,
    #[error("Drawing failed: {0}")]
    Drawing(String),
    #[error("Failed to create output directory {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

fn drawing_error<E: std::fmt::Display>(err: E) -> RenderError {
    RenderError::Drawing(err.to_string())
}

/// Appearance of the rendered map.
#[derive(Debug, Clone)]
pub struct MapStyle {
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
    pub legend: bool,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 900,
            title: None,
            legend: false,
        }
    }
}

impl MapStyle {
    pub fn has_text(&self) -> bool {
        self.title.is_some() || self.legend
    }

    pub fn without_text(&self) -> Self {
        Self {
            title: None,
            legend: false,
            ..self.clone()
        }
    }
}

pub struct ChoroplethRenderer;

impl ChoroplethRenderer {
    /// Render to `path`; `.svg` selects the SVG backend, anything else a bitmap.
    pub fn render_to_file(table: &MapTable, style: &MapStyle, path: &Path) -> Result<(), RenderError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| RenderError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let is_svg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

        Self::with_text_fallback(style, |style| {
            if is_svg {
                let root = SVGBackend::new(path, (style.width, style.height)).into_drawing_area();
                Self::draw(&root, table, style)?;
                root.present().map_err(drawing_error)
            } else {
                let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
                Self::draw(&root, table, style)?;
                root.present().map_err(drawing_error)
            }
        })?;

        info!("Rendered map of {} regions to {:?}", table.rows.len(), path);
        Ok(())
    }

    /// Render into an in-memory SVG document.
    pub fn render_svg_string(table: &MapTable, style: &MapStyle) -> Result<String, RenderError> {
        Self::with_text_fallback(style, |style| {
            let mut svg = String::new();
            {
                let root =
                    SVGBackend::with_string(&mut svg, (style.width, style.height)).into_drawing_area();
                Self::draw(&root, table, style)?;
                root.present().map_err(drawing_error)?;
            }
            Ok(svg)
        })
    }

    /// Text needs a system font; without one, retry with shapes only.
    fn with_text_fallback<T>(
        style: &MapStyle,
        render: impl Fn(&MapStyle) -> Result<T, RenderError>,
    ) -> Result<T, RenderError> {
        match render(style) {
            Err(RenderError::Drawing(reason)) if style.has_text() => {
                warn!("Drawing text failed ({reason}), rendering without title and legend");
                render(&style.without_text())
            }
            other => other,
        }
    }

    /// Fill colour for a ratio; NaN maps to the missing colour.
    pub fn ratio_color(ratio: f64) -> RGBColor {
        if ratio.is_nan() {
            return MISSING;
        }

        let t = ratio.clamp(0.0, 1.0) * (RAMP.len() - 1) as f64;
        let lower = (t.floor() as usize).min(RAMP.len() - 2);
        let frac = t - lower as f64;

        let (r0, g0, b0) = RAMP[lower];
        let (r1, g1, b1) = RAMP[lower + 1];
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;

        RGBColor(mix(r0, r1), mix(g0, g1), mix(b0, b1))
    }

    fn draw<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        table: &MapTable,
        style: &MapStyle,
    ) -> Result<(), RenderError> {
        let extent = Self::extent(&table.rows).ok_or(RenderError::Empty)?;
        let x_scale = Self::longitude_scale(&extent);

        root.fill(&BACKGROUND).map_err(drawing_error)?;

        let right_margin = if style.legend { LEGEND_WIDTH } else { 10 };
        let mut builder = ChartBuilder::on(root);
        builder.margin(10).margin_right(right_margin);
        if let Some(title) = &style.title {
            builder.caption(title, ("sans-serif", 24));
        }

        let (x_range, y_range) = Self::fit_ranges(
            &extent,
            x_scale,
            style.width as i32 - 10 - right_margin,
            style.height as i32 - 20 - if style.title.is_some() { 40 } else { 0 },
        );
        let mut chart = builder
            .build_cartesian_2d(x_range, y_range)
            .map_err(drawing_error)?;

        for row in &table.rows {
            let color = Self::ratio_color(row.ratio);
            for polygon in &row.geometry.0 {
                let ring = Self::project(polygon.exterior(), x_scale);
                chart
                    .draw_series(std::iter::once(Polygon::new(ring.clone(), color.filled())))
                    .map_err(drawing_error)?;
                chart
                    .draw_series(std::iter::once(PathElement::new(ring, OUTLINE.stroke_width(1))))
                    .map_err(drawing_error)?;
            }
        }

        if style.legend {
            Self::draw_legend(root, style)?;
        }

        Ok(())
    }

    fn draw_legend<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        style: &MapStyle,
    ) -> Result<(), RenderError> {
        let bar_x = style.width as i32 - LEGEND_WIDTH + 15;
        let bar_w = 20;
        let top = style.height as i32 / 4;
        let bottom = style.height as i32 * 3 / 4;
        let step_h = ((bottom - top) / LEGEND_STEPS).max(1);

        for i in 0..LEGEND_STEPS {
            let ratio = (i as f64 + 0.5) / LEGEND_STEPS as f64;
            let y1 = bottom - i * step_h;
            let y0 = y1 - step_h;
            root.draw(&Rectangle::new(
                [(bar_x, y0), (bar_x + bar_w, y1)],
                Self::ratio_color(ratio).filled(),
            ))
            .map_err(drawing_error)?;
        }

        let font = ("sans-serif", 14).into_font().color(&LABEL);
        let bar_top = bottom - LEGEND_STEPS * step_h;
        for (ratio, label) in [(0.0, "0%"), (0.5, "50%"), (1.0, "100%")] {
            let y = bottom - (ratio * (bottom - bar_top) as f64) as i32;
            root.draw(&Text::new(label, (bar_x + bar_w + 5, y - 7), font.clone()))
                .map_err(drawing_error)?;
        }

        Ok(())
    }

    fn extent(rows: &[MapRow]) -> Option<Rect<f64>> {
        rows.iter()
            .filter_map(|row| row.geometry.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                    (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
                )
            })
    }

    /// Shrink longitudes by the cosine of the mid latitude.
    fn longitude_scale(extent: &Rect<f64>) -> f64 {
        let mid_lat = (extent.min().y + extent.max().y) / 2.0;
        let scale = mid_lat.to_radians().cos();
        if scale > 0.05 {
            scale
        } else {
            1.0
        }
    }

    fn project(ring: &LineString<f64>, x_scale: f64) -> Vec<(f64, f64)> {
        ring.coords().map(|c| (c.x * x_scale, c.y)).collect()
    }

    /// Pad the projected extent so one unit spans the same pixels on both axes.
    fn fit_ranges(
        extent: &Rect<f64>,
        x_scale: f64,
        plot_w: i32,
        plot_h: i32,
    ) -> (Range<f64>, Range<f64>) {
        let (x0, x1) = (extent.min().x * x_scale, extent.max().x * x_scale);
        let (y0, y1) = (extent.min().y, extent.max().y);
        let w = (x1 - x0).max(1e-9);
        let h = (y1 - y0).max(1e-9);

        let pixel_ratio = plot_w.max(1) as f64 / plot_h.max(1) as f64;
        let (w, h) = if w / h > pixel_ratio {
            (w, w / pixel_ratio)
        } else {
            (h * pixel_ratio, h)
        };

        let cx = (x0 + x1) / 2.0;
        let cy = (y0 + y1) / 2.0;
        let pad = 1.02;
        (
            (cx - w * pad / 2.0)..(cx + w * pad / 2.0),
            (cy - h * pad / 2.0)..(cy + h * pad / 2.0),
        )
    }
}
