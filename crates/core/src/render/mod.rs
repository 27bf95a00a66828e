//! Map rendering
//!
//! [`render_day`] draws one forecast day onto any [`Surface`] in a fixed
//! layer order:
//!
//! 1. vertical background gradient
//! 2. screen grid lines
//! 3. land silhouette fill
//! 4. one rectangle per cell, coloured by [`color_for`]
//! 5. land outline
//! 6. internal borders, when the boundary has them
//! 7. title
//!
//! Nothing is drawn without a map context. A day index with no cells still
//! draws the basemap.

pub mod color;
pub mod font;
pub mod raster;

pub use color::{color_for, css, Paint, COLOR_STOPS};
pub use raster::RasterSurface;

use crate::forecast::ForecastResult;
use crate::geo::{MapContext, Projection};
use nalgebra::Point2;
use std::path::Path;
use tracing::debug;

/// Drawing target
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Fill the whole surface with a top-to-bottom gradient
    fn fill_vertical_gradient(&mut self, top: Paint, bottom: Paint);

    /// Fill an axis-aligned rectangle given by its top-left corner
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, paint: Paint);

    /// Fill closed rings as one even-odd path
    fn fill_path(&mut self, rings: &[Vec<Point2<f64>>], paint: Paint);

    /// Stroke an open polyline
    fn stroke_polyline(&mut self, points: &[Point2<f64>], width: f64, paint: Paint);

    /// Draw text with its baseline starting at `origin`
    fn draw_text(&mut self, text: &str, origin: Point2<f64>, size: f64, paint: Paint);
}

/// Errors that can occur while exporting a rendered map
#[derive(Debug)]
pub enum RenderError {
    /// Failed to create or write the output file
    Io(std::io::Error),
    /// Failed to encode the image
    Image(image::ImageError),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Io(e) => write!(f, "Failed to write image: {e}"),
            RenderError::Image(e) => write!(f, "Failed to encode image: {e}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Io(e) => Some(e),
            RenderError::Image(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(e: std::io::Error) -> Self {
        RenderError::Io(e)
    }
}

impl From<image::ImageError> for RenderError {
    fn from(e: image::ImageError) -> Self {
        RenderError::Image(e)
    }
}

/// Map styling
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub background_top: Paint,
    pub background_bottom: Paint,
    /// Spacing of screen grid lines in pixels
    pub grid_spacing: f64,
    pub grid_paint: Paint,
    pub grid_width: f64,
    pub land_fill: Paint,
    /// Cell rectangle size in pixels
    pub cell_size: (f64, f64),
    pub cell_alpha: f64,
    pub outline_paint: Paint,
    pub outline_width: f64,
    pub border_paint: Paint,
    pub border_width: f64,
    pub title: String,
    pub title_origin: Point2<f64>,
    pub title_size: f64,
    pub title_paint: Paint,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background_top: Paint::hex(0xedf5ff),
            background_bottom: Paint::hex(0xdbeafe),
            grid_spacing: 75.0,
            grid_paint: Paint::hex(0x9bb6d8),
            grid_width: 1.0,
            land_fill: Paint::rgba(18, 33, 59, 0.26),
            cell_size: (14.0, 11.0),
            cell_alpha: 0.9,
            outline_paint: Paint::hex(0x1c3557),
            outline_width: 2.0,
            border_paint: Paint::rgba(28, 53, 87, 0.5),
            border_width: 0.8,
            title: "Continental US precipitation".to_string(),
            title_origin: Point2::new(18.0, 28.0),
            title_size: 18.0,
            title_paint: Paint::hex(0x17345a),
        }
    }
}

/// Project every ring of the land silhouette, dropping unprojectable vertices
fn projected_land_rings(context: &MapContext) -> Vec<Vec<Point2<f64>>> {
    let projection = context.projection();
    context
        .geometry()
        .land
        .polygons()
        .iter()
        .flat_map(|polygon| polygon.rings())
        .map(|ring| {
            ring.iter()
                .filter_map(|p| projection.project(p.x, p.y))
                .collect::<Vec<_>>()
        })
        .filter(|ring| ring.len() >= 3)
        .collect()
}

/// Draw day `day_index` of `result`
///
/// Returns `false` (and draws nothing) when `context` is `None`.
pub fn render_day<S: Surface + ?Sized>(
    surface: &mut S,
    result: &ForecastResult,
    day_index: usize,
    context: Option<&MapContext>,
    config: &RenderConfig,
) -> bool {
    let Some(context) = context else {
        debug!("Skipping render: no map context");
        return false;
    };
    let width = f64::from(surface.width());
    let height = f64::from(surface.height());

    surface.fill_vertical_gradient(config.background_top, config.background_bottom);

    if config.grid_spacing > 0.0 {
        let mut gx = 0.0;
        while gx <= width {
            surface.stroke_polyline(
                &[Point2::new(gx, 0.0), Point2::new(gx, height)],
                config.grid_width,
                config.grid_paint,
            );
            gx += config.grid_spacing;
        }
        let mut gy = 0.0;
        while gy <= height {
            surface.stroke_polyline(
                &[Point2::new(0.0, gy), Point2::new(width, gy)],
                config.grid_width,
                config.grid_paint,
            );
            gy += config.grid_spacing;
        }
    }

    let land = projected_land_rings(context);
    surface.fill_path(&land, config.land_fill);

    let (cw, ch) = config.cell_size;
    let cells = result.cells(day_index);
    let mut drawn = 0_usize;
    for cell in cells {
        let Some(p) = context.project(cell.lon, cell.lat) else {
            continue;
        };
        let paint = Paint::from(color_for(cell.value.value())).with_alpha(config.cell_alpha);
        surface.fill_rect(p.x - cw / 2.0, p.y - ch / 2.0, cw, ch, paint);
        drawn += 1;
    }

    for ring in &land {
        let mut closed = ring.clone();
        closed.push(ring[0]);
        surface.stroke_polyline(&closed, config.outline_width, config.outline_paint);
    }

    if let Some(borders) = &context.geometry().borders {
        let projection = context.projection();
        for line in borders.lines() {
            let projected: Vec<Point2<f64>> = line
                .iter()
                .filter_map(|p| projection.project(p.x, p.y))
                .collect();
            surface.stroke_polyline(&projected, config.border_width, config.border_paint);
        }
    }

    surface.draw_text(
        &config.title,
        config.title_origin,
        config.title_size,
        config.title_paint,
    );

    debug!(
        "Rendered day {}: {} of {} cells drawn",
        day_index,
        drawn,
        cells.len()
    );
    true
}

/// Render day `day_index` at the context's canvas size and save it as PNG
///
/// Returns `Ok(false)` without writing anything when `context` is `None`.
///
/// # Errors
/// See [`RasterSurface::save_png`]
pub fn render_png<P: AsRef<Path>>(
    path: P,
    result: &ForecastResult,
    day_index: usize,
    context: Option<&MapContext>,
    config: &RenderConfig,
) -> Result<bool, RenderError> {
    let Some(ctx) = context else {
        return Ok(false);
    };
    let extent = ctx.extent();
    let mut surface = RasterSurface::new(extent.width, extent.height);
    render_day(&mut surface, result, day_index, Some(ctx), config);
    surface.save_png(path)?;
    Ok(true)
}
