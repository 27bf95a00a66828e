//! In-memory RGB raster implementing [`Surface`]
//!
//! Sampling is at pixel centres. Polygon fills use the even-odd rule without
//! anti-aliasing; strokes get a one-pixel coverage ramp at their edges.

use super::color::Paint;
use super::font;
use super::{RenderError, Surface};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageEncoder, Rgb, RgbImage};
use nalgebra::Point2;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// RGB pixel buffer with alpha-blended drawing
#[derive(Debug, Clone)]
pub struct RasterSurface {
    image: RgbImage,
}

impl RasterSurface {
    /// White surface of the given size
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, Rgb([255, 255, 255])),
        }
    }

    #[must_use]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    #[must_use]
    pub fn into_image(self) -> RgbImage {
        self.image
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb<u8>> {
        (x < self.image.width() && y < self.image.height()).then(|| *self.image.get_pixel(x, y))
    }

    /// Write the raster as PNG
    ///
    /// # Errors
    /// `Io` if the file cannot be created, `Image` if encoding fails
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), RenderError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        let encoder =
            PngEncoder::new_with_quality(writer, CompressionType::Default, FilterType::Adaptive);
        encoder.write_image(
            self.image.as_raw(),
            self.image.width(),
            self.image.height(),
            image::ExtendedColorType::Rgb8,
        )?;
        debug!(
            "Wrote {}x{} PNG to {}",
            self.image.width(),
            self.image.height(),
            path.display()
        );
        Ok(())
    }

    /// Blend `paint` into one pixel with extra coverage in `[0, 1]`
    fn blend(&mut self, x: i64, y: i64, paint: Paint, coverage: f64) {
        if x < 0 || y < 0 || x >= i64::from(self.image.width()) || y >= i64::from(self.image.height())
        {
            return;
        }
        let a = (paint.alpha * coverage).clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        for i in 0..3 {
            let s = f64::from(paint.color[i]);
            let d = f64::from(dst[i]);
            dst[i] = (s * a + d * (1.0 - a)).round() as u8;
        }
    }

    /// Pixel columns whose centres fall in `[x0, x1)`, clipped to the raster
    fn span(&self, x0: f64, x1: f64) -> std::ops::Range<i64> {
        let w = i64::from(self.image.width());
        let start = ((x0 - 0.5).ceil() as i64).max(0);
        let end = ((x1 - 0.5).ceil() as i64).min(w);
        start..end.max(start)
    }

    /// Pixel rows whose centres fall in `[y0, y1)`, clipped to the raster
    fn rows(&self, y0: f64, y1: f64) -> std::ops::Range<i64> {
        let h = i64::from(self.image.height());
        let start = ((y0 - 0.5).ceil() as i64).max(0);
        let end = ((y1 - 0.5).ceil() as i64).min(h);
        start..end.max(start)
    }
}

impl Surface for RasterSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn fill_vertical_gradient(&mut self, top: Paint, bottom: Paint) {
        let h = f64::from(self.image.height());
        for y in 0..i64::from(self.image.height()) {
            let paint = top.lerp(bottom, (y as f64 + 0.5) / h);
            for x in 0..i64::from(self.image.width()) {
                self.blend(x, y, paint, 1.0);
            }
        }
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, paint: Paint) {
        for py in self.rows(y, y + height) {
            for px in self.span(x, x + width) {
                self.blend(px, py, paint, 1.0);
            }
        }
    }

    fn fill_path(&mut self, rings: &[Vec<Point2<f64>>], paint: Paint) {
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for p in rings.iter().flatten() {
            y_min = y_min.min(p.y);
            y_max = y_max.max(p.y);
        }
        if !y_min.is_finite() || !y_max.is_finite() || y_min >= y_max {
            return;
        }

        let mut crossings = Vec::new();
        for py in self.rows(y_min, y_max) {
            let yc = py as f64 + 0.5;
            crossings.clear();
            for ring in rings.iter().filter(|r| r.len() >= 3) {
                let mut j = ring.len() - 1;
                for i in 0..ring.len() {
                    let (a, b) = (ring[i], ring[j]);
                    if (a.y > yc) != (b.y > yc) {
                        crossings.push((b.x - a.x) * (yc - a.y) / (b.y - a.y) + a.x);
                    }
                    j = i;
                }
            }
            crossings.sort_by(f64::total_cmp);
            for pair in crossings.chunks_exact(2) {
                for px in self.span(pair[0], pair[1]) {
                    self.blend(px, py, paint, 1.0);
                }
            }
        }
    }

    fn stroke_polyline(&mut self, points: &[Point2<f64>], width: f64, paint: Paint) {
        if points.len() < 2 || width <= 0.0 {
            return;
        }
        let half = width / 2.0;
        let pad = half + 1.0;

        let mut lo = Point2::new(f64::INFINITY, f64::INFINITY);
        let mut hi = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            lo = Point2::new(lo.x.min(p.x), lo.y.min(p.y));
            hi = Point2::new(hi.x.max(p.x), hi.y.max(p.y));
        }
        let xs = self.span(lo.x - pad, hi.x + pad);
        let ys = self.rows(lo.y - pad, hi.y + pad);
        if xs.is_empty() || ys.is_empty() {
            return;
        }

        // Coverage is the max over segments so joints are not blended twice
        let cols = (xs.end - xs.start) as usize;
        let mut coverage = vec![0.0_f64; cols * (ys.end - ys.start) as usize];
        for seg in points.windows(2) {
            let (a, b) = (seg[0], seg[1]);
            let sx = self.span(a.x.min(b.x) - pad, a.x.max(b.x) + pad);
            let sy = self.rows(a.y.min(b.y) - pad, a.y.max(b.y) + pad);
            for py in sy {
                for px in sx.clone() {
                    let c = Point2::new(px as f64 + 0.5, py as f64 + 0.5);
                    let cov = (half + 0.5 - distance_to_segment(c, a, b)).clamp(0.0, 1.0);
                    let idx = (py - ys.start) as usize * cols + (px - xs.start) as usize;
                    if cov > coverage[idx] {
                        coverage[idx] = cov;
                    }
                }
            }
        }

        for (row, py) in ys.enumerate() {
            for (col, px) in xs.clone().enumerate() {
                let cov = coverage[row * cols + col];
                if cov > 0.0 {
                    self.blend(px, py, paint, cov);
                }
            }
        }
    }

    fn draw_text(&mut self, text: &str, origin: Point2<f64>, size: f64, paint: Paint) {
        let scale = font::scale_for_size(size);
        let x0 = origin.x.round() as i64;
        // Origin is the baseline; glyphs sit on it
        let y0 = origin.y.round() as i64 - i64::from(font::GLYPH_HEIGHT * scale);
        let mut lit = Vec::new();
        font::for_each_pixel(text, scale, |dx, dy| lit.push((dx, dy)));
        for (dx, dy) in lit {
            self.blend(x0 + i64::from(dx), y0 + i64::from(dy), paint, 1.0);
        }
    }
}

fn distance_to_segment(p: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}
