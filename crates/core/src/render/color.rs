//! Precipitation colour ramp and paint helpers

use image::Rgb;

/// `(mm, rgb)` stops of the precipitation ramp, ascending
pub const COLOR_STOPS: [(f64, [u8; 3]); 6] = [
    (0.0, [236, 248, 255]),
    (10.0, [167, 224, 255]),
    (20.0, [103, 177, 238]),
    (35.0, [57, 126, 202]),
    (50.0, [29, 79, 145]),
    (65.0, [18, 33, 59]),
];

/// Returned for inputs that fall in no bracket (NaN)
const FALLBACK: [u8; 3] = [167, 224, 255];

/// Colour of a precipitation depth
///
/// Piecewise-linear between stops, clamped at both ends. Each channel is
/// rounded half away from zero.
#[must_use]
pub fn color_for(mm: f64) -> Rgb<u8> {
    let (first_mm, first_rgb) = COLOR_STOPS[0];
    let (last_mm, last_rgb) = COLOR_STOPS[COLOR_STOPS.len() - 1];
    if mm <= first_mm {
        return Rgb(first_rgb);
    }
    if mm >= last_mm {
        return Rgb(last_rgb);
    }

    for pair in COLOR_STOPS.windows(2) {
        let (a_mm, a) = pair[0];
        let (b_mm, b) = pair[1];
        if mm >= a_mm && mm <= b_mm {
            let t = (mm - a_mm) / (b_mm - a_mm);
            let lerp = |i: usize| {
                let (from, to) = (f64::from(a[i]), f64::from(b[i]));
                (from + (to - from) * t).round() as u8
            };
            return Rgb([lerp(0), lerp(1), lerp(2)]);
        }
    }
    Rgb(FALLBACK)
}

/// CSS functional notation, e.g. `rgb(236,248,255)`
#[must_use]
pub fn css(color: Rgb<u8>) -> String {
    let [r, g, b] = color.0;
    format!("rgb({r},{g},{b})")
}

/// Solid colour with an opacity in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Rgb<u8>,
    pub alpha: f64,
}

impl Paint {
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            color: Rgb([r, g, b]),
            alpha: 1.0,
        }
    }

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, alpha: f64) -> Self {
        Self {
            color: Rgb([r, g, b]),
            alpha,
        }
    }

    /// Opaque paint from `0xRRGGBB`
    #[must_use]
    pub const fn hex(rgb: u32) -> Self {
        Self::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    #[must_use]
    pub const fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Linear interpolation between two paints, `t` in `[0, 1]`
    #[must_use]
    pub fn lerp(self, other: Paint, t: f64) -> Paint {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Paint {
            color: Rgb([
                mix(self.color[0], other.color[0]),
                mix(self.color[1], other.color[1]),
                mix(self.color[2], other.color[2]),
            ]),
            alpha: self.alpha + (other.alpha - self.alpha) * t,
        }
    }
}

impl From<Rgb<u8>> for Paint {
    fn from(color: Rgb<u8>) -> Self {
        Self { color, alpha: 1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_clamp() {
        assert_eq!(color_for(0.0), Rgb([236, 248, 255]));
        assert_eq!(color_for(-3.0), Rgb([236, 248, 255]));
        assert_eq!(color_for(65.0), Rgb([18, 33, 59]));
        assert_eq!(color_for(80.0), Rgb([18, 33, 59]));
    }

    #[test]
    fn test_interpolated_values() {
        assert_eq!(color_for(5.0), Rgb([202, 236, 255]));
        assert_eq!(color_for(15.0), Rgb([135, 201, 247]));
        assert_eq!(color_for(27.5), Rgb([80, 152, 220]));
        assert_eq!(color_for(42.5), Rgb([43, 103, 174]));
        assert_eq!(color_for(57.5), Rgb([24, 56, 102]));
        assert_eq!(color_for(12.3), Rgb([152, 213, 251]));
    }

    #[test]
    fn test_stops_are_exact_and_continuous() {
        for (mm, rgb) in COLOR_STOPS {
            assert_eq!(color_for(mm), Rgb(rgb));
            // Just either side of a stop stays within one step of it
            for probe in [mm - 1e-9, mm + 1e-9] {
                let c = color_for(probe);
                for i in 0..3 {
                    assert!((i32::from(c[i]) - i32::from(rgb[i])).abs() <= 1);
                }
            }
        }
    }

    #[test]
    fn test_nan_falls_back() {
        assert_eq!(color_for(f64::NAN), Rgb([167, 224, 255]));
    }

    #[test]
    fn test_css_and_hex() {
        assert_eq!(css(color_for(0.0)), "rgb(236,248,255)");
        let p = Paint::hex(0x1c3557);
        assert_eq!(p.color, Rgb([0x1c, 0x35, 0x57]));
        assert_eq!(p.alpha, 1.0);
        assert_eq!(p.with_alpha(0.5).alpha, 0.5);
    }

    #[test]
    fn test_paint_lerp() {
        let top = Paint::hex(0xedf5ff);
        let bottom = Paint::hex(0xdbeafe);
        assert_eq!(top.lerp(bottom, 0.0), top);
        assert_eq!(top.lerp(bottom, 1.0), bottom);
    }
}
