#![forbid(unsafe_code)]

//! CIE Lab color space and Delta-E distance.
//!
//! sRGB values are gamma-expanded to linear light, projected into CIE XYZ
//! (D65 white point), then into L*a*b*. Distance between two colors is
//! Delta-E CIE76 — Euclidean distance in Lab — which tracks human perception
//! far better than raw RGB distance: dark colors that are numerically far
//! apart but visually close score low, and vice versa.

use crate::cell::Rgb;

/// Distance charged when exactly one of two compared colors is absent.
///
/// Equal to the maximum raw-RGB Euclidean distance (black to white), i.e.
/// `sqrt(3 * 255^2)`. "Default color" versus "explicit color" is treated as
/// a maximal change because the terminal default is unknowable here.
pub const MISSING_COLOR_DISTANCE: f64 = 441.67;

#[inline]
fn srgb_to_linear(channel: u8) -> f64 {
    let c = f64::from(channel) / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn lab_f(t: f64) -> f64 {
    const EPSILON: f64 = 0.008856;
    if t > EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

/// Convert an sRGB color to CIE Lab (D65 reference white).
pub fn rgb_to_lab(color: Rgb) -> [f64; 3] {
    let r = srgb_to_linear(color.r);
    let g = srgb_to_linear(color.g);
    let b = srgb_to_linear(color.b);

    // sRGB → XYZ, D65.
    let x = 0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b;
    let y = 0.212_672_9 * r + 0.715_152_2 * g + 0.072_175_0 * b;
    let z = 0.019_333_9 * r + 0.119_192_0 * g + 0.950_304_1 * b;

    let fx = lab_f(x / 0.950_47);
    let fy = lab_f(y / 1.0);
    let fz = lab_f(z / 1.088_83);

    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// Delta-E CIE76: Euclidean distance in Lab space.
pub fn delta_e(a: Rgb, b: Rgb) -> f64 {
    let la = rgb_to_lab(a);
    let lb = rgb_to_lab(b);
    let dl = la[0] - lb[0];
    let da = la[1] - lb[1];
    let db = la[2] - lb[2];
    (dl * dl + da * da + db * db).sqrt()
}

/// Perceptual distance between two optional colors.
///
/// Both absent: 0. Exactly one absent: [`MISSING_COLOR_DISTANCE`].
/// Both present: [`delta_e`].
pub fn color_distance(a: Option<Rgb>, b: Option<Rgb>) -> f64 {
    match (a, b) {
        (None, None) => 0.0,
        (Some(a), Some(b)) => delta_e(a, b),
        _ => MISSING_COLOR_DISTANCE,
    }
}
