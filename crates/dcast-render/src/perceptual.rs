#![forbid(unsafe_code)]

//! Visual difference scoring between two cells.
//!
//! Produces a 0–100 score estimating how noticeable a cell change is to a
//! human viewer. Glyph identity dominates; foreground, background, and the
//! change in fg/bg contrast contribute smaller weighted terms. Colors are
//! compared as the viewer sees them (reverse video pre-swapped) after 5-bit
//! quantization, so dithering noise from upstream renderers scores as zero.

use crate::cell::{Cell, Rgb};
use crate::lab::color_distance;

/// Lab-distance normalization: distances at or above this count as a full
/// (1.0) color change. Tuned, not derived; lowering it makes the scorer more
/// sensitive to hue shifts.
pub const DISTANCE_NORM: f64 = 150.0;

const GLYPH_WEIGHT: f64 = 0.5;
const FG_WEIGHT: f64 = 0.25;
const BG_WEIGHT: f64 = 0.25;
const CONTRAST_WEIGHT: f64 = 0.25;

#[inline]
fn normalized_distance(a: Option<Rgb>, b: Option<Rgb>) -> f64 {
    (color_distance(a, b) / DISTANCE_NORM).min(1.0)
}

/// Score how visually different `curr` is from `prev`, 0.0–100.0.
///
/// Identical cells (structural equality) short-circuit to exactly 0.0.
pub fn visual_difference(prev: &Cell, curr: &Cell) -> f64 {
    if prev.glyph == curr.glyph && prev.style == curr.style {
        return 0.0;
    }

    let (prev_fg, prev_bg) = prev.style.effective_colors();
    let (curr_fg, curr_bg) = curr.style.effective_colors();

    let prev_fg = prev_fg.map(Rgb::quantized);
    let prev_bg = prev_bg.map(Rgb::quantized);
    let curr_fg = curr_fg.map(Rgb::quantized);
    let curr_bg = curr_bg.map(Rgb::quantized);

    let glyph_diff = if prev.glyph == curr.glyph { 0.0 } else { 1.0 };
    let fg_diff = normalized_distance(prev_fg, curr_fg);
    let bg_diff = normalized_distance(prev_bg, curr_bg);

    // A cell's legibility is its fg/bg contrast; compare how much that
    // contrast itself moved between the two cells.
    let prev_contrast = normalized_distance(prev_fg, prev_bg);
    let curr_contrast = normalized_distance(curr_fg, curr_bg);
    let contrast_diff = (prev_contrast - curr_contrast).abs();

    let score = GLYPH_WEIGHT * glyph_diff
        + FG_WEIGHT * fg_diff
        + BG_WEIGHT * bg_diff
        + CONTRAST_WEIGHT * contrast_diff;

    score.min(1.0) * 100.0
}
