#![forbid(unsafe_code)]

//! Diff computation between frames.
//!
//! `FrameDiff` computes the set of cells that must be re-emitted to turn the
//! previous frame into the current one, using a row-major scan for cache
//! efficiency.
//!
//! Two policies exist:
//!
//! - **Exact**: a cell changes iff it compares structurally unequal.
//! - **Perceptual**: a cell changes iff its
//!   [`visual_difference`](crate::perceptual::visual_difference) score is
//!   strictly greater than the threshold. A score exactly at the threshold
//!   does not change.
//!
//! A configured threshold of 0 disables perceptual scoring and selects
//! exact diffing: structurally unequal cells that happen to score 0
//! (sub-quantum color shifts, reverse-video twins) must still be re-emitted
//! when the caller asked for zero tolerance.

use crate::error::{RenderError, RenderResult};
use crate::frame::Frame;
use crate::perceptual::visual_difference;

/// How cell changes are detected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiffPolicy {
    /// Structural equality; any differing cell is a change.
    Exact,
    /// Perceptual scoring; only cells scoring strictly above `threshold`
    /// (0–100) are changes.
    Perceptual { threshold: f64 },
}

impl DiffPolicy {
    /// Build a policy from an optional threshold, validating the range.
    ///
    /// `None` and `Some(0.0)` both yield [`DiffPolicy::Exact`]: zero
    /// tolerance means every structural difference matters, including ones
    /// the perceptual score cannot see.
    pub fn from_threshold(threshold: Option<f64>) -> RenderResult<Self> {
        match threshold {
            None => Ok(Self::Exact),
            Some(t) if t == 0.0 => Ok(Self::Exact),
            Some(t) if (0.0..=100.0).contains(&t) => Ok(Self::Perceptual { threshold: t }),
            Some(t) => Err(RenderError::InvalidThreshold(t)),
        }
    }

    #[inline]
    fn cell_changed(&self, prev: &crate::cell::Cell, curr: &crate::cell::Cell) -> bool {
        match *self {
            Self::Exact => prev != curr,
            Self::Perceptual { threshold } => visual_difference(prev, curr) > threshold,
        }
    }
}

/// A contiguous run of changed cells on a single row.
///
/// Adjacent changed cells share one cursor-positioning sequence, so the
/// encoder consumes runs rather than individual positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRun {
    /// Row index.
    pub y: u16,
    /// Start column (inclusive).
    pub x0: u16,
    /// End column (inclusive).
    pub x1: u16,
}

impl ChangeRun {
    #[inline]
    pub const fn new(y: u16, x0: u16, x1: u16) -> Self {
        debug_assert!(x0 <= x1);
        Self { y, x0, x1 }
    }

    /// Number of cells in this run.
    #[inline]
    pub const fn len(&self) -> u16 {
        self.x1 - self.x0 + 1
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.x1 < self.x0
    }
}

/// The diff between two frames: the (x, y) positions that must be emitted.
#[derive(Debug, Clone, Default)]
pub struct FrameDiff {
    changes: Vec<(u16, u16)>,
}

impl FrameDiff {
    /// Create an empty diff.
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Compute the diff between two same-sized frames under a policy.
    pub fn compute(prev: &Frame, curr: &Frame, policy: DiffPolicy) -> RenderResult<Self> {
        #[cfg(feature = "tracing")]
        let _span =
            tracing::debug_span!("diff_compute", width = curr.width(), height = curr.height())
                .entered();

        if prev.width() != curr.width() || prev.height() != curr.height() {
            return Err(RenderError::DimensionMismatch {
                expected: (prev.width(), prev.height()),
                actual: (curr.width(), curr.height()),
            });
        }

        let width = curr.width();
        let height = curr.height();

        // Assume ~5% of cells change on average.
        let estimated = (width as usize * height as usize) / 20;
        let mut changes = Vec::with_capacity(estimated);

        for y in 0..height {
            for x in 0..width {
                let prev_cell = prev.get_unchecked(x, y);
                let curr_cell = curr.get_unchecked(x, y);
                if policy.cell_changed(prev_cell, curr_cell) {
                    changes.push((x, y));
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(changes = changes.len(), "diff computed");

        Ok(Self { changes })
    }

    /// A diff marking every cell changed: the first frame and forced
    /// refreshes emit everything.
    pub fn keyframe(width: u16, height: u16) -> Self {
        let mut changes = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                changes.push((x, y));
            }
        }
        Self { changes }
    }

    /// Number of changed cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Changed positions in row-major order.
    #[inline]
    pub fn changes(&self) -> &[(u16, u16)] {
        &self.changes
    }

    /// Coalesce point changes into contiguous per-row runs.
    pub fn runs(&self) -> Vec<ChangeRun> {
        if self.changes.is_empty() {
            return Vec::new();
        }

        // Already sorted by (y, x) from the row-major scan.
        let sorted = &self.changes;
        let mut runs = Vec::new();
        let mut i = 0;

        while i < sorted.len() {
            let (x0, y) = sorted[i];
            let mut x1 = x0;
            i += 1;
            while i < sorted.len() {
                let (x, yy) = sorted[i];
                if yy != y || x != x1 + 1 {
                    break;
                }
                x1 = x;
                i += 1;
            }
            runs.push(ChangeRun::new(y, x0, x1));
        }

        runs
    }

    /// Iterate over changed positions.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.changes.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, Rgb, Style};

    #[test]
    fn empty_diff_when_frames_identical() {
        let a = Frame::new(10, 10);
        let b = Frame::new(10, 10);
        let diff = FrameDiff::compute(&a, &b, DiffPolicy::Exact).unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn single_cell_change_detected() {
        let prev = Frame::new(10, 10);
        let mut curr = Frame::new(10, 10);
        curr.set(5, 5, Cell::from_char('X'));

        let diff = FrameDiff::compute(&prev, &curr, DiffPolicy::Exact).unwrap();
        assert_eq!(diff.changes(), &[(5, 5)]);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let a = Frame::new(10, 10);
        let b = Frame::new(10, 11);
        let err = FrameDiff::compute(&a, &b, DiffPolicy::Exact).unwrap_err();
        assert!(matches!(err, RenderError::DimensionMismatch { .. }));
    }

    #[test]
    fn threshold_validation() {
        assert!(matches!(
            DiffPolicy::from_threshold(None),
            Ok(DiffPolicy::Exact)
        ));
        assert!(matches!(
            DiffPolicy::from_threshold(Some(0.0)),
            Ok(DiffPolicy::Exact)
        ));
        assert!(matches!(
            DiffPolicy::from_threshold(Some(100.0)),
            Ok(DiffPolicy::Perceptual { .. })
        ));
        assert!(matches!(
            DiffPolicy::from_threshold(Some(-1.0)),
            Err(RenderError::InvalidThreshold(_))
        ));
        assert!(matches!(
            DiffPolicy::from_threshold(Some(100.1)),
            Err(RenderError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn perceptual_skips_sub_threshold_noise() {
        let mut prev = Frame::new(4, 1);
        let mut curr = Frame::new(4, 1);
        // Dithering noise: near-identical grays.
        prev.set(
            0,
            0,
            Cell::new('#', Style::new().with_fg(Rgb::new(136, 147, 158))),
        );
        curr.set(
            0,
            0,
            Cell::new('#', Style::new().with_fg(Rgb::new(130, 141, 151))),
        );
        // A real change next to it.
        curr.set(1, 0, Cell::from_char('X'));

        let diff =
            FrameDiff::compute(&prev, &curr, DiffPolicy::Perceptual { threshold: 5.0 }).unwrap();
        assert_eq!(diff.changes(), &[(1, 0)]);

        let exact = FrameDiff::compute(&prev, &curr, DiffPolicy::Exact).unwrap();
        assert_eq!(exact.len(), 2);
    }

    #[test]
    fn score_exactly_at_threshold_does_not_change() {
        // A pure glyph change scores exactly 50.0.
        let mut prev = Frame::new(1, 1);
        let mut curr = Frame::new(1, 1);
        prev.set(0, 0, Cell::from_char('A'));
        curr.set(0, 0, Cell::from_char('B'));

        let at = FrameDiff::compute(&prev, &curr, DiffPolicy::Perceptual { threshold: 50.0 })
            .unwrap();
        assert!(at.is_empty(), "score == threshold must not emit");

        let below = FrameDiff::compute(&prev, &curr, DiffPolicy::Perceptual { threshold: 49.9 })
            .unwrap();
        assert_eq!(below.len(), 1);
    }

    #[test]
    fn perceptual_threshold_zero_still_skips_identical_cells() {
        let a = Frame::new(3, 3);
        let b = Frame::new(3, 3);
        let diff =
            FrameDiff::compute(&a, &b, DiffPolicy::Perceptual { threshold: 0.0 }).unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn threshold_zero_detects_sub_quantum_color_shifts() {
        // These two foregrounds quantize to the same 5-bit buckets, so a
        // perceptual score would be 0. Zero tolerance must still see them.
        let mut prev = Frame::new(2, 1);
        let mut curr = Frame::new(2, 1);
        prev.set(
            0,
            0,
            Cell::new('#', Style::new().with_fg(Rgb::new(136, 144, 152))),
        );
        curr.set(
            0,
            0,
            Cell::new('#', Style::new().with_fg(Rgb::new(139, 146, 155))),
        );

        let policy = DiffPolicy::from_threshold(Some(0.0)).unwrap();
        let diff = FrameDiff::compute(&prev, &curr, policy).unwrap();
        assert_eq!(diff.changes(), &[(0, 0)]);
    }

    #[test]
    fn red_cell_against_default_grid_is_the_only_change() {
        let prev = Frame::new(2, 2);
        let mut curr = Frame::new(2, 2);
        curr.set(
            0,
            0,
            Cell::new('A', Style::new().with_fg(Rgb::new(255, 0, 0))),
        );

        let exact = FrameDiff::compute(&prev, &curr, DiffPolicy::Exact).unwrap();
        assert_eq!(exact.changes(), &[(0, 0)]);

        let perceptual =
            FrameDiff::compute(&prev, &curr, DiffPolicy::Perceptual { threshold: 5.0 }).unwrap();
        assert_eq!(perceptual.changes(), &[(0, 0)]);
    }

    #[test]
    fn runs_coalesce_adjacent_cells() {
        let prev = Frame::new(10, 10);
        let mut curr = Frame::new(10, 10);
        curr.set(3, 5, Cell::from_char('A'));
        curr.set(4, 5, Cell::from_char('B'));
        curr.set(5, 5, Cell::from_char('C'));

        let diff = FrameDiff::compute(&prev, &curr, DiffPolicy::Exact).unwrap();
        let runs = diff.runs();
        assert_eq!(runs, vec![ChangeRun::new(5, 3, 5)]);
        assert_eq!(runs[0].len(), 3);
    }

    #[test]
    fn runs_split_on_gaps_and_rows() {
        let prev = Frame::new(10, 10);
        let mut curr = Frame::new(10, 10);
        curr.set(0, 0, Cell::from_char('A'));
        curr.set(1, 0, Cell::from_char('B'));
        curr.set(3, 0, Cell::from_char('C'));
        curr.set(0, 2, Cell::from_char('D'));

        let diff = FrameDiff::compute(&prev, &curr, DiffPolicy::Exact).unwrap();
        let runs = diff.runs();
        assert_eq!(
            runs,
            vec![
                ChangeRun::new(0, 0, 1),
                ChangeRun::new(0, 3, 3),
                ChangeRun::new(2, 0, 0),
            ]
        );
    }

    #[test]
    fn keyframe_marks_every_cell() {
        let diff = FrameDiff::keyframe(4, 3);
        assert_eq!(diff.len(), 12);
        let runs = diff.runs();
        assert_eq!(runs.len(), 3);
        assert!(runs.iter().all(|r| r.x0 == 0 && r.x1 == 3));
    }

    #[test]
    fn row_major_order_preserved() {
        let prev = Frame::new(3, 3);
        let mut curr = Frame::new(3, 3);
        curr.set(2, 2, Cell::from_char('C'));
        curr.set(0, 0, Cell::from_char('A'));
        curr.set(1, 1, Cell::from_char('B'));

        let diff = FrameDiff::compute(&prev, &curr, DiffPolicy::Exact).unwrap();
        assert_eq!(diff.changes(), &[(0, 0), (1, 1), (2, 2)]);
    }
}
