#![forbid(unsafe_code)]

//! Render orchestration.
//!
//! [`Renderer`] owns the retained previous frame and the encoder, and turns
//! each incoming frame into the escape-sequence bytes that update the
//! terminal. The first frame is always a keyframe (every cell emitted);
//! later frames emit only diffs, with optional periodic keyframes to bound
//! drift.
//!
//! # Previous-frame bookkeeping
//!
//! Under exact diffing every visible difference is emitted, so after a
//! render the incoming frame *is* the terminal's content and is moved in
//! wholesale. Under perceptual diffing sub-threshold cells are deliberately
//! not emitted, so only the emitted cells are copied into the retained
//! frame; the skipped cells keep their old value and their difference keeps
//! accumulating against later frames until it crosses the threshold. A slow
//! fade therefore renders eventually instead of being suppressed forever.

use crate::diff::{DiffPolicy, FrameDiff};
use crate::encoder::{Encoder, EncoderOptions};
use crate::error::{RenderError, RenderResult};
use crate::frame::Frame;

/// Renderer configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Grid width in cells.
    pub width: u16,
    /// Grid height in cells.
    pub height: u16,
    /// Perceptual change threshold (0–100); `None` or `Some(0.0)` selects
    /// exact diffing.
    pub threshold: Option<f64>,
    /// Skip cursor positioning when the cursor is already at the target.
    ///
    /// Off by default: positions in a recorded stream stay self-describing,
    /// which keeps playback robust when a terminal wraps or scrolls
    /// unexpectedly.
    pub cache_position: bool,
    /// Skip style sequences when the active style already matches.
    pub cache_style: bool,
    /// Emit a full keyframe every N frames; 0 disables periodic keyframes.
    pub keyframe_interval: u32,
}

impl RenderOptions {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            threshold: Some(5.0),
            cache_position: false,
            cache_style: true,
            keyframe_interval: 0,
        }
    }
}

/// Stateful frame-to-escape-stream renderer.
#[derive(Debug)]
pub struct Renderer {
    options: RenderOptions,
    policy: DiffPolicy,
    encoder: Encoder,
    prev: Option<Frame>,
    frames_since_keyframe: u32,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> RenderResult<Self> {
        if options.width == 0 || options.height == 0 {
            return Err(RenderError::InvalidDimensions {
                width: options.width,
                height: options.height,
            });
        }
        let policy = DiffPolicy::from_threshold(options.threshold)?;
        Ok(Self {
            options,
            policy,
            encoder: Encoder::new(EncoderOptions {
                cache_position: options.cache_position,
                cache_style: options.cache_style,
            }),
            prev: None,
            frames_since_keyframe: 0,
        })
    }

    #[inline]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render one frame, consuming it into the retained state.
    ///
    /// Returns the escape-sequence bytes to write to the terminal; empty
    /// when nothing changed.
    pub fn render(&mut self, frame: Frame) -> RenderResult<Vec<u8>> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "render_frame",
            width = frame.width(),
            height = frame.height()
        )
        .entered();

        if frame.width() != self.options.width || frame.height() != self.options.height {
            return Err(RenderError::DimensionMismatch {
                expected: (self.options.width, self.options.height),
                actual: (frame.width(), frame.height()),
            });
        }

        let periodic_due = self.options.keyframe_interval > 0
            && self.frames_since_keyframe >= self.options.keyframe_interval;

        let output = match self.prev.take() {
            None => self.render_keyframe(frame)?,
            Some(_) if periodic_due => self.render_keyframe(frame)?,
            Some(mut prev) => {
                let diff = FrameDiff::compute(&prev, &frame, self.policy)?;
                let mut out = Vec::new();
                for (x, y) in diff.iter() {
                    self.encoder
                        .encode_cell(&mut out, x, y, frame.get_unchecked(x, y))?;
                }

                match self.policy {
                    // Everything visible was emitted; the new frame is now
                    // terminal truth.
                    DiffPolicy::Exact => self.prev = Some(frame),
                    // Only emitted cells reached the terminal; skipped cells
                    // keep accumulating difference.
                    DiffPolicy::Perceptual { .. } => {
                        for (x, y) in diff.iter() {
                            prev.set(x, y, *frame.get_unchecked(x, y));
                        }
                        self.prev = Some(prev);
                    }
                }
                self.frames_since_keyframe += 1;
                out
            }
        };

        #[cfg(feature = "tracing")]
        tracing::trace!(bytes = output.len(), "frame rendered");

        Ok(output)
    }

    fn render_keyframe(&mut self, frame: Frame) -> RenderResult<Vec<u8>> {
        self.encoder.reset();
        let diff = FrameDiff::keyframe(frame.width(), frame.height());
        let mut out = Vec::new();
        for (x, y) in diff.iter() {
            self.encoder
                .encode_cell(&mut out, x, y, frame.get_unchecked(x, y))?;
        }
        self.prev = Some(frame);
        self.frames_since_keyframe = 1;
        Ok(out)
    }

    /// Make the next rendered frame a keyframe and drop all assumed state.
    ///
    /// Call when the terminal was written to outside this renderer.
    pub fn force_keyframe(&mut self) {
        self.prev = None;
        self.encoder.reset();
    }

    /// Change grid dimensions. Drops retained state; the next frame is a
    /// keyframe.
    pub fn resize(&mut self, width: u16, height: u16) -> RenderResult<()> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        self.options.width = width;
        self.options.height = height;
        self.force_keyframe();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, Rgb, Style};

    fn exact_options(width: u16, height: u16) -> RenderOptions {
        RenderOptions {
            threshold: None,
            cache_position: true,
            ..RenderOptions::new(width, height)
        }
    }

    #[test]
    fn zero_dimensions_rejected() {
        let err = Renderer::new(RenderOptions::new(0, 24)).unwrap_err();
        assert!(matches!(err, RenderError::InvalidDimensions { .. }));
    }

    #[test]
    fn bad_threshold_rejected() {
        let mut options = RenderOptions::new(80, 24);
        options.threshold = Some(101.0);
        assert!(matches!(
            Renderer::new(options),
            Err(RenderError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn first_frame_emits_every_cell() {
        let mut renderer = Renderer::new(exact_options(3, 2)).unwrap();
        let out = renderer.render(Frame::new(3, 2)).unwrap();
        let text = String::from_utf8(out).unwrap();
        // Six blank glyphs, at least one cursor move.
        assert_eq!(text.matches(' ').count(), 6);
        assert!(text.contains("\x1b[1;1H"));
    }

    #[test]
    fn identical_second_frame_emits_nothing() {
        let mut renderer = Renderer::new(exact_options(3, 2)).unwrap();
        renderer.render(Frame::new(3, 2)).unwrap();
        let out = renderer.render(Frame::new(3, 2)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn changed_cell_is_the_only_emission() {
        let mut renderer = Renderer::new(exact_options(3, 2)).unwrap();
        renderer.render(Frame::new(3, 2)).unwrap();

        let mut next = Frame::new(3, 2);
        next.set(1, 1, Cell::from_char('X'));
        let out = String::from_utf8(renderer.render(next).unwrap()).unwrap();
        assert!(out.contains('X'));
        assert!(!out.contains(' '), "unchanged blanks not re-emitted: {out:?}");
    }

    #[test]
    fn wrong_dimensions_rejected() {
        let mut renderer = Renderer::new(exact_options(3, 2)).unwrap();
        let err = renderer.render(Frame::new(3, 3)).unwrap_err();
        assert!(matches!(err, RenderError::DimensionMismatch { .. }));
    }

    #[test]
    fn force_keyframe_re_emits_everything() {
        let mut renderer = Renderer::new(exact_options(2, 1)).unwrap();
        renderer.render(Frame::new(2, 1)).unwrap();

        renderer.force_keyframe();
        let out = renderer.render(Frame::new(2, 1)).unwrap();
        assert!(!out.is_empty());
    }

    #[test]
    fn periodic_keyframes_fire_on_interval() {
        let mut options = exact_options(2, 1);
        options.keyframe_interval = 3;
        let mut renderer = Renderer::new(options).unwrap();

        let sizes: Vec<usize> = (0..7)
            .map(|_| renderer.render(Frame::new(2, 1)).unwrap().len())
            .collect();
        // Keyframes at 0, 3, 6; identical in-between frames are empty.
        for (i, size) in sizes.iter().enumerate() {
            if i % 3 == 0 {
                assert!(*size > 0, "frame {i} should be a keyframe");
            } else {
                assert_eq!(*size, 0, "frame {i} should be empty");
            }
        }
    }

    #[test]
    fn perceptual_drift_accumulates_until_rendered() {
        // Darken a cell a little each frame; each step is sub-threshold
        // against the retained frame's last *emitted* value, but the
        // accumulated difference eventually crosses it.
        let mut options = RenderOptions::new(1, 1);
        options.threshold = Some(8.0);
        let mut renderer = Renderer::new(options).unwrap();

        let cell_with_gray = |v: u8| {
            let mut frame = Frame::new(1, 1);
            frame.set(0, 0, Cell::new('#', Style::new().with_fg(Rgb::new(v, v, v))));
            frame
        };

        renderer.render(cell_with_gray(200)).unwrap();

        let mut emitted_any = false;
        let mut v: u8 = 200;
        for _ in 0..20 {
            v -= 8;
            let out = renderer.render(cell_with_gray(v)).unwrap();
            if !out.is_empty() {
                emitted_any = true;
                break;
            }
        }
        assert!(emitted_any, "slow fade must eventually render");
    }

    #[test]
    fn resize_forces_keyframe_and_new_dimensions() {
        let mut renderer = Renderer::new(exact_options(2, 1)).unwrap();
        renderer.render(Frame::new(2, 1)).unwrap();

        renderer.resize(3, 1).unwrap();
        assert!(renderer.render(Frame::new(2, 1)).is_err());
        let out = renderer.render(Frame::new(3, 1)).unwrap();
        assert!(!out.is_empty());
    }
}
