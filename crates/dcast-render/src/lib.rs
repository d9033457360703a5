#![forbid(unsafe_code)]

//! Differential render kernel: cells, frames, perceptual diffs, and minimal
//! ANSI emission.
//!
//! The crate turns a sequence of full-frame character grids into the smallest
//! escape-sequence stream that transforms what a terminal currently shows
//! into each new frame. It has no terminal backend dependency; output is raw
//! bytes that a player or recorder consumes.
//!
//! Pipeline position: an upstream renderer produces a full-frame glyph grid
//! ([`frame::Frame`]), [`diff::FrameDiff`] compares it against the retained
//! previous frame, [`encoder::Encoder`] emits only the changed cells, and
//! [`renderer::Renderer`] owns the previous-frame buffer, keyframes, and
//! drift correction.

pub mod ansi;
pub mod cell;
pub mod diff;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod lab;
pub mod perceptual;
pub mod renderer;

pub use cell::{Cell, Rgb, Style, StyleFlags};
pub use diff::{ChangeRun, DiffPolicy, FrameDiff};
pub use encoder::{Encoder, EncoderOptions};
pub use error::{RenderError, RenderResult};
pub use frame::Frame;
pub use perceptual::{DISTANCE_NORM, visual_difference};
pub use renderer::{RenderOptions, Renderer};
