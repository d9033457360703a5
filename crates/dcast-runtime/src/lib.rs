#![forbid(unsafe_code)]

//! Runtime plumbing: the source-to-bytes pipeline and the cast recording
//! format.

pub mod cast;
pub mod pipe;

pub use cast::{CastError, CastHeader, CastReader, CastRecorder};
pub use pipe::{FrameSource, GlyphRenderer, Pipeline, PipelineError, RgbImage, TermParser, Timed};
