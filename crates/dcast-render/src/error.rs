#![forbid(unsafe_code)]

//! Render error taxonomy.

use std::fmt;
use std::io;

/// Convenience alias for render results.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors surfaced by the diff and render layer.
#[derive(Debug)]
pub enum RenderError {
    /// A frame's dimensions do not match the renderer's configured grid.
    DimensionMismatch {
        expected: (u16, u16),
        actual: (u16, u16),
    },
    /// A perceptual threshold outside the valid 0–100 range.
    InvalidThreshold(f64),
    /// A zero-width or zero-height grid.
    InvalidDimensions { width: u16, height: u16 },
    /// Underlying write failure while emitting escape sequences.
    Io(io::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "frame dimension mismatch: expected {}x{}, got {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
            Self::InvalidThreshold(t) => {
                write!(f, "perceptual threshold {t} outside 0.0..=100.0")
            }
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid grid dimensions {width}x{height}")
            }
            Self::Io(err) => write!(f, "escape stream write failed: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for RenderError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
