#![forbid(unsafe_code)]

//! Pull-based processing pipeline.
//!
//! A [`Pipeline`] strings together the external collaborators — a frame
//! source (decoder), a glyph renderer (image to full-frame escape blob), a
//! terminal parser (blob to cell grid) — and the differential
//! [`Renderer`](dcast_render::Renderer), exposing the whole chain as an
//! iterator of timestamped escape-sequence payloads. Nothing is buffered
//! ahead: each `next()` pulls exactly one source frame through, so memory
//! use is constant regardless of clip length.
//!
//! Frame-rate decimation happens here, at the source, before any expensive
//! work: a frame arriving less than `1/fps` seconds after the last kept
//! frame is dropped without being glyph-rendered, parsed, or diffed.

use std::fmt;
use std::io;

use dcast_render::{Frame, RenderError, Renderer, Rgb};
use tracing::trace;

/// A value paired with its presentation time in seconds from stream start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timed<T> {
    pub time: f64,
    pub data: T,
}

impl<T> Timed<T> {
    pub const fn new(time: f64, data: T) -> Self {
        Self { time, data }
    }
}

/// A decoded raster: packed RGB bytes, 3 per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbImage {
    /// Build an image from packed RGB bytes.
    ///
    /// Returns `None` when the byte count does not match the dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() == width as usize * height as usize * 3 {
            Some(Self {
                width,
                height,
                data,
            })
        } else {
            None
        }
    }

    /// A solid-color image of the given size.
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..width as usize * height as usize {
            data.extend_from_slice(&[color.r, color.g, color.b]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x < self.width && y < self.height {
            let i = (y as usize * self.width as usize + x as usize) * 3;
            Some(Rgb::new(self.data[i], self.data[i + 1], self.data[i + 2]))
        } else {
            None
        }
    }

    /// Packed RGB bytes, row-major.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Errors from any pipeline stage.
#[derive(Debug)]
pub enum PipelineError {
    Io(io::Error),
    /// Source-side decode failure (corrupt input, codec error).
    Source(String),
    /// Glyph-render or terminal-parse failure.
    Parse(String),
    Render(RenderError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "pipeline i/o failed: {err}"),
            Self::Source(msg) => write!(f, "source decode failed: {msg}"),
            Self::Parse(msg) => write!(f, "frame parse failed: {msg}"),
            Self::Render(err) => write!(f, "render stage failed: {err}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Render(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PipelineError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<RenderError> for PipelineError {
    fn from(err: RenderError) -> Self {
        Self::Render(err)
    }
}

/// Produces timestamped frames on demand, timestamps non-decreasing.
pub trait FrameSource {
    /// The next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Timed<RgbImage>>, PipelineError>;
}

/// Turns a decoded image into a full-frame blob of glyphs and escapes
/// sized for a `cols × rows` grid.
pub trait GlyphRenderer {
    fn render(&mut self, image: &RgbImage, cols: u16, rows: u16)
    -> Result<String, PipelineError>;
}

/// Interprets a full-frame escape blob into a cell grid.
///
/// Parsing happens in an isolated buffer; implementations must not carry
/// state between frames that could leak one frame's content into the next.
pub trait TermParser {
    fn parse(&mut self, blob: &str, cols: u16, rows: u16) -> Result<Frame, PipelineError>;
}

/// The full source-to-bytes chain as a pull iterator.
///
/// Yields `Timed` escape-sequence payloads. A frame that produced no output
/// (nothing changed) still yields, with an empty payload; the cast recorder
/// drops those, while a live player uses them to keep pace.
#[derive(Debug)]
pub struct Pipeline<S, G, P> {
    source: S,
    glyphs: G,
    parser: P,
    renderer: Renderer,
    /// Minimum spacing between kept frames, from the target fps.
    min_interval: Option<f64>,
    last_kept: Option<f64>,
}

impl<S: FrameSource, G: GlyphRenderer, P: TermParser> Pipeline<S, G, P> {
    /// Build a pipeline; `fps` caps the output frame rate, `None` keeps
    /// every source frame.
    pub fn new(source: S, glyphs: G, parser: P, renderer: Renderer, fps: Option<f64>) -> Self {
        Self {
            source,
            glyphs,
            parser,
            renderer,
            min_interval: fps.filter(|f| *f > 0.0).map(|f| 1.0 / f),
            last_kept: None,
        }
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    fn keep(&mut self, time: f64) -> bool {
        match (self.min_interval, self.last_kept) {
            (Some(interval), Some(last)) if time - last < interval => false,
            _ => {
                self.last_kept = Some(time);
                true
            }
        }
    }

    fn pull(&mut self) -> Result<Option<Timed<Vec<u8>>>, PipelineError> {
        loop {
            let Some(frame) = self.source.next_frame()? else {
                return Ok(None);
            };
            if !self.keep(frame.time) {
                trace!(time = frame.time, "frame decimated");
                continue;
            }
            let cols = self.renderer.options().width;
            let rows = self.renderer.options().height;
            let blob = self.glyphs.render(&frame.data, cols, rows)?;
            let grid = self.parser.parse(&blob, cols, rows)?;
            let bytes = self.renderer.render(grid)?;
            trace!(time = frame.time, bytes = bytes.len(), "frame rendered");
            return Ok(Some(Timed::new(frame.time, bytes)));
        }
    }
}

impl<S: FrameSource, G: GlyphRenderer, P: TermParser> Iterator for Pipeline<S, G, P> {
    type Item = Result<Timed<Vec<u8>>, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pull().transpose()
    }
}
