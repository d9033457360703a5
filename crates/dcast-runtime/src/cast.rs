#![forbid(unsafe_code)]

//! Cast recording format (asciicast v2 shape).
//!
//! A cast file is newline-delimited JSON compatible with asciinema-player:
//! the first line is a header object, every following line an event array
//! `[time, "o", data]` with `time` in seconds from playback start.
//!
//! Conventions on the write side:
//!
//! - Event times are rounded to 4 decimal places.
//! - Bare `\n` in payload data becomes `\r\n`, since players run the
//!   terminal in a mode where a lone line feed does not return the carriage.
//! - Events with empty payloads are skipped entirely; a frame that changed
//!   nothing contributes no line.
//!
//! The read side accepts only version-2 headers and ignores event kinds
//! other than `"o"` (input events from real recordings carry no output).

use std::fmt;
use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};
use tracing::{info, trace};

/// Cast header: the first line of a recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastHeader {
    pub version: u32,
    pub width: u16,
    pub height: u16,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Errors from reading or writing cast streams.
#[derive(Debug)]
pub enum CastError {
    Io(io::Error),
    Json(serde_json::Error),
    /// Header declared a version this reader does not understand.
    UnsupportedVersion(u32),
    /// An event line that is not a `[time, kind, data]` triple.
    MalformedEvent(String),
}

impl fmt::Display for CastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cast i/o failed: {err}"),
            Self::Json(err) => write!(f, "cast line is not valid JSON: {err}"),
            Self::UnsupportedVersion(v) => {
                write!(f, "unsupported cast version {v} (expected 2)")
            }
            Self::MalformedEvent(line) => write!(f, "malformed cast event: {line}"),
        }
    }
}

impl std::error::Error for CastError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for CastError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for CastError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Round an event time to the 4 decimal places the format carries.
#[inline]
fn round_time(time: f64) -> f64 {
    (time * 10_000.0).round() / 10_000.0
}

/// Convert bare `\n` to `\r\n`, leaving existing `\r\n` pairs alone.
fn normalize_newlines(data: &str) -> String {
    let mut out = String::with_capacity(data.len());
    let mut prev_cr = false;
    for ch in data.chars() {
        if ch == '\n' && !prev_cr {
            out.push('\r');
        }
        prev_cr = ch == '\r';
        out.push(ch);
    }
    out
}

/// Records output events in cast format.
#[derive(Debug)]
pub struct CastRecorder<W: Write> {
    output: W,
    event_count: u64,
}

impl<W: Write> CastRecorder<W> {
    /// Write the header and return a recorder for the event lines.
    pub fn with_writer(
        mut output: W,
        width: u16,
        height: u16,
        timestamp: i64,
        title: Option<String>,
    ) -> Result<Self, CastError> {
        let header = CastHeader {
            version: 2,
            width,
            height,
            timestamp,
            title,
        };
        serde_json::to_writer(&mut output, &header)?;
        output.write_all(b"\n")?;
        info!(width, height, timestamp, "cast recording started");
        Ok(Self {
            output,
            event_count: 0,
        })
    }

    /// Record one output event at `time` seconds from start.
    ///
    /// Empty payloads are skipped.
    pub fn record(&mut self, time: f64, data: &[u8]) -> Result<(), CastError> {
        if data.is_empty() {
            return Ok(());
        }
        let text = normalize_newlines(&String::from_utf8_lossy(data));
        let event = (round_time(time), "o", text);
        serde_json::to_writer(&mut self.output, &event)?;
        self.output.write_all(b"\n")?;
        self.event_count += 1;
        trace!(bytes = data.len(), time, "cast event recorded");
        Ok(())
    }

    /// Number of events recorded so far.
    #[must_use]
    pub const fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Flush and return the inner writer.
    pub fn finish(mut self) -> Result<W, CastError> {
        self.output.flush()?;
        info!(events = self.event_count, "cast recording complete");
        Ok(self.output)
    }
}

/// One decoded event line.
#[derive(Debug, Deserialize)]
struct RawEvent(f64, String, String);

/// Reads a cast stream: header first, then output events in order.
#[derive(Debug)]
pub struct CastReader<R: BufRead> {
    input: R,
    header: CastHeader,
    line: String,
}

impl<R: BufRead> CastReader<R> {
    /// Parse the header line and validate the version.
    pub fn new(mut input: R) -> Result<Self, CastError> {
        let mut line = String::new();
        input.read_line(&mut line)?;
        let header: CastHeader = serde_json::from_str(line.trim_end())?;
        if header.version != 2 {
            return Err(CastError::UnsupportedVersion(header.version));
        }
        Ok(Self {
            input,
            header,
            line: String::new(),
        })
    }

    pub fn header(&self) -> &CastHeader {
        &self.header
    }

    /// Next output event as `(time, data)`, or `None` at end of stream.
    ///
    /// Non-output events (e.g. `"i"` input lines from real recordings) are
    /// skipped transparently.
    pub fn next_output(&mut self) -> Result<Option<(f64, String)>, CastError> {
        loop {
            self.line.clear();
            if self.input.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            let trimmed = self.line.trim_end();
            if trimmed.is_empty() {
                continue;
            }
            let event: RawEvent = serde_json::from_str(trimmed)
                .map_err(|_| CastError::MalformedEvent(trimmed.to_owned()))?;
            if event.1 == "o" {
                return Ok(Some((event.0, event.2)));
            }
        }
    }
}

impl<R: BufRead> Iterator for CastReader<R> {
    type Item = Result<(f64, String), CastError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_output().transpose()
    }
}
