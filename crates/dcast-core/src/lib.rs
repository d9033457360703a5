#![forbid(unsafe_code)]

//! Terminal lifecycle for live playback.

pub mod session;

pub use session::{PlaybackSession, SessionOptions};
