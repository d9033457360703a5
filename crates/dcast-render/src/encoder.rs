#![forbid(unsafe_code)]

//! Stateful escape-sequence encoder.
//!
//! Tracks what the terminal is assumed to currently have — cursor position
//! and active style — and emits only the sequences needed to reach the
//! target state for each cell. Both caches are `Option`: `None` means
//! "unknown, must emit", which is the state after construction, [`reset`],
//! or anything that invalidates assumptions (a keyframe, an external write
//! to the terminal).
//!
//! # Cursor cache
//!
//! The cache holds the *post-advance* position: after printing a glyph at
//! `(x, y)` the terminal cursor sits at `(x + 1, y)`. A target cell whose
//! position equals the cached value needs no positioning sequence, which
//! covers both "cursor is already there" and "cell follows the previous one
//! on the same row" with a single equality check.
//!
//! # Style cache
//!
//! Style emission has three cases:
//!
//! 1. Target equals the cached style: emit nothing.
//! 2. Attribute flags differ (or no style is cached): SGR reset, then
//!    rebuild flags and both colors from scratch. Resetting is the only
//!    reliable way to *remove* an attribute across terminals.
//! 3. Flags match but colors differ: emit only the changed color channels,
//!    using the default-color sequences when a channel goes from explicit
//!    to absent. No reset, so unchanged attributes survive.

use std::io::{self, Write};

use crate::ansi;
use crate::cell::{Cell, Style};

/// Toggles for the encoder's two caches.
///
/// Disabling a cache makes the encoder emit the corresponding sequences for
/// every cell. Correctness is unaffected; only stream size grows. Useful
/// when the output is replayed from arbitrary positions (seeking) where
/// assumed state would be wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Skip cursor positioning when the cursor is already at the target.
    pub cache_position: bool,
    /// Skip style sequences when the active style already matches.
    pub cache_style: bool,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            cache_position: true,
            cache_style: true,
        }
    }
}

/// Stateful generator of minimal escape sequences.
#[derive(Debug)]
pub struct Encoder {
    options: EncoderOptions,
    /// Assumed cursor position after the last emitted glyph; `None` = unknown.
    cursor: Option<(u16, u16)>,
    /// Assumed active style; `None` = unknown.
    style: Option<Style>,
}

impl Encoder {
    pub fn new(options: EncoderOptions) -> Self {
        Self {
            options,
            cursor: None,
            style: None,
        }
    }

    /// Forget all assumed terminal state.
    ///
    /// Call when the terminal was touched outside this encoder.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.style = None;
    }

    /// Emit the sequences that draw `cell` at `(x, y)`, updating the caches.
    pub fn encode_cell<W: Write>(
        &mut self,
        w: &mut W,
        x: u16,
        y: u16,
        cell: &Cell,
    ) -> io::Result<()> {
        self.emit_cursor_movement(w, x, y)?;
        self.emit_style_changes(w, &cell.style)?;

        let mut glyph_buf = [0u8; 4];
        w.write_all(cell.glyph.encode_utf8(&mut glyph_buf).as_bytes())?;

        self.cursor = Some((x + 1, y));
        self.style = Some(cell.style);
        Ok(())
    }

    fn emit_cursor_movement<W: Write>(&mut self, w: &mut W, x: u16, y: u16) -> io::Result<()> {
        if self.options.cache_position && self.cursor == Some((x, y)) {
            return Ok(());
        }
        ansi::cup(w, y, x)
    }

    fn emit_style_changes<W: Write>(&mut self, w: &mut W, target: &Style) -> io::Result<()> {
        if self.options.cache_style {
            match self.style {
                Some(current) if current == *target => return Ok(()),
                Some(current) if current.flags == target.flags => {
                    // Colors-only delta keeps the attribute state intact.
                    if current.fg != target.fg {
                        emit_fg(w, target.fg)?;
                    }
                    if current.bg != target.bg {
                        emit_bg(w, target.bg)?;
                    }
                    return Ok(());
                }
                _ => {}
            }
        }

        // Unknown state, flags changed, or caching disabled: rebuild fully.
        ansi::sgr_reset(w)?;
        ansi::sgr_flags(w, target.flags)?;
        if target.fg.is_some() {
            emit_fg(w, target.fg)?;
        }
        if target.bg.is_some() {
            emit_bg(w, target.bg)?;
        }
        Ok(())
    }
}

fn emit_fg<W: Write>(w: &mut W, color: Option<crate::cell::Rgb>) -> io::Result<()> {
    match color {
        Some(c) => ansi::sgr_fg_rgb(w, c.r, c.g, c.b),
        None => ansi::sgr_fg_default(w),
    }
}

fn emit_bg<W: Write>(w: &mut W, color: Option<crate::cell::Rgb>) -> io::Result<()> {
    match color {
        Some(c) => ansi::sgr_bg_rgb(w, c.r, c.g, c.b),
        None => ansi::sgr_bg_default(w),
    }
}
