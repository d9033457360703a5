#![forbid(unsafe_code)]

//! Cell and style value types.
//!
//! A [`Cell`] is the atomic renderable unit: one glyph plus the [`Style`]
//! applied to it. Styles are plain value types with structural equality —
//! two styles are equal iff both colors and all seven attribute flags match
//! by value. There is deliberately no coupling to any terminal-emulation
//! library; upstream parsers construct these directly.
//!
//! Wide glyphs are out of scope: every cell holds exactly one column's worth
//! of content.

use bitflags::bitflags;

/// A 24-bit RGB color.
///
/// Absence of a color ("use the terminal default") is modeled as
/// `Option<Rgb>` at the use sites, never as a magic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Quantize to 5 bits per channel (32 levels each).
    ///
    /// Upstream glyph renderers dither, which flips low-order color bits
    /// between otherwise identical frames. Perceptual comparison quantizes
    /// both sides first so that noise scores as zero difference.
    #[inline]
    pub const fn quantized(self) -> Self {
        Self {
            r: self.r & !7,
            g: self.g & !7,
            b: self.b & !7,
        }
    }
}

bitflags! {
    /// Text attribute flags, one bit per SGR attribute.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u8 {
        const BOLD          = 1 << 0;
        const DIM           = 1 << 1;
        const ITALIC        = 1 << 2;
        const UNDERLINE     = 1 << 3;
        const BLINK         = 1 << 4;
        const REVERSE       = 1 << 5;
        const STRIKETHROUGH = 1 << 6;
    }
}

/// Color and attribute state applied to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    /// Foreground color; `None` means "no color set / terminal default".
    pub fg: Option<Rgb>,
    /// Background color; `None` means "no color set / terminal default".
    pub bg: Option<Rgb>,
    /// Attribute flags.
    pub flags: StyleFlags,
}

impl Style {
    #[inline]
    pub const fn new() -> Self {
        Self {
            fg: None,
            bg: None,
            flags: StyleFlags::empty(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn with_fg(mut self, color: Rgb) -> Self {
        self.fg = Some(color);
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_bg(mut self, color: Rgb) -> Self {
        self.bg = Some(color);
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_flags(mut self, flags: StyleFlags) -> Self {
        self.flags = flags;
        self
    }

    /// The colors a viewer actually sees: reverse video swaps fg and bg.
    ///
    /// Perceptual comparison works on effective colors so that a
    /// reverse-video cell scores identical to its pre-swapped twin.
    #[inline]
    pub fn effective_colors(&self) -> (Option<Rgb>, Option<Rgb>) {
        if self.flags.contains(StyleFlags::REVERSE) {
            (self.bg, self.fg)
        } else {
            (self.fg, self.bg)
        }
    }
}

/// One character position in the terminal grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub glyph: char,
    pub style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            glyph: ' ',
            style: Style::new(),
        }
    }
}

impl Cell {
    #[inline]
    pub const fn new(glyph: char, style: Style) -> Self {
        Self { glyph, style }
    }

    /// Cell with the given glyph and default style.
    #[inline]
    pub const fn from_char(glyph: char) -> Self {
        Self {
            glyph,
            style: Style::new(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_equality_is_structural() {
        let a = Style::new()
            .with_fg(Rgb::new(10, 20, 30))
            .with_flags(StyleFlags::BOLD | StyleFlags::UNDERLINE);
        let b = Style::new()
            .with_fg(Rgb::new(10, 20, 30))
            .with_flags(StyleFlags::BOLD | StyleFlags::UNDERLINE);
        assert_eq!(a, b);

        let c = b.with_flags(StyleFlags::BOLD);
        assert_ne!(a, c);
    }

    #[test]
    fn absent_and_present_colors_are_unequal() {
        let a = Style::new();
        let b = Style::new().with_fg(Rgb::BLACK);
        assert_ne!(a, b);
    }

    #[test]
    fn quantize_drops_low_bits() {
        assert_eq!(Rgb::new(255, 7, 8).quantized(), Rgb::new(248, 0, 8));
        assert_eq!(Rgb::new(136, 147, 158).quantized(), Rgb::new(136, 144, 152));
    }

    #[test]
    fn effective_colors_swap_on_reverse() {
        let fg = Rgb::new(1, 2, 3);
        let bg = Rgb::new(4, 5, 6);
        let plain = Style::new().with_fg(fg).with_bg(bg);
        assert_eq!(plain.effective_colors(), (Some(fg), Some(bg)));

        let reversed = plain.with_flags(StyleFlags::REVERSE);
        assert_eq!(reversed.effective_colors(), (Some(bg), Some(fg)));
    }

    #[test]
    fn default_cell_is_blank() {
        let cell = Cell::default();
        assert_eq!(cell.glyph, ' ');
        assert_eq!(cell.style, Style::new());
    }
}
