#![forbid(unsafe_code)]

//! Fixed-size cell grid.
//!
//! Cells are stored row-major in a single `Vec` so the diff scan walks
//! memory sequentially. Dimensions are fixed for the lifetime of a render
//! session; a resize means a new `Frame` and a forced keyframe upstream.

use crate::cell::Cell;

/// A full terminal frame: `width × height` cells, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Frame {
    /// Create a cleared frame (every cell a blank with default style).
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width as usize * height as usize],
        }
    }

    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Get a cell, or `None` if out of bounds.
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if x < self.width && y < self.height {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// Get a cell without a bounds check beyond the slice index itself.
    ///
    /// Callers iterate within `0..width`/`0..height`; anything else is a bug.
    #[inline]
    pub fn get_unchecked(&self, x: u16, y: u16) -> &Cell {
        debug_assert!(x < self.width && y < self.height, "cell out of bounds");
        &self.cells[self.index(x, y)]
    }

    /// Overwrite a cell. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.cells[idx] = cell;
        }
    }

    /// Reset every cell to the blank default.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Raw cell slice, row-major.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}
