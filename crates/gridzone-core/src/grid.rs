//! The [`Grid`] type: a dense 2D array addressed by absolute [`Point`]s.
//!
//! A `Grid` covers one [`Range`] anywhere in coordinate space. Its backing
//! buffer never shrinks: [`resize`](Grid::resize) re-bases the window in place
//! when the new area fits the current capacity and only reallocates when it
//! grows.

use crate::geom::{Point, Range};

/// A dense grid of `T` over a [`Range`].
#[derive(Debug, Clone)]
pub struct Grid<T> {
    cells: Vec<T>,
    bounds: Range,
}

impl<T: Clone> Grid<T> {
    /// Create a grid covering `bounds`, every cell set to `fill`.
    pub fn new(bounds: Range, fill: T) -> Self {
        Self {
            cells: vec![fill; bounds.len()],
            bounds,
        }
    }

    /// Move the grid to `bounds` and reset every visible cell to `fill`.
    ///
    /// Returns `true` if the backing buffer had to be reallocated.
    pub fn resize(&mut self, bounds: Range, fill: T) -> bool {
        let len = bounds.len();
        self.bounds = bounds;
        if len <= self.cells.len() {
            self.cells[..len].fill(fill);
            return false;
        }
        self.cells.clear();
        self.cells.resize(len, fill);
        true
    }

    /// Set every cell to `value`.
    pub fn fill(&mut self, value: T) {
        let len = self.bounds.len();
        self.cells[..len].fill(value);
    }
}

impl<T> Grid<T> {
    /// The area covered by this grid.
    #[inline]
    pub fn bounds(&self) -> Range {
        self.bounds
    }

    /// Number of cells the buffer can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        self.bounds.contains(p)
    }

    /// Read the cell at `p`, or `None` if outside the bounds.
    #[inline]
    pub fn at(&self, p: Point) -> Option<&T> {
        self.bounds.index_of(p).map(|i| &self.cells[i])
    }

    /// Mutable access to the cell at `p`.
    #[inline]
    pub fn at_mut(&mut self, p: Point) -> Option<&mut T> {
        self.bounds.index_of(p).map(|i| &mut self.cells[i])
    }

    /// Set the cell at `p`. Returns `false` (and does nothing) if outside.
    #[inline]
    pub fn set(&mut self, p: Point, value: T) -> bool {
        match self.bounds.index_of(p) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    /// Cells of the visible window in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.cells[..self.bounds.len()]
    }

    /// Row-major iterator over `(Point, &T)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Point, &T)> {
        self.bounds.iter().zip(self.as_slice())
    }
}
