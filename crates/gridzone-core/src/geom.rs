//! Cell coordinates and rectangular areas.
//!
//! Coordinates are unbounded `i32`s, x growing east and y growing south.
//! Chunk arithmetic ([`Point::div_floor`], [`Point::rem_floor`]) rounds
//! towards negative infinity, so chunk `-1` covers cells `-size..0`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Sub};

use crate::direction::Direction;

/// A cell position.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Self = Self::new(0, 0);

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn shift(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Cardinal neighbours in [`Direction::CARDINALS`] order.
    pub fn neighbors_4(self) -> [Point; 4] {
        Direction::CARDINALS.map(|d| self + d)
    }

    /// All neighbours in [`Direction::ALL`] order.
    pub fn neighbors_8(self) -> [Point; 8] {
        Direction::ALL.map(|d| self + d)
    }

    /// Index of the chunk of size `size` holding this cell.
    ///
    /// `Point::new(-1, 5).div_floor(Point::new(4, 4))` is `(-1, 1)`.
    #[inline]
    pub fn div_floor(self, size: Point) -> Self {
        Self::new(self.x.div_euclid(size.x), self.y.div_euclid(size.y))
    }

    /// Offset of this cell inside its chunk; always non-negative.
    #[inline]
    pub fn rem_floor(self, size: Point) -> Self {
        Self::new(self.x.rem_euclid(size.x), self.y.rem_euclid(size.y))
    }
}

/// Row-major: by `y`, then by `x`.
impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

macro_rules! point_op {
    ($tr:ident, $method:ident, $op:tt, Point) => {
        impl $tr for Point {
            type Output = Point;
            #[inline]
            fn $method(self, rhs: Point) -> Point {
                Point::new(self.x $op rhs.x, self.y $op rhs.y)
            }
        }
    };
    ($tr:ident, $method:ident, $op:tt, i32) => {
        impl $tr<i32> for Point {
            type Output = Point;
            #[inline]
            fn $method(self, rhs: i32) -> Point {
                Point::new(self.x $op rhs, self.y $op rhs)
            }
        }
    };
}

point_op!(Add, add, +, Point);
point_op!(Sub, sub, -, Point);
point_op!(Mul, mul, *, i32);
point_op!(Div, div, /, i32);

/// A half-open rectangle of cells: `min` inclusive, `max` exclusive.
///
/// Every empty range equals every other empty range, and operations that can
/// produce an empty range return `Range::default()`.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub min: Point,
    pub max: Point,
}

impl Range {
    /// Range spanned by two corners in any order.
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min: Point::new(x0.min(x1), y0.min(y1)),
            max: Point::new(x0.max(x1), y0.max(y1)),
        }
    }

    pub fn with_size(origin: Point, size: Point) -> Self {
        let far = origin + size;
        Self::new(origin.x, origin.y, far.x, far.y)
    }

    fn or_empty(self) -> Self {
        if self.is_empty() { Self::default() } else { self }
    }

    #[inline]
    pub fn size(self) -> Point {
        self.max - self.min
    }

    #[inline]
    pub fn width(self) -> i32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(self) -> i32 {
        self.max.y - self.min.y
    }

    /// Number of cells.
    pub fn len(self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.width() as usize * self.height() as usize
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    #[inline]
    pub fn contains(self, p: Point) -> bool {
        (self.min.x..self.max.x).contains(&p.x) && (self.min.y..self.max.y).contains(&p.y)
    }

    /// Whether `p` is inside and on the outer ring of cells.
    pub fn on_border(self, p: Point) -> bool {
        let last = self.max.shift(-1, -1);
        self.contains(p) && (p.x == self.min.x || p.x == last.x || p.y == self.min.y || p.y == last.y)
    }

    /// Move the min corner by `(dx0, dy0)` and the max corner by
    /// `(dx1, dy1)`.
    pub fn shift(self, dx0: i32, dy0: i32, dx1: i32, dy1: i32) -> Self {
        Self {
            min: self.min.shift(dx0, dy0),
            max: self.max.shift(dx1, dy1),
        }
        .or_empty()
    }

    pub fn intersect(self, other: Range) -> Self {
        Self {
            min: Point::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            max: Point::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        }
        .or_empty()
    }

    /// Bounding range of both; an empty side is ignored.
    pub fn union(self, other: Range) -> Self {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => other,
            (_, true) => self,
            _ => Self {
                min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
                max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
            },
        }
    }

    /// Grow to cover cell `p`.
    pub fn include(self, p: Point) -> Self {
        self.union(Range::with_size(p, Point::new(1, 1)))
    }

    /// Row-major offset of `p` from `min`, if inside.
    #[inline]
    pub fn index_of(self, p: Point) -> Option<usize> {
        if !self.contains(p) {
            return None;
        }
        let d = p - self.min;
        Some(d.y as usize * self.width() as usize + d.x as usize)
    }

    /// Cell at row-major offset `idx`; the inverse of
    /// [`index_of`](Self::index_of).
    #[inline]
    pub fn point_at(self, idx: usize) -> Point {
        let w = self.width().max(1) as usize;
        self.min + Point::new((idx % w) as i32, (idx / w) as i32)
    }

    /// Cells in row-major order.
    pub fn iter(self) -> RangeIter {
        RangeIter {
            range: self,
            next: 0,
            len: self.len(),
        }
    }
}

impl PartialEq for Range {
    fn eq(&self, other: &Self) -> bool {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => true,
            (false, false) => self.min == other.min && self.max == other.max,
            _ => false,
        }
    }
}

impl Eq for Range {}

impl Hash for Range {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let r = self.or_empty();
        (r.min, r.max).hash(state);
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{})", self.min, self.max)
    }
}

impl Add<Point> for Range {
    type Output = Range;
    fn add(self, p: Point) -> Range {
        Range {
            min: self.min + p,
            max: self.max + p,
        }
    }
}

impl Sub<Point> for Range {
    type Output = Range;
    fn sub(self, p: Point) -> Range {
        Range {
            min: self.min - p,
            max: self.max - p,
        }
    }
}

impl IntoIterator for Range {
    type Item = Point;
    type IntoIter = RangeIter;
    fn into_iter(self) -> RangeIter {
        self.iter()
    }
}

/// Row-major iterator over the cells of a [`Range`].
#[derive(Clone, Debug)]
pub struct RangeIter {
    range: Range,
    next: usize,
    len: usize,
}

impl Iterator for RangeIter {
    type Item = Point;

    #[inline]
    fn next(&mut self) -> Option<Point> {
        if self.next >= self.len {
            return None;
        }
        let p = self.range.point_at(self.next);
        self.next += 1;
        Some(p)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.len - self.next;
        (n, Some(n))
    }
}

impl ExactSizeIterator for RangeIter {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn point_ops() {
        let a = Point::new(1, 2);
        assert_eq!(a + Point::new(3, 4), Point::new(4, 6));
        assert_eq!(Point::new(3, 4) - a, Point::new(2, 2));
        assert_eq!(a * 3, Point::new(3, 6));
        assert_eq!(Point::new(3, 4) / 2, Point::new(1, 2));
        assert!(Point::new(9, 0) < Point::new(0, 1));
    }

    #[test]
    fn neighbours_follow_direction_order() {
        let p = Point::new(5, 5);
        assert_eq!(p.neighbors_4()[0], Point::new(5, 4));
        assert_eq!(p.neighbors_4()[1], Point::new(6, 5));
        assert_eq!(p.neighbors_8()[1], Point::new(6, 4));
        assert_eq!(p.neighbors_8().iter().collect::<HashSet<_>>().len(), 8);
    }

    #[test]
    fn chunk_arithmetic_on_negative_cells() {
        let size = Point::new(4, 4);
        for (p, chunk, offset) in [
            (Point::new(-1, 5), Point::new(-1, 1), Point::new(3, 1)),
            (Point::new(-4, -5), Point::new(-1, -2), Point::new(0, 3)),
            (Point::new(7, 0), Point::new(1, 0), Point::new(3, 0)),
        ] {
            assert_eq!(p.div_floor(size), chunk);
            assert_eq!(p.rem_floor(size), offset);
            assert_eq!(chunk * 4 + offset, p);
        }
    }

    #[test]
    fn range_shape() {
        let r = Range::new(3, 2, 0, 0);
        assert_eq!((r.min, r.max), (Point::ZERO, Point::new(3, 2)));
        assert_eq!(r.size(), Point::new(3, 2));
        assert_eq!(r.len(), 6);
        assert!(r.contains(Point::new(2, 1)));
        assert!(!r.contains(Point::new(3, 0)));
        assert!(!r.contains(Point::new(0, 2)));
        assert_eq!(Range::with_size(Point::new(-2, 1), Point::new(2, 2)), Range::new(-2, 1, 0, 3));
    }

    #[test]
    fn iteration_matches_indexing() {
        let r = Range::new(-2, 3, 5, 7);
        let cells: Vec<Point> = r.iter().collect();
        assert_eq!(cells.len(), r.len());
        assert_eq!(r.iter().len(), r.len());
        for (i, p) in cells.iter().enumerate() {
            assert_eq!(r.index_of(*p), Some(i));
            assert_eq!(r.point_at(i), *p);
        }
        assert_eq!(cells.first(), Some(&r.min));
        assert_eq!(r.index_of(Point::new(5, 3)), None);
        assert_eq!(Range::default().iter().next(), None);
    }

    #[test]
    fn border_ring() {
        let r = Range::new(0, 0, 4, 4);
        let ring = r.iter().filter(|p| r.on_border(*p)).count();
        assert_eq!(ring, 12);
        assert!(!r.on_border(Point::new(4, 2)));
    }

    #[test]
    fn set_operations() {
        let a = Range::new(0, 0, 4, 4);
        assert_eq!(a.intersect(Range::new(2, 2, 6, 6)), Range::new(2, 2, 4, 4));
        assert_eq!(a.intersect(Range::new(5, 5, 7, 7)), Range::default());
        assert_eq!(a.union(Range::default()), a);
        assert_eq!(Range::default().include(Point::new(3, 3)), Range::new(3, 3, 4, 4));
        assert_eq!(Range::new(0, 0, 2, 2).include(Point::new(4, 1)), Range::new(0, 0, 5, 2));
        assert_eq!(Range::new(1, 1, 3, 3).shift(1, 1, -1, -1), Range::default());
        let p = Point::new(10, 20);
        assert_eq!((a + p) - p, a);
    }

    #[test]
    fn empty_ranges_are_one_value() {
        let odd = Range {
            min: Point::new(5, 5),
            max: Point::new(5, 9),
        };
        assert_eq!(odd, Range::default());
        let set: HashSet<Range> = [odd, Range::default()].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
}
