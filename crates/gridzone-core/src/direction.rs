//! The 8-connected direction vocabulary.
//!
//! [`Direction`] names the eight grid directions plus `None`; [`Adjacency`]
//! picks which of them a movement rule allows, and [`DirectionMask`] packs a
//! set of directions into one byte (used for per-cell connectivity).

use std::fmt;
use std::ops::Add;

use crate::geom::Point;

/// One of the eight grid directions, or `None`.
///
/// North is `-y`, east is `+x`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Direction {
    #[default]
    None = 0,
    North = 1,
    NorthEast = 2,
    East = 3,
    SouthEast = 4,
    South = 5,
    SouthWest = 6,
    West = 7,
    NorthWest = 8,
}

impl Direction {
    /// The eight real directions, clockwise from north.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// North, east, south, west.
    pub const CARDINALS: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// The four diagonal directions, clockwise from north-east.
    pub const DIAGONALS: [Direction; 4] = [
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    /// Unit coordinate delta of one step in this direction.
    #[inline]
    pub const fn delta(self) -> Point {
        match self {
            Direction::None => Point::new(0, 0),
            Direction::North => Point::new(0, -1),
            Direction::NorthEast => Point::new(1, -1),
            Direction::East => Point::new(1, 0),
            Direction::SouthEast => Point::new(1, 1),
            Direction::South => Point::new(0, 1),
            Direction::SouthWest => Point::new(-1, 1),
            Direction::West => Point::new(-1, 0),
            Direction::NorthWest => Point::new(-1, -1),
        }
    }

    /// The opposite direction. `None` is its own inverse.
    #[inline]
    pub const fn inverse(self) -> Self {
        match self {
            Direction::None => Direction::None,
            Direction::North => Direction::South,
            Direction::NorthEast => Direction::SouthWest,
            Direction::East => Direction::West,
            Direction::SouthEast => Direction::NorthWest,
            Direction::South => Direction::North,
            Direction::SouthWest => Direction::NorthEast,
            Direction::West => Direction::East,
            Direction::NorthWest => Direction::SouthEast,
        }
    }

    #[inline]
    pub const fn is_cardinal(self) -> bool {
        matches!(
            self,
            Direction::North | Direction::East | Direction::South | Direction::West
        )
    }

    #[inline]
    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::NorthEast
                | Direction::SouthEast
                | Direction::SouthWest
                | Direction::NorthWest
        )
    }

    /// Index in [`Direction::ALL`], or `None` for [`Direction::None`].
    #[inline]
    pub const fn index(self) -> Option<usize> {
        match self {
            Direction::None => None,
            d => Some(d as usize - 1),
        }
    }

    /// Inverse of [`index`](Self::index). Out-of-range indices map to `None`.
    #[inline]
    pub const fn from_index(idx: usize) -> Self {
        if idx < 8 { Self::ALL[idx] } else { Direction::None }
    }

    /// Compact byte code (0 = `None`, 1..=8 clockwise from north).
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Inverse of [`code`](Self::code).
    #[inline]
    pub const fn from_code(code: u8) -> Self {
        if code == 0 || code > 8 {
            Direction::None
        } else {
            Self::ALL[code as usize - 1]
        }
    }

    /// Classify an arbitrary delta by the sign of each axis.
    ///
    /// `(5, -2)` is north-east, `(0, 3)` is south, `(0, 0)` is `None`.
    #[inline]
    pub fn from_delta(dx: i32, dy: i32) -> Self {
        match (dx.signum(), dy.signum()) {
            (0, -1) => Direction::North,
            (1, -1) => Direction::NorthEast,
            (1, 0) => Direction::East,
            (1, 1) => Direction::SouthEast,
            (0, 1) => Direction::South,
            (-1, 1) => Direction::SouthWest,
            (-1, 0) => Direction::West,
            (-1, -1) => Direction::NorthWest,
            _ => Direction::None,
        }
    }

    /// Direction from `from` towards `to`, see [`from_delta`](Self::from_delta).
    #[inline]
    pub fn between(from: Point, to: Point) -> Self {
        Self::from_delta(to.x - from.x, to.y - from.y)
    }

    /// Bit of this direction inside a [`DirectionMask`]; 0 for `None`.
    #[inline]
    pub const fn bit(self) -> u8 {
        match self.index() {
            Some(i) => 1 << i,
            None => 0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::None => "-",
            Direction::North => "N",
            Direction::NorthEast => "NE",
            Direction::East => "E",
            Direction::SouthEast => "SE",
            Direction::South => "S",
            Direction::SouthWest => "SW",
            Direction::West => "W",
            Direction::NorthWest => "NW",
        };
        f.write_str(s)
    }
}

impl Add<Direction> for Point {
    type Output = Point;

    #[inline]
    fn add(self, d: Direction) -> Point {
        self + d.delta()
    }
}

// ---------------------------------------------------------------------------
// Adjacency
// ---------------------------------------------------------------------------

/// Which neighbours count as adjacent.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Adjacency {
    /// Only the four cardinal neighbours.
    Cardinal,
    /// Only the four diagonal neighbours.
    Diagonal,
    /// All eight neighbours.
    #[default]
    EightWay,
}

impl Adjacency {
    /// Allowed directions, cardinals before diagonals.
    ///
    /// Searches expand neighbours in this order, which biases equal-cost
    /// ties towards straight moves.
    #[inline]
    pub const fn directions(self) -> &'static [Direction] {
        const EIGHT: [Direction; 8] = [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
            Direction::NorthEast,
            Direction::SouthEast,
            Direction::SouthWest,
            Direction::NorthWest,
        ];
        match self {
            Adjacency::Cardinal => &Direction::CARDINALS,
            Adjacency::Diagonal => &Direction::DIAGONALS,
            Adjacency::EightWay => &EIGHT,
        }
    }

    #[inline]
    pub const fn allows(self, d: Direction) -> bool {
        match self {
            Adjacency::Cardinal => d.is_cardinal(),
            Adjacency::Diagonal => d.is_diagonal(),
            Adjacency::EightWay => d.is_cardinal() || d.is_diagonal(),
        }
    }

    /// Neighbours of `p` under this rule, in [`directions`](Self::directions) order.
    pub fn neighbors(self, p: Point) -> impl Iterator<Item = (Direction, Point)> {
        self.directions().iter().map(move |&d| (d, p + d))
    }
}

// ---------------------------------------------------------------------------
// DirectionMask
// ---------------------------------------------------------------------------

/// A set of directions packed into one byte.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectionMask(pub u8);

impl DirectionMask {
    pub const EMPTY: Self = Self(0);
    pub const ALL: Self = Self(0xFF);
    pub const CARDINALS: Self = Self(0b0101_0101);

    #[inline]
    pub const fn with(self, d: Direction) -> Self {
        Self(self.0 | d.bit())
    }

    #[inline]
    pub const fn without(self, d: Direction) -> Self {
        Self(self.0 & !d.bit())
    }

    #[inline]
    pub const fn contains(self, d: Direction) -> bool {
        let bit = d.bit();
        bit != 0 && self.0 & bit == bit
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Directions in the set, clockwise from north.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl FromIterator<Direction> for DirectionMask {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, |m, d| m.with(d))
    }
}
