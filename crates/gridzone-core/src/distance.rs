use crate::direction::{Adjacency, Direction};
use crate::geom::Point;

/// Manhattan (L1) distance between two points.
#[inline]
pub fn manhattan(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Chebyshev (L∞) distance between two points.
#[inline]
pub fn chebyshev(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

/// Euclidean (L2) distance between two points.
#[inline]
pub fn euclidean(a: Point, b: Point) -> f32 {
    let dx = (a.x - b.x) as f32;
    let dy = (a.y - b.y) as f32;
    (dx * dx + dy * dy).sqrt()
}

/// Cost and adjacency model of a movement.
///
/// The metric decides which neighbours exist ([`adjacency`](Self::adjacency))
/// and what a single step costs on uniform terrain. It never changes which
/// cells are passable.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistanceMetric {
    /// 8-way movement, diagonal steps cost √2.
    Euclidean,
    /// 4-way movement.
    Manhattan,
    /// 8-way movement, every step costs 1.
    #[default]
    Chebyshev,
}

impl DistanceMetric {
    pub const ALL: [DistanceMetric; 3] = [
        DistanceMetric::Euclidean,
        DistanceMetric::Manhattan,
        DistanceMetric::Chebyshev,
    ];

    /// Neighbourhood implied by the metric.
    #[inline]
    pub const fn adjacency(self) -> Adjacency {
        match self {
            DistanceMetric::Manhattan => Adjacency::Cardinal,
            DistanceMetric::Euclidean | DistanceMetric::Chebyshev => Adjacency::EightWay,
        }
    }

    /// Distance between two points; an admissible estimate for uniform
    /// terrain under this metric.
    #[inline]
    pub fn distance(self, a: Point, b: Point) -> f32 {
        match self {
            DistanceMetric::Manhattan => manhattan(a, b) as f32,
            DistanceMetric::Chebyshev => chebyshev(a, b) as f32,
            DistanceMetric::Euclidean => euclidean(a, b),
        }
    }

    /// Cost of one step in `d` on uniform terrain, or `None` if the metric
    /// does not allow moving that way.
    #[inline]
    pub fn step_cost(self, d: Direction) -> Option<f32> {
        if !self.adjacency().allows(d) {
            return None;
        }
        match self {
            DistanceMetric::Euclidean if d.is_diagonal() => Some(std::f32::consts::SQRT_2),
            _ => Some(1.0),
        }
    }
}
