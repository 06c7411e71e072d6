use gridzone_core::{Adjacency, Direction, DistanceMetric, Point};

/// Outcome of a legal move: the new accumulated cost plus one byte of
/// per-edge metadata (typically the movement-mode index used for the step).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub cost: f32,
    pub meta: u8,
}

impl Step {
    #[inline]
    pub const fn new(cost: f32, meta: u8) -> Self {
        Self { cost, meta }
    }
}

/// Traversability and cost oracle shared by every search.
pub trait Pather {
    /// Neighbourhood searched from every cell.
    fn adjacency(&self) -> Adjacency {
        Adjacency::EightWay
    }

    /// Whether a cell can be stood on at all. Used for region labelling.
    fn passable(&self, p: Point) -> bool;

    /// Try to move from `from` one step in `dir` with `cost` accumulated so
    /// far. Returns `None` if the move is illegal.
    ///
    /// The returned cost must not be lower than `cost`.
    fn step(&self, from: Point, dir: Direction, cost: f32) -> Option<Step>;
}

impl<P: Pather + ?Sized> Pather for &P {
    fn adjacency(&self) -> Adjacency {
        (**self).adjacency()
    }

    fn passable(&self, p: Point) -> bool {
        (**self).passable(p)
    }

    fn step(&self, from: Point, dir: Direction, cost: f32) -> Option<Step> {
        (**self).step(from, dir, cost)
    }
}

/// Termination condition and heuristic of an A* search.
pub trait SearchGoal {
    fn is_goal(&self, p: Point) -> bool;

    /// Estimated remaining cost from `p`. Should not overestimate.
    fn estimate(&self, p: Point) -> f32;
}

/// Reach one fixed cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointGoal {
    pub target: Point,
    pub metric: DistanceMetric,
}

impl PointGoal {
    pub const fn new(target: Point, metric: DistanceMetric) -> Self {
        Self { target, metric }
    }
}

impl SearchGoal for PointGoal {
    #[inline]
    fn is_goal(&self, p: Point) -> bool {
        p == self.target
    }

    #[inline]
    fn estimate(&self, p: Point) -> f32 {
        self.metric.distance(p, self.target)
    }
}

/// Goal defined by closures, for moving or multi-cell targets.
pub struct FnGoal<G, H> {
    pub is_goal: G,
    pub estimate: H,
}

impl<G, H> SearchGoal for FnGoal<G, H>
where
    G: Fn(Point) -> bool,
    H: Fn(Point) -> f32,
{
    #[inline]
    fn is_goal(&self, p: Point) -> bool {
        (self.is_goal)(p)
    }

    #[inline]
    fn estimate(&self, p: Point) -> f32 {
        (self.estimate)(p)
    }
}
