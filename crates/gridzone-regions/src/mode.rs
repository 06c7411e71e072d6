//! Movement modes and the registry of active (mode, metric) partitions.

use std::fmt;

use gridzone_core::{Adjacency, Direction, DistanceMetric, Point, Range, TiledGrid};
use gridzone_paths::{Pather, Step};

use crate::zone::{ZoneCell, ZoneId};

/// Index of a movement mode, stored per path step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeId(pub u8);

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// A way of moving across terrain (walking, flying, swimming, ...).
///
/// Modes are compared by [`id`](Self::id).
pub trait MovementMode {
    fn id(&self) -> ModeId;

    /// Cost factor of entering `p`, or `None` if this mode cannot stand there.
    fn cost(&self, p: Point) -> Option<f32>;

    fn passable(&self, p: Point) -> bool {
        self.cost(p).is_some()
    }

    /// Cost of one step from `from` in `dir`: the metric's base step cost
    /// times the cost factor of the entered cell.
    fn step(&self, from: Point, dir: Direction, metric: DistanceMetric) -> Option<f32> {
        Some(metric.step_cost(dir)? * self.cost(from + dir)?)
    }
}

/// A movement mode backed by a closure.
pub struct FnMode<F> {
    id: ModeId,
    cost: F,
}

impl<F: Fn(Point) -> Option<f32>> FnMode<F> {
    pub fn new(id: ModeId, cost: F) -> Self {
        Self { id, cost }
    }
}

impl<F: Fn(Point) -> Option<f32>> MovementMode for FnMode<F> {
    fn id(&self) -> ModeId {
        self.id
    }

    fn cost(&self, p: Point) -> Option<f32> {
        (self.cost)(p)
    }
}

/// Source of movement modes and of the (mode, metric) pairs whose path data
/// should be maintained.
pub trait ModeRegistry {
    fn active(&self) -> Vec<(ModeId, DistanceMetric)>;

    fn mode(&self, id: ModeId) -> Option<&dyn MovementMode>;
}

struct ModeEntry {
    mode: Box<dyn MovementMode>,
    metrics: Vec<DistanceMetric>,
}

/// A plain registry: each mode with the metrics it is used under.
#[derive(Default)]
pub struct ModeTable {
    entries: Vec<ModeEntry>,
}

impl fmt::Debug for ModeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.mode.id(), &e.metrics)))
            .finish()
    }
}

impl ModeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `mode` under `metrics`.
    ///
    /// # Panics
    ///
    /// Panics if a mode with the same id is already registered.
    pub fn with<M: MovementMode + 'static>(mut self, mode: M, metrics: &[DistanceMetric]) -> Self {
        self.register(mode, metrics);
        self
    }

    /// See [`with`](Self::with).
    pub fn register<M: MovementMode + 'static>(&mut self, mode: M, metrics: &[DistanceMetric]) {
        let id = mode.id();
        assert!(
            self.entries.iter().all(|e| e.mode.id() != id),
            "movement mode {id} registered twice"
        );
        let mut metrics = metrics.to_vec();
        metrics.sort();
        metrics.dedup();
        self.entries.push(ModeEntry {
            mode: Box::new(mode),
            metrics,
        });
    }

    /// Replace the metrics `id` is active under. Returns `false` for an
    /// unknown mode.
    pub fn set_metrics(&mut self, id: ModeId, metrics: &[DistanceMetric]) -> bool {
        match self.entries.iter_mut().find(|e| e.mode.id() == id) {
            Some(e) => {
                e.metrics = metrics.to_vec();
                e.metrics.sort();
                e.metrics.dedup();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: ModeId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.mode.id() != id);
        self.entries.len() != before
    }
}

impl ModeRegistry for ModeTable {
    fn active(&self) -> Vec<(ModeId, DistanceMetric)> {
        self.entries
            .iter()
            .flat_map(|e| e.metrics.iter().map(move |m| (e.mode.id(), *m)))
            .collect()
    }

    fn mode(&self, id: ModeId) -> Option<&dyn MovementMode> {
        self.entries
            .iter()
            .find(|e| e.mode.id() == id)
            .map(|e| e.mode.as_ref())
    }
}

/// Adapts a movement mode and metric to the search primitives, optionally
/// confined to a rectangle and to one zone.
///
/// Step metadata carries the mode id.
#[derive(Clone, Copy)]
pub struct ModePather<'a> {
    mode: &'a dyn MovementMode,
    metric: DistanceMetric,
    bounds: Option<Range>,
    zone: Option<(&'a TiledGrid<ZoneCell>, ZoneId)>,
}

impl<'a> ModePather<'a> {
    pub fn new(mode: &'a dyn MovementMode, metric: DistanceMetric) -> Self {
        Self {
            mode,
            metric,
            bounds: None,
            zone: None,
        }
    }

    /// Treat cells outside `bounds` as impassable. Nested calls intersect.
    pub fn within(mut self, bounds: Range) -> Self {
        self.bounds = Some(match self.bounds {
            Some(b) => b.intersect(bounds),
            None => bounds,
        });
        self
    }

    /// Like [`within`](Self::within) for an optional bound.
    pub fn within_opt(self, bounds: Option<Range>) -> Self {
        match bounds {
            Some(b) => self.within(b),
            None => self,
        }
    }

    /// Treat cells not labelled `zone` in `cells` as impassable.
    pub fn in_zone(mut self, cells: &'a TiledGrid<ZoneCell>, zone: ZoneId) -> Self {
        self.zone = Some((cells, zone));
        self
    }
}

impl Pather for ModePather<'_> {
    fn adjacency(&self) -> Adjacency {
        self.metric.adjacency()
    }

    fn passable(&self, p: Point) -> bool {
        if self.bounds.is_some_and(|b| !b.contains(p)) {
            return false;
        }
        if let Some((cells, zone)) = self.zone {
            if cells.get(p).map(|c| c.zone) != Some(zone) {
                return false;
            }
        }
        self.mode.passable(p)
    }

    fn step(&self, from: Point, dir: Direction, cost: f32) -> Option<Step> {
        if !self.passable(from + dir) {
            return None;
        }
        let c = self.mode.step(from, dir, self.metric)?;
        Some(Step::new(cost + c, self.mode.id().0))
    }
}
