//! The region graph: one [`ZoneLayer`] per active (mode, metric) pair, and
//! hierarchical path queries over it.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use gridzone_core::{Direction, DistanceMetric, Point};
use gridzone_paths::{PathStep, SearchResult, SearchStatus};

use crate::config::RegionConfig;
use crate::edge::{RegionEdge, ZoneConnections};
use crate::layer::ZoneLayer;
use crate::mode::{ModeId, ModeRegistry, MovementMode};
use crate::segment::PathSegment;
use crate::zone::{DirtyState, GlobalZoneId, ZoneEdgeKey, ZoneInfo};

/// Zone data for every active (movement mode, distance metric) pair.
pub struct RegionGraph<R: ModeRegistry> {
    registry: R,
    config: RegionConfig,
    layers: HashMap<(ModeId, DistanceMetric), ZoneLayer>,
}

impl<R: ModeRegistry> RegionGraph<R> {
    pub fn new(registry: R, config: RegionConfig) -> Self {
        let mut graph = Self {
            registry,
            config,
            layers: HashMap::new(),
        };
        graph.sync_layers();
        graph
    }

    #[inline]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Mutable access to the registry. Call [`sync_layers`](Self::sync_layers)
    /// after changing which pairs are active.
    #[inline]
    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    #[inline]
    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// Create layers for newly active pairs and drop layers of pairs no
    /// longer active.
    pub fn sync_layers(&mut self) {
        let active = self.registry.active();
        self.layers.retain(|key, layer| {
            let keep = active.contains(key);
            if !keep {
                layer.clear();
                log::debug!("dropped layer {}/{:?}", key.0, key.1);
            }
            keep
        });
        for (mode, metric) in active {
            self.layers
                .entry((mode, metric))
                .or_insert_with(|| ZoneLayer::new(mode, metric, self.config));
        }
    }

    pub fn layer(&self, mode: ModeId, metric: DistanceMetric) -> Option<&ZoneLayer> {
        self.layers.get(&(mode, metric))
    }

    pub fn layer_mut(&mut self, mode: ModeId, metric: DistanceMetric) -> Option<&mut ZoneLayer> {
        self.layers.get_mut(&(mode, metric))
    }

    /// Active (mode, metric) pairs, sorted.
    pub fn keys(&self) -> Vec<(ModeId, DistanceMetric)> {
        let mut keys: Vec<_> = self.layers.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Decompose `chunk` in every layer where it is missing or dirty. Returns
    /// the number of layers that decomposed.
    pub fn ensure_chunk(&mut self, chunk: Point) -> usize {
        let mut n = 0;
        for ((id, _), layer) in self.layers.iter_mut() {
            if let Some(mode) = self.registry.mode(*id) {
                if layer.ensure_chunk(mode, chunk) {
                    n += 1;
                }
            }
        }
        n
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    pub fn zones(&self, mode: ModeId, metric: DistanceMetric, chunk: Point) -> Option<&[ZoneInfo]> {
        self.layer(mode, metric)?.zones(chunk)
    }

    pub fn path_data(&self, key: ZoneEdgeKey) -> Option<&ZoneConnections> {
        self.layer(key.mode, key.metric)?.path_data(key.zone)
    }

    pub fn edges(&self, mode: ModeId, metric: DistanceMetric, chunk: Point) -> Vec<RegionEdge> {
        self.layer(mode, metric)
            .map(|l| l.edges(chunk))
            .unwrap_or_default()
    }

    /// Cached or freshly computed segment inside `key.zone`.
    pub fn segment(&mut self, key: ZoneEdgeKey, entry: Point, exit: Point) -> Option<&PathSegment> {
        let mode = self.registry.mode(key.mode)?;
        self.layers
            .get_mut(&(key.mode, key.metric))?
            .segment(mode, key.zone, entry, exit)
    }

    // -----------------------------------------------------------------------
    // Invalidation
    // -----------------------------------------------------------------------

    /// Terrain at `p` changed, in every layer.
    pub fn mark_dirty(&mut self, p: Point) {
        for layer in self.layers.values_mut() {
            layer.mark_dirty(p);
        }
    }

    pub fn mark_chunk_dirty(&mut self, chunk: Point, state: DirtyState) {
        for layer in self.layers.values_mut() {
            layer.mark_chunk_dirty(chunk, state);
        }
    }

    pub fn invalidate_zone(&mut self, key: ZoneEdgeKey) -> bool {
        self.layers
            .get_mut(&(key.mode, key.metric))
            .is_some_and(|l| l.invalidate_zone(key.zone))
    }

    /// Unload `chunk` from every layer. Returns the number of layers that
    /// had it loaded.
    pub fn unload_chunk(&mut self, chunk: Point) -> usize {
        self.layers
            .values_mut()
            .map(|l| l.unload_chunk(chunk))
            .filter(|&unloaded| unloaded)
            .count()
    }

    /// Unload chunks marked for removal in every layer.
    pub fn unload_marked(&mut self) -> usize {
        self.layers.values_mut().map(ZoneLayer::unload_marked).sum()
    }

    pub fn clear(&mut self) {
        for layer in self.layers.values_mut() {
            layer.clear();
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Path from `start` to `goal` for one movement mode and metric.
    ///
    /// Runs A* over (zone, entry cell) nodes: each expansion either finishes
    /// inside the goal zone or leaves through one of the zone's outbound
    /// edges, costing the cached in-zone segment plus the crossing step.
    /// Chunks are decomposed on demand: the start and goal chunks up front,
    /// and a neighbouring chunk just before the first expansion whose zone
    /// reaches the shared border. A chunk is therefore up to date before any
    /// abstract node refers to its zones, and later refreshes of the same
    /// chunk are no-ops, so zone ids stay stable for the whole query. Dirty
    /// chunks beyond the zones the search reaches are left alone.
    ///
    /// The abstract search expands at most [`RegionConfig::query_budget`]
    /// nodes; like the grid search it returns the best partial path when the
    /// goal is not reached.
    pub fn find_path(
        &mut self,
        mode: ModeId,
        metric: DistanceMetric,
        start: Point,
        goal: Point,
    ) -> SearchResult {
        let Some(m) = self.registry.mode(mode) else {
            return SearchResult::empty(SearchStatus::NotFound, start);
        };
        let Some(layer) = self.layers.get_mut(&(mode, metric)) else {
            return SearchResult::empty(SearchStatus::NotFound, start);
        };
        let budget = layer.config().query_budget;
        AbstractSearch::default().run(layer, m, start, goal, budget)
    }
}

// ---------------------------------------------------------------------------
// Abstract search
// ---------------------------------------------------------------------------

const NO_PARENT: usize = usize::MAX;

#[derive(Clone, Copy)]
enum Via {
    Start,
    Edge(RegionEdge),
    Goal,
}

struct AbstractNode {
    zone: GlobalZoneId,
    entry: Point,
    g: f32,
    parent: usize,
    via: Via,
    closed: bool,
}

struct Frontier {
    idx: usize,
    g: f32,
    f: f32,
    seq: u64,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
struct AbstractSearch {
    nodes: Vec<AbstractNode>,
    index: HashMap<(GlobalZoneId, Point), usize>,
    open: BinaryHeap<Frontier>,
    seq: u64,
}

impl AbstractSearch {
    fn relax(&mut self, zone: GlobalZoneId, entry: Point, g: f32, h: f32, parent: usize, via: Via) {
        let idx = match self.index.get(&(zone, entry)) {
            Some(&i) => {
                let n = &mut self.nodes[i];
                if n.closed || g >= n.g {
                    return;
                }
                n.g = g;
                n.parent = parent;
                n.via = via;
                i
            }
            None => {
                self.nodes.push(AbstractNode {
                    zone,
                    entry,
                    g,
                    parent,
                    via,
                    closed: false,
                });
                let i = self.nodes.len() - 1;
                self.index.insert((zone, entry), i);
                i
            }
        };
        self.seq += 1;
        self.open.push(Frontier {
            idx,
            g,
            f: g + h,
            seq: self.seq,
        });
    }

    fn run(
        mut self,
        layer: &mut ZoneLayer,
        mode: &dyn MovementMode,
        start: Point,
        goal: Point,
        budget: usize,
    ) -> SearchResult {
        let metric = layer.metric();
        layer.ensure_chunk(mode, layer.chunk_of(start));
        layer.ensure_chunk(mode, layer.chunk_of(goal));
        let Some(start_zone) = layer.global_zone_at(start) else {
            return SearchResult::empty(SearchStatus::NotFound, start);
        };
        let goal_zone = layer.global_zone_at(goal);
        let estimate = |p: Point| metric.distance(p, goal);

        self.relax(start_zone, start, 0.0, estimate(start), NO_PARENT, Via::Start);
        let mut best = 0;
        let mut best_h = estimate(start);
        let mut evaluated = 0usize;

        let (status, last) = loop {
            let Some(current) = self.open.pop() else {
                break (SearchStatus::NotFound, best);
            };
            let ci = current.idx;
            let node = &self.nodes[ci];
            if node.closed || current.g > node.g {
                continue;
            }
            if evaluated >= budget {
                log::warn!(
                    "region query {start} -> {goal} gave up after {evaluated} abstract nodes"
                );
                break (SearchStatus::SearchLimitReached, best);
            }
            evaluated += 1;
            if node.entry == goal {
                break (SearchStatus::Found, ci);
            }

            let (zone, entry, g) = (node.zone, node.entry, node.g);
            self.nodes[ci].closed = true;
            let h = estimate(entry);
            if h < best_h {
                best_h = h;
                best = ci;
            }
            log::trace!("expand {zone} at {entry}, g = {g}");

            if goal_zone == Some(zone) {
                if let Some(seg) = layer.segment(mode, zone, entry, goal) {
                    let cost = seg.cost;
                    self.relax(zone, goal, g + cost, 0.0, ci, Via::Goal);
                }
            }

            for d in border_sides(layer, zone) {
                layer.ensure_chunk(mode, zone.chunk + d.delta());
            }
            let edges: Vec<RegionEdge> = layer
                .path_data(zone)
                .map(|r| r.outbound().to_vec())
                .unwrap_or_default();
            for e in edges {
                let Some(seg_cost) = layer.segment(mode, zone, entry, e.from).map(|s| s.cost) else {
                    continue;
                };
                let Some(cross) = mode.step(e.from, e.dir, metric) else {
                    continue;
                };
                let to = e.to();
                self.relax(e.target, to, g + seg_cost + cross, estimate(to), ci, Via::Edge(e));
            }
        };

        let mut chain = Vec::new();
        let mut i = last;
        while i != NO_PARENT {
            chain.push(i);
            i = self.nodes[i].parent;
        }
        chain.reverse();

        let mut res = SearchResult::empty(status, start);
        res.nodes_evaluated = evaluated;
        for pair in chain.windows(2) {
            let (a, b) = (&self.nodes[pair[0]], &self.nodes[pair[1]]);
            match b.via {
                Via::Edge(e) => {
                    append_segment(&mut res, layer, mode, a.zone, a.entry, e.from);
                    let c = mode.step(e.from, e.dir, metric).unwrap_or(0.0);
                    push_step(&mut res, e.to(), e.dir, mode.id().0, c);
                }
                Via::Goal => append_segment(&mut res, layer, mode, a.zone, a.entry, goal),
                Via::Start => {}
            }
        }
        res
    }
}

/// Directions of the neighbouring chunks `zone` can have edges into: those
/// whose shared border or corner the zone's bounding box reaches.
fn border_sides(layer: &ZoneLayer, zone: GlobalZoneId) -> Vec<Direction> {
    let chunk = layer.chunk_bounds(zone.chunk);
    let Some(b) = layer
        .zones(zone.chunk)
        .and_then(|zs| zs.iter().find(|z| z.id == zone.zone))
        .map(|z| z.bounds)
    else {
        return Direction::ALL.to_vec();
    };
    let reaches = |step: i32, lo: bool, hi: bool| match step {
        -1 => lo,
        1 => hi,
        _ => true,
    };
    Direction::ALL
        .into_iter()
        .filter(|d| {
            let v = d.delta();
            reaches(v.x, b.min.x == chunk.min.x, b.max.x == chunk.max.x)
                && reaches(v.y, b.min.y == chunk.min.y, b.max.y == chunk.max.y)
        })
        .collect()
}

fn push_step(res: &mut SearchResult, pos: Point, dir: Direction, meta: u8, cost: f32) {
    res.cost += cost;
    res.steps.push(PathStep {
        pos,
        dir,
        meta,
        cost: res.cost,
    });
}

fn append_segment(
    res: &mut SearchResult,
    layer: &mut ZoneLayer,
    mode: &dyn MovementMode,
    zone: GlobalZoneId,
    entry: Point,
    exit: Point,
) {
    let metric = layer.metric();
    let Some(seg) = layer.segment(mode, zone, entry, exit) else {
        return;
    };
    for (from, dir, m) in seg.walk() {
        let c = mode.step(from, dir, metric).unwrap_or(0.0);
        push_step(res, from + dir, dir, m.0, c);
    }
}
