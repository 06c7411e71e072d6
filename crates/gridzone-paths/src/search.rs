use std::collections::BinaryHeap;

use gridzone_core::{Direction, DirectionMask, Point, Range};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchStatus {
    /// The goal was reached; the path ends on it.
    Found,
    /// The node budget ran out; the path leads to the best node seen.
    SearchLimitReached,
    /// Every reachable node was evaluated without meeting the goal; the path
    /// leads to the best node seen.
    NotFound,
}

/// One step of a path: the cell entered, the direction moved to enter it,
/// the step metadata and the cost accumulated on arrival.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathStep {
    pub pos: Point,
    pub dir: Direction,
    pub meta: u8,
    pub cost: f32,
}

/// Result of a path query. Never an error: failed searches still carry the
/// best partial path gathered.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchResult {
    pub status: SearchStatus,
    pub origin: Point,
    pub steps: Vec<PathStep>,
    /// Accumulated cost at the end of the path.
    pub cost: f32,
    /// Nodes taken off the open list, for diagnostics and tuning.
    pub nodes_evaluated: usize,
}

impl SearchResult {
    /// A result with no steps, for searches that could not start.
    pub fn empty(status: SearchStatus, origin: Point) -> Self {
        Self {
            status,
            origin,
            steps: Vec::new(),
            cost: 0.0,
            nodes_evaluated: 0,
        }
    }

    #[inline]
    pub fn is_found(&self) -> bool {
        self.status == SearchStatus::Found
    }

    /// The last cell of the path (the origin for an empty path).
    #[inline]
    pub fn target(&self) -> Point {
        self.steps.last().map_or(self.origin, |s| s.pos)
    }

    /// Number of steps.
    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Cells entered along the path, excluding the origin.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.steps.iter().map(|s| s.pos)
    }

    /// Append `other`, which must start where `self` ends. Step costs of
    /// `other` are shifted by `self.cost`.
    pub fn extend(&mut self, other: &SearchResult) {
        debug_assert_eq!(self.target(), other.origin, "path pieces must be contiguous");
        let base = self.cost;
        self.steps.extend(other.steps.iter().map(|s| PathStep {
            cost: s.cost + base,
            ..*s
        }));
        self.cost += other.cost;
        self.nodes_evaluated += other.nodes_evaluated;
    }
}

// ---------------------------------------------------------------------------
// Search nodes
// ---------------------------------------------------------------------------

pub(crate) const NO_PARENT: usize = usize::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NodeState {
    Open,
    Closed,
}

#[derive(Clone)]
pub(crate) struct Node {
    pub(crate) g: f32,
    /// Dijkstra only: the source weight this node inherited.
    pub(crate) limit: f32,
    pub(crate) parent: usize,
    /// Direction moved to enter this node from its parent.
    pub(crate) dir: Direction,
    pub(crate) meta: u8,
    pub(crate) generation: u32,
    pub(crate) state: NodeState,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            g: 0.0,
            limit: 0.0,
            parent: NO_PARENT,
            dir: Direction::None,
            meta: 0,
            generation: 0,
            state: NodeState::Closed,
        }
    }
}

/// Reference into the node array, ordered by `f` for use in `BinaryHeap`.
///
/// Equal `f` values pop in insertion order, so neighbours pushed first
/// (cardinals) win ties.
#[derive(Clone, Copy)]
pub(crate) struct NodeRef {
    pub(crate) idx: usize,
    pub(crate) g: f32,
    pub(crate) f: f32,
    pub(crate) seq: u64,
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for NodeRef {}

impl Ord for NodeRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // smallest f first, then oldest
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for NodeRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// SearchArea
// ---------------------------------------------------------------------------

/// Reusable scratch space for searches over one rectangle of the grid.
///
/// `SearchArea` owns the node arrays, open list and label buffers so that
/// repeated queries allocate nothing after warm-up. Nodes are invalidated
/// lazily by bumping a generation counter instead of being cleared.
///
/// A search area is not shareable between threads while a search runs; give
/// each thread (or each chunk owner) its own.
pub struct SearchArea {
    pub(crate) bounds: Range,
    // A* caches
    pub(crate) nodes: Vec<Node>,
    pub(crate) stamp: u32,
    // flow field caches
    pub(crate) flow_nodes: Vec<Node>,
    pub(crate) flow_stamp: u32,
    pub(crate) flow_results: Vec<crate::dijkstra::FlowNode>,
    // shared open list
    pub(crate) open: BinaryHeap<NodeRef>,
    pub(crate) seq: u64,
    // connected-component caches
    pub(crate) cc_labels: Vec<u32>,
    pub(crate) cc_masks: Vec<DirectionMask>,
    pub(crate) cc_count: u32,
    pub(crate) fill_stack: Vec<usize>,
}

impl SearchArea {
    /// Create a search area covering `bounds`.
    pub fn new(bounds: Range) -> Self {
        let len = bounds.len();
        Self {
            bounds,
            nodes: vec![Node::default(); len],
            stamp: 0,
            flow_nodes: vec![Node::default(); len],
            flow_stamp: 0,
            flow_results: Vec::new(),
            open: BinaryHeap::new(),
            seq: 0,
            cc_labels: vec![0; len],
            cc_masks: vec![DirectionMask::EMPTY; len],
            cc_count: 0,
            fill_stack: Vec::new(),
        }
    }

    /// Move the area to `bounds`.
    ///
    /// If the new area fits within the current capacity, the window is only
    /// re-based and generation counters bumped so stale entries are ignored.
    /// Otherwise every cache is reallocated. Returns `true` on reallocation.
    pub fn set_range(&mut self, bounds: Range) -> bool {
        let new_len = bounds.len();
        let old_capacity = self.nodes.len();
        self.bounds = bounds;
        self.flow_results.clear();
        self.cc_count = 0;

        if new_len <= old_capacity {
            self.stamp = self.stamp.wrapping_add(1);
            self.flow_stamp = self.flow_stamp.wrapping_add(1);
            self.cc_labels[..new_len].fill(0);
            self.cc_masks[..new_len].fill(DirectionMask::EMPTY);
            return false;
        }

        self.nodes.clear();
        self.nodes.resize(new_len, Node::default());
        self.stamp = 0;

        self.flow_nodes.clear();
        self.flow_nodes.resize(new_len, Node::default());
        self.flow_stamp = 0;

        self.cc_labels.clear();
        self.cc_labels.resize(new_len, 0);
        self.cc_masks.clear();
        self.cc_masks.resize(new_len, DirectionMask::EMPTY);
        self.fill_stack.clear();
        true
    }

    /// The grid rectangle being searched.
    #[inline]
    pub fn range(&self) -> Range {
        self.bounds
    }

    /// Number of cells the caches can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    // -----------------------------------------------------------------------
    // Coordinate helpers
    // -----------------------------------------------------------------------

    /// Flat index of `p`, if inside the area.
    #[inline]
    pub(crate) fn idx(&self, p: Point) -> Option<usize> {
        self.bounds.index_of(p)
    }

    /// Cell at flat index `idx`.
    #[inline]
    pub(crate) fn point(&self, idx: usize) -> Point {
        self.bounds.point_at(idx)
    }

    #[inline]
    pub(crate) fn next_seq(&mut self) -> u64 {
        self.seq = self.seq.wrapping_add(1);
        self.seq
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for SearchArea {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bounds.serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for SearchArea {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let range = Range::deserialize(deserializer)?;
        Ok(SearchArea::new(range))
    }
}
