//! Compressed in-zone path segments and their cache.

use std::collections::HashMap;

use gridzone_core::{Direction, Point};
use gridzone_paths::SearchResult;

use crate::mode::ModeId;

/// A concrete route between two cells of one zone, stored as the direction
/// and movement mode of each step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathSegment {
    pub origin: Point,
    pub target: Point,
    pub cost: f32,
    pub steps: Vec<(Direction, ModeId)>,
}

impl PathSegment {
    /// Compress a search result. The result's step metadata is read as the
    /// mode id.
    pub fn from_search(res: &SearchResult) -> Self {
        Self {
            origin: res.origin,
            target: res.target(),
            cost: res.cost,
            steps: res.steps.iter().map(|s| (s.dir, ModeId(s.meta))).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Cells entered along the segment, excluding the origin.
    pub fn cells(&self) -> impl Iterator<Item = Point> + '_ {
        self.steps.iter().scan(self.origin, |p, (dir, _)| {
            *p = *p + *dir;
            Some(*p)
        })
    }

    /// Every step as `(from, dir, mode)`.
    pub fn walk(&self) -> impl Iterator<Item = (Point, Direction, ModeId)> + '_ {
        self.steps.iter().scan(self.origin, |p, &(dir, mode)| {
            let from = *p;
            *p = from + dir;
            Some((from, dir, mode))
        })
    }
}

/// Segments of one zone, keyed by entry point then exit point.
#[derive(Debug, Clone, Default)]
pub struct SegmentCache {
    by_entry: HashMap<Point, HashMap<Point, PathSegment>>,
    len: usize,
    computed: u64,
}

impl SegmentCache {
    pub fn get(&self, entry: Point, exit: Point) -> Option<&PathSegment> {
        self.by_entry.get(&entry)?.get(&exit)
    }

    /// Segments cached for one entry point.
    pub fn from_entry(&self, entry: Point) -> impl Iterator<Item = &PathSegment> {
        self.by_entry.get(&entry).into_iter().flat_map(|m| m.values())
    }

    /// Store a freshly computed segment, counting it as a computation.
    pub fn insert(&mut self, segment: PathSegment) -> &PathSegment {
        self.computed += 1;
        let exits = self.by_entry.entry(segment.origin).or_default();
        let target = segment.target;
        if exits.insert(target, segment).is_none() {
            self.len += 1;
        }
        &exits[&target]
    }

    /// Forget every segment. The computation counter is kept.
    pub fn invalidate(&mut self) {
        self.by_entry.clear();
        self.len = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Segments computed over the cache's lifetime, including ones later
    /// invalidated.
    #[inline]
    pub fn computed(&self) -> u64 {
        self.computed
    }

    pub(crate) fn reset(&mut self) {
        self.invalidate();
        self.computed = 0;
    }
}
