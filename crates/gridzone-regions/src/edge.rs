//! Zone-to-zone boundary edges and the per-zone connection record.

use gridzone_core::{Direction, Point, Poolable};

use crate::segment::SegmentCache;
use crate::zone::{DirtyState, EdgeId, GlobalZoneId};

/// One boundary crossing from a zone into a zone of a neighbouring chunk.
///
/// The owning zone stores the edge as outbound, the target zone stores the
/// identical value as inbound; either half can be removed independently.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionEdge {
    pub owner: GlobalZoneId,
    pub id: EdgeId,
    /// Last cell inside the owning zone.
    pub from: Point,
    /// Direction crossing into the neighbouring chunk.
    pub dir: Direction,
    pub target: GlobalZoneId,
}

impl RegionEdge {
    /// First cell inside the target zone.
    #[inline]
    pub fn to(&self) -> Point {
        self.from + self.dir
    }
}

/// Everything a zone knows about its connections: edges in both directions,
/// cached segments and the freshness of both.
#[derive(Debug, Clone, Default)]
pub struct ZoneConnections {
    outbound: Vec<RegionEdge>,
    inbound: Vec<RegionEdge>,
    segments: SegmentCache,
    state: DirtyState,
}

impl Poolable for ZoneConnections {
    fn reset(&mut self) {
        self.outbound.clear();
        self.inbound.clear();
        self.segments.reset();
        self.state = DirtyState::Clean;
    }
}

impl ZoneConnections {
    #[inline]
    pub fn outbound(&self) -> &[RegionEdge] {
        &self.outbound
    }

    #[inline]
    pub fn inbound(&self) -> &[RegionEdge] {
        &self.inbound
    }

    #[inline]
    pub fn segments(&self) -> &SegmentCache {
        &self.segments
    }

    #[inline]
    pub fn state(&self) -> DirtyState {
        self.state
    }

    /// Add an outbound edge. Returns `false` if it was already present.
    pub fn add_outbound(&mut self, edge: RegionEdge) -> bool {
        add_unique(&mut self.outbound, edge)
    }

    /// Add an inbound edge. Returns `false` if it was already present.
    pub fn add_inbound(&mut self, edge: RegionEdge) -> bool {
        add_unique(&mut self.inbound, edge)
    }

    /// Remove an outbound edge. Removing an absent edge is a no-op.
    pub fn remove_outbound(&mut self, edge: &RegionEdge) -> bool {
        remove_value(&mut self.outbound, edge)
    }

    /// Remove an inbound edge. Removing an absent edge is a no-op.
    pub fn remove_inbound(&mut self, edge: &RegionEdge) -> bool {
        remove_value(&mut self.inbound, edge)
    }

    /// Merge `state` into the record's state.
    pub fn mark(&mut self, state: DirtyState) {
        self.state = self.state.merge(state);
    }

    /// Drop cached segments if the record is dirty, leaving it clean.
    /// Returns `true` if anything was flushed.
    pub(crate) fn refresh(&mut self) -> bool {
        if self.state.is_clean() {
            return false;
        }
        self.segments.invalidate();
        self.state = DirtyState::Clean;
        true
    }

    pub(crate) fn segments_mut(&mut self) -> &mut SegmentCache {
        &mut self.segments
    }

    /// Nothing left worth keeping: no edges, no segments.
    pub fn is_unused(&self) -> bool {
        self.outbound.is_empty() && self.inbound.is_empty() && self.segments.is_empty()
    }
}

fn add_unique(list: &mut Vec<RegionEdge>, edge: RegionEdge) -> bool {
    if list.contains(&edge) {
        return false;
    }
    list.push(edge);
    true
}

fn remove_value(list: &mut Vec<RegionEdge>, edge: &RegionEdge) -> bool {
    match list.iter().position(|e| e == edge) {
        Some(i) => {
            list.swap_remove(i);
            true
        }
        None => false,
    }
}
