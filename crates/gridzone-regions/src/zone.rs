//! Zone and edge identifiers, dirty states and per-cell zone data.

use std::fmt;

use gridzone_core::{Direction, DirectionMask, DistanceMetric, Point, Range};

use crate::mode::ModeId;

/// Zone label, unique inside one chunk until that chunk is decomposed again.
/// [`ZoneId::NONE`] marks impassable or unclassified cells.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneId(pub u16);

impl ZoneId {
    pub const NONE: Self = Self(0);

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "z{}", self.0)
    }
}

/// A zone together with the chunk owning it; the only zone reference valid
/// across chunk boundaries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalZoneId {
    pub chunk: Point,
    pub zone: ZoneId,
}

impl GlobalZoneId {
    pub const fn new(chunk: Point, zone: ZoneId) -> Self {
        Self { chunk, zone }
    }
}

impl fmt::Display for GlobalZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chunk, self.zone)
    }
}

/// Identifies one boundary crossing within a chunk: the crossing cell's
/// offset inside the chunk and the direction leaving it.
///
/// Ids are positional, so decomposing an unchanged chunk again reproduces
/// the same ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// `offset` is the row-major index of the source cell inside its chunk.
    ///
    /// # Panics
    ///
    /// Panics if `dir` is `Direction::None`.
    pub fn new(offset: usize, dir: Direction) -> Self {
        let Some(d) = dir.index() else {
            panic!("edge direction must not be None");
        };
        Self((offset * 8 + d) as u32)
    }

    #[inline]
    pub fn offset(self) -> usize {
        (self.0 / 8) as usize
    }

    #[inline]
    pub fn dir(self) -> Direction {
        Direction::from_index((self.0 % 8) as usize)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}:{}", self.offset(), self.dir())
    }
}

/// The partition key of all path data: connectivity and cached segments
/// differ per movement mode and distance metric.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneEdgeKey {
    pub zone: GlobalZoneId,
    pub mode: ModeId,
    pub metric: DistanceMetric,
}

/// Freshness of a chunk's decomposition or of a zone's cached paths.
///
/// Ordered by severity; [`merge`](Self::merge) keeps the more severe state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DirtyState {
    #[default]
    Clean,
    /// Terrain changed; the chunk must be decomposed again.
    Modified,
    /// Cached segments and edges must be rebuilt before use.
    PathDirty,
    /// Scheduled for unloading.
    MarkedForRemove,
}

impl DirtyState {
    #[inline]
    pub fn merge(self, other: Self) -> Self {
        self.max(other)
    }

    #[inline]
    pub fn is_clean(self) -> bool {
        self == DirtyState::Clean
    }
}

/// Per-cell zone data.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneCell {
    pub zone: ZoneId,
    /// Directions leading to a mutually reachable neighbour.
    pub connectivity: DirectionMask,
}

/// Summary of one zone of a decomposed chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneInfo {
    pub id: ZoneId,
    /// Number of cells.
    pub cells: usize,
    /// Bounding box of the cells.
    pub bounds: Range,
}
