use gridzone_core::{Range, TileConfig};

/// Tuning of a region layer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RegionConfig {
    /// Chunk size. A chunk is both the storage tile and the unit of
    /// decomposition.
    pub chunk: TileConfig,
    /// Node budget of one in-zone segment search. `None` is unbounded; a
    /// zone's cells are always mutually reachable, so the search ends anyway.
    pub segment_budget: Option<usize>,
    /// Abstract nodes a hierarchical query may expand before giving up with
    /// a partial result.
    pub query_budget: usize,
    /// Cells outside these bounds are impassable. `None` leaves the world
    /// unbounded.
    pub world_bounds: Option<Range>,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            chunk: TileConfig::default(),
            segment_budget: None,
            query_budget: 4096,
            world_bounds: None,
        }
    }
}

impl RegionConfig {
    pub fn with_chunk(mut self, chunk: TileConfig) -> Self {
        self.chunk = chunk;
        self
    }

    pub fn with_world_bounds(mut self, bounds: Range) -> Self {
        self.world_bounds = Some(bounds);
        self
    }
}
