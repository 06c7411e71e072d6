//! Hierarchical pathfinding over a chunked, streamed grid.
//!
//! The map is cut into chunks. Each chunk is decomposed, per movement mode
//! and distance metric, into zones of mutually reachable cells; zones of
//! neighbouring chunks are linked by boundary edges. A long query then runs
//! over zones and edges instead of cells, and the concrete route inside each
//! zone comes from a cache of path segments filled on first use.
//!
//! | Type | Role |
//! |---|---|
//! | [`ModeRegistry`] / [`MovementMode`] | which (mode, metric) pairs exist and what terrain costs |
//! | [`ZoneLayer`] | zone labels, edges and segments of one (mode, metric) pair |
//! | [`RegionGraph`] | all layers plus hierarchical [`find_path`](RegionGraph::find_path) |
//! | [`debug`] | ASCII dumps for checking a decomposition by eye |
//!
//! Nothing here is synchronised: one owner drives decomposition,
//! invalidation and queries.

mod config;
pub mod debug;
mod edge;
mod graph;
mod layer;
mod mode;
mod segment;
mod zone;

pub use config::RegionConfig;
pub use edge::{RegionEdge, ZoneConnections};
pub use graph::RegionGraph;
pub use layer::{LayerStats, ZoneLayer};
pub use mode::{FnMode, ModeId, ModePather, ModeRegistry, ModeTable, MovementMode};
pub use segment::{PathSegment, SegmentCache};
pub use zone::{DirtyState, EdgeId, GlobalZoneId, ZoneCell, ZoneEdgeKey, ZoneId, ZoneInfo};
