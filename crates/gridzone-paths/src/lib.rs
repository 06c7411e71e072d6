//! Grid search primitives over unbounded coordinates.
//!
//! - **A\*** towards a predicate goal with a node budget and best-effort
//!   partial results ([`SearchArea::astar`])
//! - **Dijkstra** flow fields from many weighted sources
//!   ([`SearchArea::flow_field`], [`SearchArea::flow_path`])
//! - **Connected components** with per-cell connectivity masks
//!   ([`SearchArea::cc_map_all`])
//!
//! All algorithms run through a [`SearchArea`], which owns and reuses its
//! node arrays so repeated queries allocate nothing after warm-up. Moves and
//! costs come from a [`Pather`]; A* termination comes from a [`SearchGoal`].

mod astar;
mod cc;
mod dijkstra;
mod search;
mod traits;

pub use dijkstra::{FlowNode, FlowSource};
pub use search::{PathStep, SearchArea, SearchResult, SearchStatus};
pub use traits::{FnGoal, Pather, PointGoal, SearchGoal, Step};
