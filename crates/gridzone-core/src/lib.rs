//! **gridzone-core**: foundational types for grid pathfinding.
//!
//! This crate provides the geometry ([`Point`], [`Range`]), the 8-connected
//! [`Direction`] vocabulary with [`Adjacency`] rules and [`DistanceMetric`]s,
//! a dense [`Grid`], and the pooled storage layer: object [`Pool`]s, the
//! generation-checked [`Arena`], and lazily-allocated [`TiledGrid`] /
//! [`TiledGrid3`] views over unbounded coordinates.

pub mod direction;
pub mod distance;
pub mod geom;
pub mod grid;
pub mod pool;
pub mod tiled;

pub use direction::{Adjacency, Direction, DirectionMask};
pub use distance::{DistanceMetric, chebyshev, euclidean, manhattan};
pub use geom::{Point, Range, RangeIter};
pub use grid::Grid;
pub use pool::{Arena, Handle, Pool, PoolStats, Poolable};
pub use tiled::{Tile, TileConfig, TilePool, TiledGrid, TiledGrid3};
