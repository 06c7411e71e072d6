//! Sparse tiled storage over unbounded coordinates.
//!
//! Space is cut into fixed-size tiles ([`TileConfig`]); a coordinate splits
//! into a tile index and an in-tile offset. Tiles are allocated lazily, their
//! cell buffers rented from a [`TilePool`] and handed back when the tile is
//! removed or the storage cleared. Reading an unallocated coordinate never
//! allocates.
//!
//! [`TiledGrid`] is the 2D view; [`TiledGrid3`] maps integer layers to 2D
//! views created on demand, all sharing one pool.

use std::collections::HashMap;

use crate::geom::{Point, Range};
use crate::pool::{Pool, PoolStats};

/// Size of one storage tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileConfig {
    pub width: i32,
    pub height: i32,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self::square(32)
    }
}

impl TileConfig {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub const fn square(size: i32) -> Self {
        Self::new(size, size)
    }

    #[inline]
    pub const fn size(self) -> Point {
        Point::new(self.width, self.height)
    }

    /// Cells per tile.
    #[inline]
    pub const fn area(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Index of the tile containing `p`.
    #[inline]
    pub fn tile_of(self, p: Point) -> Point {
        p.div_floor(self.size())
    }

    /// Offset of `p` inside its tile.
    #[inline]
    pub fn offset_of(self, p: Point) -> Point {
        p.rem_floor(self.size())
    }

    /// Absolute bounds of the tile at index `tile`.
    #[inline]
    pub fn bounds_of(self, tile: Point) -> Range {
        Range::with_size(
            Point::new(tile.x * self.width, tile.y * self.height),
            self.size(),
        )
    }

    fn validate(self) {
        assert!(
            self.width > 0 && self.height > 0,
            "tile size must be positive, got {}x{}",
            self.width,
            self.height
        );
    }
}

// ---------------------------------------------------------------------------
// TilePool
// ---------------------------------------------------------------------------

/// Pool of cell buffers for one tile size and one initial value.
#[derive(Debug, Clone)]
pub struct TilePool<T> {
    config: TileConfig,
    initial: T,
    buffers: Pool<Vec<T>>,
}

impl<T: Clone> TilePool<T> {
    pub fn new(config: TileConfig, initial: T) -> Self {
        config.validate();
        Self {
            config,
            initial,
            buffers: Pool::new(),
        }
    }

    /// Keep at most `retain` idle buffers.
    pub fn with_retention(mut self, retain: usize) -> Self {
        self.buffers = Pool::with_retention(retain);
        self
    }

    #[inline]
    pub fn config(&self) -> TileConfig {
        self.config
    }

    /// The value every rented buffer is filled with.
    #[inline]
    pub fn initial(&self) -> &T {
        &self.initial
    }

    /// A buffer of [`TileConfig::area`] cells, all equal to the initial value.
    pub fn rent(&mut self) -> Vec<T> {
        let (initial, area) = (&self.initial, self.config.area());
        self.buffers.rent_with(|| vec![initial.clone(); area])
    }

    /// Return a buffer. Panics if it was not rented for this tile size.
    pub fn give_back(&mut self, buf: Vec<T>) {
        assert_eq!(
            buf.len(),
            self.config.area(),
            "tile buffer returned to a pool of a different tile size"
        );
        let initial = &self.initial;
        self.buffers.give_back_with(buf, |b| b.fill(initial.clone()));
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.buffers.available()
    }

    #[inline]
    pub fn stats(&self) -> PoolStats {
        self.buffers.stats()
    }
}

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// One allocated tile.
#[derive(Debug, Clone)]
pub struct Tile<T> {
    bounds: Range,
    cells: Vec<T>,
    age: u32,
}

impl<T> Tile<T> {
    /// Absolute area covered by the tile.
    #[inline]
    pub fn bounds(&self) -> Range {
        self.bounds
    }

    /// Modification counter; starts at zero when the tile is rented.
    #[inline]
    pub fn age(&self) -> u32 {
        self.age
    }

    #[inline]
    pub fn bump_age(&mut self) -> u32 {
        self.age = self.age.wrapping_add(1);
        self.age
    }

    #[inline]
    pub fn at(&self, p: Point) -> Option<&T> {
        self.bounds.index_of(p).map(|i| &self.cells[i])
    }

    #[inline]
    pub fn at_mut(&mut self, p: Point) -> Option<&mut T> {
        self.bounds.index_of(p).map(|i| &mut self.cells[i])
    }

    /// Row-major iterator over `(Point, &T)`.
    pub fn iter(&self) -> impl Iterator<Item = (Point, &T)> {
        self.bounds.iter().zip(self.cells.iter())
    }

    #[inline]
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    #[inline]
    pub fn cells_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }
}

// ---------------------------------------------------------------------------
// TileMap (pool-less core shared by the 2D and 3D views)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TileMap<T> {
    tiles: HashMap<Point, Tile<T>>,
}

impl<T: Clone> TileMap<T> {
    fn new() -> Self {
        Self {
            tiles: HashMap::new(),
        }
    }

    fn get(&self, config: TileConfig, p: Point) -> Option<&T> {
        self.tiles.get(&config.tile_of(p))?.at(p)
    }

    fn tile_or_create(&mut self, pool: &mut TilePool<T>, tile: Point) -> &mut Tile<T> {
        let config = pool.config();
        self.tiles.entry(tile).or_insert_with(|| Tile {
            bounds: config.bounds_of(tile),
            cells: pool.rent(),
            age: 0,
        })
    }

    fn remove(&mut self, pool: &mut TilePool<T>, tile: Point) -> bool {
        match self.tiles.remove(&tile) {
            Some(t) => {
                pool.give_back(t.cells);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self, pool: &mut TilePool<T>) {
        for (_, t) in self.tiles.drain() {
            pool.give_back(t.cells);
        }
    }
}

// ---------------------------------------------------------------------------
// TiledGrid
// ---------------------------------------------------------------------------

/// Lazily-allocated 2D storage over unbounded `i32` coordinates.
#[derive(Debug, Clone)]
pub struct TiledGrid<T> {
    map: TileMap<T>,
    pool: TilePool<T>,
}

impl<T: Clone> TiledGrid<T> {
    /// Storage whose fresh cells (and absent reads) equal `initial`.
    pub fn new(config: TileConfig, initial: T) -> Self {
        Self::with_pool(TilePool::new(config, initial))
    }

    pub fn with_pool(pool: TilePool<T>) -> Self {
        Self {
            map: TileMap::new(),
            pool,
        }
    }

    #[inline]
    pub fn config(&self) -> TileConfig {
        self.pool.config()
    }

    /// Index of the tile containing `p`.
    #[inline]
    pub fn tile_of(&self, p: Point) -> Point {
        self.config().tile_of(p)
    }

    /// Value at `p` if its tile is allocated. Never allocates.
    #[inline]
    pub fn get(&self, p: Point) -> Option<&T> {
        self.map.get(self.config(), p)
    }

    /// Value at `p`, or the initial value if its tile is not allocated.
    #[inline]
    pub fn at(&self, p: Point) -> T {
        self.get(p).cloned().unwrap_or_else(|| self.pool.initial().clone())
    }

    /// Mutable access to `p`, renting its tile if necessary.
    pub fn get_or_create_mut(&mut self, p: Point) -> &mut T {
        let tile = self.tile_of(p);
        let offset = self.config().offset_of(p);
        let width = self.config().width as usize;
        let t = self.map.tile_or_create(&mut self.pool, tile);
        &mut t.cells[offset.y as usize * width + offset.x as usize]
    }

    /// Store `value` at `p`, renting its tile if necessary.
    #[inline]
    pub fn set(&mut self, p: Point, value: T) {
        *self.get_or_create_mut(p) = value;
    }

    #[inline]
    pub fn tile(&self, tile: Point) -> Option<&Tile<T>> {
        self.map.tiles.get(&tile)
    }

    #[inline]
    pub fn tile_mut(&mut self, tile: Point) -> Option<&mut Tile<T>> {
        self.map.tiles.get_mut(&tile)
    }

    /// The tile at index `tile`, rented and initialised if absent.
    #[inline]
    pub fn tile_or_create(&mut self, tile: Point) -> &mut Tile<T> {
        self.map.tile_or_create(&mut self.pool, tile)
    }

    /// Free the tile at index `tile`, returning its buffer to the pool.
    #[inline]
    pub fn remove_tile(&mut self, tile: Point) -> bool {
        self.map.remove(&mut self.pool, tile)
    }

    /// Free every tile.
    pub fn clear(&mut self) {
        self.map.clear(&mut self.pool);
    }

    /// Allocated tiles with their indices, in arbitrary order.
    pub fn tiles(&self) -> impl Iterator<Item = (Point, &Tile<T>)> {
        self.map.tiles.iter().map(|(k, t)| (*k, t))
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        self.map.tiles.len()
    }

    #[inline]
    pub fn pool(&self) -> &TilePool<T> {
        &self.pool
    }
}

// ---------------------------------------------------------------------------
// TiledGrid3
// ---------------------------------------------------------------------------

/// Sparse map of integer layers to tiled 2D storage.
#[derive(Debug, Clone)]
pub struct TiledGrid3<T> {
    layers: HashMap<i32, TileMap<T>>,
    pool: TilePool<T>,
}

impl<T: Clone> TiledGrid3<T> {
    pub fn new(config: TileConfig, initial: T) -> Self {
        Self {
            layers: HashMap::new(),
            pool: TilePool::new(config, initial),
        }
    }

    #[inline]
    pub fn config(&self) -> TileConfig {
        self.pool.config()
    }

    /// Value at `(p, z)` if allocated. Never allocates, not even the layer.
    pub fn get(&self, p: Point, z: i32) -> Option<&T> {
        self.layers.get(&z)?.get(self.config(), p)
    }

    /// Value at `(p, z)`, or the initial value.
    pub fn at(&self, p: Point, z: i32) -> T {
        self.get(p, z)
            .cloned()
            .unwrap_or_else(|| self.pool.initial().clone())
    }

    /// Mutable access to `(p, z)`, creating the layer and tile if necessary.
    pub fn get_or_create_mut(&mut self, p: Point, z: i32) -> &mut T {
        let config = self.config();
        let offset = config.offset_of(p);
        let layer = self.layers.entry(z).or_insert_with(TileMap::new);
        let t = layer.tile_or_create(&mut self.pool, config.tile_of(p));
        &mut t.cells[offset.y as usize * config.width as usize + offset.x as usize]
    }

    #[inline]
    pub fn set(&mut self, p: Point, z: i32, value: T) {
        *self.get_or_create_mut(p, z) = value;
    }

    pub fn tile(&self, tile: Point, z: i32) -> Option<&Tile<T>> {
        self.layers.get(&z)?.tiles.get(&tile)
    }

    pub fn tile_or_create(&mut self, tile: Point, z: i32) -> &mut Tile<T> {
        self.layers
            .entry(z)
            .or_insert_with(TileMap::new)
            .tile_or_create(&mut self.pool, tile)
    }

    /// Free one tile of layer `z`. The layer itself is dropped once empty.
    pub fn remove_tile(&mut self, tile: Point, z: i32) -> bool {
        let Some(layer) = self.layers.get_mut(&z) else {
            return false;
        };
        let removed = layer.remove(&mut self.pool, tile);
        if layer.tiles.is_empty() {
            self.layers.remove(&z);
        }
        removed
    }

    /// Free every tile of layer `z`.
    pub fn remove_layer(&mut self, z: i32) -> bool {
        match self.layers.remove(&z) {
            Some(mut layer) => {
                layer.clear(&mut self.pool);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        for (_, mut layer) in self.layers.drain() {
            layer.clear(&mut self.pool);
        }
    }

    /// Layers holding at least one tile, sorted.
    pub fn layers(&self) -> Vec<i32> {
        let mut zs: Vec<i32> = self.layers.keys().copied().collect();
        zs.sort_unstable();
        zs
    }

    #[inline]
    pub fn pool(&self) -> &TilePool<T> {
        &self.pool
    }
}
