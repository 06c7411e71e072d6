//! One (movement mode, distance metric) partition of the region graph.
//!
//! A [`ZoneLayer`] owns the zone labels of every decomposed chunk, the
//! connection record of every zone that has edges or cached segments, and a
//! [`SearchArea`] reused by decomposition and segment searches.
//!
//! Decomposing a chunk labels its cells, then links its border zones with
//! the zones of every already decomposed neighbour chunk, writing both
//! halves of each edge in both directions. Decomposing again, or unloading,
//! first removes those edges from both sides.

use std::collections::HashMap;

use gridzone_core::{
    Arena, Direction, DirectionMask, DistanceMetric, Handle, Point, Pool, PoolStats, Range,
    TiledGrid,
};
use gridzone_paths::{PointGoal, SearchArea};

use crate::config::RegionConfig;
use crate::edge::{RegionEdge, ZoneConnections};
use crate::mode::{ModeId, ModePather, MovementMode};
use crate::segment::PathSegment;
use crate::zone::{DirtyState, EdgeId, GlobalZoneId, ZoneCell, ZoneEdgeKey, ZoneId, ZoneInfo};

/// Counters for tuning and tests.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerStats {
    /// Chunk decompositions performed.
    pub decompositions: u64,
    /// Segments computed by an in-zone search.
    pub segment_computations: u64,
    /// Segment requests answered from cache.
    pub segment_hits: u64,
    /// Edges currently stored (each direction counts once).
    pub edges: usize,
}

#[derive(Debug, Clone)]
struct ChunkZones {
    state: DirtyState,
    /// Labels no longer match the terrain. Tracked apart from `state`
    /// because a later `MarkedForRemove` hides an earlier `Modified`.
    stale: bool,
    zones: Vec<ZoneInfo>,
}

pub struct ZoneLayer {
    mode: ModeId,
    metric: DistanceMetric,
    config: RegionConfig,
    cells: TiledGrid<ZoneCell>,
    chunks: HashMap<Point, ChunkZones>,
    records: Arena<ZoneConnections>,
    record_pool: Pool<ZoneConnections>,
    record_index: HashMap<GlobalZoneId, Handle>,
    area: SearchArea,
    stats: LayerStats,
}

impl ZoneLayer {
    pub fn new(mode: ModeId, metric: DistanceMetric, config: RegionConfig) -> Self {
        Self {
            mode,
            metric,
            config,
            cells: TiledGrid::new(config.chunk, ZoneCell::default()),
            chunks: HashMap::new(),
            records: Arena::new(),
            record_pool: Pool::new(),
            record_index: HashMap::new(),
            area: SearchArea::new(config.chunk.bounds_of(Point::ZERO)),
            stats: LayerStats::default(),
        }
    }

    #[inline]
    pub fn mode(&self) -> ModeId {
        self.mode
    }

    #[inline]
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    #[inline]
    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// The partition key of `zone` in this layer.
    pub fn key(&self, zone: GlobalZoneId) -> ZoneEdgeKey {
        ZoneEdgeKey {
            zone,
            mode: self.mode,
            metric: self.metric,
        }
    }

    #[inline]
    pub fn stats(&self) -> LayerStats {
        self.stats
    }

    /// Statistics of the connection-record pool.
    #[inline]
    pub fn record_pool_stats(&self) -> PoolStats {
        self.record_pool.stats()
    }

    /// Statistics of the zone-label tile pool.
    #[inline]
    pub fn tile_pool_stats(&self) -> PoolStats {
        self.cells.pool().stats()
    }

    // -----------------------------------------------------------------------
    // Chunks
    // -----------------------------------------------------------------------

    #[inline]
    pub fn chunk_of(&self, p: Point) -> Point {
        self.config.chunk.tile_of(p)
    }

    #[inline]
    pub fn chunk_bounds(&self, chunk: Point) -> Range {
        self.config.chunk.bounds_of(chunk)
    }

    /// State of a decomposed chunk; `None` if it was never decomposed or has
    /// been unloaded.
    pub fn chunk_state(&self, chunk: Point) -> Option<DirtyState> {
        self.chunks.get(&chunk).map(|c| c.state)
    }

    /// Number of decompositions since the chunk was loaded.
    pub fn chunk_age(&self, chunk: Point) -> Option<u32> {
        self.cells.tile(chunk).map(|t| t.age())
    }

    /// Decomposed chunks, in arbitrary order.
    pub fn chunks(&self) -> impl Iterator<Item = Point> + '_ {
        self.chunks.keys().copied()
    }

    fn check_mode(&self, mode: &dyn MovementMode) {
        assert_eq!(
            mode.id(),
            self.mode,
            "layer for {} used with movement mode {}",
            self.mode,
            mode.id()
        );
    }

    /// Decompose `chunk` unless it is already decomposed and up to date.
    /// Returns `true` if a decomposition ran.
    ///
    /// A chunk only marked for removal is up to date; it keeps serving
    /// queries until the owner unloads it.
    pub fn ensure_chunk(&mut self, mode: &dyn MovementMode, chunk: Point) -> bool {
        match self.chunks.get(&chunk) {
            Some(c) if !c.stale => false,
            _ => {
                self.decompose_chunk(mode, chunk);
                true
            }
        }
    }

    /// Label the zones of `chunk` and rebuild its edges. Returns the number
    /// of zones.
    ///
    /// The chunk comes out clean, except that a pending
    /// [`DirtyState::MarkedForRemove`] survives.
    ///
    /// # Panics
    ///
    /// Panics if `mode` is not this layer's mode, or if the chunk holds more
    /// zones than a [`ZoneId`] can number.
    pub fn decompose_chunk(&mut self, mode: &dyn MovementMode, chunk: Point) -> usize {
        self.check_mode(mode);
        let state = match self.chunks.get(&chunk).map(|c| c.state) {
            Some(DirtyState::MarkedForRemove) => DirtyState::MarkedForRemove,
            _ => DirtyState::Clean,
        };
        self.release_chunk(chunk);

        let bounds = self.chunk_bounds(chunk);
        let pather = ModePather::new(mode, self.metric).within_opt(self.config.world_bounds);
        self.area.set_range(bounds);
        let count = self.area.cc_map_all(&pather);
        assert!(
            count <= u32::from(u16::MAX),
            "chunk {chunk} holds {count} zones, more than a zone id can number"
        );

        let mut zones: Vec<ZoneInfo> = (1..=count)
            .map(|i| ZoneInfo {
                id: ZoneId(i as u16),
                cells: 0,
                bounds: Range::default(),
            })
            .collect();

        let tile = self.cells.tile_or_create(chunk);
        tile.bump_age();
        for (cell, p) in tile.cells_mut().iter_mut().zip(bounds.iter()) {
            let label = self.area.cc_at(p).unwrap_or(0);
            *cell = ZoneCell {
                zone: ZoneId(label as u16),
                connectivity: self.area.connectivity_at(p),
            };
            if label != 0 {
                let info = &mut zones[label as usize - 1];
                info.cells += 1;
                info.bounds = info.bounds.include(p);
            }
        }

        let discovered = self.discover_edges(chunk, bounds);
        let edge_count = discovered.len();
        for edge in discovered {
            self.link(edge);
        }

        self.chunks.insert(
            chunk,
            ChunkZones {
                state,
                stale: false,
                zones,
            },
        );
        self.stats.decompositions += 1;
        log::debug!(
            "decomposed chunk {chunk} for {}/{:?}: {count} zones, {edge_count} edge halves",
            self.mode,
            self.metric
        );
        count as usize
    }

    /// Edges between `chunk` and its decomposed neighbours, both directions.
    fn discover_edges(&self, chunk: Point, bounds: Range) -> Vec<RegionEdge> {
        let mut found = Vec::new();
        for p in bounds.iter().filter(|p| bounds.on_border(*p)) {
            let Some(cell) = self.cells.get(p).copied() else {
                continue;
            };
            if cell.zone.is_none() {
                continue;
            }
            let owner = GlobalZoneId::new(chunk, cell.zone);
            for dir in cell.connectivity.iter() {
                let q = p + dir;
                if bounds.contains(q) {
                    continue;
                }
                let nc = self.chunk_of(q);
                if !self.chunks.contains_key(&nc) {
                    continue;
                }
                let tz = self.zone_at(q);
                if tz.is_none() {
                    continue;
                }
                let target = GlobalZoneId::new(nc, tz);
                found.push(RegionEdge {
                    owner,
                    id: self.edge_id(chunk, p, dir),
                    from: p,
                    dir,
                    target,
                });
                found.push(RegionEdge {
                    owner: target,
                    id: self.edge_id(nc, q, dir.inverse()),
                    from: q,
                    dir: dir.inverse(),
                    target: owner,
                });
            }
        }
        found
    }

    fn edge_id(&self, chunk: Point, p: Point, dir: Direction) -> EdgeId {
        let offset = self.chunk_bounds(chunk).index_of(p).unwrap_or(0);
        EdgeId::new(offset, dir)
    }

    /// Store both halves of `edge`.
    fn link(&mut self, edge: RegionEdge) {
        assert!(edge.owner.zone.is_some(), "edge {} has no owning zone", edge.id);
        assert_eq!(
            self.chunk_of(edge.from),
            edge.owner.chunk,
            "edge {} registered for chunk {} which does not own {}",
            edge.id,
            edge.owner.chunk,
            edge.from
        );
        let h = self.record_or_create(edge.owner);
        if let Some(rec) = self.records.get_mut(h) {
            if rec.add_outbound(edge) {
                self.stats.edges += 1;
            }
        }
        let h = self.record_or_create(edge.target);
        if let Some(rec) = self.records.get_mut(h) {
            rec.add_inbound(edge);
        }
    }

    /// Remove every edge touching `chunk` from both sides and free the
    /// chunk's connection records. Labels are left in place.
    fn release_chunk(&mut self, chunk: Point) {
        let Some(cz) = self.chunks.get(&chunk) else {
            return;
        };
        let ids: Vec<ZoneId> = cz.zones.iter().map(|z| z.id).collect();
        for id in ids {
            let zone = GlobalZoneId::new(chunk, id);
            let Some(h) = self.record_index.remove(&zone) else {
                continue;
            };
            let Some(rec) = self.records.remove(h) else {
                continue;
            };
            for e in rec.outbound() {
                self.stats.edges -= 1;
                self.unlink_half(e.target, e, false);
            }
            for e in rec.inbound() {
                self.unlink_half(e.owner, e, true);
            }
            self.record_pool.give_back(rec);
        }
    }

    /// Remove one half of `edge` from `zone`'s record, freeing the record if
    /// nothing remains in it.
    fn unlink_half(&mut self, zone: GlobalZoneId, edge: &RegionEdge, outbound: bool) {
        let Some(&h) = self.record_index.get(&zone) else {
            return;
        };
        let Some(rec) = self.records.get_mut(h) else {
            return;
        };
        let removed = if outbound {
            rec.remove_outbound(edge)
        } else {
            rec.remove_inbound(edge)
        };
        if removed && outbound {
            self.stats.edges -= 1;
        }
        self.free_if_unused(zone);
    }

    // -----------------------------------------------------------------------
    // Connection records
    // -----------------------------------------------------------------------

    fn record_or_create(&mut self, zone: GlobalZoneId) -> Handle {
        if let Some(&h) = self.record_index.get(&zone) {
            return h;
        }
        let h = self.records.insert(self.record_pool.rent());
        self.record_index.insert(zone, h);
        h
    }

    fn free_if_unused(&mut self, zone: GlobalZoneId) {
        let Some(&h) = self.record_index.get(&zone) else {
            return;
        };
        if !self.records.get(h).is_some_and(|r| r.is_unused()) {
            return;
        }
        self.record_index.remove(&zone);
        if let Some(rec) = self.records.remove(h) {
            self.record_pool.give_back(rec);
        }
    }

    /// Number of live connection records.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Zones of a decomposed chunk, ordered by id.
    pub fn zones(&self, chunk: Point) -> Option<&[ZoneInfo]> {
        self.chunks.get(&chunk).map(|c| c.zones.as_slice())
    }

    /// Zone and connectivity of `p`; `None` if its chunk is not loaded.
    pub fn cell(&self, p: Point) -> Option<ZoneCell> {
        self.cells.get(p).copied()
    }

    /// Zone label of `p`, [`ZoneId::NONE`] if impassable or not loaded.
    pub fn zone_at(&self, p: Point) -> ZoneId {
        self.cells.get(p).map_or(ZoneId::NONE, |c| c.zone)
    }

    pub fn global_zone_at(&self, p: Point) -> Option<GlobalZoneId> {
        let z = self.zone_at(p);
        z.is_some().then(|| GlobalZoneId::new(self.chunk_of(p), z))
    }

    pub fn connectivity_at(&self, p: Point) -> DirectionMask {
        self.cells.get(p).map_or(DirectionMask::EMPTY, |c| c.connectivity)
    }

    /// Edges and cached segments of `zone`; `None` if it has neither.
    pub fn path_data(&self, zone: GlobalZoneId) -> Option<&ZoneConnections> {
        let h = self.record_index.get(&zone)?;
        self.records.get(*h)
    }

    /// Outbound edges of every zone of `chunk`, ordered by zone then id.
    pub fn edges(&self, chunk: Point) -> Vec<RegionEdge> {
        let Some(cz) = self.chunks.get(&chunk) else {
            return Vec::new();
        };
        let mut out: Vec<RegionEdge> = cz
            .zones
            .iter()
            .filter_map(|z| self.path_data(GlobalZoneId::new(chunk, z.id)))
            .flat_map(|rec| rec.outbound().iter().copied())
            .collect();
        out.sort_by_key(|e| (e.owner.zone, e.id));
        out
    }

    /// The zone labels, for read-only confinement of searches.
    #[inline]
    pub fn cells(&self) -> &TiledGrid<ZoneCell> {
        &self.cells
    }

    // -----------------------------------------------------------------------
    // Segments
    // -----------------------------------------------------------------------

    /// The path from `entry` to `exit` inside `zone`, from cache or computed
    /// by a search confined to the zone.
    ///
    /// Returns `None` if either point is not in `zone` or the search budget
    /// ran out. The chunk is decomposed first if it is not clean, which may
    /// renumber its zones.
    pub fn segment(
        &mut self,
        mode: &dyn MovementMode,
        zone: GlobalZoneId,
        entry: Point,
        exit: Point,
    ) -> Option<&PathSegment> {
        self.ensure_chunk(mode, zone.chunk);
        if self.global_zone_at(entry) != Some(zone) || self.global_zone_at(exit) != Some(zone) {
            return None;
        }

        let h = self.record_or_create(zone);
        let rec = self.records.get_mut(h)?;
        if rec.refresh() {
            log::trace!("flushed stale segments of {zone}");
        }
        if rec.segments().get(entry, exit).is_some() {
            self.stats.segment_hits += 1;
            log::trace!("segment hit {zone} {entry} -> {exit}");
            return self.records.get(h)?.segments().get(entry, exit);
        }

        let bounds = self.config.chunk.bounds_of(zone.chunk);
        let pather = ModePather::new(mode, self.metric)
            .within(bounds)
            .within_opt(self.config.world_bounds)
            .in_zone(&self.cells, zone.zone);
        self.area.set_range(bounds);
        let res = self.area.astar(
            &pather,
            &PointGoal::new(exit, self.metric),
            entry,
            self.config.segment_budget,
        );
        if !res.is_found() {
            log::debug!(
                "segment {zone} {entry} -> {exit} not found after {} nodes",
                res.nodes_evaluated
            );
            self.free_if_unused(zone);
            return None;
        }

        self.stats.segment_computations += 1;
        log::trace!(
            "segment miss {zone} {entry} -> {exit}: {} steps, {} nodes",
            res.len(),
            res.nodes_evaluated
        );
        let rec = self.records.get_mut(h)?;
        Some(rec.segments_mut().insert(PathSegment::from_search(&res)))
    }

    // -----------------------------------------------------------------------
    // Invalidation
    // -----------------------------------------------------------------------

    fn mark_record(&mut self, zone: GlobalZoneId, state: DirtyState) -> bool {
        let Some(&h) = self.record_index.get(&zone) else {
            return false;
        };
        match self.records.get_mut(h) {
            Some(rec) => {
                rec.mark(state);
                true
            }
            None => false,
        }
    }

    /// Terrain at `p` changed: its chunk is marked `Modified` and every zone
    /// of the chunk `PathDirty`. When `p` lies on the chunk border, the zones
    /// of neighbouring chunks touching it are marked `PathDirty` too.
    ///
    /// Returns `false` if the chunk is not loaded.
    pub fn mark_dirty(&mut self, p: Point) -> bool {
        let chunk = self.chunk_of(p);
        if !self.mark_chunk_dirty(chunk, DirtyState::Modified) {
            return false;
        }
        if self.chunk_bounds(chunk).on_border(p) {
            for dir in Direction::ALL {
                let q = p + dir;
                if self.chunk_of(q) == chunk {
                    continue;
                }
                if let Some(zone) = self.global_zone_at(q) {
                    self.mark_record(zone, DirtyState::PathDirty);
                }
            }
        }
        true
    }

    /// Merge `state` into the chunk's state and mark its zones `PathDirty`.
    /// Returns `false` if the chunk is not loaded.
    pub fn mark_chunk_dirty(&mut self, chunk: Point, state: DirtyState) -> bool {
        let Some(cz) = self.chunks.get_mut(&chunk) else {
            return false;
        };
        cz.state = cz.state.merge(state);
        cz.stale |= matches!(state, DirtyState::Modified | DirtyState::PathDirty);
        let ids: Vec<ZoneId> = cz.zones.iter().map(|z| z.id).collect();
        for id in ids {
            self.mark_record(GlobalZoneId::new(chunk, id), DirtyState::PathDirty);
        }
        log::trace!("chunk {chunk} marked {state:?}");
        true
    }

    /// Drop the cached segments of `zone` on next use without touching the
    /// decomposition. Returns `false` if the zone holds no path data.
    pub fn invalidate_zone(&mut self, zone: GlobalZoneId) -> bool {
        let marked = self.mark_record(zone, DirtyState::PathDirty);
        if marked {
            log::debug!("invalidated zone {zone}");
        }
        marked
    }

    /// Remove the chunk's labels, edges and records, returning pooled
    /// buffers. Returns `false` if it was not loaded.
    pub fn unload_chunk(&mut self, chunk: Point) -> bool {
        if !self.chunks.contains_key(&chunk) {
            return false;
        }
        self.release_chunk(chunk);
        self.chunks.remove(&chunk);
        self.cells.remove_tile(chunk);
        log::debug!("unloaded chunk {chunk} for {}/{:?}", self.mode, self.metric);
        true
    }

    /// Unload every chunk marked [`DirtyState::MarkedForRemove`]. Returns the
    /// number unloaded.
    pub fn unload_marked(&mut self) -> usize {
        let marked: Vec<Point> = self
            .chunks
            .iter()
            .filter(|(_, c)| c.state == DirtyState::MarkedForRemove)
            .map(|(k, _)| *k)
            .collect();
        for chunk in &marked {
            self.unload_chunk(*chunk);
        }
        marked.len()
    }

    /// Unload everything.
    pub fn clear(&mut self) {
        for rec in self.records.drain() {
            self.record_pool.give_back(rec);
        }
        self.record_index.clear();
        self.chunks.clear();
        self.cells.clear();
        self.stats.edges = 0;
        log::debug!("cleared layer {}/{:?}", self.mode, self.metric);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::FnMode;
    use gridzone_core::{Grid, TileConfig};
    use rand::rngs::StdRng;
    use rand::{RngExt, SeedableRng};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Terrain = Rc<RefCell<Grid<bool>>>;

    fn terrain(rows: &[&str]) -> Terrain {
        let mut g = Grid::new(
            Range::new(0, 0, rows[0].len() as i32, rows.len() as i32),
            true,
        );
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                g.set(Point::new(x as i32, y as i32), ch == '#');
            }
        }
        Rc::new(RefCell::new(g))
    }

    fn walker(t: &Terrain) -> FnMode<impl Fn(Point) -> Option<f32>> {
        let t = Rc::clone(t);
        FnMode::new(ModeId(0), move |p| match t.borrow().at(p) {
            Some(false) => Some(1.0),
            _ => None,
        })
    }

    fn layer(chunk: TileConfig, metric: DistanceMetric) -> ZoneLayer {
        ZoneLayer::new(ModeId(0), metric, RegionConfig::default().with_chunk(chunk))
    }

    #[test]
    fn open_chunk_is_one_zone() {
        let t = terrain(&[".........."; 10]);
        let mode = walker(&t);
        let mut l = layer(TileConfig::square(10), DistanceMetric::Chebyshev);
        assert_eq!(l.decompose_chunk(&mode, Point::ZERO), 1);
        let zones = l.zones(Point::ZERO).map(<[ZoneInfo]>::to_vec);
        assert_eq!(
            zones,
            Some(vec![ZoneInfo {
                id: ZoneId(1),
                cells: 100,
                bounds: Range::new(0, 0, 10, 10),
            }])
        );
        assert_eq!(l.chunk_age(Point::ZERO), Some(1));
        assert!(l.edges(Point::ZERO).is_empty());
    }

    #[test]
    fn neighbouring_chunks_link_both_ways() {
        let t = terrain(&["......", "......"]);
        let mode = walker(&t);
        let mut l = layer(TileConfig::new(3, 2), DistanceMetric::Manhattan);
        l.decompose_chunk(&mode, Point::new(0, 0));
        assert_eq!(l.stats().edges, 0);
        l.decompose_chunk(&mode, Point::new(1, 0));
        // two rows cross the boundary, one edge per row and direction
        assert_eq!(l.stats().edges, 4);
        let left = GlobalZoneId::new(Point::new(0, 0), ZoneId(1));
        let right = GlobalZoneId::new(Point::new(1, 0), ZoneId(1));
        let rec = l.path_data(left).map(|r| (r.outbound().len(), r.inbound().len()));
        assert_eq!(rec, Some((2, 2)));
        assert!(l.edges(Point::new(0, 0)).iter().all(|e| e.target == right));
        assert!(l.edges(Point::new(1, 0)).iter().all(|e| e.dir == Direction::West));
    }

    #[test]
    fn redecomposition_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(11);
        let rows: Vec<String> = (0..16)
            .map(|_| {
                (0..16)
                    .map(|_| if rng.random_range(0..10) < 3 { '#' } else { '.' })
                    .collect()
            })
            .collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let t = terrain(&rows);
        let mode = walker(&t);
        let mut l = layer(TileConfig::square(8), DistanceMetric::Chebyshev);
        let chunks = [Point::new(0, 0), Point::new(1, 0), Point::new(0, 1), Point::new(1, 1)];
        for c in chunks {
            l.decompose_chunk(&mode, c);
        }
        let snapshot = |l: &ZoneLayer| {
            let cells: Vec<Option<ZoneCell>> =
                Range::new(0, 0, 16, 16).iter().map(|p| l.cell(p)).collect();
            let edges: Vec<Vec<RegionEdge>> = chunks.iter().map(|c| l.edges(*c)).collect();
            (cells, edges, l.stats().edges)
        };
        let before = snapshot(&l);
        l.decompose_chunk(&mode, Point::new(1, 0));
        l.decompose_chunk(&mode, Point::new(0, 1));
        assert_eq!(snapshot(&l), before);
        assert_eq!(l.chunk_age(Point::new(1, 0)), Some(2));
    }

    #[test]
    fn unload_releases_both_halves() {
        let t = terrain(&["......"]);
        let mode = walker(&t);
        let mut l = layer(TileConfig::new(3, 1), DistanceMetric::Manhattan);
        l.decompose_chunk(&mode, Point::new(0, 0));
        l.decompose_chunk(&mode, Point::new(1, 0));
        assert_eq!(l.record_count(), 2);

        assert!(l.unload_chunk(Point::new(1, 0)));
        assert!(!l.unload_chunk(Point::new(1, 0)));
        assert_eq!(l.stats().edges, 0);
        assert_eq!(l.record_count(), 0);
        assert_eq!(l.record_pool_stats().returned, 2);
        assert_eq!(l.chunk_age(Point::new(1, 0)), None);
        assert_eq!(l.zone_at(Point::new(4, 0)), ZoneId::NONE);

        l.decompose_chunk(&mode, Point::new(1, 0));
        assert_eq!(l.chunk_age(Point::new(1, 0)), Some(1));
        assert_eq!(l.record_pool_stats().reused, 2);
    }

    #[test]
    fn mark_dirty_forces_redecomposition() {
        let t = terrain(&["....", "....", "....", "...."]);
        let mode = walker(&t);
        let mut l = layer(TileConfig::new(2, 4), DistanceMetric::Manhattan);
        l.ensure_chunk(&mode, Point::new(0, 0));
        l.ensure_chunk(&mode, Point::new(1, 0));
        assert!(!l.ensure_chunk(&mode, Point::new(0, 0)));

        // wall off the left chunk's right column
        for y in 0..4 {
            t.borrow_mut().set(Point::new(1, y), true);
            assert!(l.mark_dirty(Point::new(1, y)));
        }
        assert_eq!(l.chunk_state(Point::new(0, 0)), Some(DirtyState::Modified));
        assert!(l.ensure_chunk(&mode, Point::new(0, 0)));
        assert_eq!(l.stats().edges, 0);
        assert!(!l.mark_dirty(Point::new(50, 50)));
    }

    #[test]
    fn segments_are_cached_until_invalidated() {
        let t = terrain(&["....", ".##.", "...."]);
        let mode = walker(&t);
        let mut l = layer(TileConfig::new(4, 3), DistanceMetric::Manhattan);
        l.ensure_chunk(&mode, Point::ZERO);
        let zone = GlobalZoneId::new(Point::ZERO, ZoneId(1));
        let (a, b) = (Point::new(0, 1), Point::new(3, 1));

        let len = l.segment(&mode, zone, a, b).map(|s| s.len());
        assert_eq!(len, Some(5));
        assert!(l.segment(&mode, zone, a, b).is_some());
        assert_eq!(l.stats().segment_computations, 1);
        assert_eq!(l.stats().segment_hits, 1);

        assert!(l.invalidate_zone(zone));
        assert!(l.segment(&mode, zone, a, b).is_some());
        assert_eq!(l.stats().segment_computations, 2);

        // points outside the zone
        assert!(l.segment(&mode, zone, a, Point::new(1, 1)).is_none());
    }
}
