use std::cell::RefCell;
use std::rc::Rc;

use gridzone_core::{Direction, DistanceMetric, Grid, Point, Range, TileConfig};
use gridzone_paths::{PointGoal, SearchArea, SearchStatus};
use gridzone_regions::debug::{dump_connectivity, dump_edges, dump_zones};
use gridzone_regions::{
    DirtyState, FnMode, GlobalZoneId, ModeId, ModePather, ModeRegistry, ModeTable, RegionConfig,
    RegionGraph, ZoneEdgeKey, ZoneId,
};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

const WALK: ModeId = ModeId(0);

/// Walls are `#`; everything outside the map is a wall.
type Terrain = Rc<RefCell<Grid<bool>>>;

fn parse(rows: &[&str]) -> Terrain {
    let mut g = Grid::new(
        Range::new(0, 0, rows[0].len() as i32, rows.len() as i32),
        false,
    );
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            g.set(Point::new(x as i32, y as i32), ch == '#');
        }
    }
    Rc::new(RefCell::new(g))
}

fn graph(t: &Terrain, chunk: TileConfig, metric: DistanceMetric) -> RegionGraph<ModeTable> {
    let t = Rc::clone(t);
    let walk = FnMode::new(WALK, move |p| match t.borrow().at(p).copied() {
        Some(false) => Some(1.0),
        _ => None,
    });
    RegionGraph::new(
        ModeTable::new().with(walk, &[metric]),
        RegionConfig::default().with_chunk(chunk),
    )
}

fn wall_map() -> Terrain {
    let rows: Vec<String> = (0..10)
        .map(|y| {
            (0..10)
                .map(|x| if x == 5 && y != 5 { '#' } else { '.' })
                .collect()
        })
        .collect();
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    parse(&rows)
}

#[test]
fn open_chunk_decomposes_into_one_zone() {
    let t = parse(&[".........."; 10]);
    let mut g = graph(&t, TileConfig::square(10), DistanceMetric::Chebyshev);
    assert_eq!(g.ensure_chunk(Point::ZERO), 1);
    let zones = g.zones(WALK, DistanceMetric::Chebyshev, Point::ZERO).map(<[_]>::len);
    assert_eq!(zones, Some(1));
    let layer = g.layer(WALK, DistanceMetric::Chebyshev).map(|l| dump_zones(l, Point::ZERO));
    assert_eq!(layer.as_deref(), Some("1111111111\n".repeat(10).as_str()));
}

#[test]
fn wall_with_gap_gives_two_zones_and_one_edge_pair() {
    let t = wall_map();
    let metric = DistanceMetric::Manhattan;
    let mut g = graph(&t, TileConfig::new(5, 10), metric);
    g.ensure_chunk(Point::new(0, 0));
    g.ensure_chunk(Point::new(1, 0));

    let left = Point::new(0, 0);
    let right = Point::new(1, 0);
    assert_eq!(g.zones(WALK, metric, left).map(<[_]>::len), Some(1));
    assert_eq!(g.zones(WALK, metric, right).map(<[_]>::len), Some(1));

    let key = |chunk| ZoneEdgeKey {
        zone: GlobalZoneId::new(chunk, ZoneId(1)),
        mode: WALK,
        metric,
    };
    for chunk in [left, right] {
        let counts = g
            .path_data(key(chunk))
            .map(|r| (r.outbound().len(), r.inbound().len()));
        assert_eq!(counts, Some((1, 1)), "chunk {chunk}");
    }

    let out = g.edges(WALK, metric, left);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].from, Point::new(4, 5));
    assert_eq!(out[0].dir, Direction::East);
    assert_eq!(out[0].target, key(right).zone);

    let back = g.edges(WALK, metric, right);
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].from, Point::new(5, 5));
    assert_eq!(back[0].dir, Direction::West);

    let layer = g.layer(WALK, metric).map(|l| l.stats().edges);
    assert_eq!(layer, Some(2));
}

#[test]
fn query_crosses_the_gap() {
    let t = wall_map();
    let metric = DistanceMetric::Manhattan;
    let mut g = graph(&t, TileConfig::new(5, 10), metric);
    let res = g.find_path(WALK, metric, Point::new(1, 0), Point::new(8, 0));
    assert_eq!(res.status, SearchStatus::Found);
    assert!(res.points().any(|p| p == Point::new(5, 5)));
    // down to the gap and back up on the far side
    assert_eq!(res.len(), 17);
    assert_eq!(res.cost, 17.0);
}

#[test]
fn decomposition_is_idempotent_on_random_maps() {
    let mut rng = StdRng::seed_from_u64(2024);
    for round in 0..4 {
        let rows: Vec<String> = (0..24)
            .map(|_| {
                (0..24)
                    .map(|_| if rng.random_range(0..100) < 35 { '#' } else { '.' })
                    .collect()
            })
            .collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let t = parse(&rows);
        let metric = if round % 2 == 0 {
            DistanceMetric::Chebyshev
        } else {
            DistanceMetric::Manhattan
        };
        let mut g = graph(&t, TileConfig::square(8), metric);
        let chunks: Vec<Point> = Range::new(0, 0, 3, 3).iter().collect();
        for c in &chunks {
            g.ensure_chunk(*c);
        }

        let dump = |g: &RegionGraph<ModeTable>| -> Vec<String> {
            let Some(l) = g.layer(WALK, metric) else {
                return Vec::new();
            };
            chunks
                .iter()
                .flat_map(|c| [dump_zones(l, *c), dump_connectivity(l, *c), dump_edges(l, *c)])
                .collect()
        };
        let before = dump(&g);
        for c in &chunks {
            g.mark_chunk_dirty(*c, DirtyState::Modified);
        }
        for c in &chunks {
            assert_eq!(g.ensure_chunk(*c), 1);
        }
        assert_eq!(dump(&g), before, "round {round}");
    }
}

#[test]
fn segment_decompresses_to_the_searched_path() {
    let t = parse(&[
        "........",
        ".######.",
        "......#.",
        "#####.#.",
        "........",
    ]);
    let metric = DistanceMetric::Chebyshev;
    let mut g = graph(&t, TileConfig::new(8, 5), metric);
    g.ensure_chunk(Point::ZERO);
    let key = ZoneEdgeKey {
        zone: GlobalZoneId::new(Point::ZERO, ZoneId(1)),
        mode: WALK,
        metric,
    };
    let (entry, exit) = (Point::new(0, 2), Point::new(0, 4));
    let cells: Vec<Point> = match g.segment(key, entry, exit) {
        Some(seg) => seg.cells().collect(),
        None => panic!("no segment"),
    };

    let mode = g.registry().mode(WALK).map(|m| {
        let Some(layer) = g.layer(WALK, metric) else {
            panic!("no layer");
        };
        let pather = ModePather::new(m, metric)
            .within(Range::new(0, 0, 8, 5))
            .in_zone(layer.cells(), ZoneId(1));
        let mut area = SearchArea::new(Range::new(0, 0, 8, 5));
        let res = area.astar(&pather, &PointGoal::new(exit, metric), entry, None);
        res.points().collect::<Vec<_>>()
    });
    assert_eq!(mode, Some(cells.clone()));
    assert_eq!(cells.last(), Some(&exit));
}

#[test]
fn invalidating_a_zone_recomputes_its_segment() {
    let t = parse(&["......", "......", "......"]);
    let metric = DistanceMetric::Chebyshev;
    let mut g = graph(&t, TileConfig::new(6, 3), metric);
    g.ensure_chunk(Point::ZERO);
    let key = ZoneEdgeKey {
        zone: GlobalZoneId::new(Point::ZERO, ZoneId(1)),
        mode: WALK,
        metric,
    };
    let (a, b) = (Point::new(0, 0), Point::new(5, 2));
    let computations = |g: &RegionGraph<ModeTable>| {
        g.layer(WALK, metric).map_or(0, |l| l.stats().segment_computations)
    };

    assert!(g.segment(key, a, b).is_some());
    assert!(g.segment(key, a, b).is_some());
    assert_eq!(computations(&g), 1);

    assert!(g.invalidate_zone(key));
    assert!(g.segment(key, a, b).is_some());
    assert_eq!(computations(&g), 2);
}

#[test]
fn terrain_edits_reroute_queries() {
    let t = wall_map();
    let metric = DistanceMetric::Manhattan;
    let mut g = graph(&t, TileConfig::new(5, 10), metric);
    let (a, b) = (Point::new(0, 5), Point::new(9, 5));
    assert!(g.find_path(WALK, metric, a, b).is_found());

    t.borrow_mut().set(Point::new(5, 5), true);
    g.mark_dirty(Point::new(5, 5));
    let closed = g.find_path(WALK, metric, a, b);
    assert_eq!(closed.status, SearchStatus::NotFound);
    assert!(closed.is_empty());
    assert_eq!(closed.target(), a);

    t.borrow_mut().set(Point::new(5, 2), false);
    g.mark_dirty(Point::new(5, 2));
    let reopened = g.find_path(WALK, metric, a, b);
    assert!(reopened.is_found());
    assert!(reopened.points().any(|p| p == Point::new(5, 2)));
}

#[test]
fn unloading_returns_pooled_storage() {
    let t = wall_map();
    let metric = DistanceMetric::Manhattan;
    let mut g = graph(&t, TileConfig::new(5, 10), metric);
    g.ensure_chunk(Point::new(0, 0));
    g.ensure_chunk(Point::new(1, 0));

    g.mark_chunk_dirty(Point::new(1, 0), DirtyState::MarkedForRemove);
    assert_eq!(g.unload_marked(), 1);
    let Some(layer) = g.layer(WALK, metric) else {
        panic!("no layer");
    };
    assert_eq!(layer.chunk_state(Point::new(1, 0)), None);
    assert_eq!(layer.stats().edges, 0);
    assert_eq!(layer.record_count(), 0);
    assert_eq!(layer.tile_pool_stats().returned, 1);

    assert_eq!(g.unload_chunk(Point::new(0, 0)), 1);
    g.clear();
    assert_eq!(g.ensure_chunk(Point::new(1, 0)), 1);
    let reused = g.layer(WALK, metric).map(|l| l.tile_pool_stats().reused);
    assert_eq!(reused, Some(1));
}

#[test]
fn queries_keep_a_scheduled_unload() {
    let t = wall_map();
    let metric = DistanceMetric::Manhattan;
    let mut g = graph(&t, TileConfig::new(5, 10), metric);
    g.ensure_chunk(Point::new(0, 0));
    g.ensure_chunk(Point::new(1, 0));
    let right = Point::new(1, 0);
    let state = |g: &RegionGraph<ModeTable>| g.layer(WALK, metric).and_then(|l| l.chunk_state(right));
    let age = |g: &RegionGraph<ModeTable>| g.layer(WALK, metric).and_then(|l| l.chunk_age(right));

    g.mark_chunk_dirty(right, DirtyState::MarkedForRemove);
    let res = g.find_path(WALK, metric, Point::new(1, 0), Point::new(8, 0));
    assert!(res.is_found());
    assert_eq!(res.cost, 17.0);
    assert_eq!(state(&g), Some(DirtyState::MarkedForRemove));
    assert_eq!(age(&g), Some(1));

    // edited after being scheduled: relabelled, still scheduled
    t.borrow_mut().set(Point::new(7, 3), true);
    g.mark_dirty(Point::new(7, 3));
    assert_eq!(state(&g), Some(DirtyState::MarkedForRemove));
    assert!(g.find_path(WALK, metric, Point::new(1, 0), Point::new(8, 0)).is_found());
    assert_eq!(age(&g), Some(2));
    assert_eq!(state(&g), Some(DirtyState::MarkedForRemove));

    assert_eq!(g.unload_marked(), 1);
    assert_eq!(state(&g), None);
}

#[test]
fn query_leaves_unreachable_neighbours_undecomposed() {
    // the left chunk's east column is solid wall
    let t = parse(&["....#.....", "....#.....", "....#.....", "....#.....", "....#....."]);
    let metric = DistanceMetric::Manhattan;
    let mut g = graph(&t, TileConfig::new(5, 5), metric);
    let res = g.find_path(WALK, metric, Point::new(0, 0), Point::new(3, 4));
    assert!(res.is_found());
    assert_eq!(res.cost, 7.0);
    let layer = g.layer(WALK, metric);
    assert_eq!(layer.and_then(|l| l.chunk_state(Point::new(0, 0))), Some(DirtyState::Clean));
    assert_eq!(layer.and_then(|l| l.chunk_state(Point::new(1, 0))), None);
}

#[test]
fn stale_chunk_on_the_route_is_relabelled_before_entry() {
    let t = parse(&["..............."; 5]);
    let metric = DistanceMetric::Manhattan;
    let mut g = graph(&t, TileConfig::new(5, 5), metric);
    for x in 0..3 {
        g.ensure_chunk(Point::new(x, 0));
    }
    for y in 0..4 {
        t.borrow_mut().set(Point::new(7, y), true);
        g.mark_dirty(Point::new(7, y));
    }
    let middle = Point::new(1, 0);
    assert_eq!(
        g.layer(WALK, metric).and_then(|l| l.chunk_state(middle)),
        Some(DirtyState::Modified)
    );

    let res = g.find_path(WALK, metric, Point::new(0, 0), Point::new(14, 0));
    assert!(res.is_found());
    assert!(res.points().any(|p| p == Point::new(7, 4)));
    assert_eq!(res.cost, 22.0);
    assert_eq!(
        g.layer(WALK, metric).and_then(|l| l.chunk_state(middle)),
        Some(DirtyState::Clean)
    );
}
