//! A* best-first search towards a predicate-defined goal.

use gridzone_core::Point;

use crate::SearchArea;
use crate::search::{NO_PARENT, NodeRef, NodeState, PathStep, SearchResult, SearchStatus};
use crate::traits::{Pather, SearchGoal};

impl SearchArea {
    /// Search from `from` until a cell satisfying `goal` is dequeued.
    ///
    /// Cells move Unvisited → Open → Closed; a closed cell is never reopened.
    /// `budget` caps the number of evaluated nodes. When the goal is not
    /// reached, the result carries the path to the evaluated node with the
    /// lowest heuristic estimate, tagged [`SearchStatus::SearchLimitReached`]
    /// or [`SearchStatus::NotFound`].
    ///
    /// A start outside the area yields an empty `NotFound` result.
    pub fn astar<P: Pather, G: SearchGoal>(
        &mut self,
        pather: &P,
        goal: &G,
        from: Point,
        budget: Option<usize>,
    ) -> SearchResult {
        let Some(start_idx) = self.idx(from) else {
            return SearchResult::empty(SearchStatus::NotFound, from);
        };

        // Bump generation to lazily invalidate all nodes.
        self.stamp = self.stamp.wrapping_add(1);
        let cur_gen = self.stamp;

        {
            let node = &mut self.nodes[start_idx];
            node.g = 0.0;
            node.parent = NO_PARENT;
            node.dir = gridzone_core::Direction::None;
            node.meta = 0;
            node.generation = cur_gen;
            node.state = NodeState::Open;
        }

        self.open.clear();
        let seq = self.next_seq();
        self.open.push(NodeRef {
            idx: start_idx,
            g: 0.0,
            f: goal.estimate(from),
            seq,
        });

        let mut best_idx = start_idx;
        let mut best_h = goal.estimate(from);
        let mut evaluated = 0usize;
        let adjacency = pather.adjacency();

        let status = loop {
            let Some(current) = self.open.pop() else {
                break SearchStatus::NotFound;
            };
            let ci = current.idx;

            // Skip stale entries.
            let node = &self.nodes[ci];
            if node.generation != cur_gen
                || node.state == NodeState::Closed
                || current.g > node.g
            {
                continue;
            }

            if budget.is_some_and(|b| evaluated >= b) {
                log::trace!("astar from {from} stopped after {evaluated} nodes");
                break SearchStatus::SearchLimitReached;
            }
            evaluated += 1;

            let current_point = self.point(ci);
            if goal.is_goal(current_point) {
                best_idx = ci;
                break SearchStatus::Found;
            }

            self.nodes[ci].state = NodeState::Closed;
            let current_g = self.nodes[ci].g;

            let h = goal.estimate(current_point);
            if h < best_h {
                best_h = h;
                best_idx = ci;
            }

            for &dir in adjacency.directions() {
                let np = current_point + dir;
                let Some(ni) = self.idx(np) else {
                    continue;
                };
                let Some(step) = pather.step(current_point, dir, current_g) else {
                    continue;
                };
                debug_assert!(
                    step.cost >= current_g,
                    "cost decreased from {current_g} to {} moving {dir} from {current_point}",
                    step.cost
                );

                let n = &mut self.nodes[ni];
                if n.generation == cur_gen {
                    if n.state == NodeState::Closed || step.cost >= n.g {
                        continue;
                    }
                } else {
                    n.generation = cur_gen;
                }

                n.g = step.cost;
                n.parent = ci;
                n.dir = dir;
                n.meta = step.meta;
                n.state = NodeState::Open;

                let seq = self.next_seq();
                self.open.push(NodeRef {
                    idx: ni,
                    g: step.cost,
                    f: step.cost + goal.estimate(np),
                    seq,
                });
            }
        };

        let steps = self.astar_reconstruct(best_idx);
        SearchResult {
            status,
            origin: from,
            cost: self.nodes[best_idx].g,
            steps,
            nodes_evaluated: evaluated,
        }
    }

    /// Walk parent pointers from `idx` back to the start, then reverse.
    fn astar_reconstruct(&self, idx: usize) -> Vec<PathStep> {
        let mut steps = Vec::new();
        let mut ci = idx;
        loop {
            let n = &self.nodes[ci];
            if n.parent == NO_PARENT {
                break;
            }
            steps.push(PathStep {
                pos: self.point(ci),
                dir: n.dir,
                meta: n.meta,
                cost: n.g,
            });
            ci = n.parent;
        }
        steps.reverse();
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{FnGoal, PointGoal, Step};
    use gridzone_core::{
        Adjacency, Direction, DistanceMetric, Grid, Range, chebyshev,
    };
    use rand::rngs::StdRng;
    use rand::{RngExt, SeedableRng};

    /// `#` is a wall; everything else costs one per step.
    struct AsciiMap {
        walls: Grid<bool>,
        adjacency: Adjacency,
    }

    impl AsciiMap {
        fn parse(rows: &[&str], adjacency: Adjacency) -> Self {
            let h = rows.len() as i32;
            let w = rows[0].len() as i32;
            let mut walls = Grid::new(Range::new(0, 0, w, h), false);
            for (y, row) in rows.iter().enumerate() {
                for (x, ch) in row.chars().enumerate() {
                    walls.set(Point::new(x as i32, y as i32), ch == '#');
                }
            }
            Self { walls, adjacency }
        }

        fn open(w: i32, h: i32) -> Self {
            Self {
                walls: Grid::new(Range::new(0, 0, w, h), false),
                adjacency: Adjacency::EightWay,
            }
        }
    }

    impl Pather for AsciiMap {
        fn adjacency(&self) -> Adjacency {
            self.adjacency
        }

        fn passable(&self, p: Point) -> bool {
            self.walls.at(p) == Some(&false)
        }

        fn step(&self, from: Point, dir: Direction, cost: f32) -> Option<Step> {
            if self.passable(from + dir) {
                Some(Step::new(cost + 1.0, 0))
            } else {
                None
            }
        }
    }

    #[test]
    fn start_equal_to_goal_is_found_and_empty() {
        let map = AsciiMap::open(5, 5);
        let mut area = SearchArea::new(map.walls.bounds());
        let p = Point::new(2, 3);
        let res = area.astar(&map, &PointGoal::new(p, DistanceMetric::Chebyshev), p, None);
        assert_eq!(res.status, SearchStatus::Found);
        assert!(res.is_empty());
        assert_eq!(res.cost, 0.0);
        assert_eq!(res.target(), p);
    }

    #[test]
    fn open_map_path_length_is_chebyshev_distance() {
        let map = AsciiMap::open(24, 24);
        let mut area = SearchArea::new(map.walls.bounds());
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let a = Point::new(rng.random_range(0..24), rng.random_range(0..24));
            let b = Point::new(rng.random_range(0..24), rng.random_range(0..24));
            let res = area.astar(&map, &PointGoal::new(b, DistanceMetric::Chebyshev), a, None);
            assert!(res.is_found());
            assert_eq!(res.len() as i32, chebyshev(a, b), "{a} -> {b}");
            assert_eq!(res.cost, chebyshev(a, b) as f32);
            assert_eq!(res.target(), b);
        }
    }

    #[test]
    fn path_steps_are_contiguous() {
        let map = AsciiMap::parse(
            &[
                "..........",
                ".########.",
                ".#......#.",
                ".#.####.#.",
                ".#....#...",
                ".######.##",
                "..........",
            ],
            Adjacency::Cardinal,
        );
        let mut area = SearchArea::new(map.walls.bounds());
        let from = Point::new(2, 4);
        let to = Point::new(0, 6);
        let res = area.astar(&map, &PointGoal::new(to, DistanceMetric::Manhattan), from, None);
        assert!(res.is_found());
        let mut cur = from;
        for s in &res.steps {
            assert!(s.dir.is_cardinal());
            assert_eq!(cur + s.dir, s.pos);
            assert!(map.passable(s.pos));
            cur = s.pos;
        }
        assert_eq!(cur, to);
    }

    #[test]
    fn prefers_straight_moves_on_ties() {
        let map = AsciiMap::open(6, 1);
        let mut area = SearchArea::new(map.walls.bounds());
        let res = area.astar(
            &map,
            &PointGoal::new(Point::new(5, 0), DistanceMetric::Chebyshev),
            Point::new(0, 0),
            None,
        );
        assert!(res.steps.iter().all(|s| s.dir == Direction::East));
    }

    #[test]
    fn unreachable_goal_returns_closest_partial() {
        let map = AsciiMap::parse(
            &[
                "....#...", //
                "....#...",
                "....#...",
            ],
            Adjacency::EightWay,
        );
        let mut area = SearchArea::new(map.walls.bounds());
        let goal = PointGoal::new(Point::new(7, 1), DistanceMetric::Chebyshev);
        let res = area.astar(&map, &goal, Point::new(0, 1), None);
        assert_eq!(res.status, SearchStatus::NotFound);
        assert_eq!(res.target().x, 3);
        assert_eq!(res.nodes_evaluated, 12);
    }

    #[test]
    fn budget_exhaustion_returns_best_so_far() {
        let map = AsciiMap::open(50, 1);
        let mut area = SearchArea::new(map.walls.bounds());
        let goal = PointGoal::new(Point::new(49, 0), DistanceMetric::Chebyshev);
        let res = area.astar(&map, &goal, Point::new(0, 0), Some(10));
        assert_eq!(res.status, SearchStatus::SearchLimitReached);
        assert_eq!(res.nodes_evaluated, 10);
        assert_eq!(res.target(), Point::new(9, 0));
        assert_eq!(res.len(), 9);
    }

    #[test]
    fn predicate_goal_supports_multi_cell_targets() {
        let map = AsciiMap::open(10, 10);
        let mut area = SearchArea::new(map.walls.bounds());
        let goal = FnGoal {
            is_goal: |p: Point| p.x == 9,
            estimate: |p: Point| (9 - p.x) as f32,
        };
        let res = area.astar(&map, &goal, Point::new(0, 4), None);
        assert!(res.is_found());
        assert_eq!(res.target().x, 9);
        assert_eq!(res.len(), 9);
    }

    #[test]
    fn start_outside_area_is_not_found() {
        let map = AsciiMap::open(3, 3);
        let mut area = SearchArea::new(map.walls.bounds());
        let p = Point::new(-1, 0);
        let res = area.astar(&map, &PointGoal::new(Point::ZERO, DistanceMetric::Chebyshev), p, None);
        assert_eq!(res.status, SearchStatus::NotFound);
        assert_eq!(res.nodes_evaluated, 0);
    }

    #[test]
    fn reuse_after_rebase() {
        let map = AsciiMap::open(40, 40);
        let mut area = SearchArea::new(Range::new(0, 0, 40, 40));
        area.set_range(Range::new(10, 10, 20, 20));
        let goal = PointGoal::new(Point::new(19, 19), DistanceMetric::Chebyshev);
        let res = area.astar(&map, &goal, Point::new(10, 10), None);
        assert!(res.is_found());
        assert_eq!(res.len(), 9);
        // A goal outside the window cannot be reached.
        let far = PointGoal::new(Point::new(30, 30), DistanceMetric::Chebyshev);
        let res = area.astar(&map, &far, Point::new(10, 10), None);
        assert_eq!(res.status, SearchStatus::NotFound);
        assert_eq!(res.target(), Point::new(19, 19));
    }

    /// Every step refunds one unit instead of charging it.
    struct Refunding(AsciiMap);

    impl Pather for Refunding {
        fn adjacency(&self) -> Adjacency {
            self.0.adjacency()
        }

        fn passable(&self, p: Point) -> bool {
            self.0.passable(p)
        }

        fn step(&self, from: Point, dir: Direction, cost: f32) -> Option<Step> {
            self.0.step(from, dir, cost).map(|s| Step::new(cost - 1.0, s.meta))
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "cost decreased")]
    fn decreasing_step_cost_panics() {
        let map = Refunding(AsciiMap::open(6, 6));
        let mut area = SearchArea::new(Range::new(0, 0, 6, 6));
        let goal = PointGoal::new(Point::new(5, 5), DistanceMetric::Chebyshev);
        area.astar(&map, &goal, Point::ZERO, None);
    }
}
