//! Multi-source Dijkstra producing a flow field.
//!
//! Every source starts at cost 0 and carries a positive weight: a cell is
//! only reached while its cost stays strictly below the weight of the source
//! it descends from. Cells are settled by remaining budget (`weight - cost`,
//! largest first), so a cell belongs to the source that reaches it with the
//! most budget left. With equal weights that is the nearest source. The
//! resulting cost and backpointer field answers "how far" and "which way"
//! for every reached cell without searching again.

use gridzone_core::{Direction, Point};

use crate::SearchArea;
use crate::search::{NO_PARENT, NodeRef, NodeState, PathStep, SearchResult, SearchStatus};
use crate::traits::Pather;

/// A seed of a flow field search.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlowSource {
    pub pos: Point,
    /// Exclusive cost limit of cells reached from this source. Must be
    /// positive.
    pub weight: f32,
}

impl FlowSource {
    pub const fn new(pos: Point, weight: f32) -> Self {
        Self { pos, weight }
    }
}

/// A cell settled by a flow field search.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlowNode {
    pub pos: Point,
    /// Cumulative cost from the source owning this cell.
    pub cost: f32,
    /// Backpointer: direction of the next cell towards that source.
    /// `Direction::None` on sources.
    pub dir: Direction,
}

impl SearchArea {
    /// Flood outwards from `sources` and return every settled cell, in
    /// settling order: decreasing remaining budget, which is non-decreasing
    /// cost order when all weights are equal.
    ///
    /// A cell is reached when some source's true cost to it is below that
    /// source's weight. A neighbour is updated only when the new route leaves
    /// strictly more budget than the one already recorded, so among equal
    /// routes the first found (cardinal moves first) is kept. Sources outside
    /// the area are ignored; a cell listed twice keeps the larger weight.
    ///
    /// # Panics
    ///
    /// Panics if a source weight is not positive.
    pub fn flow_field<P: Pather>(&mut self, pather: &P, sources: &[FlowSource]) -> &[FlowNode] {
        self.flow_stamp = self.flow_stamp.wrapping_add(1);
        let cur_gen = self.flow_stamp;
        self.flow_results.clear();
        self.open.clear();

        for src in sources {
            assert!(
                src.weight > 0.0,
                "flow source at {} has non-positive weight {}",
                src.pos,
                src.weight
            );
            let Some(i) = self.idx(src.pos) else {
                continue;
            };
            let node = &mut self.flow_nodes[i];
            if node.generation == cur_gen && node.limit >= src.weight {
                continue;
            }
            node.g = 0.0;
            node.limit = src.weight;
            node.parent = NO_PARENT;
            node.dir = Direction::None;
            node.meta = 0;
            node.generation = cur_gen;
            node.state = NodeState::Open;
            let seq = self.next_seq();
            self.open.push(NodeRef {
                idx: i,
                g: 0.0,
                f: -src.weight,
                seq,
            });
        }

        let adjacency = pather.adjacency();
        while let Some(current) = self.open.pop() {
            let ci = current.idx;
            let node = &self.flow_nodes[ci];
            if node.generation != cur_gen
                || node.state == NodeState::Closed
                || current.f > node.g - node.limit
            {
                continue;
            }
            let (cost, limit, entered_by) = (node.g, node.limit, node.dir);
            self.flow_nodes[ci].state = NodeState::Closed;

            let cp = self.point(ci);
            self.flow_results.push(FlowNode {
                pos: cp,
                cost,
                dir: entered_by.inverse(),
            });

            for &dir in adjacency.directions() {
                let Some(ni) = self.idx(cp + dir) else {
                    continue;
                };
                let Some(step) = pather.step(cp, dir, cost) else {
                    continue;
                };
                debug_assert!(
                    step.cost >= cost,
                    "cost decreased from {cost} to {} moving {dir} from {cp}",
                    step.cost
                );
                if step.cost >= limit {
                    continue;
                }

                // smaller key means more budget left
                let key = step.cost - limit;
                let n = &mut self.flow_nodes[ni];
                if n.generation == cur_gen {
                    if n.state == NodeState::Closed || key >= n.g - n.limit {
                        continue;
                    }
                } else {
                    n.generation = cur_gen;
                }
                n.g = step.cost;
                n.limit = limit;
                n.parent = ci;
                n.dir = dir;
                n.meta = step.meta;
                n.state = NodeState::Open;

                let seq = self.next_seq();
                self.open.push(NodeRef {
                    idx: ni,
                    g: step.cost,
                    f: key,
                    seq,
                });
            }
        }

        log::trace!(
            "flow field over {} from {} sources settled {} cells",
            self.bounds,
            sources.len(),
            self.flow_results.len()
        );
        &self.flow_results
    }

    /// Cells settled by the last [`flow_field`](Self::flow_field).
    pub fn flow_nodes(&self) -> &[FlowNode] {
        &self.flow_results
    }

    fn flow_node_at(&self, p: Point) -> Option<usize> {
        let i = self.idx(p)?;
        let n = &self.flow_nodes[i];
        (n.generation == self.flow_stamp && n.state == NodeState::Closed).then_some(i)
    }

    /// Cost from `p` to the source owning it, or `None` if the last flow
    /// field did not reach it.
    pub fn flow_cost_at(&self, p: Point) -> Option<f32> {
        self.flow_node_at(p).map(|i| self.flow_nodes[i].g)
    }

    /// Direction to move from `p` towards the source owning it.
    /// `Direction::None` on sources and unreached cells.
    pub fn flow_dir_at(&self, p: Point) -> Direction {
        self.flow_node_at(p)
            .map_or(Direction::None, |i| self.flow_nodes[i].dir.inverse())
    }

    /// Follow backpointers from `from` towards the source owning it, taking at
    /// most `max_len` steps.
    ///
    /// Step costs in the result count the distance travelled from `from`.
    /// The status is `Found` when a source is reached, `SearchLimitReached`
    /// when `max_len` ran out first and `NotFound` when `from` was not
    /// reached by the field.
    pub fn flow_path(&self, from: Point, max_len: usize) -> SearchResult {
        let Some(mut ci) = self.flow_node_at(from) else {
            return SearchResult::empty(SearchStatus::NotFound, from);
        };
        let start_cost = self.flow_nodes[ci].g;
        let mut steps = Vec::new();

        let status = loop {
            let node = &self.flow_nodes[ci];
            if node.parent == NO_PARENT {
                break SearchStatus::Found;
            }
            if steps.len() >= max_len {
                break SearchStatus::SearchLimitReached;
            }
            let next = node.parent;
            steps.push(PathStep {
                pos: self.point(next),
                dir: node.dir.inverse(),
                meta: node.meta,
                cost: start_cost - self.flow_nodes[next].g,
            });
            ci = next;
        };

        SearchResult {
            status,
            origin: from,
            cost: start_cost - self.flow_nodes[ci].g,
            nodes_evaluated: steps.len(),
            steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Step;
    use gridzone_core::{Adjacency, Grid, Range};
    use rand::rngs::StdRng;
    use rand::{RngExt, SeedableRng};
    use std::collections::VecDeque;

    struct Walls {
        walls: Grid<bool>,
        diagonal_cost: f32,
    }

    impl Walls {
        fn random(w: i32, h: i32, seed: u64) -> Self {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut walls = Grid::new(Range::new(0, 0, w, h), false);
            for p in Range::new(0, 0, w, h).iter() {
                walls.set(p, rng.random_range(0..100) < 25);
            }
            Self {
                walls,
                diagonal_cost: 1.0,
            }
        }
    }

    impl Pather for Walls {
        fn adjacency(&self) -> Adjacency {
            Adjacency::EightWay
        }

        fn passable(&self, p: Point) -> bool {
            self.walls.at(p) == Some(&false)
        }

        fn step(&self, from: Point, dir: Direction, cost: f32) -> Option<Step> {
            if !self.passable(from + dir) {
                return None;
            }
            let c = if dir.is_diagonal() { self.diagonal_cost } else { 1.0 };
            Some(Step::new(cost + c, dir.code()))
        }
    }

    /// Breadth-first distances on a unit-cost map.
    fn bfs(map: &Walls, from: Point) -> Grid<Option<u32>> {
        let mut dist = Grid::new(map.walls.bounds(), None);
        let mut queue = VecDeque::new();
        dist.set(from, Some(0));
        queue.push_back(from);
        while let Some(p) = queue.pop_front() {
            let d = dist.at(p).copied().flatten().unwrap_or(0);
            for &dir in Adjacency::EightWay.directions() {
                let np = p + dir;
                if map.passable(np) && dist.at(np) == Some(&None) {
                    dist.set(np, Some(d + 1));
                    queue.push_back(np);
                }
            }
        }
        dist
    }

    #[test]
    fn single_source_reach_matches_true_distances() {
        for seed in 0..5 {
            let mut map = Walls::random(20, 15, seed);
            let src = Point::new(10, 7);
            map.walls.set(src, false);
            let truth = bfs(&map, src);

            let mut area = SearchArea::new(map.walls.bounds());
            let weight = 6.0;
            area.flow_field(&map, &[FlowSource::new(src, weight)]);

            for p in map.walls.bounds().iter() {
                let expected = truth
                    .at(p)
                    .copied()
                    .flatten()
                    .map(|d| d as f32)
                    .filter(|&d| d < weight);
                assert_eq!(area.flow_cost_at(p), expected, "seed {seed} at {p}");
            }
        }
    }

    #[test]
    fn results_come_out_in_cost_order() {
        let map = Walls::random(16, 16, 42);
        let mut area = SearchArea::new(map.walls.bounds());
        let sources: Vec<_> = [Point::new(1, 1), Point::new(14, 14)]
            .into_iter()
            .filter(|p| map.passable(*p))
            .map(|p| FlowSource::new(p, 100.0))
            .collect();
        let nodes = area.flow_field(&map, &sources);
        assert!(nodes.windows(2).all(|w| w[0].cost <= w[1].cost));
    }

    #[test]
    fn multi_source_points_to_nearest() {
        let map = Walls {
            walls: Grid::new(Range::new(0, 0, 21, 1), false),
            diagonal_cost: 1.0,
        };
        let mut area = SearchArea::new(map.walls.bounds());
        area.flow_field(
            &map,
            &[
                FlowSource::new(Point::new(0, 0), 50.0),
                FlowSource::new(Point::new(20, 0), 50.0),
            ],
        );
        assert_eq!(area.flow_dir_at(Point::new(3, 0)), Direction::West);
        assert_eq!(area.flow_dir_at(Point::new(17, 0)), Direction::East);
        assert_eq!(area.flow_cost_at(Point::new(10, 0)), Some(10.0));
        assert_eq!(area.flow_dir_at(Point::new(0, 0)), Direction::None);
    }

    #[test]
    fn flow_path_descends_to_source() {
        let map = Walls {
            walls: Grid::new(Range::new(0, 0, 10, 10), false),
            diagonal_cost: 1.5,
        };
        let mut area = SearchArea::new(map.walls.bounds());
        let src = Point::new(0, 0);
        area.flow_field(&map, &[FlowSource::new(src, 100.0)]);

        let from = Point::new(4, 2);
        let cost = area.flow_cost_at(from);
        assert_eq!(cost, Some(5.0));
        let path = area.flow_path(from, 100);
        assert_eq!(path.status, SearchStatus::Found);
        assert_eq!(path.target(), src);
        assert_eq!(path.cost, 5.0);
        let mut cur = from;
        for s in &path.steps {
            assert_eq!(cur + s.dir, s.pos);
            cur = s.pos;
        }

        let short = area.flow_path(from, 1);
        assert_eq!(short.status, SearchStatus::SearchLimitReached);
        assert_eq!(short.len(), 1);
    }

    #[test]
    fn unreached_cells_have_no_path() {
        let map = Walls {
            walls: Grid::new(Range::new(0, 0, 10, 1), false),
            diagonal_cost: 1.0,
        };
        let mut area = SearchArea::new(map.walls.bounds());
        area.flow_field(&map, &[FlowSource::new(Point::new(0, 0), 3.0)]);
        assert_eq!(area.flow_cost_at(Point::new(2, 0)), Some(2.0));
        assert_eq!(area.flow_cost_at(Point::new(3, 0)), None);
        let res = area.flow_path(Point::new(5, 0), 10);
        assert_eq!(res.status, SearchStatus::NotFound);
        assert!(res.is_empty());
    }

    #[test]
    fn rebase_invalidates_field() {
        let map = Walls {
            walls: Grid::new(Range::new(0, 0, 10, 10), false),
            diagonal_cost: 1.0,
        };
        let mut area = SearchArea::new(map.walls.bounds());
        area.flow_field(&map, &[FlowSource::new(Point::new(5, 5), 4.0)]);
        assert!(area.flow_cost_at(Point::new(5, 5)).is_some());
        area.set_range(Range::new(0, 0, 10, 10));
        assert_eq!(area.flow_cost_at(Point::new(5, 5)), None);
        assert!(area.flow_nodes().is_empty());
    }

    #[test]
    fn strong_source_floods_past_a_weak_one() {
        let map = Walls {
            walls: Grid::new(Range::new(-5, 0, 11, 1), false),
            diagonal_cost: 1.0,
        };
        let mut area = SearchArea::new(map.walls.bounds());
        let weak = Point::new(0, 0);
        let strong = Point::new(10, 0);
        area.flow_field(
            &map,
            &[FlowSource::new(weak, 2.0), FlowSource::new(strong, 100.0)],
        );

        // every cell on the line is within 100 of the strong source
        for p in map.walls.bounds().iter() {
            assert_eq!(area.flow_cost_at(p), Some((strong.x - p.x) as f32), "at {p}");
        }
        assert_eq!(area.flow_cost_at(Point::new(-3, 0)), Some(13.0));
        assert_eq!(area.flow_dir_at(Point::new(-3, 0)), Direction::East);
        assert_eq!(area.flow_dir_at(weak), Direction::East);

        let path = area.flow_path(Point::new(-3, 0), 100);
        assert_eq!(path.status, SearchStatus::Found);
        assert_eq!(path.target(), strong);
        assert_eq!(path.cost, 13.0);
    }

    #[test]
    fn weak_source_keeps_cells_out_of_reach_of_the_strong_one() {
        let map = Walls {
            walls: Grid::new(Range::new(0, 0, 30, 1), false),
            diagonal_cost: 1.0,
        };
        let mut area = SearchArea::new(map.walls.bounds());
        area.flow_field(
            &map,
            &[
                FlowSource::new(Point::new(0, 0), 4.0),
                FlowSource::new(Point::new(29, 0), 3.0),
            ],
        );
        assert_eq!(area.flow_cost_at(Point::new(3, 0)), Some(3.0));
        assert_eq!(area.flow_cost_at(Point::new(4, 0)), None);
        assert_eq!(area.flow_cost_at(Point::new(27, 0)), Some(2.0));
        assert_eq!(area.flow_cost_at(Point::new(26, 0)), None);
        assert_eq!(area.flow_nodes().len(), 7);
    }

    /// Reports a cheaper cost for every step taken.
    struct Downhill;

    impl Pather for Downhill {
        fn adjacency(&self) -> Adjacency {
            Adjacency::Cardinal
        }

        fn passable(&self, _: Point) -> bool {
            true
        }

        fn step(&self, _: Point, _: Direction, cost: f32) -> Option<Step> {
            Some(Step::new(cost - 1.0, 0))
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "cost decreased")]
    fn decreasing_step_cost_panics() {
        let mut area = SearchArea::new(Range::new(0, 0, 4, 4));
        area.flow_field(&Downhill, &[FlowSource::new(Point::new(1, 1), 10.0)]);
    }

    #[test]
    #[should_panic(expected = "non-positive weight")]
    fn zero_weight_source_panics() {
        let map = Walls {
            walls: Grid::new(Range::new(0, 0, 3, 3), false),
            diagonal_cost: 1.0,
        };
        let mut area = SearchArea::new(map.walls.bounds());
        area.flow_field(&map, &[FlowSource::new(Point::ZERO, 0.0)]);
    }
}
