//! Connected-component labelling with per-cell connectivity masks.

use gridzone_core::{Direction, DirectionMask, Point};

use crate::SearchArea;
use crate::traits::Pather;

impl SearchArea {
    /// Label every passable cell of the area with a component id starting at
    /// 1, and record for each one the mask of directions leading to a
    /// mutually reachable neighbour. Returns the number of components.
    ///
    /// Two neighbours are connected when both are passable and the pather
    /// allows the move in both directions. Mask bits towards cells outside
    /// the area are recorded as the pather reports them, but the flood never
    /// leaves the area.
    pub fn cc_map_all<P: Pather>(&mut self, pather: &P) -> u32 {
        let len = self.bounds.len();
        self.cc_labels[..len].fill(0);
        self.cc_masks[..len].fill(DirectionMask::EMPTY);
        self.cc_count = 0;
        let adjacency = pather.adjacency();

        for seed in 0..len {
            if self.cc_labels[seed] != 0 || !pather.passable(self.point(seed)) {
                continue;
            }
            self.cc_count += 1;
            let label = self.cc_count;
            self.cc_labels[seed] = label;
            self.fill_stack.clear();
            self.fill_stack.push(seed);

            while let Some(ci) = self.fill_stack.pop() {
                let p = self.point(ci);
                let mut mask = DirectionMask::EMPTY;
                for &dir in adjacency.directions() {
                    let np = p + dir;
                    if !mutually_reachable(pather, p, np, dir) {
                        continue;
                    }
                    mask = mask.with(dir);
                    if let Some(ni) = self.idx(np) {
                        if self.cc_labels[ni] == 0 {
                            self.cc_labels[ni] = label;
                            self.fill_stack.push(ni);
                        }
                    }
                }
                self.cc_masks[ci] = mask;
            }
        }
        self.cc_count
    }

    /// Component id of `p` from the last [`cc_map_all`](Self::cc_map_all),
    /// or `None` for impassable cells and cells outside the area.
    pub fn cc_at(&self, p: Point) -> Option<u32> {
        let label = self.cc_labels[self.idx(p)?];
        (label != 0).then_some(label)
    }

    /// Connectivity mask of `p`; empty outside the area.
    pub fn connectivity_at(&self, p: Point) -> DirectionMask {
        self.idx(p)
            .map_or(DirectionMask::EMPTY, |i| self.cc_masks[i])
    }

    /// Number of components found by the last labelling.
    #[inline]
    pub fn cc_count(&self) -> u32 {
        self.cc_count
    }
}

fn mutually_reachable<P: Pather>(pather: &P, p: Point, np: Point, dir: Direction) -> bool {
    pather.passable(np)
        && pather.step(p, dir, 0.0).is_some()
        && pather.step(np, dir.inverse(), 0.0).is_some()
}
