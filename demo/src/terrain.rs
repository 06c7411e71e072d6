//! ASCII terrain and the movement modes that read it.

use std::rc::Rc;

use anyhow::{Result, bail};
use gridzone_core::{Grid, Point, Range};
use gridzone_regions::{FnMode, ModeId};

pub const WALK: ModeId = ModeId(0);
pub const FLY: ModeId = ModeId(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Floor,
    Marsh,
    Wall,
}

impl Cell {
    fn parse(c: char) -> Option<Self> {
        match c {
            '.' => Some(Cell::Floor),
            '~' => Some(Cell::Marsh),
            '#' => Some(Cell::Wall),
            _ => None,
        }
    }
}

/// `.` floor, `~` marsh, `#` wall. Rows may be ragged; missing cells are
/// walls.
pub fn parse(text: &str) -> Result<Grid<Cell>> {
    let rows: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if rows.is_empty() {
        bail!("empty map");
    }
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let mut grid = Grid::new(Range::new(0, 0, width as i32, rows.len() as i32), Cell::Wall);
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let Some(cell) = Cell::parse(ch) else {
                bail!("unknown glyph {ch:?} at {x},{y}");
            };
            grid.set(Point::new(x as i32, y as i32), cell);
        }
    }
    Ok(grid)
}

/// Walkers avoid walls and pay triple in marsh.
pub fn walker(map: Rc<Grid<Cell>>) -> FnMode<impl Fn(Point) -> Option<f32>> {
    FnMode::new(WALK, move |p| match map.at(p) {
        Some(Cell::Floor) => Some(1.0),
        Some(Cell::Marsh) => Some(3.0),
        _ => None,
    })
}

/// Flyers cross everything inside the map at unit cost.
pub fn flyer(map: Rc<Grid<Cell>>) -> FnMode<impl Fn(Point) -> Option<f32>> {
    FnMode::new(FLY, move |p| map.contains(p).then_some(1.0))
}
