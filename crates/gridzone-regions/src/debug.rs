//! ASCII dumps of zone labels, connectivity and edges, for checking a
//! decomposition by eye.

use std::fmt::Write;

use gridzone_core::{Direction, Point};

use crate::layer::ZoneLayer;
use crate::zone::ZoneId;

/// Glyph of a zone id: base-36 digits, `+` past 35, `#` for no zone.
pub fn zone_glyph(id: ZoneId) -> char {
    match id.0 {
        0 => '#',
        n @ 1..=35 => char::from_digit(u32::from(n), 36).unwrap_or('+'),
        _ => '+',
    }
}

/// One glyph per cell of `chunk`, one line per row. Cells of a chunk that is
/// not decomposed print as `?`.
pub fn dump_zones(layer: &ZoneLayer, chunk: Point) -> String {
    let bounds = layer.chunk_bounds(chunk);
    let loaded = layer.zones(chunk).is_some();
    let mut out = String::with_capacity(bounds.len() + bounds.height() as usize);
    for y in bounds.min.y..bounds.max.y {
        for x in bounds.min.x..bounds.max.x {
            let c = if loaded {
                zone_glyph(layer.zone_at(Point::new(x, y)))
            } else {
                '?'
            };
            out.push(c);
        }
        out.push('\n');
    }
    out
}

fn link_glyph(d: Direction) -> char {
    match d {
        Direction::North | Direction::South => '|',
        Direction::East | Direction::West => '-',
        Direction::NorthEast | Direction::SouthWest => '/',
        Direction::NorthWest | Direction::SouthEast => '\\',
        Direction::None => ' ',
    }
}

/// A 3×3 block per cell: the zone glyph in the middle, surrounded by a link
/// glyph for every direction in the cell's connectivity mask.
pub fn dump_connectivity(layer: &ZoneLayer, chunk: Point) -> String {
    let bounds = layer.chunk_bounds(chunk);
    let mut out = String::new();
    for y in bounds.min.y..bounds.max.y {
        for row in -1..=1 {
            for x in bounds.min.x..bounds.max.x {
                let p = Point::new(x, y);
                let mask = layer.connectivity_at(p);
                for col in -1..=1 {
                    let c = if row == 0 && col == 0 {
                        match layer.cell(p) {
                            Some(cell) => zone_glyph(cell.zone),
                            None => '?',
                        }
                    } else {
                        let d = Direction::from_delta(col, row);
                        if mask.contains(d) { link_glyph(d) } else { ' ' }
                    };
                    out.push(c);
                }
            }
            out.push('\n');
        }
    }
    out
}

/// One line per outbound edge of `chunk`.
pub fn dump_edges(layer: &ZoneLayer, chunk: Point) -> String {
    let mut out = String::new();
    for e in layer.edges(chunk) {
        let _ = writeln!(
            out,
            "{} {} {} {} -> {} {}",
            e.id,
            e.owner,
            e.from,
            e.dir,
            e.target,
            e.to()
        );
    }
    out
}
