use std::fs;
use std::path::Path;

use crate::error::LayoutError;
use crate::grid::Grid;
use crate::types::{Cell, Vec2};

/// Built-in maze used when no level file is given.
pub const DEFAULT_LEVEL: &str = "\
#####################
#.........#.........#
#.###.###.#.###.###.#
#...................#
#.###.#.#####.#.###.#
#.....#...#...#.....#
#####.###.#.###.#####
#.......G.G.G.G.....#
#####.#.#####.#.#####
#.........#.........#
#.###.###.#.###.###.#
#...#.....P.....#...#
###.#.#.#####.#.#.###
#.....#...#...#.....#
#.#######.#.#######.#
#...................#
#####################";

/// Parses a level made of glyph rows (`#`, `.`, space, `P`, `G`) or digit
/// rows (`0`..`4`). Both forms may be mixed. Trailing blank lines and `\r`
/// are ignored.
pub fn parse_level(text: &str) -> Result<Grid, LayoutError> {
    let mut lines: Vec<&str> = text.lines().map(|line| line.trim_end_matches('\r')).collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        return Err(LayoutError::Empty);
    }

    let expected = lines[0].chars().count();
    let mut rows = Vec::with_capacity(lines.len());
    for (y, line) in lines.iter().enumerate() {
        let mut row = Vec::with_capacity(expected);
        for (x, glyph) in line.chars().enumerate() {
            let cell = Cell::from_glyph(glyph).ok_or(LayoutError::UnknownGlyph { glyph, x, y })?;
            row.push(cell);
        }
        if row.len() != expected {
            return Err(LayoutError::Ragged {
                row: y,
                expected,
                found: row.len(),
            });
        }
        rows.push(row);
    }
    if expected == 0 {
        return Err(LayoutError::Empty);
    }

    let grid = Grid::from_rows(rows).ok_or(LayoutError::Empty)?;
    match grid.count(Cell::Player) {
        0 => Err(LayoutError::MissingPlayer),
        1 => Ok(grid),
        n => Err(LayoutError::MultiplePlayers(n)),
    }
}

pub fn load_level(path: &Path) -> Result<Grid, LayoutError> {
    let text = fs::read_to_string(path)?;
    parse_level(&text)
}

pub fn default_level() -> Result<Grid, LayoutError> {
    parse_level(DEFAULT_LEVEL)
}

pub fn find_player_start(grid: &Grid) -> Option<Vec2> {
    grid.find_first(Cell::Player)
}

/// Ghost seeds in row-major order; this order is the ghosts' creation order.
pub fn find_ghost_starts(grid: &Grid) -> Vec<Vec2> {
    grid.positions_of(Cell::Ghost)
}
