use crate::error::GridError;
use crate::types::{Cell, Vec2};

/// 4-connected neighbour offsets, in the order neighbours are visited.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// Shared occupancy grid. Cells double as terrain and as actor markers, so
/// callers that write actor markers are responsible for restoring terrain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn filled(width: i32, height: i32, cell: Cell) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![cell; (width * height) as usize],
        }
    }

    /// Builds a grid from rows of equal length; returns `None` for ragged input.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|row| row.len() != width) {
            return None;
        }
        Some(Self {
            width: width as i32,
            height: height as i32,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    pub fn get(&self, x: i32, y: i32) -> Result<Cell, GridError> {
        self.index(x, y).map(|idx| self.cells[idx])
    }

    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> Result<(), GridError> {
        let idx = self.index(x, y)?;
        self.cells[idx] = cell;
        Ok(())
    }

    pub fn is_traversable(&self, x: i32, y: i32) -> bool {
        matches!(self.get(x, y), Ok(cell) if cell != Cell::Wall)
    }

    pub fn traversable_neighbors(&self, pos: Vec2) -> impl Iterator<Item = Vec2> + '_ {
        NEIGHBOR_OFFSETS
            .iter()
            .map(move |&(dx, dy)| pos.offset(dx, dy))
            .filter(move |next| self.is_traversable(next.x, next.y))
    }

    /// Row-major position of the first cell holding `cell`.
    pub fn find_first(&self, cell: Cell) -> Option<Vec2> {
        self.cells
            .iter()
            .position(|&c| c == cell)
            .map(|idx| self.position_of(idx))
    }

    /// Row-major positions of every cell holding `cell`.
    pub fn positions_of(&self, cell: Cell) -> Vec<Vec2> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == cell)
            .map(|(idx, _)| self.position_of(idx))
            .collect()
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// One string per row, in level glyphs.
    pub fn to_rows(&self) -> Vec<String> {
        if self.width == 0 {
            return vec![String::new(); self.height as usize];
        }
        self.cells
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|cell| cell.glyph()).collect())
            .collect()
    }

    pub(crate) fn index(&self, x: i32, y: i32) -> Result<usize, GridError> {
        if !self.in_bounds(x, y) {
            return Err(GridError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok((y * self.width + x) as usize)
    }

    pub(crate) fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn position_of(&self, idx: usize) -> Vec2 {
        let idx = idx as i32;
        Vec2::new(idx % self.width, idx / self.width)
    }
}
