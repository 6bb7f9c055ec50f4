use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("level has no rows")]
    Empty,

    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown glyph {glyph:?} at ({x}, {y})")]
    UnknownGlyph { glyph: char, x: usize, y: usize },

    #[error("level has no player start")]
    MissingPlayer,

    #[error("level has {0} player starts, expected exactly one")]
    MultiplePlayers(usize),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("failed to read level: {0}")]
    Io(#[from] std::io::Error),
}
