use crate::types::Cell;

pub const FPS: u32 = 30;
pub const FRAME_MS: u64 = 1000 / FPS as u64;

/// The player advances once every this many frames.
pub const PLAYER_FRAME_INTERVAL: u32 = 5;
/// Every ghost advances once every this many frames.
pub const GHOST_FRAME_INTERVAL: u32 = 7;

/// Recovery kicks in once the stuck counter exceeds this value.
pub const STUCK_THRESHOLD: u32 = 4;
pub const PATH_REFRESH_INTERVAL: u32 = 5;
pub const RANDOM_RETARGET_CHANCE: f64 = 0.1;

pub const AMBUSH_LEAD: i32 = 2;
pub const FLANK_OFFSET: i32 = 5;

/// What a freshly spawned ghost assumes is underneath it.
pub const GHOST_SPAWN_UNDERLAY: Cell = Cell::Dot;
