use serde::Serialize;

/// A single grid cell. The numeric codes match the level digit format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    Empty,
    Wall,
    Dot,
    Player,
    Ghost,
}

impl Cell {
    pub fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Wall => 1,
            Self::Dot => 2,
            Self::Player => 3,
            Self::Ghost => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Wall),
            2 => Some(Self::Dot),
            3 => Some(Self::Player),
            4 => Some(Self::Ghost),
            _ => None,
        }
    }

    pub fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            ' ' => Some(Self::Empty),
            '#' => Some(Self::Wall),
            '.' => Some(Self::Dot),
            'P' => Some(Self::Player),
            'G' => Some(Self::Ghost),
            digit if digit.is_ascii_digit() => Self::from_code(digit as u8 - b'0'),
            _ => None,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Self::Empty => ' ',
            Self::Wall => '#',
            Self::Dot => '.',
            Self::Player => 'P',
            Self::Ghost => 'G',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }
}

/// Ghost targeting strategy, fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Chaser,
    Ambusher,
    Random,
    Flanker,
}

impl Personality {
    /// Assignment order for ghosts found in the level.
    pub const ROTATION: [Personality; 4] = [
        Personality::Chaser,
        Personality::Ambusher,
        Personality::Random,
        Personality::Flanker,
    ];

    pub fn for_spawn_index(index: usize) -> Self {
        Self::ROTATION[index % Self::ROTATION.len()]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Per-tick displacement. Each component is in `-1..=1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Step {
    pub dx: i32,
    pub dy: i32,
}

impl Step {
    pub const ZERO: Step = Step { dx: 0, dy: 0 };

    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Single greedy step from `from` toward `to`, one unit per axis.
    pub fn toward(from: Vec2, to: Vec2) -> Self {
        Self::new((to.x - from.x).clamp(-1, 1), (to.y - from.y).clamp(-1, 1))
    }

    pub fn between(from: Vec2, to: Vec2) -> Self {
        Self::new(to.x - from.x, to.y - from.y)
    }

    pub fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Caught,
    FrameLimit,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    #[serde(rename = "queuedDir")]
    pub queued_dir: Direction,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub personality: Personality,
    pub target: Vec2,
    #[serde(rename = "pathLen")]
    pub path_len: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    DotEaten {
        x: i32,
        y: i32,
    },
    GhostRecovered {
        #[serde(rename = "ghostId")]
        ghost_id: String,
        x: i32,
        y: i32,
    },
    PlayerCaught {
        #[serde(rename = "ghostId")]
        ghost_id: String,
        x: i32,
        y: i32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub frame: u64,
    pub tick: u64,
    pub tiles: Vec<String>,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    #[serde(rename = "dotsRemaining")]
    pub dots_remaining: usize,
    pub ended: bool,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub reason: Option<GameOverReason>,
    pub frames: u64,
    #[serde(rename = "playerTicks")]
    pub player_ticks: u64,
    #[serde(rename = "ghostTicks")]
    pub ghost_ticks: u64,
    #[serde(rename = "dotsEaten")]
    pub dots_eaten: u32,
    #[serde(rename = "dotsRemaining")]
    pub dots_remaining: usize,
    pub recoveries: u32,
    #[serde(rename = "caughtBy")]
    pub caught_by: Option<String>,
}
