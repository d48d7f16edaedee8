use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn is_none(self) -> bool {
        self == Direction::None
    }
}

/// Integer cell coordinate. `y` grows downward, so row 0 is the top of the maze.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dir: Direction) -> Self {
        match dir {
            Direction::Up => Self::new(self.x, self.y.saturating_sub(1)),
            Direction::Down => Self::new(self.x, self.y.saturating_add(1)),
            Direction::Left => Self::new(self.x.saturating_sub(1), self.y),
            Direction::Right => Self::new(self.x.saturating_add(1), self.y),
            Direction::None => self,
        }
    }

    pub fn to_point(self) -> glam::Vec2 {
        glam::Vec2::new(self.x as f32, self.y as f32)
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    Empty,
    OuterCorner,
    OuterWall,
    InnerCorner,
    InnerWall,
    Pellet,
    PowerPellet,
    TJunction,
    GhostBarrier,
}

impl Cell {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::OuterCorner),
            2 => Some(Self::OuterWall),
            3 => Some(Self::InnerCorner),
            4 => Some(Self::InnerWall),
            5 => Some(Self::Pellet),
            6 => Some(Self::PowerPellet),
            7 => Some(Self::TJunction),
            8 => Some(Self::GhostBarrier),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::OuterCorner => 1,
            Self::OuterWall => 2,
            Self::InnerCorner => 3,
            Self::InnerWall => 4,
            Self::Pellet => 5,
            Self::PowerPellet => 6,
            Self::TJunction => 7,
            Self::GhostBarrier => 8,
        }
    }

    pub fn is_walkable(self) -> bool {
        matches!(self, Self::Empty | Self::Pellet | Self::PowerPellet)
    }

    pub fn is_passable_for_pursuer(self) -> bool {
        self.is_walkable() || self == Self::GhostBarrier
    }

    pub fn is_wall_like(self) -> bool {
        !self.is_walkable()
    }

    pub fn pellet_kind(self) -> Option<PelletKind> {
        match self {
            Self::Pellet => Some(PelletKind::Regular),
            Self::PowerPellet => Some(PelletKind::Power),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PelletKind {
    Regular,
    Power,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Rotation {
    #[serde(rename = "0")]
    Deg0,
    #[serde(rename = "90")]
    Deg90,
    #[serde(rename = "180")]
    Deg180,
    #[serde(rename = "270")]
    Deg270,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatState {
    Normal,
    Scared,
    Recovering,
    Dead,
}

impl ThreatState {
    pub fn is_vulnerable(self) -> bool {
        matches!(self, Self::Scared | Self::Recovering)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ActorId {
    Player,
    Pursuer(String),
    Bonus(u64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    LevelCleared,
    OutOfLives,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    CountdownTick {
        label: String,
    },
    RoundStarted,
    MovementStarted {
        from: GridPos,
        to: GridPos,
        dir: Direction,
    },
    PelletEaten {
        x: i32,
        y: i32,
    },
    PowerPelletEaten {
        x: i32,
        y: i32,
    },
    WallBumped {
        x: i32,
        y: i32,
    },
    PowerModeEntered {
        #[serde(rename = "durationMs")]
        duration_ms: u64,
    },
    PowerModeRecovering {
        #[serde(rename = "pursuersChanged")]
        pursuers_changed: usize,
    },
    PowerModeExited,
    PursuerEliminated {
        #[serde(rename = "pursuerId")]
        pursuer_id: String,
    },
    PursuerRespawned {
        #[serde(rename = "pursuerId")]
        pursuer_id: String,
        state: ThreatState,
    },
    LifeLost {
        #[serde(rename = "livesLeft")]
        lives_left: u32,
    },
    PlayerRespawned,
    Teleported {
        from: GridPos,
        to: GridPos,
    },
    BonusSpawned {
        id: u64,
    },
    BonusCollected {
        id: u64,
    },
    BonusDespawned {
        id: u64,
    },
    LevelCleared,
    GameOver {
        reason: GameOverReason,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct PowerView {
    pub active: bool,
    #[serde(rename = "remainingMs")]
    pub remaining_ms: u64,
    #[serde(rename = "recoveryTriggered")]
    pub recovery_triggered: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub moving: bool,
    #[serde(rename = "movementEnabled")]
    pub movement_enabled: bool,
    #[serde(rename = "renderX")]
    pub render_x: f32,
    #[serde(rename = "renderY")]
    pub render_y: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct PursuerView {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub state: ThreatState,
    #[serde(rename = "collisionEnabled")]
    pub collision_enabled: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct BonusView {
    pub id: u64,
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "nowMs")]
    pub now_ms: u64,
    #[serde(rename = "gameTimeMs")]
    pub game_time_ms: u64,
    pub score: u32,
    pub lives: u32,
    #[serde(rename = "remainingPellets")]
    pub remaining_pellets: u32,
    pub power: PowerView,
    pub player: PlayerView,
    pub pursuers: Vec<PursuerView>,
    pub bonus: Option<BonusView>,
    pub events: Vec<GameEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub reason: Option<GameOverReason>,
    pub score: u32,
    #[serde(rename = "gameTimeMs")]
    pub game_time_ms: u64,
    #[serde(rename = "livesLeft")]
    pub lives_left: u32,
    #[serde(rename = "pelletsEaten")]
    pub pellets_eaten: u32,
    #[serde(rename = "totalPellets")]
    pub total_pellets: u32,
    #[serde(rename = "pursuersEliminated")]
    pub pursuers_eliminated: u32,
    #[serde(rename = "bonusesCollected")]
    pub bonuses_collected: u32,
    #[serde(rename = "newHighScore")]
    pub new_high_score: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HighScoreRecord {
    pub score: u32,
    #[serde(rename = "timeMs")]
    pub time_ms: Option<u64>,
}
