use serde::Serialize;

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
    /// Fixed evaluation order for neighbor enumeration and tie-breaking.
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => Self::None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tile {
    Wall,
    Open,
    Pellet,
    PowerPellet,
    House,
    Door,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostPersonality {
    /// Targets the player's cell directly.
    Chaser,
    /// Targets four tiles ahead of the player's facing.
    Ambusher,
    /// Reflects a pivot ahead of the player through the Chaser's position.
    Flanker,
    /// Chases from afar, retreats to its corner when close.
    Wanderer,
}

impl GhostPersonality {
    /// Fixed actor order; also the ghost update order within a tick.
    pub const ALL: [GhostPersonality; 4] = [
        GhostPersonality::Chaser,
        GhostPersonality::Ambusher,
        GhostPersonality::Flanker,
        GhostPersonality::Wanderer,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Chaser => 0,
            Self::Ambusher => 1,
            Self::Flanker => 2,
            Self::Wanderer => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostLifecycle {
    Caged,
    Exiting,
    Active,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveMode {
    Scatter,
    Chase,
}

/// What a renderer should draw for a ghost this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostVisual {
    Normal,
    Frightened,
    Flashing,
    Eaten,
    Caged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    LevelCleared,
    LivesExhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub personality: GhostPersonality,
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub lifecycle: GhostLifecycle,
    pub visual: GhostVisual,
}

/// Discrete notifications for sound/score/lives collaborators. Each variant
/// carries the updated totals it concerns, so collaborators never have to
/// inspect engine internals.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    PelletEaten {
        x: i32,
        y: i32,
        score: i32,
        #[serde(rename = "pelletsRemaining")]
        pellets_remaining: i32,
    },
    PowerPelletEaten {
        x: i32,
        y: i32,
        score: i32,
        #[serde(rename = "pelletsRemaining")]
        pellets_remaining: i32,
    },
    GhostCaptured {
        ghost: GhostPersonality,
        points: i32,
        score: i32,
    },
    GhostReleased {
        ghost: GhostPersonality,
    },
    GhostRevived {
        ghost: GhostPersonality,
    },
    WaveChanged {
        mode: WaveMode,
    },
    FrightenedEnded,
    LifeLost {
        lives: i32,
    },
    LevelCleared {
        score: i32,
    },
}

/// Per-tick state readout for renderers and drivers.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub score: i32,
    pub lives: i32,
    #[serde(rename = "waveMode")]
    pub wave_mode: WaveMode,
    #[serde(rename = "frightenedTicks")]
    pub frightened_ticks: u64,
    #[serde(rename = "pelletsRemaining")]
    pub pellets_remaining: i32,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub events: Vec<GameEvent>,
}

/// Terminal report for a finished attempt.
#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub outcome: GameOutcome,
    pub ticks: u64,
    pub score: i32,
    pub lives: i32,
    #[serde(rename = "pelletsEaten")]
    pub pellets_eaten: i32,
    #[serde(rename = "ghostsCaptured")]
    pub ghosts_captured: i32,
    #[serde(rename = "livesLost")]
    pub lives_lost: i32,
}
