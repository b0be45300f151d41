use crate::types::{GhostPersonality, WaveMode};

/// Nominal wall-clock length of one simulation tick. The engine itself only
/// counts ticks; the driver decides the real cadence.
pub const TICK_MS: u64 = 150;

pub const PLAYER_STEP_TICKS: u64 = 4;
pub const GHOST_STEP_TICKS: u64 = 5;
pub const GHOST_FRIGHTENED_STEP_TICKS: u64 = 8;
pub const GHOST_EATEN_STEP_TICKS: u64 = 2;
pub const CAGED_IDLE_TICKS: u64 = 5;

pub const PELLET_POINTS: i32 = 10;
pub const POWER_PELLET_POINTS: i32 = 50;
pub const GHOST_CAPTURE_POINTS: i32 = 200;

pub const STARTING_LIVES: i32 = 3;

pub const FRIGHTENED_TICKS: u64 = 60;
pub const FRIGHTENED_FLASH_WINDOW: u64 = 20;
pub const FRIGHTENED_FLASH_PERIOD: u64 = 4;

pub const AMBUSH_LEAD_TILES: i32 = 4;
pub const FLANK_PIVOT_TILES: i32 = 2;
pub const WANDER_RANGE_TILES: f64 = 8.0;

/// Scatter/Chase waves in order, each with its duration in ticks. Once the
/// schedule is exhausted the mode stays Chase for the rest of the attempt.
pub const WAVE_SCHEDULE: [(WaveMode, u64); 7] = [
    (WaveMode::Scatter, 45),
    (WaveMode::Chase, 135),
    (WaveMode::Scatter, 45),
    (WaveMode::Chase, 135),
    (WaveMode::Scatter, 30),
    (WaveMode::Chase, 135),
    (WaveMode::Scatter, 30),
];

/// Pellets-eaten-since-life-loss quota gating a ghost's release. `None`
/// means the ghost is never pellet-gated.
pub fn release_pellet_quota(personality: GhostPersonality) -> Option<i32> {
    match personality {
        GhostPersonality::Chaser => None,
        GhostPersonality::Ambusher => Some(0),
        GhostPersonality::Flanker => Some(30),
        GhostPersonality::Wanderer => Some(60),
    }
}

/// Elapsed-tick fallback that releases a caged ghost even when its pellet
/// quota was never reached. Zero with no quota means the ghost starts in
/// play.
pub fn release_fallback_ticks(personality: GhostPersonality) -> u64 {
    match personality {
        GhostPersonality::Chaser => 0,
        GhostPersonality::Ambusher => 50,
        GhostPersonality::Flanker => 600,
        GhostPersonality::Wanderer => 1200,
    }
}
