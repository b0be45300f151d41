use crate::level::Level;
use crate::types::{Direction, Tile, Vec2};

use super::utils::tunnel_distance;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum SeekMode {
    Nearest,
    Farthest,
}

/// One committed-to move: the cell stepped into and the direction taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct Step {
    pub pos: Vec2,
    pub dir: Direction,
}

pub(super) fn player_can_enter(level: &Level, pos: Vec2) -> bool {
    matches!(
        level.tile(pos),
        Tile::Open | Tile::Pellet | Tile::PowerPellet
    )
}

pub(super) fn ghost_can_enter(level: &Level, pos: Vec2, through_door: bool) -> bool {
    match level.tile(pos) {
        Tile::Wall => false,
        Tile::House | Tile::Door => through_door,
        _ => true,
    }
}

/// Picks the next cell for a target-seeking ghost.
///
/// Candidates are the four cardinal neighbors in fixed order (also the
/// tie-break order), minus walls and house tiles, with tunnel wrap applied
/// by `Level::neighbor`. The reversal of the current facing is discarded
/// unless it is the only candidate left (dead-end rule). Among survivors the
/// tunnel-aware distance to `target` decides, minimized or maximized per
/// `seek`; strict comparison keeps the first-in-order candidate on ties.
///
/// Pure with respect to its inputs: identical arguments always yield the
/// identical step.
pub(super) fn resolve_ghost_step(
    level: &Level,
    pos: Vec2,
    facing: Direction,
    target: Vec2,
    seek: SeekMode,
    through_door: bool,
) -> Option<Step> {
    let mut candidates: Vec<Step> = Vec::with_capacity(4);
    for dir in Direction::CARDINALS {
        let Some(next) = level.neighbor(pos, dir) else {
            continue;
        };
        if !ghost_can_enter(level, next, through_door) {
            continue;
        }
        candidates.push(Step { pos: next, dir });
    }

    let reverse = facing.opposite();
    let has_forward = candidates.iter().any(|step| step.dir != reverse);

    let mut best: Option<(Step, f64)> = None;
    for step in candidates {
        if has_forward && step.dir == reverse {
            continue;
        }
        let score = tunnel_distance(level, step.pos, target);
        let better = match (&best, seek) {
            (None, _) => true,
            (Some((_, held)), SeekMode::Nearest) => score < *held,
            (Some((_, held)), SeekMode::Farthest) => score > *held,
        };
        if better {
            best = Some((step, score));
        }
    }
    best.map(|(step, _)| step)
}
