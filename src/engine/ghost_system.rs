use crate::constants::{AMBUSH_LEAD_TILES, FLANK_PIVOT_TILES, WANDER_RANGE_TILES};
use crate::level::Level;
use crate::types::{Direction, GhostLifecycle, GhostPersonality, GhostVisual, Vec2};

use super::movement::Step;
use super::utils::{offset, tunnel_distance};

/// One ghost actor. Created once per attempt and repositioned in place on
/// life loss; identity never changes.
#[derive(Clone, Debug)]
pub(super) struct Ghost {
    pub personality: GhostPersonality,
    pub pos: Vec2,
    pub prev: Vec2,
    pub facing: Direction,
    pub lifecycle: GhostLifecycle,
    pub frightened: bool,
    pub eaten: bool,
    spawn: Vec2,
    starts_in_play: bool,
}

impl Ghost {
    pub fn new(personality: GhostPersonality, spawn: Vec2, starts_in_play: bool) -> Self {
        let mut ghost = Self {
            personality,
            pos: spawn,
            prev: spawn,
            facing: Direction::Up,
            lifecycle: GhostLifecycle::Caged,
            frightened: false,
            eaten: false,
            spawn,
            starts_in_play,
        };
        ghost.reset();
        ghost
    }

    /// Back to the initial caged/active state at the spawn cell.
    pub fn reset(&mut self) {
        self.pos = self.spawn;
        self.prev = self.spawn;
        self.frightened = false;
        self.eaten = false;
        if self.starts_in_play {
            self.lifecycle = GhostLifecycle::Active;
            self.facing = Direction::Left;
        } else {
            self.lifecycle = GhostLifecycle::Caged;
            self.facing = Direction::Up;
        }
    }

    pub fn reverse(&mut self) {
        self.facing = self.facing.opposite();
    }

    /// `previous_position` updates only here, on a committed move.
    pub fn commit(&mut self, step: Step) {
        self.prev = self.pos;
        self.pos = step.pos;
        self.facing = step.dir;
    }

    pub fn visual(&self, flash: bool) -> GhostVisual {
        if self.lifecycle == GhostLifecycle::Caged {
            GhostVisual::Caged
        } else if self.eaten {
            GhostVisual::Eaten
        } else if self.frightened {
            if flash {
                GhostVisual::Flashing
            } else {
                GhostVisual::Frightened
            }
        } else {
            GhostVisual::Normal
        }
    }
}

/// Where a pursuing (non-frightened, non-eaten) ghost is headed. Scatter
/// sends every personality to its own corner; Chase dispatches on the
/// personality. Targets may land on walls or off the grid; the resolver
/// only measures distance toward them.
pub(super) fn pursuit_target(
    ghost: &Ghost,
    scatter: bool,
    player_pos: Vec2,
    player_facing: Direction,
    chaser_pos: Vec2,
    level: &Level,
) -> Vec2 {
    if scatter {
        return level.anchors.scatter_corners[ghost.personality.index()];
    }
    match ghost.personality {
        GhostPersonality::Chaser => player_pos,
        GhostPersonality::Ambusher => lead_point(player_pos, player_facing, AMBUSH_LEAD_TILES),
        GhostPersonality::Flanker => {
            let pivot = lead_point(player_pos, player_facing, FLANK_PIVOT_TILES);
            Vec2 {
                x: 2 * pivot.x - chaser_pos.x,
                y: 2 * pivot.y - chaser_pos.y,
            }
        }
        GhostPersonality::Wanderer => {
            if tunnel_distance(level, ghost.pos, player_pos) > WANDER_RANGE_TILES {
                player_pos
            } else {
                level.anchors.scatter_corners[ghost.personality.index()]
            }
        }
    }
}

/// The scripted pen exit: sidestep until aligned with the exit column,
/// then climb through the door. Returns `None` once the ghost stands on
/// the exit cell itself.
pub(super) fn exit_step(ghost: &Ghost, level: &Level) -> Option<Step> {
    let exit = level.anchors.exit;
    if ghost.pos.x != exit.x {
        let dir = if ghost.pos.x < exit.x {
            Direction::Right
        } else {
            Direction::Left
        };
        Some(Step {
            pos: offset(ghost.pos, dir),
            dir,
        })
    } else if ghost.pos.y != exit.y {
        Some(Step {
            pos: offset(ghost.pos, Direction::Up),
            dir: Direction::Up,
        })
    } else {
        None
    }
}

fn lead_point(pos: Vec2, facing: Direction, tiles: i32) -> Vec2 {
    match facing {
        Direction::Up => Vec2 {
            x: pos.x,
            y: pos.y - tiles,
        },
        Direction::Down => Vec2 {
            x: pos.x,
            y: pos.y + tiles,
        },
        Direction::Left => Vec2 {
            x: pos.x - tiles,
            y: pos.y,
        },
        Direction::Right => Vec2 {
            x: pos.x + tiles,
            y: pos.y,
        },
        Direction::None => pos,
    }
}
