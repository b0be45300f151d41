use crate::constants::{
    CAGED_IDLE_TICKS, GHOST_CAPTURE_POINTS, GHOST_EATEN_STEP_TICKS, GHOST_FRIGHTENED_STEP_TICKS,
    GHOST_STEP_TICKS, PELLET_POINTS, PLAYER_STEP_TICKS, POWER_PELLET_POINTS, STARTING_LIVES,
};
use crate::level::Level;
use crate::types::{
    Direction, GameEvent, GameOutcome, GameSummary, GhostLifecycle, GhostPersonality, GhostView,
    PlayerView, Snapshot, Tile, Vec2, WaveMode,
};

mod ghost_system;
mod mode_system;
mod movement;
mod release_system;
mod utils;

use self::ghost_system::{exit_step, pursuit_target, Ghost};
use self::mode_system::ModeScheduler;
use self::movement::{player_can_enter, resolve_ghost_step, SeekMode, Step};
use self::release_system::ReleaseGate;
use self::utils::manhattan;

#[derive(Clone, Debug)]
struct PlayerActor {
    pos: Vec2,
    prev: Vec2,
    facing: Direction,
}

#[derive(Clone, Debug, Default)]
struct RunTallies {
    pellets_eaten: i32,
    ghosts_captured: i32,
    lives_lost: i32,
}

/// The tick orchestrator. One instance per level attempt; collaborators
/// call `step` once per fixed-period tick and read `build_snapshot`.
///
/// Intra-tick order is fixed: wave/frightened timers, release gating, the
/// player's move (with pellet pickup), each ghost in personality order on
/// its own cadence, then collision evaluation.
#[derive(Clone, Debug)]
pub struct GameEngine {
    level: Level,
    tick: u64,
    score: i32,
    lives: i32,
    pellets_remaining: i32,
    pellets_since_life_loss: i32,
    desired_dir: Direction,
    player: PlayerActor,
    ghosts: Vec<Ghost>,
    scheduler: ModeScheduler,
    gates: [ReleaseGate; 4],
    paused: bool,
    ended: bool,
    outcome: Option<GameOutcome>,
    events: Vec<GameEvent>,
    tallies: RunTallies,
}

impl GameEngine {
    pub fn new(level: Level) -> Self {
        let spawn = level.anchors.player_spawn;
        let gates = GhostPersonality::ALL.map(ReleaseGate::for_personality);
        let ghosts = GhostPersonality::ALL
            .iter()
            .map(|&personality| {
                Ghost::new(
                    personality,
                    level.anchors.ghost_spawns[personality.index()],
                    gates[personality.index()].starts_in_play(),
                )
            })
            .collect();

        Self {
            pellets_remaining: level.pellets_total(),
            level,
            tick: 0,
            score: 0,
            lives: STARTING_LIVES,
            pellets_since_life_loss: 0,
            desired_dir: Direction::None,
            player: PlayerActor {
                pos: spawn,
                prev: spawn,
                facing: Direction::None,
            },
            ghosts,
            scheduler: ModeScheduler::new(),
            gates,
            paused: false,
            ended: false,
            outcome: None,
            events: Vec::new(),
            tallies: RunTallies::default(),
        }
    }

    /// Latest-wins desired direction from the input collaborator, sampled
    /// at the player's movement cadence.
    pub fn set_desired_direction(&mut self, dir: Direction) {
        self.desired_dir = dir;
    }

    /// Freezes the tick loop; no actor state changes while paused.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn pellets_remaining(&self) -> i32 {
        self.pellets_remaining
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Advances the simulation by one tick.
    pub fn step(&mut self) {
        if self.ended || self.paused {
            return;
        }
        self.tick += 1;
        self.update_timers();
        self.update_release();
        if self.tick.is_multiple_of(PLAYER_STEP_TICKS) {
            self.advance_player();
        }
        if self.ended {
            return;
        }
        self.update_ghosts();
        self.resolve_collisions();
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let flash = self.scheduler.frightened_flashing();
        let snapshot = Snapshot {
            tick: self.tick,
            score: self.score,
            lives: self.lives,
            wave_mode: self.scheduler.wave_mode(),
            frightened_ticks: self.scheduler.frightened_ticks(),
            pellets_remaining: self.pellets_remaining,
            player: PlayerView {
                x: self.player.pos.x,
                y: self.player.pos.y,
                dir: self.player.facing,
            },
            ghosts: self
                .ghosts
                .iter()
                .map(|ghost| GhostView {
                    personality: ghost.personality,
                    x: ghost.pos.x,
                    y: ghost.pos.y,
                    dir: ghost.facing,
                    lifecycle: ghost.lifecycle,
                    visual: ghost.visual(flash),
                })
                .collect(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            outcome: self.outcome.unwrap_or(GameOutcome::LivesExhausted),
            ticks: self.tick,
            score: self.score,
            lives: self.lives,
            pellets_eaten: self.tallies.pellets_eaten,
            ghosts_captured: self.tallies.ghosts_captured,
            lives_lost: self.tallies.lives_lost,
        }
    }

    fn update_timers(&mut self) {
        let mode_tick = self.scheduler.advance();
        if let Some(mode) = mode_tick.wave_changed {
            self.broadcast_wave_reversal();
            self.events.push(GameEvent::WaveChanged { mode });
        }
        if mode_tick.frightened_ended {
            for ghost in &mut self.ghosts {
                ghost.frightened = false;
            }
            self.events.push(GameEvent::FrightenedEnded);
        }
    }

    /// Wave flips force an immediate about-face on every ghost in normal
    /// play; frightened and eaten ghosts keep their heading.
    fn broadcast_wave_reversal(&mut self) {
        for ghost in &mut self.ghosts {
            if ghost.lifecycle == GhostLifecycle::Active && !ghost.eaten && !ghost.frightened {
                ghost.reverse();
            }
        }
    }

    fn update_release(&mut self) {
        for idx in 0..self.ghosts.len() {
            if self.ghosts[idx].lifecycle != GhostLifecycle::Caged {
                continue;
            }
            if self.gates[idx].should_exit(self.pellets_since_life_loss, self.tick) {
                self.ghosts[idx].lifecycle = GhostLifecycle::Exiting;
                self.events.push(GameEvent::GhostReleased {
                    ghost: self.ghosts[idx].personality,
                });
            }
        }
    }

    fn advance_player(&mut self) {
        let step = self
            .player_step(self.desired_dir)
            .or_else(|| self.player_step(self.player.facing));
        let Some(step) = step else {
            // Both the requested turn and the current heading are blocked;
            // the player keeps its cell and facing until next cadence.
            return;
        };
        self.player.prev = self.player.pos;
        self.player.pos = step.pos;
        self.player.facing = step.dir;
        self.consume_pellet_under_player();
    }

    fn player_step(&self, dir: Direction) -> Option<Step> {
        if dir == Direction::None {
            return None;
        }
        let next = self.level.neighbor(self.player.pos, dir)?;
        player_can_enter(&self.level, next).then_some(Step { pos: next, dir })
    }

    fn consume_pellet_under_player(&mut self) {
        let pos = self.player.pos;
        let Some(kind) = self.level.consume_pellet(pos) else {
            return;
        };
        self.pellets_remaining -= 1;
        self.pellets_since_life_loss += 1;
        self.tallies.pellets_eaten += 1;

        match kind {
            Tile::PowerPellet => {
                self.score += POWER_PELLET_POINTS;
                self.scheduler.start_frightened();
                for ghost in &mut self.ghosts {
                    if ghost.lifecycle == GhostLifecycle::Active
                        && !ghost.eaten
                        && !ghost.frightened
                    {
                        ghost.frightened = true;
                        ghost.reverse();
                    }
                }
                self.events.push(GameEvent::PowerPelletEaten {
                    x: pos.x,
                    y: pos.y,
                    score: self.score,
                    pellets_remaining: self.pellets_remaining,
                });
            }
            _ => {
                self.score += PELLET_POINTS;
                self.events.push(GameEvent::PelletEaten {
                    x: pos.x,
                    y: pos.y,
                    score: self.score,
                    pellets_remaining: self.pellets_remaining,
                });
            }
        }

        if self.pellets_remaining == 0 {
            self.ended = true;
            self.outcome = Some(GameOutcome::LevelCleared);
            self.events.push(GameEvent::LevelCleared { score: self.score });
        }
    }

    fn ghost_cadence(ghost: &Ghost) -> u64 {
        match ghost.lifecycle {
            GhostLifecycle::Caged => CAGED_IDLE_TICKS,
            _ if ghost.eaten => GHOST_EATEN_STEP_TICKS,
            _ if ghost.frightened => GHOST_FRIGHTENED_STEP_TICKS,
            _ => GHOST_STEP_TICKS,
        }
    }

    fn update_ghosts(&mut self) {
        let player_pos = self.player.pos;
        let player_facing = self.player.facing;
        let chaser_pos = self.ghosts[GhostPersonality::Chaser.index()].pos;
        let scatter = self.scheduler.wave_mode() == WaveMode::Scatter;

        for idx in 0..self.ghosts.len() {
            if !self.tick.is_multiple_of(Self::ghost_cadence(&self.ghosts[idx])) {
                continue;
            }
            match self.ghosts[idx].lifecycle {
                GhostLifecycle::Caged => {
                    // Cosmetic idle bob; the pen row is one tile tall, so
                    // only the facing oscillates.
                    let ghost = &mut self.ghosts[idx];
                    ghost.facing = if ghost.facing == Direction::Up {
                        Direction::Down
                    } else {
                        Direction::Up
                    };
                }
                GhostLifecycle::Exiting => {
                    if let Some(step) = exit_step(&self.ghosts[idx], &self.level) {
                        self.ghosts[idx].commit(step);
                    }
                    if self.ghosts[idx].pos == self.level.anchors.exit {
                        let ghost = &mut self.ghosts[idx];
                        ghost.lifecycle = GhostLifecycle::Active;
                        ghost.facing = Direction::Left;
                    }
                }
                GhostLifecycle::Active => {
                    let (pos, facing) = (self.ghosts[idx].pos, self.ghosts[idx].facing);
                    let step = if self.ghosts[idx].eaten {
                        resolve_ghost_step(
                            &self.level,
                            pos,
                            facing,
                            self.level.anchors.home_anchor,
                            SeekMode::Nearest,
                            true,
                        )
                    } else if self.ghosts[idx].frightened {
                        resolve_ghost_step(
                            &self.level,
                            pos,
                            facing,
                            player_pos,
                            SeekMode::Farthest,
                            false,
                        )
                    } else {
                        let target = pursuit_target(
                            &self.ghosts[idx],
                            scatter,
                            player_pos,
                            player_facing,
                            chaser_pos,
                            &self.level,
                        );
                        resolve_ghost_step(&self.level, pos, facing, target, SeekMode::Nearest, false)
                    };
                    if let Some(step) = step {
                        self.ghosts[idx].commit(step);
                    }
                    if self.ghosts[idx].eaten
                        && manhattan(self.ghosts[idx].pos, self.level.anchors.home_anchor) <= 1
                    {
                        let ghost = &mut self.ghosts[idx];
                        ghost.eaten = false;
                        ghost.lifecycle = GhostLifecycle::Exiting;
                        self.events.push(GameEvent::GhostRevived {
                            ghost: ghost.personality,
                        });
                    }
                }
            }
        }
    }

    /// Capture rule: same cell after movement, or the two actors swapped
    /// cells within the tick (they passed through each other between the
    /// discretized positions).
    fn resolve_collisions(&mut self) {
        for idx in 0..self.ghosts.len() {
            if self.ghosts[idx].lifecycle == GhostLifecycle::Caged {
                continue;
            }
            let overlap = self.ghosts[idx].pos == self.player.pos;
            let swapped = self.ghosts[idx].pos == self.player.prev
                && self.ghosts[idx].prev == self.player.pos;
            if !overlap && !swapped {
                continue;
            }
            if self.ghosts[idx].eaten {
                continue;
            }
            if self.ghosts[idx].frightened {
                let ghost = &mut self.ghosts[idx];
                ghost.frightened = false;
                ghost.eaten = true;
                self.score += GHOST_CAPTURE_POINTS;
                self.tallies.ghosts_captured += 1;
                self.events.push(GameEvent::GhostCaptured {
                    ghost: ghost.personality,
                    points: GHOST_CAPTURE_POINTS,
                    score: self.score,
                });
            } else {
                self.lose_life();
                return;
            }
        }
    }

    fn lose_life(&mut self) {
        self.lives -= 1;
        self.tallies.lives_lost += 1;
        self.events.push(GameEvent::LifeLost { lives: self.lives });
        if self.lives <= 0 {
            self.ended = true;
            self.outcome = Some(GameOutcome::LivesExhausted);
            return;
        }

        // Same actors, initial placements; the per-life pellet counter and
        // the wave clock start over, the global tick does not.
        self.pellets_since_life_loss = 0;
        self.desired_dir = Direction::None;
        let spawn = self.level.anchors.player_spawn;
        self.player = PlayerActor {
            pos: spawn,
            prev: spawn,
            facing: Direction::None,
        };
        for ghost in &mut self.ghosts {
            ghost.reset();
        }
        self.scheduler.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{FRIGHTENED_TICKS, WAVE_SCHEDULE};
    use crate::types::GhostVisual;

    fn engine_on_built_in() -> GameEngine {
        GameEngine::new(Level::built_in())
    }

    fn chaser(engine: &GameEngine) -> &Ghost {
        &engine.ghosts[GhostPersonality::Chaser.index()]
    }

    /// Consumes every pellet except `keep`, adjusting the remaining count.
    fn eat_all_but(engine: &mut GameEngine, keep: Vec2) {
        for y in 0..engine.level.height() {
            for x in 0..engine.level.width() {
                let pos = Vec2 { x, y };
                if pos == keep {
                    continue;
                }
                if engine.level.consume_pellet(pos).is_some() {
                    engine.pellets_remaining -= 1;
                }
            }
        }
        assert_eq!(engine.pellets_remaining, 1);
    }

    #[test]
    fn initial_state_matches_the_level() {
        let engine = engine_on_built_in();
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.lives(), STARTING_LIVES);
        assert_eq!(engine.pellets_remaining(), 142);
        assert_eq!(chaser(&engine).lifecycle, GhostLifecycle::Active);
        assert_eq!(
            engine.ghosts[GhostPersonality::Flanker.index()].lifecycle,
            GhostLifecycle::Caged
        );
    }

    #[test]
    fn player_moves_on_cadence_and_eats() {
        let mut engine = engine_on_built_in();
        engine.set_desired_direction(Direction::Left);
        for _ in 0..PLAYER_STEP_TICKS - 1 {
            engine.step();
        }
        assert_eq!(engine.player.pos, engine.level.anchors.player_spawn);
        engine.step();
        assert_eq!(engine.player.pos, Vec2 { x: 8, y: 16 });
        assert_eq!(engine.score(), PELLET_POINTS);
        assert_eq!(engine.pellets_remaining(), 141);
        assert_eq!(engine.pellets_since_life_loss, 1);
    }

    #[test]
    fn blocked_turn_falls_back_to_current_heading() {
        let mut engine = engine_on_built_in();
        engine.player.pos = Vec2 { x: 1, y: 4 };
        engine.player.prev = engine.player.pos;
        engine.player.facing = Direction::Down;
        // (1, 5) is open, (0, 4) is a wall; an impossible Left request must
        // not stall the runner.
        engine.set_desired_direction(Direction::Left);
        for _ in 0..PLAYER_STEP_TICKS {
            engine.step();
        }
        assert_eq!(engine.player.pos, Vec2 { x: 1, y: 5 });
        assert_eq!(engine.player.facing, Direction::Down);
    }

    #[test]
    fn fully_blocked_player_keeps_cell_and_facing() {
        let mut engine = engine_on_built_in();
        engine.player.pos = Vec2 { x: 1, y: 4 };
        engine.player.prev = engine.player.pos;
        engine.player.facing = Direction::None;
        engine.set_desired_direction(Direction::None);
        for _ in 0..PLAYER_STEP_TICKS {
            engine.step();
        }
        assert_eq!(engine.player.pos, Vec2 { x: 1, y: 4 });
        assert_eq!(engine.player.prev, Vec2 { x: 1, y: 4 });
    }

    #[test]
    fn tunnel_wraps_the_player_between_edges() {
        let mut engine = engine_on_built_in();
        engine.player.pos = Vec2 { x: 0, y: 10 };
        engine.player.prev = engine.player.pos;
        engine.set_desired_direction(Direction::Left);
        for _ in 0..PLAYER_STEP_TICKS {
            engine.step();
        }
        assert_eq!(engine.player.pos, Vec2 { x: 18, y: 10 });
    }

    #[test]
    fn power_pellet_frightens_and_reverses_active_ghosts() {
        let mut engine = engine_on_built_in();
        engine.player.pos = Vec2 { x: 1, y: 1 };
        engine.player.prev = engine.player.pos;
        let facing_before = chaser(&engine).facing;
        // Keep the chaser off its cadence so the reversal is observable.
        engine.set_desired_direction(Direction::Down);
        for _ in 0..PLAYER_STEP_TICKS {
            engine.step();
        }
        assert_eq!(engine.player.pos, Vec2 { x: 1, y: 2 });
        assert_eq!(engine.score(), POWER_PELLET_POINTS);
        assert!(engine.scheduler.frightened_active());
        let ghost = chaser(&engine);
        assert!(ghost.frightened);
        // One forced reversal, no movement yet at tick 4.
        assert_eq!(ghost.facing, facing_before.opposite());
        // Caged ghosts are not flagged.
        assert!(!engine.ghosts[GhostPersonality::Flanker.index()].frightened);
    }

    #[test]
    fn frightened_clears_uniformly_at_zero() {
        let mut engine = engine_on_built_in();
        engine.scheduler.start_frightened();
        for ghost in &mut engine.ghosts {
            if ghost.lifecycle == GhostLifecycle::Active {
                ghost.frightened = true;
            }
        }
        for _ in 0..FRIGHTENED_TICKS {
            engine.step();
        }
        assert!(!engine.scheduler.frightened_active());
        assert!(engine.ghosts.iter().all(|ghost| !ghost.frightened));
        let snapshot = engine.build_snapshot(true);
        assert!(snapshot
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::FrightenedEnded)));
    }

    #[test]
    fn swap_collision_costs_a_life() {
        let mut engine = engine_on_built_in();
        engine.pellets_since_life_loss = 17;
        engine.player.prev = Vec2 { x: 5, y: 4 };
        engine.player.pos = Vec2 { x: 6, y: 4 };
        engine.ghosts[0].prev = Vec2 { x: 6, y: 4 };
        engine.ghosts[0].pos = Vec2 { x: 5, y: 4 };

        engine.resolve_collisions();

        assert_eq!(engine.lives(), STARTING_LIVES - 1);
        assert_eq!(engine.pellets_since_life_loss, 0);
        assert_eq!(engine.player.pos, engine.level.anchors.player_spawn);
        assert_eq!(chaser(&engine).lifecycle, GhostLifecycle::Active);
        assert_eq!(
            engine.ghosts[GhostPersonality::Wanderer.index()].lifecycle,
            GhostLifecycle::Caged
        );
        let snapshot = engine.build_snapshot(true);
        assert!(snapshot
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::LifeLost { lives } if *lives == 2)));
    }

    #[test]
    fn swap_collision_captures_a_frightened_ghost() {
        let mut engine = engine_on_built_in();
        engine.ghosts[0].frightened = true;
        engine.player.prev = Vec2 { x: 5, y: 4 };
        engine.player.pos = Vec2 { x: 6, y: 4 };
        engine.ghosts[0].prev = Vec2 { x: 6, y: 4 };
        engine.ghosts[0].pos = Vec2 { x: 5, y: 4 };

        engine.resolve_collisions();

        assert_eq!(engine.score(), GHOST_CAPTURE_POINTS);
        assert!(engine.ghosts[0].eaten);
        assert!(!engine.ghosts[0].frightened);
        assert_eq!(engine.lives(), STARTING_LIVES);
    }

    #[test]
    fn eaten_ghost_is_harmless_on_contact() {
        let mut engine = engine_on_built_in();
        engine.ghosts[0].eaten = true;
        engine.ghosts[0].pos = engine.player.pos;
        engine.ghosts[0].prev = engine.player.pos;
        engine.resolve_collisions();
        assert_eq!(engine.lives(), STARTING_LIVES);
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn release_quota_gates_until_the_counter_reaches_it() {
        let mut engine = engine_on_built_in();
        let flanker = GhostPersonality::Flanker.index();

        engine.pellets_since_life_loss = 29;
        engine.step();
        assert_eq!(engine.ghosts[flanker].lifecycle, GhostLifecycle::Caged);

        engine.pellets_since_life_loss = 30;
        engine.step();
        assert_eq!(engine.ghosts[flanker].lifecycle, GhostLifecycle::Exiting);
    }

    #[test]
    fn released_ghost_walks_the_pen_exit_and_activates() {
        let mut engine = engine_on_built_in();
        let ambusher = GhostPersonality::Ambusher.index();
        // Quota zero: released on the very first tick.
        engine.step();
        assert_eq!(engine.ghosts[ambusher].lifecycle, GhostLifecycle::Exiting);

        for _ in 0..2 * GHOST_STEP_TICKS {
            engine.step();
        }
        assert_eq!(engine.ghosts[ambusher].lifecycle, GhostLifecycle::Active);
        assert_eq!(engine.ghosts[ambusher].pos, engine.level.anchors.exit);
        assert_eq!(engine.ghosts[ambusher].facing, Direction::Left);
    }

    #[test]
    fn end_to_end_pellet_power_capture_revival() {
        let mut engine = engine_on_built_in();
        engine.player.pos = Vec2 { x: 2, y: 1 };
        engine.player.prev = engine.player.pos;

        // Standard pellet at (1, 1).
        engine.set_desired_direction(Direction::Left);
        for _ in 0..PLAYER_STEP_TICKS {
            engine.step();
        }
        assert_eq!(engine.score(), 10);

        // Power pellet at (1, 2).
        engine.set_desired_direction(Direction::Down);
        for _ in 0..PLAYER_STEP_TICKS {
            engine.step();
        }
        assert_eq!(engine.score(), 60);
        assert!(chaser(&engine).frightened);

        // The frightened chaser blunders onto the player's cell.
        engine.ghosts[0].pos = engine.player.pos;
        engine.ghosts[0].prev = engine.player.pos;
        engine.set_desired_direction(Direction::None);
        engine.step();
        assert_eq!(engine.score(), 260);
        assert!(engine.ghosts[0].eaten);

        // Drop the eyes next to the pen and let them walk home.
        engine.ghosts[0].pos = engine.level.anchors.exit;
        engine.ghosts[0].prev = engine.level.anchors.exit;
        engine.ghosts[0].facing = Direction::Down;
        let mut revived = false;
        for _ in 0..20 * GHOST_STEP_TICKS {
            engine.step();
            let snapshot = engine.build_snapshot(true);
            if snapshot.events.iter().any(
                |event| matches!(event, GameEvent::GhostRevived { ghost } if *ghost == GhostPersonality::Chaser),
            ) {
                revived = true;
                break;
            }
        }
        assert!(revived);
        assert!(!engine.ghosts[0].eaten);
        for _ in 0..3 * GHOST_STEP_TICKS {
            engine.step();
        }
        assert_eq!(chaser(&engine).lifecycle, GhostLifecycle::Active);
        assert_eq!(engine.score(), 260);
    }

    #[test]
    fn wave_transitions_fire_one_broadcast_each() {
        let mut engine = engine_on_built_in();
        // Park the player in the sealed pocket at (1, 8): no ghost can
        // reach it, so no life loss ever resets the wave clock mid-test.
        engine.player.pos = Vec2 { x: 1, y: 8 };
        engine.player.prev = engine.player.pos;
        let mut wave_events = Vec::new();
        for _ in 0..600 {
            engine.step();
            for event in engine.build_snapshot(true).events {
                if let GameEvent::WaveChanged { mode } = event {
                    wave_events.push((engine.tick(), mode));
                }
            }
            if engine.is_ended() {
                break;
            }
        }
        let expected: u64 = WAVE_SCHEDULE.iter().map(|(_, ticks)| ticks).sum();
        assert_eq!(wave_events.len(), WAVE_SCHEDULE.len());
        assert_eq!(wave_events.last().map(|(tick, _)| *tick), Some(expected));
        for pair in wave_events.windows(2) {
            assert_ne!(pair[0].1, pair[1].1);
        }
    }

    #[test]
    fn wave_reversal_skips_frightened_eaten_and_caged() {
        let mut engine = engine_on_built_in();
        engine.ghosts[0].facing = Direction::Left;
        engine.ghosts[1].lifecycle = GhostLifecycle::Active;
        engine.ghosts[1].frightened = true;
        engine.ghosts[1].facing = Direction::Up;
        engine.ghosts[2].lifecycle = GhostLifecycle::Active;
        engine.ghosts[2].eaten = true;
        engine.ghosts[2].facing = Direction::Up;
        engine.ghosts[3].facing = Direction::Up;

        engine.broadcast_wave_reversal();

        assert_eq!(engine.ghosts[0].facing, Direction::Right);
        assert_eq!(engine.ghosts[1].facing, Direction::Up);
        assert_eq!(engine.ghosts[2].facing, Direction::Up);
        // Still caged: no reversal.
        assert_eq!(engine.ghosts[3].facing, Direction::Up);
    }

    #[test]
    fn ghosts_stay_on_legal_tiles_for_thousands_of_ticks() {
        let mut engine = engine_on_built_in();
        engine.lives = 1_000;
        let mut last_score = 0;
        for _ in 0..3_000 {
            engine.step();
            for ghost in &engine.ghosts {
                let tile = engine.level.tile(ghost.pos);
                assert_ne!(tile, Tile::Wall, "ghost on a wall at {:?}", ghost.pos);
                if ghost.lifecycle == GhostLifecycle::Active && !ghost.eaten {
                    assert!(
                        !matches!(tile, Tile::House | Tile::Door),
                        "active ghost inside the pen at {:?}",
                        ghost.pos
                    );
                }
            }
            assert!(engine.score() >= last_score);
            last_score = engine.score();
        }
    }

    #[test]
    fn eating_the_last_pellet_clears_the_level() {
        let mut engine = engine_on_built_in();
        eat_all_but(&mut engine, Vec2 { x: 8, y: 16 });
        engine.set_desired_direction(Direction::Left);
        for _ in 0..PLAYER_STEP_TICKS {
            engine.step();
        }
        assert!(engine.is_ended());
        assert_eq!(engine.outcome(), Some(GameOutcome::LevelCleared));
        let snapshot = engine.build_snapshot(true);
        assert!(snapshot
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::LevelCleared { score } if *score == PELLET_POINTS)));

        let summary = engine.build_summary();
        assert_eq!(summary.outcome, GameOutcome::LevelCleared);
        assert_eq!(summary.pellets_eaten, 1);
    }

    #[test]
    fn losing_the_last_life_ends_the_run() {
        let mut engine = engine_on_built_in();
        engine.lives = 1;
        engine.ghosts[0].pos = engine.player.pos;
        engine.ghosts[0].prev = engine.player.pos;
        engine.resolve_collisions();
        assert!(engine.is_ended());
        assert_eq!(engine.outcome(), Some(GameOutcome::LivesExhausted));

        let tick_at_end = engine.tick();
        engine.step();
        assert_eq!(engine.tick(), tick_at_end);
    }

    #[test]
    fn pausing_freezes_every_actor() {
        let mut engine = engine_on_built_in();
        engine.set_desired_direction(Direction::Left);
        for _ in 0..10 {
            engine.step();
        }
        let before = serde_json::to_string(&engine.build_snapshot(false)).expect("serializes");
        engine.pause();
        for _ in 0..50 {
            engine.step();
        }
        let after = serde_json::to_string(&engine.build_snapshot(false)).expect("serializes");
        assert_eq!(before, after);
        engine.resume();
        engine.step();
        assert_ne!(engine.tick(), 10);
    }

    #[test]
    fn identical_drivers_produce_identical_runs() {
        let mut a = engine_on_built_in();
        let mut b = engine_on_built_in();
        let script = [
            Direction::Left,
            Direction::Down,
            Direction::Right,
            Direction::Up,
        ];
        for tick in 0..600u64 {
            let dir = script[(tick / 50) as usize % script.len()];
            a.set_desired_direction(dir);
            b.set_desired_direction(dir);
            a.step();
            b.step();
            if tick % 100 == 0 {
                let sa = serde_json::to_string(&a.build_snapshot(false)).expect("serializes");
                let sb = serde_json::to_string(&b.build_snapshot(false)).expect("serializes");
                assert_eq!(sa, sb);
            }
        }
    }

    #[test]
    fn caged_ghosts_only_bob_in_place() {
        let mut engine = engine_on_built_in();
        let wanderer = GhostPersonality::Wanderer.index();
        let spawn = engine.ghosts[wanderer].pos;
        let mut facings = Vec::new();
        for _ in 0..4 * CAGED_IDLE_TICKS {
            engine.step();
            assert_eq!(engine.ghosts[wanderer].pos, spawn);
            facings.push(engine.ghosts[wanderer].facing);
        }
        assert!(facings.contains(&Direction::Up));
        assert!(facings.contains(&Direction::Down));
        let snapshot = engine.build_snapshot(false);
        assert_eq!(
            snapshot.ghosts[wanderer].visual,
            GhostVisual::Caged
        );
    }
}
