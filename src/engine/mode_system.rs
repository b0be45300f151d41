use crate::constants::{
    FRIGHTENED_FLASH_PERIOD, FRIGHTENED_FLASH_WINDOW, FRIGHTENED_TICKS, WAVE_SCHEDULE,
};
use crate::types::WaveMode;

/// Owns the Scatter/Chase wave clock and the shared frightened countdown.
/// Past the end of the schedule the mode stays Chase.
#[derive(Clone, Debug)]
pub(super) struct ModeScheduler {
    wave_index: usize,
    wave_elapsed: u64,
    frightened_ticks: u64,
}

#[derive(Clone, Copy, Debug, Default)]
pub(super) struct ModeTick {
    pub wave_changed: Option<WaveMode>,
    pub frightened_ended: bool,
}

impl ModeScheduler {
    pub fn new() -> Self {
        Self {
            wave_index: 0,
            wave_elapsed: 0,
            frightened_ticks: 0,
        }
    }

    pub fn wave_mode(&self) -> WaveMode {
        WAVE_SCHEDULE
            .get(self.wave_index)
            .map(|(mode, _)| *mode)
            .unwrap_or(WaveMode::Chase)
    }

    pub fn frightened_ticks(&self) -> u64 {
        self.frightened_ticks
    }

    pub fn frightened_active(&self) -> bool {
        self.frightened_ticks > 0
    }

    /// Flash cue for renderers: toggles at a fixed sub-interval during the
    /// tail of the countdown.
    pub fn frightened_flashing(&self) -> bool {
        self.frightened_ticks > 0
            && self.frightened_ticks <= FRIGHTENED_FLASH_WINDOW
            && (self.frightened_ticks / FRIGHTENED_FLASH_PERIOD) % 2 == 0
    }

    /// (Re)arms the shared countdown. A power pellet eaten while one is
    /// already running restarts it at full duration.
    pub fn start_frightened(&mut self) {
        self.frightened_ticks = FRIGHTENED_TICKS;
    }

    pub fn advance(&mut self) -> ModeTick {
        let mut out = ModeTick::default();
        if self.frightened_ticks > 0 {
            self.frightened_ticks -= 1;
            if self.frightened_ticks == 0 {
                out.frightened_ended = true;
            }
        }
        if let Some((_, duration)) = WAVE_SCHEDULE.get(self.wave_index) {
            self.wave_elapsed += 1;
            if self.wave_elapsed >= *duration {
                self.wave_index += 1;
                self.wave_elapsed = 0;
                out.wave_changed = Some(self.wave_mode());
            }
        }
        out
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
