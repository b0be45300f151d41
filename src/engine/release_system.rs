use crate::constants::{release_fallback_ticks, release_pellet_quota};
use crate::types::GhostPersonality;

/// Per-ghost release gate. The pellet quota, when configured, is the
/// primary condition; the elapsed-tick fallback still frees a ghost on a
/// life where the player stops eating. Tick thresholds count from level
/// start and do not reset on life loss; only the pellet counter does.
#[derive(Clone, Copy, Debug)]
pub(super) struct ReleaseGate {
    quota: Option<i32>,
    fallback_ticks: u64,
}

impl ReleaseGate {
    pub fn for_personality(personality: GhostPersonality) -> Self {
        Self {
            quota: release_pellet_quota(personality),
            fallback_ticks: release_fallback_ticks(personality),
        }
    }

    /// A gate with no quota and a zero tick threshold never cages its
    /// ghost at all.
    pub fn starts_in_play(&self) -> bool {
        self.quota.is_none() && self.fallback_ticks == 0
    }

    pub fn should_exit(&self, pellets_since_reset: i32, tick: u64) -> bool {
        match self.quota {
            Some(quota) => pellets_since_reset >= quota || tick >= self.fallback_ticks,
            None => tick >= self.fallback_ticks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ungated_ghost_starts_in_play() {
        let gate = ReleaseGate::for_personality(GhostPersonality::Chaser);
        assert!(gate.starts_in_play());
        let gated = ReleaseGate::for_personality(GhostPersonality::Flanker);
        assert!(!gated.starts_in_play());
    }

    #[test]
    fn quota_releases_exactly_at_the_threshold() {
        let gate = ReleaseGate {
            quota: Some(30),
            fallback_ticks: 600,
        };
        assert!(!gate.should_exit(29, 10));
        assert!(gate.should_exit(30, 10));
    }

    #[test]
    fn tick_fallback_frees_a_starved_ghost() {
        let gate = ReleaseGate {
            quota: Some(30),
            fallback_ticks: 600,
        };
        assert!(!gate.should_exit(0, 599));
        assert!(gate.should_exit(0, 600));
    }

    #[test]
    fn zero_quota_releases_immediately() {
        let gate = ReleaseGate::for_personality(GhostPersonality::Ambusher);
        assert!(gate.should_exit(0, 1));
    }
}
