//! Mob freezing near players.
//!
//! Runs on its own interval and only for mobs within range of some player.
//! Cold-immune kinds (strays, polar bears, snow golems) never freeze.
//! Recovery is twice as fast as freezing. From phase 5, a mob that reaches
//! the final stage freezes solid and dies.

use std::collections::BTreeMap;

use frostfall_types::{BlockPos, EffectInstance, MobFreezeStage, MobId, StatusEffect};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{EFFECT_DURATION, MobFreezeConfig, stage_index};
use crate::player::MobState;

/// Freeze counters of every tracked mob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobFreezeTracker {
    freeze_ticks: BTreeMap<MobId, u32>,
}

/// Result of one mob update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MobFreezeOutcome {
    /// Stage after the update.
    pub stage: MobFreezeStage,
    /// Whether the mob died this update.
    pub killed: bool,
}

/// Whether `pos` is within `radius` of any of `players`.
pub fn near_any_player(pos: BlockPos, players: &[BlockPos], radius: u32) -> bool {
    players.iter().any(|player| player.within(pos, radius))
}

impl MobFreezeTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze ticks of `mob`.
    pub fn freeze_ticks(&self, mob: MobId) -> u32 {
        self.freeze_ticks.get(&mob).copied().unwrap_or(0)
    }

    /// Number of mobs with freeze state.
    pub fn len(&self) -> usize {
        self.freeze_ticks.len()
    }

    /// Whether no mob has freeze state.
    pub fn is_empty(&self) -> bool {
        self.freeze_ticks.is_empty()
    }

    /// Advance one mob by one run.
    pub fn update(
        &mut self,
        mob: &mut MobState,
        temperature: f64,
        phase: u8,
        config: &MobFreezeConfig,
    ) -> MobFreezeOutcome {
        let exposed = !mob.kind.is_cold_immune() && temperature <= config.exposure_temperature;
        let ticks = self.freeze_ticks.entry(mob.id).or_insert(0);
        *ticks = if exposed {
            ticks.saturating_add(config.gain)
        } else {
            ticks.saturating_sub(config.recovery)
        };
        let value = *ticks;
        if value == 0 {
            self.freeze_ticks.remove(&mob.id);
        }

        let mut stage = MobFreezeStage::from_u8(stage_index(value, &config.stage_thresholds));
        if stage == MobFreezeStage::Solid && phase < config.solid_min_phase {
            stage = MobFreezeStage::Frozen;
        }

        let killed = match stage {
            MobFreezeStage::Clear => false,
            MobFreezeStage::Chilled => {
                mob.apply_effect(EffectInstance::new(StatusEffect::Slowness, 0, EFFECT_DURATION));
                false
            }
            MobFreezeStage::Frozen => {
                mob.apply_effect(EffectInstance::new(StatusEffect::Slowness, 2, EFFECT_DURATION));
                mob.damage(config.damage)
            }
            MobFreezeStage::Solid => {
                let alive = mob.is_alive();
                mob.kill();
                debug!(mob = %mob.id, kind = ?mob.kind, "mob frozen solid");
                alive
            }
        };
        if killed {
            self.freeze_ticks.remove(&mob.id);
        }
        MobFreezeOutcome { stage, killed }
    }

    /// Drop state for mobs not in `alive`.
    pub fn retain(&mut self, alive: impl Fn(MobId) -> bool) {
        self.freeze_ticks.retain(|id, _| alive(*id));
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use frostfall_types::MobKind;

    use super::*;

    fn mob(kind: MobKind) -> MobState {
        MobState::new(MobId::new(), kind, BlockPos::new(0, 64, 0), 1000.0)
    }

    fn run(tracker: &mut MobFreezeTracker, m: &mut MobState, temperature: f64, phase: u8, runs: u32) -> MobFreezeOutcome {
        let config = MobFreezeConfig::default();
        let mut last = MobFreezeOutcome {
            stage: MobFreezeStage::Clear,
            killed: false,
        };
        for _ in 0..runs {
            last = tracker.update(m, temperature, phase, &config);
        }
        last
    }

    #[test]
    fn cold_immune_mobs_never_freeze() {
        let mut tracker = MobFreezeTracker::new();
        let mut bear = mob(MobKind::PolarBear);
        let outcome = run(&mut tracker, &mut bear, -80.0, 5, 50);
        assert_eq!(outcome.stage, MobFreezeStage::Clear);
        assert!(tracker.is_empty());
    }

    #[test]
    fn recovery_is_twice_as_fast() {
        let mut tracker = MobFreezeTracker::new();
        let mut cow = mob(MobKind::Cow);
        run(&mut tracker, &mut cow, -30.0, 3, 10);
        assert_eq!(tracker.freeze_ticks(cow.id), 400);
        run(&mut tracker, &mut cow, 5.0, 3, 2);
        assert_eq!(tracker.freeze_ticks(cow.id), 240);
    }

    #[test]
    fn frozen_solid_only_from_phase_five() {
        let mut tracker = MobFreezeTracker::new();
        let mut zombie = mob(MobKind::Zombie);
        let outcome = run(&mut tracker, &mut zombie, -40.0, 4, 40);
        assert_eq!(outcome.stage, MobFreezeStage::Frozen);
        assert!(zombie.is_alive());

        let outcome = run(&mut tracker, &mut zombie, -40.0, 5, 1);
        assert_eq!(outcome.stage, MobFreezeStage::Solid);
        assert!(outcome.killed);
        assert!(!zombie.is_alive());
        assert_eq!(tracker.freeze_ticks(zombie.id), 0);
    }

    #[test]
    fn range_check() {
        let players = [BlockPos::new(0, 64, 0), BlockPos::new(500, 64, 0)];
        assert!(near_any_player(BlockPos::new(60, 64, 0), &players, 64));
        assert!(near_any_player(BlockPos::new(440, 64, 0), &players, 64));
        assert!(!near_any_player(BlockPos::new(250, 64, 0), &players, 64));
    }
}
