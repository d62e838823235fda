//! Heat stroke and suffocation.
//!
//! Heat ticks build while a player stands at or above the heat threshold
//! (pressed against lava, or stacked heaters) and recover at twice the rate
//! otherwise. Suffocation applies only during the collapse's later
//! sub-stages, above the breathable depth and outside every core's
//! breathable zone; armor extends the grace, and breathing air drains the
//! timer four times faster than it fills.

use frostfall_types::{EffectInstance, EnvironmentSnapshot, StatusEffect};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{EFFECT_DURATION, ExposureConfig, is_due, per_run};
use crate::player::{PlayerConditions, PlayerState};

/// Heat and suffocation counters of one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureTracker {
    /// Accumulated heat.
    pub heat_ticks: u32,
    /// Ticks spent without breathable air.
    pub suffocation_ticks: u32,
}

/// Result of one exposure update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExposureOutcome {
    /// Heat stroke level: 0 none, 1 weakness, 2 nausea and damage.
    pub heat_level: u8,
    /// Whether the player took suffocation damage.
    pub suffocating: bool,
    /// Whether damage from this update killed the player.
    pub killed: bool,
}

impl ExposureTracker {
    /// Advance by one tracker run of `elapsed` ticks.
    pub fn update(
        &mut self,
        player: &mut PlayerState,
        conditions: &PlayerConditions,
        env: &EnvironmentSnapshot,
        tick: u64,
        elapsed: u32,
        config: &ExposureConfig,
    ) -> ExposureOutcome {
        let mut outcome = ExposureOutcome::default();

        // Heat
        if conditions.temperature >= config.heat_temperature {
            self.heat_ticks = self.heat_ticks.saturating_add(elapsed);
        } else {
            self.heat_ticks = self
                .heat_ticks
                .saturating_sub(per_run(config.heat_recovery_rate, elapsed));
        }
        if self.heat_ticks >= config.weakness_at {
            outcome.heat_level = 1;
            player.apply_effect(EffectInstance::new(StatusEffect::Weakness, 0, EFFECT_DURATION));
        }
        if self.heat_ticks >= config.nausea_at {
            outcome.heat_level = 2;
            player.apply_effect(EffectInstance::new(StatusEffect::Nausea, 0, EFFECT_DURATION));
            if is_due(tick, config.heat_damage_interval) && player.damage(config.heat_damage) {
                outcome.killed = true;
            }
        }

        // Suffocation
        if air_is_thin(player, conditions, env, config) {
            self.suffocation_ticks = self.suffocation_ticks.saturating_add(elapsed);
            let grace = config
                .suffocation_grace
                .saturating_add(player.armor.suffocation_grace_bonus());
            if self.suffocation_ticks > grace {
                outcome.suffocating = true;
                debug!(player = %player.id, ticks = self.suffocation_ticks, "suffocating");
                if player.damage(config.suffocation_damage) {
                    outcome.killed = true;
                }
            }
        } else {
            self.suffocation_ticks = self
                .suffocation_ticks
                .saturating_sub(per_run(config.suffocation_recovery_rate, elapsed));
        }

        outcome
    }
}

/// Whether the player is somewhere the collapse has made unbreathable.
pub fn air_is_thin(
    player: &PlayerState,
    conditions: &PlayerConditions,
    env: &EnvironmentSnapshot,
    config: &ExposureConfig,
) -> bool {
    env.is_collapse()
        && env.sub_stage >= config.suffocation_sub_stage
        && player.pos.y > config.breathable_max_y
        && !conditions.oxygenated
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use frostfall_types::{ArmorTier, BlockPos, PlayerId};

    use super::*;
    use crate::config::TRACKER_INTERVAL;

    fn player(y: i32) -> PlayerState {
        let mut p = PlayerState::new(PlayerId::new(), "Cy", BlockPos::new(0, y, 0));
        p.health = 1000.0;
        p
    }

    fn collapse(sub_stage: u8) -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            phase: 6,
            sub_stage,
            ..EnvironmentSnapshot::calm()
        }
    }

    fn conditions(temperature: f64, oxygenated: bool) -> PlayerConditions {
        PlayerConditions {
            temperature,
            oxygenated,
            ..PlayerConditions::default()
        }
    }

    fn run(
        tracker: &mut ExposureTracker,
        p: &mut PlayerState,
        c: &PlayerConditions,
        env: &EnvironmentSnapshot,
        runs: u64,
    ) -> ExposureOutcome {
        let config = ExposureConfig::default();
        let mut last = ExposureOutcome::default();
        for i in 1..=runs {
            last = tracker.update(p, c, env, i * u64::from(TRACKER_INTERVAL), TRACKER_INTERVAL, &config);
        }
        last
    }

    #[test]
    fn heat_stroke_escalates_and_recovers_twice_as_fast() {
        let mut tracker = ExposureTracker::default();
        let mut p = player(10);
        let env = EnvironmentSnapshot::calm();
        let hot = conditions(45.0, false);
        assert_eq!(run(&mut tracker, &mut p, &hot, &env, 5).heat_level, 1);
        assert_eq!(run(&mut tracker, &mut p, &hot, &env, 10).heat_level, 2);
        assert!(p.has_effect(StatusEffect::Nausea));
        assert_eq!(tracker.heat_ticks, 300);

        run(&mut tracker, &mut p, &conditions(20.0, false), &env, 5);
        assert_eq!(tracker.heat_ticks, 100);
    }

    #[test]
    fn suffocation_only_above_ground_in_late_collapse() {
        let config = ExposureConfig::default();
        let env = collapse(2);
        let c = conditions(-120.0, false);
        assert!(air_is_thin(&player(5), &c, &env, &config));
        assert!(!air_is_thin(&player(0), &c, &env, &config));
        assert!(!air_is_thin(&player(5), &conditions(-120.0, true), &env, &config));
        assert!(!air_is_thin(&player(5), &c, &collapse(1), &config));
    }

    #[test]
    fn armor_extends_breath_and_damage_follows_grace() {
        let env = collapse(3);
        let c = conditions(-120.0, false);

        let mut tracker = ExposureTracker::default();
        let mut bare = player(20);
        assert!(!run(&mut tracker, &mut bare, &c, &env, 10).suffocating);
        assert!(run(&mut tracker, &mut bare, &c, &env, 1).suffocating);

        let mut tracker = ExposureTracker::default();
        let mut cryo = player(20);
        cryo.armor = ArmorTier::Cryo;
        assert!(!run(&mut tracker, &mut cryo, &c, &env, 40).suffocating);
        assert!((cryo.health - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn breathing_drains_the_timer_four_times_faster() {
        let mut tracker = ExposureTracker {
            heat_ticks: 0,
            suffocation_ticks: 160,
        };
        let mut p = player(-10);
        run(&mut tracker, &mut p, &conditions(-120.0, false), &collapse(3), 1);
        assert_eq!(tracker.suffocation_ticks, 80);
    }
}
