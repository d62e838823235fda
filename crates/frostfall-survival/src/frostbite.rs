//! Frostbite accumulated by players standing in the cold.
//!
//! While exposed (temperature at or below the threshold) a player first
//! burns through their armor's grace, then gains frost ticks. Frost ticks
//! map to three stages with escalating effects. Out of the cold, grace
//! resets at once while frost ticks decay at the same rate they grew; a
//! cooling timer, refilled on every exposed run, holds a staged player at
//! stage 1 or above until it runs out, at which point frostbite clears.
//!
//! # Order of operations
//!
//! 1. Accumulate grace, then frost ticks, or decay and cool
//! 2. Derive the stage, floored at 1 while cooling
//! 3. Apply stage effects and stage 3 damage
//! 4. Queue a warning on the warning interval

use frostfall_types::{
    EffectInstance, FrostbiteStage, Outbound, PlayerId, StatusEffect,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{EFFECT_DURATION, FrostbiteConfig, is_due, stage_index};
use crate::player::PlayerState;

/// Frostbite counters of one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrostbiteTracker {
    /// Armor grace used up during the current exposure.
    pub grace_ticks: u32,
    /// Accumulated frost.
    pub frost_ticks: u32,
    /// Ticks left before a staged player recovers fully.
    pub cooling_ticks: u32,
    /// Current stage.
    pub stage: FrostbiteStage,
}

/// Result of one frostbite update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrostbiteOutcome {
    /// Stage after the update.
    pub stage: FrostbiteStage,
    /// Whether the player was exposed.
    pub exposed: bool,
    /// Whether damage from this update killed the player.
    pub killed: bool,
}

impl FrostbiteTracker {
    /// Advance by one tracker run of `elapsed` ticks.
    pub fn update(
        &mut self,
        player: &mut PlayerState,
        temperature: f64,
        tick: u64,
        elapsed: u32,
        config: &FrostbiteConfig,
        outbound: &mut Vec<Outbound>,
    ) -> FrostbiteOutcome {
        let exposed = temperature <= config.exposure_temperature;
        let before = self.stage;

        if exposed {
            self.cooling_ticks = config.cooling_ticks;
            let limit = player.armor.frostbite_grace_ticks();
            let into_grace = limit.saturating_sub(self.grace_ticks).min(elapsed);
            self.grace_ticks = self.grace_ticks.saturating_add(into_grace);
            self.frost_ticks = self
                .frost_ticks
                .saturating_add(elapsed.saturating_sub(into_grace));
        } else {
            self.grace_ticks = 0;
            self.frost_ticks = self.frost_ticks.saturating_sub(elapsed);
            self.cooling_ticks = self.cooling_ticks.saturating_sub(elapsed);
        }

        self.stage = if self.cooling_ticks == 0 {
            self.frost_ticks = 0;
            FrostbiteStage::Clear
        } else {
            let by_frost = FrostbiteStage::from_u8(stage_index(self.frost_ticks, &config.stage_thresholds));
            if before == FrostbiteStage::Clear {
                by_frost
            } else {
                by_frost.max(FrostbiteStage::Numb)
            }
        };

        if self.stage != before {
            info!(player = %player.id, from = ?before, to = ?self.stage, "frostbite stage changed");
        }

        let killed = apply_stage(player, self.stage, tick, config);
        if self.stage != FrostbiteStage::Clear && is_due(tick, config.warning_interval) {
            outbound.push(warning(player.id, self.stage));
        }

        FrostbiteOutcome {
            stage: self.stage,
            exposed,
            killed,
        }
    }
}

/// Apply the effects of `stage`; returns `true` if damage killed the player.
fn apply_stage(player: &mut PlayerState, stage: FrostbiteStage, tick: u64, config: &FrostbiteConfig) -> bool {
    match stage {
        FrostbiteStage::Clear => false,
        FrostbiteStage::Numb => {
            player.apply_effect(EffectInstance::new(StatusEffect::Slowness, 0, EFFECT_DURATION));
            false
        }
        FrostbiteStage::Frostnip => {
            player.apply_effect(EffectInstance::new(StatusEffect::Slowness, 1, EFFECT_DURATION));
            player.apply_effect(EffectInstance::new(StatusEffect::MiningFatigue, 0, EFFECT_DURATION));
            false
        }
        FrostbiteStage::Frostbite => {
            player.apply_effect(EffectInstance::new(StatusEffect::Slowness, 2, EFFECT_DURATION));
            player.apply_effect(EffectInstance::new(StatusEffect::Weakness, 0, EFFECT_DURATION));
            is_due(tick, config.damage_interval) && player.damage(config.damage)
        }
    }
}

fn warning(player: PlayerId, stage: FrostbiteStage) -> Outbound {
    let text = match stage {
        FrostbiteStage::Clear | FrostbiteStage::Numb => "Your fingers are going numb. Find warmth.",
        FrostbiteStage::Frostnip => "Frostnip is setting in. You need a fire.",
        FrostbiteStage::Frostbite => "Frostbite! You are freezing to death.",
    };
    Outbound::notice(player, text)
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use frostfall_types::{ArmorTier, BlockPos};

    use super::*;
    use crate::config::TRACKER_INTERVAL;

    fn player(armor: ArmorTier) -> PlayerState {
        let mut p = PlayerState::new(PlayerId::new(), "Bo", BlockPos::new(0, 64, 0));
        p.armor = armor;
        p
    }

    /// Run `runs` tracker updates starting at `start_tick`; returns the stage history.
    fn run(
        tracker: &mut FrostbiteTracker,
        player: &mut PlayerState,
        temperature: f64,
        start_tick: u64,
        runs: u64,
    ) -> Vec<FrostbiteStage> {
        let config = FrostbiteConfig::default();
        let mut out = Vec::new();
        (0..runs)
            .map(|i| {
                let tick = start_tick + (i + 1) * u64::from(TRACKER_INTERVAL);
                tracker
                    .update(player, temperature, tick, TRACKER_INTERVAL, &config, &mut out)
                    .stage
            })
            .collect()
    }

    #[test]
    fn stages_rise_monotonically_while_exposed() {
        let mut tracker = FrostbiteTracker::default();
        let mut p = player(ArmorTier::None);
        p.health = 1000.0;
        let history = run(&mut tracker, &mut p, -30.0, 0, 80);
        assert!(history.windows(2).all(|w| w.first() <= w.get(1)));
        assert_eq!(history.get(9), Some(&FrostbiteStage::Numb));
        assert_eq!(history.get(29), Some(&FrostbiteStage::Frostnip));
        assert_eq!(history.get(59), Some(&FrostbiteStage::Frostbite));
        assert!(p.has_effect(StatusEffect::Weakness));
        assert!(p.health < 1000.0);
    }

    #[test]
    fn armor_grace_delays_onset() {
        let mut tracker = FrostbiteTracker::default();
        let mut p = player(ArmorTier::Insulated);
        let history = run(&mut tracker, &mut p, -30.0, 0, 39);
        assert!(history.iter().all(|s| *s == FrostbiteStage::Clear));
        assert_eq!(tracker.grace_ticks, 600);
        assert_eq!(tracker.frost_ticks, 180);
    }

    #[test]
    fn stage_held_at_one_while_cooling_then_resets() {
        let mut tracker = FrostbiteTracker::default();
        let mut p = player(ArmorTier::None);
        p.health = 1000.0;
        run(&mut tracker, &mut p, -30.0, 0, 35);
        assert_eq!(tracker.stage, FrostbiteStage::Frostnip);

        // Warm: frost decays 20 per run, cooling 300 lasts 15 runs.
        let history = run(&mut tracker, &mut p, 15.0, 700, 15);
        assert!(history.iter().take(14).all(|s| *s >= FrostbiteStage::Numb));
        assert_eq!(history.last(), Some(&FrostbiteStage::Clear));
        assert_eq!(tracker.frost_ticks, 0);
    }

    #[test]
    fn grace_resets_out_of_the_cold() {
        let mut tracker = FrostbiteTracker::default();
        let mut p = player(ArmorTier::Leather);
        run(&mut tracker, &mut p, -25.0, 0, 5);
        assert_eq!(tracker.grace_ticks, 100);
        run(&mut tracker, &mut p, 0.0, 100, 1);
        assert_eq!(tracker.grace_ticks, 0);
    }

    #[test]
    fn warnings_only_on_interval_while_staged() {
        let mut tracker = FrostbiteTracker {
            frost_ticks: 400,
            cooling_ticks: 300,
            stage: FrostbiteStage::Numb,
            grace_ticks: 0,
        };
        let mut p = player(ArmorTier::None);
        let config = FrostbiteConfig::default();
        let mut out = Vec::new();
        tracker.update(&mut p, -30.0, 220, TRACKER_INTERVAL, &config, &mut out);
        assert!(out.is_empty());
        tracker.update(&mut p, -30.0, 400, TRACKER_INTERVAL, &config, &mut out);
        assert_eq!(out.len(), 1);
    }
}
