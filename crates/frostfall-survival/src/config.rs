//! Configuration constants and defaults for the survival trackers.
//!
//! These values mirror the `survival` section of `frostfall-config.yaml`.
//! Each tracker has its own struct so callers and tests can override a
//! single tunable without restating the rest; missing YAML keys fall back
//! to the [`Default`] impls here.

use serde::{Deserialize, Serialize};

/// Ticks between tracker runs. Every rate below is per tick and is applied
/// in units of this interval.
pub const TRACKER_INTERVAL: u32 = 20;

/// Duration given to tracker effects; long enough to bridge two runs.
pub const EFFECT_DURATION: u32 = 60;

/// Configuration for every survival tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurvivalConfig {
    /// Player frostbite.
    pub frostbite: FrostbiteConfig,
    /// Mob freezing.
    pub mob_freeze: MobFreezeConfig,
    /// Heat stroke and suffocation.
    pub exposure: ExposureConfig,
    /// Isolation and sanity.
    pub sanity: SanityConfig,
    /// Food spoilage by cold.
    pub food_frost: FoodFrostConfig,
}

/// Frostbite tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrostbiteConfig {
    /// Temperature at or below which a player is exposed (default: -20.0).
    pub exposure_temperature: f64,
    /// Frost ticks for stages 1, 2 and 3 (default: 200 / 600 / 1200).
    pub stage_thresholds: [u32; 3],
    /// Cooling ticks refilled while exposed (default: 300).
    pub cooling_ticks: u32,
    /// Damage dealt at stage 3 (default: 1.0).
    pub damage: f64,
    /// Ticks between stage 3 damage (default: 40).
    pub damage_interval: u32,
    /// Ticks between warnings while staged (default: 200).
    pub warning_interval: u32,
}

impl Default for FrostbiteConfig {
    fn default() -> Self {
        Self {
            exposure_temperature: -20.0,
            stage_thresholds: [200, 600, 1200],
            cooling_ticks: 300,
            damage: 1.0,
            damage_interval: 40,
            warning_interval: 200,
        }
    }
}

/// Mob freeze tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobFreezeConfig {
    /// Mobs farther than this from every player are skipped (default: 64).
    pub player_radius: u32,
    /// Ticks between mob freeze runs (default: 40).
    pub interval: u32,
    /// Temperature at or below which a mob is exposed (default: -25.0).
    pub exposure_temperature: f64,
    /// Freeze ticks added per run while exposed (default: 40).
    pub gain: u32,
    /// Freeze ticks removed per run otherwise (default: 80).
    pub recovery: u32,
    /// Freeze ticks for chilled, frozen and solid (default: 200 / 600 / 1200).
    pub stage_thresholds: [u32; 3],
    /// First phase in which mobs can freeze solid (default: 5).
    pub solid_min_phase: u8,
    /// Damage dealt while frozen (default: 1.0).
    pub damage: f64,
}

impl Default for MobFreezeConfig {
    fn default() -> Self {
        Self {
            player_radius: 64,
            interval: 40,
            exposure_temperature: -25.0,
            gain: 40,
            recovery: 80,
            stage_thresholds: [200, 600, 1200],
            solid_min_phase: 5,
            damage: 1.0,
        }
    }
}

/// Heat and suffocation tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureConfig {
    /// Temperature at or above which heat ticks accumulate (default: 40.0).
    pub heat_temperature: f64,
    /// Heat ticks removed per tick when cool (default: 2).
    pub heat_recovery_rate: u32,
    /// Heat ticks for weakness (default: 100).
    pub weakness_at: u32,
    /// Heat ticks for nausea and damage (default: 300).
    pub nausea_at: u32,
    /// Heat stroke damage (default: 0.5).
    pub heat_damage: f64,
    /// Ticks between heat stroke damage (default: 40).
    pub heat_damage_interval: u32,
    /// Lowest collapse sub-stage that thins the air (default: 2).
    pub suffocation_sub_stage: u8,
    /// Highest y that stays breathable during the collapse (default: 0).
    pub breathable_max_y: i32,
    /// Ticks of breath before suffocation damage (default: 200).
    pub suffocation_grace: u32,
    /// Suffocation timer removed per tick while breathing (default: 4).
    pub suffocation_recovery_rate: u32,
    /// Suffocation damage per tracker run (default: 2.0).
    pub suffocation_damage: f64,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            heat_temperature: 40.0,
            heat_recovery_rate: 2,
            weakness_at: 100,
            nausea_at: 300,
            heat_damage: 0.5,
            heat_damage_interval: 40,
            suffocation_sub_stage: 2,
            breathable_max_y: 0,
            suffocation_grace: 200,
            suffocation_recovery_rate: 4,
            suffocation_damage: 2.0,
        }
    }
}

/// Sanity tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanityConfig {
    /// Another eligible player within this radius counts as company (default: 24).
    pub social_radius: u32,
    /// A light-emitting block within this radius lights the player (default: 6).
    pub light_radius: u32,
    /// Sky-light multiplier needed for daylight to count (default: 0.5).
    pub min_sky_light: f64,
    /// Grace ticks refilled while comforted (default: 600).
    pub comfort_grace: u32,
    /// Isolation removed per tick while comforted (default: 3).
    pub comfort_decay: u32,
    /// Isolation removed per tick with company or light (default: 1).
    pub social_decay: u32,
    /// Isolation ticks for stages 1, 2 and 3 (default: 6000 / 12000 / 24000).
    pub stage_thresholds: [u32; 3],
    /// Ticks between reminders while staged (default: 1200).
    pub message_interval: u32,
}

impl Default for SanityConfig {
    fn default() -> Self {
        Self {
            social_radius: 24,
            light_radius: 6,
            min_sky_light: 0.5,
            comfort_grace: 600,
            comfort_decay: 3,
            social_decay: 1,
            stage_thresholds: [6000, 12_000, 24_000],
            message_interval: 1200,
        }
    }
}

/// Food frost tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodFrostConfig {
    /// Ambient temperature below which food freezes (default: -30.0).
    pub freeze_temperature: f64,
    /// Frost ticks per tick for the held stack (default: 3).
    pub held_rate: u32,
    /// Frost ticks per tick for other stacks (default: 1).
    pub inventory_rate: u32,
    /// Frost ticks removed per tick when thawing (default: 2).
    pub thaw_rate: u32,
    /// Frost ticks for chilled, frozen and ruined (default: 1200 / 2400 / 6000).
    pub stage_thresholds: [u32; 3],
    /// Ticks between write-backs when the stage is unchanged (default: 600).
    pub write_back_interval: u32,
}

impl Default for FoodFrostConfig {
    fn default() -> Self {
        Self {
            freeze_temperature: -30.0,
            held_rate: 3,
            inventory_rate: 1,
            thaw_rate: 2,
            stage_thresholds: [1200, 2400, 6000],
            write_back_interval: 600,
        }
    }
}

/// Stage index 0 through 3 for `value` against ascending `thresholds`.
pub fn stage_index(value: u32, thresholds: &[u32; 3]) -> u8 {
    let reached = thresholds.iter().filter(|threshold| value >= **threshold).count();
    u8::try_from(reached).unwrap_or(3)
}

/// Whether `tick` falls on a multiple of `interval`. A zero interval never fires.
pub fn is_due(tick: u64, interval: u32) -> bool {
    tick.checked_rem(u64::from(interval)) == Some(0)
}

/// `rate` per tick scaled to one tracker run of `elapsed` ticks.
pub const fn per_run(rate: u32, elapsed: u32) -> u32 {
    rate.saturating_mul(elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_index_counts_thresholds_reached() {
        let thresholds = [200, 600, 1200];
        assert_eq!(stage_index(0, &thresholds), 0);
        assert_eq!(stage_index(199, &thresholds), 0);
        assert_eq!(stage_index(200, &thresholds), 1);
        assert_eq!(stage_index(1199, &thresholds), 2);
        assert_eq!(stage_index(u32::MAX, &thresholds), 3);
    }

    #[test]
    fn zero_interval_never_due() {
        assert!(!is_due(0, 0));
        assert!(is_due(400, 40));
        assert!(!is_due(401, 40));
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = "sanity:\n  comfort_decay: 5\nfood_frost:\n  held_rate: 4\n";
        let config: SurvivalConfig = serde_yml::from_str(yaml).unwrap_or_default();
        assert_eq!(config.sanity.comfort_decay, 5);
        assert_eq!(config.sanity.comfort_grace, 600);
        assert_eq!(config.food_frost.held_rate, 4);
        assert_eq!(config.frostbite, FrostbiteConfig::default());
    }
}
