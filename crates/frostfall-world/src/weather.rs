//! Weather over the loaded world.
//!
//! Weather is rolled on a fixed interval with phase-weighted probabilities
//! and deterministic randomness, so the same seed and tick always produce
//! the same sky. Once the phase reaches the configured lock phase the roll
//! is skipped and weather is forced to snow.
//!
//! | Weather  | Phase 0-1 | Phase 2+ (unlocked) |
//! |----------|-----------|---------------------|
//! | Clear    | 55%       | 30%                 |
//! | Rain     | 25%       | 10%                 |
//! | Snow     |  5%       | 45%                 |
//! | (repeat) | 15%       | 15%                 |

use frostfall_types::Weather;

use crate::phase;
use crate::sampling::on_interval;

/// Ticks between weather rolls.
pub const WEATHER_ROLL_INTERVAL: u64 = 1200;

/// Weighted entries: `(Some(weather), weight)` or `(None, weight)` for repeat.
fn weights_for_phase(phase: u8) -> [(Option<Weather>, u32); 4] {
    if phase <= 1 {
        [
            (Some(Weather::Clear), 55),
            (Some(Weather::Rain), 25),
            (Some(Weather::Snow), 5),
            (None, 15),
        ]
    } else {
        [
            (Some(Weather::Clear), 30),
            (Some(Weather::Rain), 10),
            (Some(Weather::Snow), 45),
            (None, 15),
        ]
    }
}

/// Deterministic weather generator.
#[derive(Debug, Clone)]
pub struct WeatherSystem {
    /// World seed used to derive per-roll randomness.
    world_seed: u64,
    /// Current weather.
    current: Weather,
}

impl WeatherSystem {
    /// Create a weather system starting clear.
    pub const fn new(world_seed: u64) -> Self {
        Self {
            world_seed,
            current: Weather::Clear,
        }
    }

    /// Current weather.
    pub const fn current(&self) -> Weather {
        self.current
    }

    /// Restore weather from a save.
    pub const fn set_current(&mut self, weather: Weather) {
        self.current = weather;
    }

    /// Advance weather for `tick` in `phase`.
    ///
    /// Locked phases always yield snow. Otherwise a new roll happens only
    /// on multiples of [`WEATHER_ROLL_INTERVAL`].
    pub fn update(&mut self, tick: u64, phase: u8, lock_phase: u8) -> Weather {
        if phase::weather_locked(phase, lock_phase) {
            self.current = Weather::Snow;
            return self.current;
        }
        if !on_interval(tick, WEATHER_ROLL_INTERVAL) {
            return self.current;
        }

        let weights = weights_for_phase(phase);
        let total: u32 = weights.iter().fold(0, |acc, (_, w)| acc.saturating_add(*w));
        if total == 0 {
            return self.current;
        }
        let random = deterministic_random(self.world_seed, tick);
        let roll = u32::try_from(random.checked_rem(u64::from(total)).unwrap_or(0)).unwrap_or(0);

        let mut cumulative: u32 = 0;
        for (weather, weight) in weights {
            cumulative = cumulative.saturating_add(weight);
            if roll < cumulative {
                if let Some(weather) = weather {
                    self.current = weather;
                }
                break;
            }
        }
        self.current
    }
}

/// `xorshift64` over the mixed `(seed, tick)` pair.
const fn deterministic_random(world_seed: u64, tick: u64) -> u64 {
    let mut state = world_seed.wrapping_add(tick.wrapping_mul(0x517c_c1b7_2722_0a95));
    if state == 0 {
        state = 0xdead_beef_cafe_babe;
    }
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    state
}
