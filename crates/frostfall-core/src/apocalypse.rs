//! The persistent apocalypse counter and its derived environment.
//!
//! [`ApocalypseState`] is the single source of truth for how far the freeze
//! has progressed. Only two values are stored: elapsed apocalypse ticks and
//! whether the apocalypse has begun. Day, phase, sub-stage and every curve
//! value are derived on demand through [`Timeline`], never stored.
//!
//! # Design Principles
//!
//! - The counter only moves forward, except for admin `reset`, `set-day`
//!   and `set-phase`.
//! - All tick arithmetic is checked; day math converts through `u32`
//!   whole days plus a remainder so no float ever feeds back into ticks.
//! - Phase 0 means the apocalypse has not been initialized.

use frostfall_types::EnvironmentSnapshot;
use frostfall_world::phase;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;

/// Per-mille start of phases 1 through 5 on the main timeline.
const PHASE_START_PERMILLE: [u64; 5] = [0, 150, 350, 550, 750];

/// Per-mille start of collapse sub-stages 1 through 3.
const SUB_STAGE_START_PERMILLE: [u64; 3] = [0, 500, 850];

/// Errors that can occur while moving the apocalypse counter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApocalypseError {
    /// The tick counter would overflow.
    #[error("apocalypse counter overflow at {ticks} ticks")]
    Overflow {
        /// Counter value before the failed advance.
        ticks: u64,
    },

    /// The timeline cannot be built from the configuration.
    #[error("invalid apocalypse timeline: {reason}")]
    InvalidTimeline {
        /// What is wrong.
        reason: String,
    },

    /// Requested phase outside 1 through 6.
    #[error("phase {phase} is out of range 1-6")]
    PhaseOutOfRange {
        /// The requested phase.
        phase: u8,
    },

    /// Requested collapse sub-stage outside 1 through 3.
    #[error("sub-stage {sub_stage} is out of range 1-3")]
    SubStageOutOfRange {
        /// The requested sub-stage.
        sub_stage: u8,
    },

    /// Phase 6 was requested with the collapse disabled.
    #[error("the atmospheric collapse is disabled")]
    CollapseDisabled,
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// Timeline parameters the derived getters need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeline {
    /// Host ticks in one day; never zero.
    pub ticks_per_day: u32,
    /// Length of the main timeline in days.
    pub total_days: u32,
    /// Whether phase 6 follows the main timeline.
    pub phase6_enabled: bool,
    /// Length of the collapse in days.
    pub phase6_days: u32,
    /// First phase with weather locked to snow.
    pub weather_lock_phase: u8,
}

impl Timeline {
    /// Build the timeline from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApocalypseError::InvalidTimeline`] if `ticks_per_day` is 0.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ApocalypseError> {
        if config.world.ticks_per_day == 0 {
            return Err(ApocalypseError::InvalidTimeline {
                reason: "ticks_per_day must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            ticks_per_day: config.world.ticks_per_day,
            total_days: config.apocalypse.total_days,
            phase6_enabled: config.apocalypse.phase6_enabled,
            phase6_days: config.apocalypse.phase6_days,
            weather_lock_phase: config.apocalypse.weather_lock_phase,
        })
    }

    /// Fractional days in `ticks`.
    pub fn days(&self, ticks: u64) -> f64 {
        let per_day = u64::from(self.ticks_per_day);
        let whole = ticks.checked_div(per_day).unwrap_or(0);
        let rest = ticks.checked_rem(per_day).unwrap_or(0);
        let whole = f64::from(u32::try_from(whole).unwrap_or(u32::MAX));
        let rest = f64::from(u32::try_from(rest).unwrap_or(0));
        whole + rest / f64::from(self.ticks_per_day.max(1))
    }

    /// Ticks in `days` whole days.
    pub fn ticks_for_days(&self, days: u32) -> u64 {
        u64::from(days).saturating_mul(u64::from(self.ticks_per_day))
    }

    /// First tick at which `permille` of `span_days` has elapsed after `offset`.
    fn tick_at(&self, offset: u64, span_days: u32, permille: u64) -> u64 {
        let span = self.ticks_for_days(span_days);
        let scaled = span
            .saturating_mul(permille)
            .saturating_add(999)
            .checked_div(1000)
            .unwrap_or(0);
        offset.saturating_add(scaled)
    }
}

// ---------------------------------------------------------------------------
// ApocalypseState
// ---------------------------------------------------------------------------

/// Persistent apocalypse counter.
///
/// Serialized as `{"apocalypseTicks": .., "initialized": ..}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApocalypseState {
    /// Elapsed apocalypse ticks.
    apocalypse_ticks: u64,
    /// Whether the apocalypse has begun.
    initialized: bool,
}

impl ApocalypseState {
    /// A world where the apocalypse has not begun.
    pub const fn new() -> Self {
        Self {
            apocalypse_ticks: 0,
            initialized: false,
        }
    }

    /// Restore a counter from saved values.
    pub const fn from_parts(apocalypse_ticks: u64, initialized: bool) -> Self {
        Self {
            apocalypse_ticks,
            initialized,
        }
    }

    /// Elapsed apocalypse ticks.
    pub const fn apocalypse_ticks(&self) -> u64 {
        self.apocalypse_ticks
    }

    /// Whether the apocalypse has begun.
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Begin the apocalypse. Returns `true` if it was not running before.
    pub const fn begin(&mut self) -> bool {
        let started = !self.initialized;
        self.initialized = true;
        started
    }

    /// Advance the counter by one tick.
    ///
    /// Does nothing before the apocalypse begins.
    ///
    /// # Errors
    ///
    /// Returns [`ApocalypseError::Overflow`] if the counter would overflow.
    pub fn advance(&mut self) -> Result<u64, ApocalypseError> {
        self.advance_by(1)
    }

    /// Advance the counter by `ticks`, e.g. when players sleep the night away.
    ///
    /// # Errors
    ///
    /// Returns [`ApocalypseError::Overflow`] if the counter would overflow.
    pub fn advance_by(&mut self, ticks: u64) -> Result<u64, ApocalypseError> {
        if !self.initialized {
            return Ok(self.apocalypse_ticks);
        }
        self.apocalypse_ticks =
            self.apocalypse_ticks
                .checked_add(ticks)
                .ok_or(ApocalypseError::Overflow {
                    ticks: self.apocalypse_ticks,
                })?;
        Ok(self.apocalypse_ticks)
    }

    /// Return to the calm world before the apocalypse.
    pub const fn reset(&mut self) {
        self.apocalypse_ticks = 0;
        self.initialized = false;
    }

    /// Jump to the start of `day`, beginning the apocalypse if needed.
    pub fn set_day(&mut self, day: u32, timeline: &Timeline) {
        self.apocalypse_ticks = timeline.ticks_for_days(day);
        self.initialized = true;
    }

    /// Jump to the start of `phase` (and collapse `sub_stage` for phase 6).
    ///
    /// # Errors
    ///
    /// Returns an error for a phase outside 1-6, a sub-stage outside 1-3,
    /// or phase 6 with the collapse disabled.
    pub fn set_phase(
        &mut self,
        phase: u8,
        sub_stage: Option<u8>,
        timeline: &Timeline,
    ) -> Result<(), ApocalypseError> {
        let ticks = match phase {
            1..=5 => {
                let index = usize::from(phase.saturating_sub(1));
                let permille = PHASE_START_PERMILLE.get(index).copied().unwrap_or(0);
                timeline.tick_at(0, timeline.total_days, permille)
            }
            6 => {
                if !timeline.phase6_enabled {
                    return Err(ApocalypseError::CollapseDisabled);
                }
                let sub_stage = sub_stage.unwrap_or(1);
                let permille = match sub_stage {
                    1..=3 => SUB_STAGE_START_PERMILLE
                        .get(usize::from(sub_stage.saturating_sub(1)))
                        .copied()
                        .unwrap_or(0),
                    _ => return Err(ApocalypseError::SubStageOutOfRange { sub_stage }),
                };
                let main_end = timeline.ticks_for_days(timeline.total_days);
                timeline.tick_at(main_end, timeline.phase6_days, permille)
            }
            _ => return Err(ApocalypseError::PhaseOutOfRange { phase }),
        };
        self.apocalypse_ticks = ticks;
        self.initialized = true;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Derived getters
    // -----------------------------------------------------------------------

    /// Elapsed days, fractional.
    pub fn day(&self, timeline: &Timeline) -> f64 {
        timeline.days(self.apocalypse_ticks)
    }

    /// Main timeline progress, 0.0 through 1.0.
    pub fn progress(&self, timeline: &Timeline) -> f64 {
        if !self.initialized {
            return 0.0;
        }
        phase::progress(self.day(timeline), f64::from(timeline.total_days))
    }

    /// Collapse progress, if the collapse is under way.
    pub fn collapse_progress(&self, timeline: &Timeline) -> Option<f64> {
        if !self.initialized || !timeline.phase6_enabled {
            return None;
        }
        let past = self.day(timeline) - f64::from(timeline.total_days);
        if past < 0.0 {
            return None;
        }
        if timeline.phase6_days == 0 {
            return Some(1.0);
        }
        Some((past / f64::from(timeline.phase6_days)).clamp(0.0, 1.0))
    }

    /// Current phase, 0 through 6.
    pub fn phase(&self, timeline: &Timeline) -> u8 {
        self.snapshot(timeline).phase
    }

    /// Collapse sub-stage 1 through 3, or 0 outside phase 6.
    pub fn sub_stage(&self, timeline: &Timeline) -> u8 {
        self.snapshot(timeline).sub_stage
    }

    /// Surface temperature offset in °C.
    pub fn temperature_offset(&self, timeline: &Timeline) -> f64 {
        self.snapshot(timeline).temperature_offset
    }

    /// Rendered sun size multiplier.
    pub fn sun_scale(&self, timeline: &Timeline) -> f64 {
        self.snapshot(timeline).sun_scale
    }

    /// Sun brightness multiplier.
    pub fn sun_brightness(&self, timeline: &Timeline) -> f64 {
        self.snapshot(timeline).sun_brightness
    }

    /// Sky light multiplier.
    pub fn sky_light(&self, timeline: &Timeline) -> f64 {
        self.snapshot(timeline).sky_light
    }

    /// Day length multiplier.
    pub fn day_length_multiplier(&self, timeline: &Timeline) -> f64 {
        self.snapshot(timeline).day_length_multiplier
    }

    /// Everything derived from the counter, for one tick.
    pub fn snapshot(&self, timeline: &Timeline) -> EnvironmentSnapshot {
        if !self.initialized {
            return EnvironmentSnapshot {
                apocalypse_ticks: self.apocalypse_ticks,
                ..EnvironmentSnapshot::calm()
            };
        }
        let day = self.day(timeline);
        let progress = self.progress(timeline);
        let (phase, sub_stage, collapse_progress, temperature_offset) =
            match self.collapse_progress(timeline) {
                Some(collapse) => (
                    6,
                    phase::sub_stage(collapse),
                    collapse,
                    phase::collapse_temperature_offset(collapse),
                ),
                None => (
                    phase::phase_for_progress(progress),
                    0,
                    0.0,
                    phase::temperature_offset(progress),
                ),
            };
        EnvironmentSnapshot {
            apocalypse_ticks: self.apocalypse_ticks,
            day,
            phase,
            sub_stage,
            progress,
            collapse_progress,
            temperature_offset,
            sun_scale: phase::sun_scale(progress),
            sun_brightness: phase::sun_brightness(progress),
            sky_light: phase::sky_light(progress),
            day_length_multiplier: phase::day_length_multiplier(progress),
            weather_locked: phase::weather_locked(phase, timeline.weather_lock_phase),
        }
    }
}
