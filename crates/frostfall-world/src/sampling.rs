//! Bounded random sampling shared by the block transformation engines.
//!
//! No engine ever walks the whole world. Each one owns a
//! [`SamplingSchedule`] that says, per phase, how often it runs and how
//! many surface and volume cells it samples around every player. Sampled
//! cells in unloaded chunks are skipped without touching them.
//!
//! Engines implement [`BlockEngine`]; [`run_engine`] applies the activity
//! check and the interval gate and logs the resulting [`TransformReport`].

use frostfall_types::{BlockKind, BlockPos, BlockState, EnvironmentSnapshot};
use rand::Rng;
use rand::rngs::SmallRng;
use tracing::debug;

use crate::registry::SpatialRegistries;
use crate::temperature::TemperatureManager;
use crate::voxel::VoxelWorld;

/// Surface sample count the configured baseline corresponds to.
pub const BASELINE_SURFACE_SAMPLES: u32 = 24;

/// Volume sample count the configured baseline corresponds to.
pub const BASELINE_VOLUME_SAMPLES: u32 = 12;

/// Whether `tick` falls on a multiple of `interval`. A zero interval never
/// fires.
pub const fn on_interval(tick: u64, interval: u64) -> bool {
    matches!(tick.checked_rem(interval), Some(0))
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

/// How often an engine runs and how much it samples per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleBudget {
    /// Run when `tick % interval == 0`.
    pub interval: u64,
    /// Surface samples per player.
    pub surface: u32,
    /// Volume samples per player.
    pub volume: u32,
}

impl SampleBudget {
    /// Create a budget.
    pub const fn new(interval: u64, surface: u32, volume: u32) -> Self {
        Self {
            interval,
            surface,
            volume,
        }
    }
}

/// Per-phase budgets for one engine.
///
/// Entries are `(min_phase, budget)` in ascending phase order; the entry
/// with the highest `min_phase` not above the current phase applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingSchedule {
    entries: &'static [(u8, SampleBudget)],
}

impl SamplingSchedule {
    /// Create a schedule from ascending `(min_phase, budget)` entries.
    pub const fn new(entries: &'static [(u8, SampleBudget)]) -> Self {
        Self { entries }
    }

    /// Budget for `phase`, or `None` below the first entry.
    pub fn budget_for(&self, phase: u8) -> Option<SampleBudget> {
        self.entries
            .iter()
            .rev()
            .find(|(min_phase, _)| phase >= *min_phase)
            .map(|(_, budget)| *budget)
    }
}

/// Radius and baseline counts from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingSettings {
    /// Half-width of the sampled square around each player.
    pub horizontal_radius: i32,
    /// Configured surface baseline; schedules scale relative to
    /// [`BASELINE_SURFACE_SAMPLES`].
    pub surface_samples: u32,
    /// Configured volume baseline; schedules scale relative to
    /// [`BASELINE_VOLUME_SAMPLES`].
    pub volume_samples: u32,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            horizontal_radius: 64,
            surface_samples: BASELINE_SURFACE_SAMPLES,
            volume_samples: BASELINE_VOLUME_SAMPLES,
        }
    }
}

impl SamplingSettings {
    /// Apply the configured baselines to a schedule budget.
    pub fn scale(&self, budget: SampleBudget) -> SampleBudget {
        SampleBudget {
            interval: budget.interval,
            surface: scale_count(budget.surface, self.surface_samples, BASELINE_SURFACE_SAMPLES),
            volume: scale_count(budget.volume, self.volume_samples, BASELINE_VOLUME_SAMPLES),
        }
    }
}

fn scale_count(count: u32, configured: u32, baseline: u32) -> u32 {
    let scaled = u64::from(count)
        .saturating_mul(u64::from(configured))
        .checked_div(u64::from(baseline))
        .unwrap_or(0);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// One `from -> to` block replacement, enabled from `min_phase` on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformRule {
    /// Kind that gets replaced.
    pub from: BlockKind,
    /// Replacement kind.
    pub to: BlockKind,
    /// First phase the rule applies in.
    pub min_phase: u8,
}

impl TransformRule {
    /// Create a rule.
    pub const fn new(from: BlockKind, to: BlockKind, min_phase: u8) -> Self {
        Self { from, to, min_phase }
    }
}

/// Replacement from the first matching enabled rule.
pub fn first_match(rules: &[TransformRule], kind: BlockKind, phase: u8) -> Option<BlockState> {
    rules
        .iter()
        .find(|rule| rule.from == kind && phase >= rule.min_phase)
        .map(|rule| BlockState::of(rule.to))
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// What one engine run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformReport {
    /// Cells examined.
    pub sampled: u32,
    /// Cells rewritten by a rule.
    pub transformed: u32,
    /// Blocks removed by tree collapses.
    pub collapsed: u32,
    /// Item drops produced by collapses.
    pub drops: u32,
}

impl TransformReport {
    /// Add another report's counts into this one.
    pub const fn merge(&mut self, other: Self) {
        self.sampled = self.sampled.saturating_add(other.sampled);
        self.transformed = self.transformed.saturating_add(other.transformed);
        self.collapsed = self.collapsed.saturating_add(other.collapsed);
        self.drops = self.drops.saturating_add(other.drops);
    }

    /// Count one sampled cell.
    pub const fn sample(&mut self) {
        self.sampled = self.sampled.saturating_add(1);
    }

    /// Count one rewritten cell.
    pub const fn transform(&mut self) {
        self.transformed = self.transformed.saturating_add(1);
    }
}

// ---------------------------------------------------------------------------
// Engine context
// ---------------------------------------------------------------------------

/// Everything an engine run reads or writes.
pub struct EngineContext<'a> {
    /// The world being transformed.
    pub world: &'a mut dyn VoxelWorld,
    /// Active heat machines.
    pub registries: &'a SpatialRegistries,
    /// Temperature multipliers.
    pub temperature: &'a TemperatureManager,
    /// This tick's environment.
    pub env: &'a EnvironmentSnapshot,
    /// Positions sampling is centered on, one per eligible player.
    pub anchors: &'a [BlockPos],
    /// Current server tick.
    pub tick: u64,
    /// Radius and baseline counts.
    pub settings: SamplingSettings,
    /// Seeded randomness.
    pub rng: &'a mut SmallRng,
}

impl EngineContext<'_> {
    /// A random column within the sampling square around `anchor`, if loaded.
    pub fn random_column(&mut self, anchor: BlockPos) -> Option<(i32, i32)> {
        let r = self.settings.horizontal_radius.max(0);
        let x = anchor.x.saturating_add(self.rng.random_range(r.saturating_neg()..=r));
        let z = anchor.z.saturating_add(self.rng.random_range(r.saturating_neg()..=r));
        self.world.is_column_loaded(x, z).then_some((x, z))
    }

    /// The top ground cell of a random loaded column around `anchor`.
    pub fn random_surface(&mut self, anchor: BlockPos) -> Option<BlockPos> {
        let (x, z) = self.random_column(anchor)?;
        let y = self.world.surface_y(x, z)?;
        Some(BlockPos::new(x, y, z))
    }

    /// A random loaded cell around `anchor` with y drawn from `min_y..=max_y`.
    pub fn random_volume(&mut self, anchor: BlockPos, min_y: i32, max_y: i32) -> Option<BlockPos> {
        if min_y > max_y {
            return None;
        }
        let (x, z) = self.random_column(anchor)?;
        let y = self.rng.random_range(min_y..=max_y);
        let pos = BlockPos::new(x, y, z);
        self.world.is_loaded(pos).then_some(pos)
    }

    /// Temperature at `pos` under this tick's environment.
    pub fn temperature_at(&self, pos: BlockPos) -> f64 {
        self.temperature
            .temperature_at(&*self.world, self.registries, self.env, pos)
    }

    /// Roll a probability.
    pub fn roll(&mut self, chance: f64) -> bool {
        self.rng.random_bool(chance.clamp(0.0, 1.0))
    }
}

/// A block transformation engine.
pub trait BlockEngine {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Per-phase run interval and sample counts.
    fn schedule(&self) -> SamplingSchedule;

    /// Whether the engine does anything under this environment.
    fn is_active(&self, env: &EnvironmentSnapshot) -> bool;

    /// Sample and transform with the given budget.
    fn run(&self, ctx: &mut EngineContext<'_>, budget: SampleBudget) -> TransformReport;
}

/// Run `engine` if it is active and its interval falls on this tick.
pub fn run_engine(engine: &dyn BlockEngine, ctx: &mut EngineContext<'_>) -> TransformReport {
    if !engine.is_active(ctx.env) {
        return TransformReport::default();
    }
    let Some(budget) = engine.schedule().budget_for(ctx.env.phase) else {
        return TransformReport::default();
    };
    if !on_interval(ctx.tick, budget.interval) || ctx.anchors.is_empty() {
        return TransformReport::default();
    }
    let budget = ctx.settings.scale(budget);
    let report = engine.run(ctx, budget);
    debug!(
        engine = engine.name(),
        tick = ctx.tick,
        sampled = report.sampled,
        transformed = report.transformed,
        collapsed = report.collapsed,
        drops = report.drops,
        "block engine run"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEDULE: SamplingSchedule = SamplingSchedule::new(&[
        (2, SampleBudget::new(20, 24, 12)),
        (5, SampleBudget::new(2, 48, 24)),
    ]);

    #[test]
    fn budget_picks_highest_enabled_entry() {
        assert_eq!(SCHEDULE.budget_for(1), None);
        assert_eq!(SCHEDULE.budget_for(3).map(|b| b.interval), Some(20));
        assert_eq!(SCHEDULE.budget_for(6).map(|b| b.surface), Some(48));
    }

    #[test]
    fn interval_gate() {
        assert!(on_interval(40, 20));
        assert!(!on_interval(41, 20));
        assert!(!on_interval(40, 0));
    }

    #[test]
    fn settings_scale_relative_to_baseline() {
        let settings = SamplingSettings {
            horizontal_radius: 64,
            surface_samples: 12,
            volume_samples: 24,
        };
        let scaled = settings.scale(SampleBudget::new(5, 36, 18));
        assert_eq!(scaled, SampleBudget::new(5, 18, 36));
    }

    #[test]
    fn first_match_respects_min_phase() {
        let rules = [
            TransformRule::new(BlockKind::Water, BlockKind::Ice, 2),
            TransformRule::new(BlockKind::Ice, BlockKind::PackedIce, 4),
        ];
        assert_eq!(first_match(&rules, BlockKind::Ice, 3), None);
        assert_eq!(
            first_match(&rules, BlockKind::Ice, 4).map(|s| s.kind),
            Some(BlockKind::PackedIce)
        );
    }
}
