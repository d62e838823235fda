//! Acheronite crystal growth on frozen surfaces.
//!
//! Once the main timeline passes 60% progress (and throughout the
//! collapse), exposed ice and stone surfaces that are cold enough may grow
//! an acheronite cluster on top.

use frostfall_types::{BlockKind, BlockState, EnvironmentSnapshot};

use crate::sampling::{BlockEngine, EngineContext, SampleBudget, SamplingSchedule, TransformReport};

const SCHEDULE: SamplingSchedule = SamplingSchedule::new(&[
    (4, SampleBudget::new(20, 8, 0)),
    (5, SampleBudget::new(10, 12, 0)),
    (6, SampleBudget::new(5, 16, 0)),
]);

/// Main timeline progress at which growth begins.
pub const GROWTH_PROGRESS: f64 = 0.6;

/// Temperature at or below which the air cell must sit, in °C.
pub const GROWTH_TEMPERATURE: f64 = -45.0;

/// Growth chance per qualifying sample by phase.
pub fn growth_chance(phase: u8) -> f64 {
    match phase {
        0..=3 => 0.0,
        4 => 0.02,
        5 => 0.05,
        _ => 0.1,
    }
}

/// Whether a cluster can sit on `kind`.
pub const fn is_growth_base(kind: BlockKind) -> bool {
    matches!(
        kind,
        BlockKind::Ice | BlockKind::PackedIce | BlockKind::BlueIce | BlockKind::Stone
    )
}

/// The acheronite growth engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcheroniteGrowth;

impl BlockEngine for AcheroniteGrowth {
    fn name(&self) -> &'static str {
        "acheronite"
    }

    fn schedule(&self) -> SamplingSchedule {
        SCHEDULE
    }

    fn is_active(&self, env: &EnvironmentSnapshot) -> bool {
        env.progress >= GROWTH_PROGRESS || env.phase >= 6
    }

    fn run(&self, ctx: &mut EngineContext<'_>, budget: SampleBudget) -> TransformReport {
        let mut report = TransformReport::default();
        let chance = growth_chance(ctx.env.phase);
        let anchors = ctx.anchors;

        for anchor in anchors {
            for _ in 0..budget.surface {
                let Some(top) = ctx.random_surface(*anchor) else {
                    continue;
                };
                report.sample();
                let air = top.above();
                if !is_growth_base(ctx.world.block(top).kind)
                    || !ctx.world.is_loaded(air)
                    || !ctx.world.block(air).kind.is_air()
                {
                    continue;
                }
                if ctx.temperature_at(air) > GROWTH_TEMPERATURE || !ctx.roll(chance) {
                    continue;
                }
                if ctx
                    .world
                    .set_block(air, BlockState::of(BlockKind::AcheroniteCluster))
                    .is_ok()
                {
                    report.transform();
                }
            }
        }
        report
    }
}
