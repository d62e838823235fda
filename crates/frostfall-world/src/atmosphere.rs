//! Frozen atmosphere formation during the collapse phase.
//!
//! In phase 6 the air itself freezes out. Samples land on air cells up to
//! [`FORMATION_HEIGHT`] blocks above the surface; cold enough cells may
//! solidify, more often as the collapse deepens.

use frostfall_types::{BlockKind, BlockState, EnvironmentSnapshot};
use rand::Rng;

use crate::sampling::{BlockEngine, EngineContext, SampleBudget, SamplingSchedule, TransformReport};

const SCHEDULE: SamplingSchedule = SamplingSchedule::new(&[(6, SampleBudget::new(10, 0, 16))]);

/// Highest offset above the surface a sample may land.
pub const FORMATION_HEIGHT: i32 = 16;

/// Temperature at or below which air can freeze, in °C.
pub const FORMATION_TEMPERATURE: f64 = -100.0;

/// Formation chance per qualifying sample by collapse sub-stage.
pub fn formation_chance(sub_stage: u8) -> f64 {
    match sub_stage {
        0 => 0.0,
        1 => 0.02,
        2 => 0.05,
        _ => 0.15,
    }
}

/// The frozen atmosphere engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrozenAtmosphereFormation;

impl BlockEngine for FrozenAtmosphereFormation {
    fn name(&self) -> &'static str {
        "atmosphere"
    }

    fn schedule(&self) -> SamplingSchedule {
        SCHEDULE
    }

    fn is_active(&self, env: &EnvironmentSnapshot) -> bool {
        env.phase >= 6
    }

    fn run(&self, ctx: &mut EngineContext<'_>, budget: SampleBudget) -> TransformReport {
        let mut report = TransformReport::default();
        let chance = formation_chance(ctx.env.sub_stage);
        let anchors = ctx.anchors;

        for anchor in anchors {
            for _ in 0..budget.volume {
                let Some((x, z)) = ctx.random_column(*anchor) else {
                    continue;
                };
                let Some(surface) = ctx.world.surface_y(x, z) else {
                    continue;
                };
                let high = surface.saturating_add(FORMATION_HEIGHT).min(ctx.world.max_y());
                if surface > high {
                    continue;
                }
                let pos = frostfall_types::BlockPos::new(x, ctx.rng.random_range(surface..=high), z);
                if !ctx.world.is_loaded(pos) {
                    continue;
                }
                report.sample();
                if !ctx.world.block(pos).kind.is_air() {
                    continue;
                }
                if ctx.temperature_at(pos) > FORMATION_TEMPERATURE || !ctx.roll(chance) {
                    continue;
                }
                if ctx
                    .world
                    .set_block(pos, BlockState::of(BlockKind::FrozenAtmosphere))
                    .is_ok()
                {
                    report.transform();
                }
            }
        }
        report
    }
}
