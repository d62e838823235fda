//! Snow accumulation and melting.
//!
//! Runs from phase 1 once weather is locked to snow, and from phase 2 in
//! any case. Each surface sample either starts a new snow layer on a solid
//! block, thickens an existing layer up to the phase maximum, compacts a
//! full eight-layer cell into a snow block, or melts one layer when any
//! heat source reaches it.

use frostfall_types::{BlockKind, BlockPos, BlockState, EnvironmentSnapshot, MAX_SNOW_LAYERS};

use crate::sampling::{BlockEngine, EngineContext, SampleBudget, SamplingSchedule, TransformReport};
use crate::temperature;

const SCHEDULE: SamplingSchedule = SamplingSchedule::new(&[
    (1, SampleBudget::new(40, 8, 0)),
    (2, SampleBudget::new(20, 16, 0)),
    (3, SampleBudget::new(10, 24, 0)),
    (4, SampleBudget::new(5, 32, 0)),
    (5, SampleBudget::new(2, 48, 0)),
]);

/// Maximum snow layers per phase 1 through 6.
pub const MAX_LAYERS_BY_PHASE: [u8; 6] = [1, 2, 4, 6, 8, 8];

/// Maximum snow layers in `phase`; zero before phase 1.
pub fn max_layers(phase: u8) -> u8 {
    usize::from(phase)
        .checked_sub(1)
        .and_then(|index| MAX_LAYERS_BY_PHASE.get(index).copied())
        .unwrap_or_else(|| if phase == 0 { 0 } else { MAX_SNOW_LAYERS })
}

/// What happened to one sampled cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnowChange {
    /// A first layer was placed on a solid block.
    Placed,
    /// A layer was added.
    Thickened,
    /// A full layer stack became a snow block.
    Compacted,
    /// One layer melted.
    Melted,
    /// Nothing changed.
    Unchanged,
}

/// The snow accumulator engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnowAccumulator;

impl SnowAccumulator {
    /// Apply snow rules to the top ground cell at `top`.
    pub fn apply(ctx: &mut EngineContext<'_>, top: BlockPos) -> SnowChange {
        let phase = ctx.env.phase;
        let max = max_layers(phase);
        let state = ctx.world.block(top);

        if state.kind == BlockKind::SnowLayer {
            if temperature::is_warmed(&*ctx.world, ctx.registries, phase, top) {
                let next = if state.layers <= 1 {
                    BlockState::AIR
                } else {
                    BlockState::snow(state.layers.saturating_sub(1))
                };
                return write(ctx, top, next, SnowChange::Melted);
            }
            if state.layers >= MAX_SNOW_LAYERS {
                return write(ctx, top, BlockState::of(BlockKind::SnowBlock), SnowChange::Compacted);
            }
            if state.layers < max {
                let next = BlockState::snow(state.layers.saturating_add(1));
                return write(ctx, top, next, SnowChange::Thickened);
            }
            return SnowChange::Unchanged;
        }

        let above = top.above();
        if max > 0
            && state.kind.is_solid()
            && ctx.world.is_loaded(above)
            && ctx.world.block(above).kind.is_air()
            && !temperature::is_warmed(&*ctx.world, ctx.registries, phase, above)
        {
            return write(ctx, above, BlockState::snow(1), SnowChange::Placed);
        }
        SnowChange::Unchanged
    }
}

fn write(ctx: &mut EngineContext<'_>, pos: BlockPos, state: BlockState, change: SnowChange) -> SnowChange {
    if ctx.world.set_block(pos, state).is_ok() {
        change
    } else {
        SnowChange::Unchanged
    }
}

impl BlockEngine for SnowAccumulator {
    fn name(&self) -> &'static str {
        "snow"
    }

    fn schedule(&self) -> SamplingSchedule {
        SCHEDULE
    }

    fn is_active(&self, env: &EnvironmentSnapshot) -> bool {
        (env.phase >= 1 && env.weather_locked) || env.phase >= 2
    }

    fn run(&self, ctx: &mut EngineContext<'_>, budget: SampleBudget) -> TransformReport {
        let mut report = TransformReport::default();
        let anchors = ctx.anchors;
        for anchor in anchors {
            for _ in 0..budget.surface {
                let Some(top) = ctx.random_surface(*anchor) else {
                    continue;
                };
                report.sample();
                if Self::apply(ctx, top) != SnowChange::Unchanged {
                    report.transform();
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::registry::SpatialRegistries;
    use crate::sampling::SamplingSettings;
    use crate::temperature::TemperatureManager;
    use crate::voxel::{ChunkedWorld, VoxelWorld};

    fn apply_at(world: &mut ChunkedWorld, registries: &SpatialRegistries, phase: u8, top: BlockPos) -> SnowChange {
        let env = EnvironmentSnapshot {
            phase,
            ..EnvironmentSnapshot::calm()
        };
        let temperature = TemperatureManager::default();
        let mut rng = SmallRng::seed_from_u64(0);
        let mut ctx = EngineContext {
            world,
            registries,
            temperature: &temperature,
            env: &env,
            anchors: &[],
            tick: 0,
            settings: SamplingSettings::default(),
            rng: &mut rng,
        };
        SnowAccumulator::apply(&mut ctx, top)
    }

    fn world() -> ChunkedWorld {
        let mut world = ChunkedWorld::new(-8, 32);
        world.load_area(0, 0, 16);
        let _ = world.set_block(BlockPos::new(0, 0, 0), BlockState::of(BlockKind::Stone));
        world
    }

    #[test]
    fn max_layers_table() {
        assert_eq!(max_layers(0), 0);
        assert_eq!(max_layers(1), 1);
        assert_eq!(max_layers(3), 4);
        assert_eq!(max_layers(6), 8);
    }

    #[test]
    fn places_then_caps_at_phase_maximum() {
        let mut world = world();
        let registries = SpatialRegistries::new();
        let ground = BlockPos::new(0, 0, 0);
        assert_eq!(apply_at(&mut world, &registries, 2, ground), SnowChange::Placed);
        let snow = ground.above();
        assert_eq!(apply_at(&mut world, &registries, 2, snow), SnowChange::Thickened);
        assert_eq!(world.block(snow).layers, 2);
        assert_eq!(apply_at(&mut world, &registries, 2, snow), SnowChange::Unchanged);
    }

    #[test]
    fn full_stack_compacts() {
        let mut world = world();
        let snow = BlockPos::new(0, 1, 0);
        let _ = world.set_block(snow, BlockState::snow(MAX_SNOW_LAYERS));
        assert_eq!(
            apply_at(&mut world, &SpatialRegistries::new(), 5, snow),
            SnowChange::Compacted
        );
        assert_eq!(world.block(snow).kind, BlockKind::SnowBlock);
    }

    #[test]
    fn heat_melts_one_layer_at_a_time() {
        let mut world = world();
        let snow = BlockPos::new(0, 1, 0);
        let _ = world.set_block(snow, BlockState::snow(2));
        let _ = world.set_block(BlockPos::new(2, 1, 0), BlockState::lit(BlockKind::Campfire));
        let registries = SpatialRegistries::new();
        assert_eq!(apply_at(&mut world, &registries, 5, snow), SnowChange::Melted);
        assert_eq!(world.block(snow).layers, 1);
        assert_eq!(apply_at(&mut world, &registries, 5, snow), SnowChange::Melted);
        assert!(world.block(snow).kind.is_air());
    }

    #[test]
    fn inactive_in_phase_one_without_lock() {
        let env = EnvironmentSnapshot {
            phase: 1,
            weather_locked: false,
            ..EnvironmentSnapshot::calm()
        };
        assert!(!SnowAccumulator.is_active(&env));
        let locked = EnvironmentSnapshot {
            weather_locked: true,
            ..env
        };
        assert!(SnowAccumulator.is_active(&locked));
    }
}
