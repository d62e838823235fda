//! Freezes water, soil and ice as the world cools.
//!
//! Active from phase 2. Each run samples surface cells (the top ground
//! block of a column) and volume cells (uniform y over the build range)
//! around every player and applies the first enabled rule.

use frostfall_types::{BlockKind, EnvironmentSnapshot};

use crate::sampling::{
    BlockEngine, EngineContext, SampleBudget, SamplingSchedule, TransformReport, TransformRule,
    first_match,
};

const SCHEDULE: SamplingSchedule = SamplingSchedule::new(&[
    (2, SampleBudget::new(20, 24, 12)),
    (3, SampleBudget::new(10, 24, 12)),
    (4, SampleBudget::new(5, 36, 18)),
    (5, SampleBudget::new(2, 48, 24)),
]);

/// Rules for the top ground cell.
pub const SURFACE_RULES: [TransformRule; 8] = [
    TransformRule::new(BlockKind::Water, BlockKind::Ice, 2),
    TransformRule::new(BlockKind::Farmland, BlockKind::FrozenDirt, 2),
    TransformRule::new(BlockKind::GrassBlock, BlockKind::FrozenDirt, 3),
    TransformRule::new(BlockKind::Dirt, BlockKind::FrozenDirt, 3),
    TransformRule::new(BlockKind::Ice, BlockKind::PackedIce, 4),
    TransformRule::new(BlockKind::Lava, BlockKind::Obsidian, 5),
    TransformRule::new(BlockKind::PackedIce, BlockKind::BlueIce, 5),
    TransformRule::new(BlockKind::FrozenDirt, BlockKind::Permafrost, 5),
];

/// Rules for cells anywhere in the build range.
pub const VOLUME_RULES: [TransformRule; 2] = [
    TransformRule::new(BlockKind::Water, BlockKind::Ice, 4),
    TransformRule::new(BlockKind::Ice, BlockKind::PackedIce, 5),
];

/// The block freezer engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFreezer;

impl BlockEngine for BlockFreezer {
    fn name(&self) -> &'static str {
        "freezer"
    }

    fn schedule(&self) -> SamplingSchedule {
        SCHEDULE
    }

    fn is_active(&self, env: &EnvironmentSnapshot) -> bool {
        env.phase >= 2
    }

    fn run(&self, ctx: &mut EngineContext<'_>, budget: SampleBudget) -> TransformReport {
        let mut report = TransformReport::default();
        let phase = ctx.env.phase;
        let (min_y, max_y) = (ctx.world.min_y(), ctx.world.max_y());
        let anchors = ctx.anchors;

        for anchor in anchors {
            for _ in 0..budget.surface {
                let Some(pos) = ctx.random_surface(*anchor) else {
                    continue;
                };
                report.sample();
                if let Some(next) = first_match(&SURFACE_RULES, ctx.world.block(pos).kind, phase)
                    && ctx.world.set_block(pos, next).is_ok()
                {
                    report.transform();
                }
            }
            for _ in 0..budget.volume {
                let Some(pos) = ctx.random_volume(*anchor, min_y, max_y) else {
                    continue;
                };
                report.sample();
                if let Some(next) = first_match(&VOLUME_RULES, ctx.world.block(pos).kind, phase)
                    && ctx.world.set_block(pos, next).is_ok()
                {
                    report.transform();
                }
            }
        }
        report
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use frostfall_types::{BlockPos, BlockState};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::registry::SpatialRegistries;
    use crate::sampling::{SamplingSettings, run_engine};
    use crate::temperature::TemperatureManager;
    use crate::voxel::{ChunkedWorld, VoxelWorld};

    fn flat_world(top: BlockKind) -> ChunkedWorld {
        let mut world = ChunkedWorld::new(-8, 32);
        world.load_area(0, 0, 4);
        world.fill(BlockPos::new(-4, 0, -4), BlockPos::new(4, 0, 4), BlockState::of(top));
        world
    }

    fn run(world: &mut ChunkedWorld, phase: u8, tick: u64, seed: u64) -> TransformReport {
        let env = EnvironmentSnapshot {
            phase,
            ..EnvironmentSnapshot::calm()
        };
        let registries = SpatialRegistries::new();
        let temperature = TemperatureManager::default();
        let anchors = [BlockPos::new(0, 1, 0)];
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut ctx = EngineContext {
            world,
            registries: &registries,
            temperature: &temperature,
            env: &env,
            anchors: &anchors,
            tick,
            settings: SamplingSettings {
                horizontal_radius: 4,
                ..SamplingSettings::default()
            },
            rng: &mut rng,
        };
        run_engine(&BlockFreezer, &mut ctx)
    }

    #[test]
    fn inactive_before_phase_two() {
        let mut world = flat_world(BlockKind::Water);
        let report = run(&mut world, 1, 0, 1);
        assert_eq!(report, TransformReport::default());
    }

    #[test]
    fn surface_water_freezes_in_phase_two() {
        let mut world = flat_world(BlockKind::Water);
        let mut total = 0;
        for step in 0..20_u64 {
            total += run(&mut world, 2, step * 20, step).transformed;
        }
        assert!(total > 0);
        assert!(world.count_kind(BlockKind::Ice) > 0);
    }

    #[test]
    fn off_interval_ticks_do_nothing() {
        let mut world = flat_world(BlockKind::Water);
        assert_eq!(run(&mut world, 2, 7, 3).sampled, 0);
    }

    #[test]
    fn grass_waits_for_phase_three() {
        let mut world = flat_world(BlockKind::GrassBlock);
        for step in 0..10_u64 {
            run(&mut world, 2, step * 20, step);
        }
        assert_eq!(world.count_kind(BlockKind::FrozenDirt), 0);
        for step in 0..10_u64 {
            run(&mut world, 3, step * 10, step);
        }
        assert!(world.count_kind(BlockKind::FrozenDirt) > 0);
    }

    #[test]
    fn sampling_never_touches_unloaded_chunks() {
        let mut world = ChunkedWorld::new(-8, 32);
        world.load_chunk(frostfall_types::ChunkPos::new(0, 0));
        world.fill(BlockPos::new(0, 0, 0), BlockPos::new(15, 0, 15), BlockState::of(BlockKind::Water));
        world.load_chunk(frostfall_types::ChunkPos::new(-1, 0));
        world.fill(BlockPos::new(-16, 0, 0), BlockPos::new(-1, 0, 15), BlockState::of(BlockKind::Water));
        world.unload_chunk(frostfall_types::ChunkPos::new(-1, 0));

        for step in 0..50_u64 {
            run(&mut world, 5, step * 2, step);
        }
        world.load_chunk(frostfall_types::ChunkPos::new(-1, 0));
        for x in -16..0 {
            for z in 0..16 {
                assert_eq!(world.block(BlockPos::new(x, 0, z)).kind, BlockKind::Water);
            }
        }
    }
}
