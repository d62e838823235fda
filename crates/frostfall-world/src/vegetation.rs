//! Kills and freezes plant life, and topples dead trees.
//!
//! Active from phase 2. Surface samples wither plants and grass; column
//! samples (from the surface down [`COLUMN_DEPTH`] blocks) kill and freeze
//! trunks. From phase 5, a sampled dead or frozen trunk may trigger a
//! collapse: a breadth-first sweep through connected dead timber that
//! removes at most [`COLLAPSE_BUDGET`] blocks.

use std::collections::{BTreeSet, VecDeque};

use frostfall_types::{BlockKind, BlockPos, BlockState, EnvironmentSnapshot};

use crate::sampling::{
    BlockEngine, EngineContext, SampleBudget, SamplingSchedule, TransformReport, TransformRule,
    first_match,
};
use crate::voxel::VoxelWorld;

const SCHEDULE: SamplingSchedule = SamplingSchedule::new(&[
    (2, SampleBudget::new(20, 16, 8)),
    (3, SampleBudget::new(10, 24, 12)),
    (5, SampleBudget::new(5, 32, 16)),
]);

/// How far below the surface column samples reach.
pub const COLUMN_DEPTH: i32 = 12;

/// Maximum blocks a single collapse removes.
pub const COLLAPSE_BUDGET: u32 = 64;

/// Chance that a sampled dead trunk collapses from phase 5 on.
pub const COLLAPSE_CHANCE: f64 = 0.1;

/// First phase in which trees collapse.
pub const COLLAPSE_PHASE: u8 = 5;

/// Rules for the top ground cell.
pub const SURFACE_RULES: [TransformRule; 7] = [
    TransformRule::new(BlockKind::ShortGrass, BlockKind::DeadBush, 2),
    TransformRule::new(BlockKind::Fern, BlockKind::DeadBush, 2),
    TransformRule::new(BlockKind::Flower, BlockKind::DeadBush, 2),
    TransformRule::new(BlockKind::Crops, BlockKind::Air, 2),
    TransformRule::new(BlockKind::OakLeaves, BlockKind::DeadLeaves, 2),
    TransformRule::new(BlockKind::GrassBlock, BlockKind::Dirt, 2),
    TransformRule::new(BlockKind::DeadLeaves, BlockKind::FrozenLeaves, 4),
];

/// Rules for trunk cells inside the sampled column.
pub const COLUMN_RULES: [TransformRule; 2] = [
    TransformRule::new(BlockKind::OakLog, BlockKind::DeadLog, 3),
    TransformRule::new(BlockKind::DeadLog, BlockKind::FrozenLog, 4),
];

/// Blocks and drops removed by one collapse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollapseOutcome {
    /// Blocks removed.
    pub removed: u32,
    /// Item drops produced.
    pub drops: u32,
}

/// Remove connected dead timber starting at `origin`.
///
/// Six-connected breadth-first search with a visited set. Stops after
/// [`COLLAPSE_BUDGET`] removals. Unloaded cells are never visited.
pub fn collapse(world: &mut dyn VoxelWorld, origin: BlockPos) -> CollapseOutcome {
    let mut outcome = CollapseOutcome::default();
    let mut visited = BTreeSet::from([origin]);
    let mut queue = VecDeque::from([origin]);

    while let Some(pos) = queue.pop_front() {
        if outcome.removed >= COLLAPSE_BUDGET {
            break;
        }
        if !world.is_loaded(pos) {
            continue;
        }
        let kind = world.block(pos).kind;
        if !kind.is_dead_timber() {
            continue;
        }
        if world.set_block(pos, BlockState::AIR).is_err() {
            continue;
        }
        outcome.removed = outcome.removed.saturating_add(1);
        if kind.drop_item().is_some() {
            outcome.drops = outcome.drops.saturating_add(1);
        }
        for next in pos.neighbors() {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    outcome
}

/// The vegetation decay engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct VegetationDecay;

impl BlockEngine for VegetationDecay {
    fn name(&self) -> &'static str {
        "vegetation"
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
                let Some((x, z)) = ctx.random_column(*anchor) else {
                    continue;
                };
                let Some(top) = ctx.world.surface_y(x, z) else {
                    continue;
                };
                let Some(pos) = ctx.random_volume_in_column(x, z, top) else {
                    continue;
                };
                report.sample();
                let kind = ctx.world.block(pos).kind;

                if phase >= COLLAPSE_PHASE && kind.is_dead_log() && ctx.roll(COLLAPSE_CHANCE) {
                    let outcome = collapse(&mut *ctx.world, pos);
                    report.collapsed = report.collapsed.saturating_add(outcome.removed);
                    report.drops = report.drops.saturating_add(outcome.drops);
                    continue;
                }
                if let Some(next) = first_match(&COLUMN_RULES, kind, phase)
                    && ctx.world.set_block(pos, next).is_ok()
                {
                    report.transform();
                }
            }
        }
        report
    }
}

impl EngineContext<'_> {
    /// A loaded cell in column `(x, z)` between `top - COLUMN_DEPTH` and `top`.
    fn random_volume_in_column(&mut self, x: i32, z: i32, top: i32) -> Option<BlockPos> {
        use rand::Rng;

        let low = top.saturating_sub(COLUMN_DEPTH).max(self.world.min_y());
        if low > top {
            return None;
        }
        let pos = BlockPos::new(x, self.rng.random_range(low..=top), z);
        self.world.is_loaded(pos).then_some(pos)
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::registry::SpatialRegistries;
    use crate::sampling::{SamplingSettings, run_engine};
    use crate::temperature::TemperatureManager;
    use crate::voxel::ChunkedWorld;

    fn world() -> ChunkedWorld {
        let mut world = ChunkedWorld::new(-16, 64);
        world.load_area(0, 0, 20);
        world
    }

    fn run(world: &mut ChunkedWorld, phase: u8, tick: u64, seed: u64, radius: i32) -> TransformReport {
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
                horizontal_radius: radius,
                ..SamplingSettings::default()
            },
            rng: &mut rng,
        };
        run_engine(&VegetationDecay, &mut ctx)
    }

    #[test]
    fn collapse_terminates_within_budget_on_connected_cube() {
        let mut world = world();
        let placed = world.fill(
            BlockPos::new(0, 0, 0),
            BlockPos::new(9, 9, 9),
            BlockState::of(BlockKind::DeadLog),
        );
        assert_eq!(placed, 1000);
        let outcome = collapse(&mut world, BlockPos::new(5, 5, 5));
        assert_eq!(outcome.removed, COLLAPSE_BUDGET);
        assert_eq!(world.count_kind(BlockKind::DeadLog), 1000 - 64);
    }

    #[test]
    fn collapse_only_takes_dead_timber() {
        let mut world = world();
        let _ = world.set_block(BlockPos::new(0, 0, 0), BlockState::of(BlockKind::FrozenLog));
        let _ = world.set_block(BlockPos::new(0, 1, 0), BlockState::of(BlockKind::DeadLeaves));
        let _ = world.set_block(BlockPos::new(0, 2, 0), BlockState::of(BlockKind::OakLog));
        let _ = world.set_block(BlockPos::new(1, 0, 0), BlockState::of(BlockKind::Stone));
        let outcome = collapse(&mut world, BlockPos::new(0, 0, 0));
        assert_eq!(outcome, CollapseOutcome { removed: 2, drops: 2 });
        assert_eq!(world.block(BlockPos::new(0, 2, 0)).kind, BlockKind::OakLog);
        assert_eq!(world.block(BlockPos::new(1, 0, 0)).kind, BlockKind::Stone);
    }

    #[test]
    fn surface_plants_wither_in_phase_two() {
        let mut world = world();
        world.fill(BlockPos::new(-2, 0, -2), BlockPos::new(2, 0, 2), BlockState::of(BlockKind::Dirt));
        world.fill(
            BlockPos::new(-2, 1, -2),
            BlockPos::new(2, 1, 2),
            BlockState::of(BlockKind::ShortGrass),
        );
        for step in 0..20_u64 {
            run(&mut world, 2, step * 20, step, 2);
        }
        assert!(world.count_kind(BlockKind::DeadBush) > 0);
    }

    #[test]
    fn dead_trees_collapse_in_phase_five() {
        let mut world = world();
        world.fill(
            BlockPos::new(0, 0, 0),
            BlockPos::new(0, 6, 0),
            BlockState::of(BlockKind::DeadLog),
        );
        let mut collapsed = 0;
        for step in 0..400_u64 {
            collapsed += run(&mut world, 5, step * 5, step, 0).collapsed;
            if world.count_kind(BlockKind::DeadLog) + world.count_kind(BlockKind::FrozenLog) == 0 {
                break;
            }
        }
        assert!(collapsed > 0);
    }
}
