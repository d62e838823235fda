//! Local temperature at a block position.
//!
//! ```text
//! temperature = surface_offset
//!             + depth_modifier(y) * geo_strength_multiplier
//!             + shelter_bonus
//!             + best_heat * heat_multiplier
//! ```
//!
//! Heat sources never stack: only the single warmest source in range
//! counts. Block sources are found by a cube scan of radius
//! [`HEAT_SCAN_RADIUS`] over loaded cells; heaters and geothermal cores come
//! from the [`SpatialRegistries`] without scanning.

use frostfall_types::{BlockKind, BlockPos, BlockState, EnvironmentSnapshot};

use crate::phase;
use crate::registry::{HEATER_WARMTH, SpatialRegistries};
use crate::voxel::VoxelWorld;

/// Half-width of the cube scanned for block heat sources.
pub const HEAT_SCAN_RADIUS: i32 = 6;

/// Warmth added when a solid block is overhead.
pub const SHELTER_BONUS: f64 = 5.0;

/// How far above the position the shelter check looks.
pub const SHELTER_HEIGHT: i32 = 4;

/// A block that radiates warmth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatSource {
    /// Euclidean reach in blocks.
    pub radius: u32,
    /// Warmth in °C delivered anywhere inside the reach.
    pub warmth: f64,
}

/// Warmth radiated by a block state during `phase`, if it is a heat source.
///
/// Campfires, soul campfires and furnaces only radiate while lit. Torches
/// stop counting after phase 3 and lanterns after phase 4.
pub fn heat_source(state: BlockState, phase: u8) -> Option<HeatSource> {
    let (radius, warmth) = match state.kind {
        BlockKind::Campfire if state.lit => (5, 25.0),
        BlockKind::SoulCampfire if state.lit => (5, 20.0),
        BlockKind::Furnace if state.lit => (3, 15.0),
        BlockKind::Fire => (3, 20.0),
        BlockKind::Lava => (4, 30.0),
        BlockKind::MagmaBlock => (2, 10.0),
        BlockKind::Torch if phase <= 3 => (2, 5.0),
        BlockKind::Lantern if phase <= 4 => (3, 8.0),
        _ => return None,
    };
    Some(HeatSource { radius, warmth })
}

/// Multipliers applied on top of the environment curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureManager {
    /// Scale applied to the depth modifier.
    pub geo_strength_multiplier: f64,
    /// Scale applied to the best heat source.
    pub heat_multiplier: f64,
}

impl Default for TemperatureManager {
    fn default() -> Self {
        Self {
            geo_strength_multiplier: 1.0,
            heat_multiplier: 1.0,
        }
    }
}

impl TemperatureManager {
    /// Create a manager with the given multipliers.
    pub const fn new(geo_strength_multiplier: f64, heat_multiplier: f64) -> Self {
        Self {
            geo_strength_multiplier,
            heat_multiplier,
        }
    }

    /// Temperature at `pos` in °C.
    pub fn temperature_at(
        &self,
        world: &dyn VoxelWorld,
        registries: &SpatialRegistries,
        env: &EnvironmentSnapshot,
        pos: BlockPos,
    ) -> f64 {
        let depth = phase::depth_modifier(pos.y) * self.geo_strength_multiplier;
        let heat = best_heat(world, registries, env.phase, pos) * self.heat_multiplier;
        env.temperature_offset + depth + shelter_bonus(world, pos) + heat
    }
}

/// [`SHELTER_BONUS`] if a solid block sits within [`SHELTER_HEIGHT`]
/// blocks directly above `pos`, else zero.
pub fn shelter_bonus(world: &dyn VoxelWorld, pos: BlockPos) -> f64 {
    let sheltered = (1..=SHELTER_HEIGHT).any(|dy| {
        let above = pos.offset(0, dy, 0);
        world.is_loaded(above) && world.block(above).kind.is_solid()
    });
    if sheltered { SHELTER_BONUS } else { 0.0 }
}

/// Warmth of the single best heat source reaching `pos`, or 0.0.
pub fn best_heat(
    world: &dyn VoxelWorld,
    registries: &SpatialRegistries,
    phase: u8,
    pos: BlockPos,
) -> f64 {
    let mut best: f64 = 0.0;

    if registries.heaters.warms(pos) {
        best = best.max(HEATER_WARMTH);
    }
    if let Some(warmth) = registries.cores.warmth_at(pos) {
        best = best.max(f64::from(warmth));
    }

    for dx in -HEAT_SCAN_RADIUS..=HEAT_SCAN_RADIUS {
        for dy in -HEAT_SCAN_RADIUS..=HEAT_SCAN_RADIUS {
            for dz in -HEAT_SCAN_RADIUS..=HEAT_SCAN_RADIUS {
                let cell = pos.offset(dx, dy, dz);
                if !world.is_loaded(cell) {
                    continue;
                }
                if let Some(source) = heat_source(world.block(cell), phase)
                    && source.warmth > best
                    && cell.within(pos, source.radius)
                {
                    best = source.warmth;
                }
            }
        }
    }
    best
}

/// Whether any heat source at all reaches `pos`.
pub fn is_warmed(
    world: &dyn VoxelWorld,
    registries: &SpatialRegistries,
    phase: u8,
    pos: BlockPos,
) -> bool {
    best_heat(world, registries, phase, pos) > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CoreReach;
    use crate::voxel::ChunkedWorld;

    fn world() -> ChunkedWorld {
        let mut world = ChunkedWorld::default();
        world.load_area(0, 0, 32);
        world
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn env_at(offset: f64, phase: u8) -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            temperature_offset: offset,
            phase,
            ..EnvironmentSnapshot::calm()
        }
    }

    #[test]
    fn two_campfires_do_not_stack() {
        let mut world = world();
        let _ = world.set_block(BlockPos::new(2, 64, 0), BlockState::lit(BlockKind::Campfire));
        let _ = world.set_block(BlockPos::new(-2, 64, 0), BlockState::lit(BlockKind::Campfire));
        let heat = best_heat(&world, &SpatialRegistries::new(), 2, BlockPos::new(0, 64, 0));
        assert!(close(heat, 25.0));
    }

    #[test]
    fn unlit_campfire_gives_no_heat() {
        let mut world = world();
        let _ = world.set_block(BlockPos::new(1, 64, 0), BlockState::of(BlockKind::Campfire));
        assert!(!is_warmed(&world, &SpatialRegistries::new(), 2, BlockPos::new(0, 64, 0)));
    }

    #[test]
    fn torch_stops_counting_after_phase_three() {
        let mut world = world();
        let _ = world.set_block(BlockPos::new(1, 64, 0), BlockState::of(BlockKind::Torch));
        let registries = SpatialRegistries::new();
        let pos = BlockPos::new(0, 64, 0);
        assert!(close(best_heat(&world, &registries, 3, pos), 5.0));
        assert!(close(best_heat(&world, &registries, 4, pos), 0.0));
    }

    #[test]
    fn radius_is_euclidean() {
        let mut world = world();
        let _ = world.set_block(BlockPos::new(2, 64, 2), BlockState::of(BlockKind::MagmaBlock));
        let registries = SpatialRegistries::new();
        assert!(close(best_heat(&world, &registries, 1, BlockPos::new(0, 64, 0)), 0.0));
        assert!(close(best_heat(&world, &registries, 1, BlockPos::new(1, 64, 1)), 10.0));
    }

    #[test]
    fn registry_sources_compete_with_blocks() {
        let mut world = world();
        let _ = world.set_block(BlockPos::new(1, 64, 0), BlockState::of(BlockKind::Lava));
        let mut registries = SpatialRegistries::new();
        registries.heaters.insert(BlockPos::new(0, 64, 7));
        let pos = BlockPos::new(0, 64, 0);
        assert!(close(best_heat(&world, &registries, 5, pos), 40.0));
        registries.cores.upsert(
            BlockPos::new(0, 60, 0),
            CoreReach {
                range_radius: 12,
                warmth: 90,
                o2_radius: 4,
            },
        );
        assert!(close(best_heat(&world, &registries, 5, pos), 90.0));
    }

    #[test]
    fn shelter_requires_solid_within_four() {
        let mut world = world();
        let pos = BlockPos::new(0, 64, 0);
        let _ = world.set_block(pos.offset(0, 5, 0), BlockState::of(BlockKind::Stone));
        assert!(close(shelter_bonus(&world, pos), 0.0));
        let _ = world.set_block(pos.offset(0, 4, 0), BlockState::of(BlockKind::Planks));
        assert!(close(shelter_bonus(&world, pos), SHELTER_BONUS));
    }

    #[test]
    fn temperature_combines_terms() {
        let mut world = world();
        let pos = BlockPos::new(0, 64, 0);
        let _ = world.set_block(pos.offset(0, 2, 0), BlockState::of(BlockKind::Stone));
        let _ = world.set_block(pos.offset(3, 0, 0), BlockState::of(BlockKind::Fire));
        let manager = TemperatureManager::new(1.0, 0.5);
        let temp = manager.temperature_at(&world, &SpatialRegistries::new(), &env_at(-35.0, 4), pos);
        // -35 + depth(64) 0 + shelter 5 + fire 20 * 0.5
        assert!(close(temp, -20.0));
    }

    #[test]
    fn deep_positions_are_warm() {
        let world = world();
        let manager = TemperatureManager::default();
        let temp = manager.temperature_at(
            &world,
            &SpatialRegistries::new(),
            &env_at(-90.0, 5),
            BlockPos::new(0, -64, 0),
        );
        assert!(close(temp, -10.0));
    }
}
