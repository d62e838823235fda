//! Demo world and player spawner.
//!
//! At startup the engine has no host world to attach to, so the spawner
//! builds one: layered terrain with a pond, trees, a crop patch and grass,
//! a small camp with a lit campfire and a thermal heater, a geothermal core
//! deep underground, and a buried transponder with a power cell and an open
//! shaft to the sky. Players get a starter kit and spread around the camp;
//! passive and hostile mobs are scattered across the loaded area.

use frostfall_core::tick::SimulationState;
use frostfall_core::SimulationConfig;
use frostfall_survival::{MobState, PlayerState};
use frostfall_types::{
    ArmorTier, BlockKind, BlockPos, BlockState, ItemKind, ItemStack, MobId, MobKind, PlayerId,
};
use frostfall_world::ChunkedWorld;
use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Configuration for the demo world, loaded from the `demo` section of
/// `frostfall-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DemoConfig {
    /// Names of the players that join at startup.
    #[serde(default = "default_players")]
    pub players: Vec<String>,

    /// Number of mobs to scatter.
    #[serde(default = "default_mobs")]
    pub mobs: u32,

    /// Half-width of the loaded area in blocks.
    #[serde(default = "default_radius")]
    pub radius: i32,

    /// Whether the first player starts with the transponder schematic.
    #[serde(default = "default_unlock_first")]
    pub unlock_first_player: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            players: default_players(),
            mobs: default_mobs(),
            radius: default_radius(),
            unlock_first_player: default_unlock_first(),
        }
    }
}

fn default_players() -> Vec<String> {
    vec![
        String::from("Rook"),
        String::from("Wren"),
        String::from("Kestrel"),
    ]
}

const fn default_mobs() -> u32 {
    8
}

const fn default_radius() -> i32 {
    48
}

const fn default_unlock_first() -> bool {
    true
}

// -----------------------------------------------------------------------
// Layout
// -----------------------------------------------------------------------

/// Top of the grass layer.
const SURFACE_Y: i32 = 63;
/// Where the camp sits.
const CAMP: BlockPos = BlockPos::new(0, SURFACE_Y + 1, 0);
/// Buried transponder.
const TRANSPONDER: BlockPos = BlockPos::new(12, -8, 12);
/// Geothermal core.
const CORE: BlockPos = BlockPos::new(-10, -24, -10);

/// What the spawner put into the world.
#[derive(Debug)]
pub struct SpawnResult {
    /// Players that joined, in config order.
    pub players: Vec<PlayerId>,
    /// Mobs scattered.
    pub mobs: u32,
}

/// Build the demo terrain.
pub fn build_world(config: &SimulationConfig, demo: &DemoConfig, rng: &mut impl Rng) -> Result<ChunkedWorld, EngineError> {
    let (min_y, max_y) = (config.world.min_y, config.world.max_y);
    if min_y >= 0 || max_y <= SURFACE_Y.saturating_add(8) {
        return Err(EngineError::Spawner {
            message: format!("demo terrain needs min_y below 0 and max_y above {}", SURFACE_Y + 8),
        });
    }
    let r = demo.radius.max(16);
    let mut world = ChunkedWorld::new(min_y, max_y);
    world.load_area(0, 0, r);

    let corner = |y: i32| BlockPos::new(r.saturating_neg(), y, r.saturating_neg());
    let far = |y: i32| BlockPos::new(r, y, r);
    world.fill(corner(min_y), far(min_y), BlockState::of(BlockKind::Bedrock));
    world.fill(corner(min_y.saturating_add(1)), far(-1), BlockState::of(BlockKind::Deepslate));
    world.fill(corner(0), far(SURFACE_Y - 4), BlockState::of(BlockKind::Stone));
    world.fill(corner(SURFACE_Y - 3), far(SURFACE_Y - 1), BlockState::of(BlockKind::Dirt));
    world.fill(corner(SURFACE_Y), far(SURFACE_Y), BlockState::of(BlockKind::GrassBlock));

    // Pond.
    world.fill(
        BlockPos::new(-20, SURFACE_Y - 2, 8),
        BlockPos::new(-12, SURFACE_Y, 14),
        BlockState::of(BlockKind::Water),
    );

    // Crop patch.
    world.fill(
        BlockPos::new(6, SURFACE_Y, -12),
        BlockPos::new(12, SURFACE_Y, -6),
        BlockState::of(BlockKind::Farmland),
    );
    world.fill(
        BlockPos::new(6, SURFACE_Y + 1, -12),
        BlockPos::new(12, SURFACE_Y + 1, -6),
        BlockState::of(BlockKind::Crops),
    );

    let inner = r.saturating_sub(3);
    let mut trees: u32 = 0;
    for _ in 0..24 {
        let x = rng.random_range(inner.saturating_neg()..=inner);
        let z = rng.random_range(inner.saturating_neg()..=inner);
        if x.abs() < 8 && z.abs() < 8 {
            continue;
        }
        plant_tree(&mut world, x, z);
        trees = trees.saturating_add(1);
    }

    let mut plants: u32 = 0;
    for _ in 0..160 {
        let pos = BlockPos::new(
            rng.random_range(r.saturating_neg()..=r),
            SURFACE_Y + 1,
            rng.random_range(r.saturating_neg()..=r),
        );
        let kind = match rng.random_range(0..10) {
            0 => BlockKind::Flower,
            1 | 2 => BlockKind::Fern,
            _ => BlockKind::ShortGrass,
        };
        if world.fill(pos, pos, BlockState::of(kind)) > 0 {
            plants = plants.saturating_add(1);
        }
    }

    // Camp.
    world.fill(CAMP.offset(3, 0, 3), CAMP.offset(3, 0, 3), BlockState::lit(BlockKind::Campfire));
    world.fill(CAMP.offset(-3, 0, 3), CAMP.offset(-3, 0, 3), BlockState::lit(BlockKind::Lantern));

    // Transponder shaft, open to the build limit.
    world.fill(
        TRANSPONDER.offset(0, 1, 0),
        BlockPos::new(TRANSPONDER.x, max_y, TRANSPONDER.z),
        BlockState::AIR,
    );

    info!(radius = r, trees, plants, "demo terrain built");
    Ok(world)
}

fn plant_tree(world: &mut ChunkedWorld, x: i32, z: i32) {
    let base = BlockPos::new(x, SURFACE_Y + 1, z);
    world.fill(base.offset(-2, 3, -2), base.offset(2, 5, 2), BlockState::of(BlockKind::OakLeaves));
    world.fill(base, base.offset(0, 4, 0), BlockState::of(BlockKind::OakLog));
}

/// Place the camp machines, players and mobs into `state`.
pub fn populate(state: &mut SimulationState, demo: &DemoConfig, rng: &mut impl Rng) -> Result<SpawnResult, EngineError> {
    place_machines(state)?;
    let players = spawn_players(state, demo)?;
    let mobs = spawn_mobs(state, demo, rng);
    info!(players = players.len(), mobs, machines = state.machines.len(), "demo world populated");
    Ok(SpawnResult { players, mobs })
}

fn place_machines(state: &mut SimulationState) -> Result<(), EngineError> {
    // A restored save already carries its machines.
    if !state.machines.is_empty() {
        return Ok(());
    }
    let heater = CAMP.offset(0, 0, 3);
    state.place_block(heater, BlockState::of(BlockKind::ThermalHeater))?;
    if let Some(frostfall_world::Machine::Heater(h)) = state.machines.get_mut(heater) {
        match h.insert_fuel(ItemStack::new(ItemKind::Coal, 32)) {
            Ok(None) => {}
            Ok(Some(leftover)) => {
                warn!(pos = %heater, item = ?leftover.kind, count = leftover.count, "heater fuel did not fit");
            }
            Err(rejected) => warn!(pos = %heater, item = ?rejected.kind, "heater refused starter fuel"),
        }
    }
    state.place_block(CORE, BlockState::of(BlockKind::GeothermalCore))?;
    state.place_block(TRANSPONDER, BlockState::of(BlockKind::Transponder))?;
    state.place_block(TRANSPONDER.offset(2, 0, 0), BlockState::of(BlockKind::PowerCell))?;
    state.place_block(CAMP.offset(-4, 0, -4), BlockState::of(BlockKind::AcheronForge))?;
    Ok(())
}

fn starter_kit(player: &mut PlayerState) -> u32 {
    let kit = [
        ItemStack::new(ItemKind::Bread, 12),
        ItemStack::new(ItemKind::Apple, 6),
        ItemStack::new(ItemKind::Coal, 16),
        ItemStack::new(ItemKind::OakLog, 16),
        ItemStack::new(ItemKind::CopperBlock, 2),
    ];
    let mut lost: u32 = 0;
    for stack in kit {
        if let Some(leftover) = player.give(stack) {
            warn!(player = %player.name, item = ?leftover.kind, count = leftover.count, "starter kit did not fit");
            lost = lost.saturating_add(leftover.count);
        }
    }
    player.armor = ArmorTier::Leather;
    lost
}

fn spawn_players(state: &mut SimulationState, demo: &DemoConfig) -> Result<Vec<PlayerId>, EngineError> {
    let mut ids = Vec::with_capacity(demo.players.len());
    let mut offset: i32 = -2;
    // Players stand in a row across the camp.
    for name in &demo.players {
        let mut player = PlayerState::new(PlayerId::new(), name.as_str(), CAMP.offset(offset, 0, 0));
        starter_kit(&mut player);
        let id = player.id;
        state.player_join(player)?;
        ids.push(id);
        offset = offset.saturating_add(2);
    }
    if demo.unlock_first_player
        && let Some(first) = ids.first()
    {
        state.unlock_schematic(*first)?;
    }
    Ok(ids)
}

fn spawn_mobs(state: &mut SimulationState, demo: &DemoConfig, rng: &mut impl Rng) -> u32 {
    const KINDS: [(MobKind, f64); 6] = [
        (MobKind::Cow, 10.0),
        (MobKind::Sheep, 8.0),
        (MobKind::Pig, 10.0),
        (MobKind::Zombie, 20.0),
        (MobKind::Spider, 16.0),
        (MobKind::Wolf, 8.0),
    ];
    let r = demo.radius.max(16);
    let mut spawned: u32 = 0;
    for _ in 0..demo.mobs {
        let Some(&(kind, health)) = KINDS.get(rng.random_range(0..KINDS.len())) else {
            continue;
        };
        let pos = BlockPos::new(
            rng.random_range(r.saturating_neg()..=r),
            SURFACE_Y + 1,
            rng.random_range(r.saturating_neg()..=r),
        );
        state.spawn_mob(MobState::new(MobId::new(), kind, pos, health));
        spawned = spawned.saturating_add(1);
    }
    spawned
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use frostfall_world::VoxelWorld;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn demo() -> (SimulationState, SpawnResult) {
        let config = SimulationConfig::default();
        let demo = DemoConfig::default();
        let mut rng = SmallRng::seed_from_u64(7);
        let world = build_world(&config, &demo, &mut rng).unwrap();
        let mut state = SimulationState::with_world(config, world).unwrap();
        let result = populate(&mut state, &demo, &mut rng).unwrap();
        (state, result)
    }

    #[test]
    fn terrain_is_layered() {
        let (state, _) = demo();
        assert_eq!(state.world.block(BlockPos::new(30, SURFACE_Y, -30)).kind, BlockKind::GrassBlock);
        assert_eq!(state.world.block(BlockPos::new(30, 10, -30)).kind, BlockKind::Stone);
        assert_eq!(state.world.block(BlockPos::new(30, -10, -30)).kind, BlockKind::Deepslate);
    }

    #[test]
    fn players_join_with_a_kit_and_first_is_unlocked() {
        let (state, result) = demo();
        assert_eq!(result.players.len(), 3);
        let first = result.players.first().copied().unwrap();
        assert!(state.unlocked_schematics.contains(&first));
        let player = state.players.get(&first).unwrap();
        assert!(player.has_item(ItemKind::Bread));
        assert_eq!(player.armor, ArmorTier::Leather);
    }

    #[test]
    fn machines_are_placed_and_shaft_is_open() {
        let (state, result) = demo();
        assert_eq!(result.mobs, 8);
        assert_eq!(state.machines.len(), 4);
        assert!(frostfall_world::machines::transponder::shaft_is_clear(&state.world, TRANSPONDER));
    }

    #[test]
    fn shallow_worlds_are_refused() {
        let mut config = SimulationConfig::default();
        config.world.min_y = 0;
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(build_world(&config, &DemoConfig::default(), &mut rng).is_err());
    }

    #[test]
    fn starter_kit_reports_what_did_not_fit() {
        let mut player = PlayerState::new(PlayerId::new(), "Rook", CAMP);
        assert_eq!(starter_kit(&mut player), 0);

        let mut full = PlayerState::new(PlayerId::new(), "Wren", CAMP);
        for slot in 0..full.inventory.len() {
            let _ = full.set_slot(slot, Some(ItemStack::new(ItemKind::Stick, 64)));
        }
        assert_eq!(starter_kit(&mut full), 52);
        assert_eq!(full.armor, ArmorTier::Leather);
    }
}
