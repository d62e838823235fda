//! Block-entity machines and the store that owns them.
//!
//! Four machines carry state between ticks: the satellite
//! [`Transponder`], the fuel-burning [`ThermalHeater`], the upgradable
//! [`GeothermalCore`], and the [`AcheronForge`]. The [`MachineStore`] keys
//! them by block position, creates them on placement, returns their
//! inventory on removal, and ticks them in a fixed order: heaters, cores,
//! forges, transponders. Heaters and cores keep the
//! [`SpatialRegistries`] current as they tick, so forges and transponders
//! see this tick's heat and power. A machine whose chunk unloads leaves
//! the registries and rejoins them when the chunk loads again.

pub mod forge;
pub mod geothermal;
pub mod heater;
pub mod transponder;

use std::collections::BTreeMap;

use frostfall_types::{BlockKind, BlockPos, BlockState, ChunkPos, ItemKind, ItemStack};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::WorldError;
use crate::registry::SpatialRegistries;
use crate::voxel::VoxelWorld;

pub use forge::{AcheronForge, ForgeRecipe};
pub use geothermal::{CoreTrack, GeothermalCore};
pub use heater::ThermalHeater;
pub use transponder::{ActivationRefusal, Transponder, TransponderSettings, TransponderState};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Something a machine did during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineEventKind {
    /// A heater started burning.
    HeaterLit,
    /// A heater ran out of fuel.
    HeaterExtinguished,
    /// A core became active and joined the registry.
    CoreActivated,
    /// A core stopped being active.
    CoreDeactivated,
    /// A core upgrade track gained a level.
    CoreLevelUp {
        /// The upgraded track.
        track: CoreTrack,
        /// The new level.
        level: u8,
    },
    /// A forge finished a recipe.
    ForgeCrafted {
        /// Item produced.
        output: ItemKind,
        /// Number produced.
        count: u32,
    },
    /// A transponder began broadcasting.
    TransponderStarted,
    /// A broadcasting transponder paused.
    TransponderPaused {
        /// Whether a player paused it.
        manual: bool,
    },
    /// A paused transponder resumed.
    TransponderResumed,
    /// A transponder finished its broadcast.
    TransponderCompleted,
}

/// A machine event with its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineEvent {
    /// Machine position.
    pub pos: BlockPos,
    /// What happened.
    pub kind: MachineEventKind,
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// State of any machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Machine {
    /// Satellite transponder.
    Transponder(Transponder),
    /// Thermal heater.
    Heater(ThermalHeater),
    /// Geothermal core.
    Core(GeothermalCore),
    /// Acheron forge.
    Forge(AcheronForge),
}

impl Machine {
    /// Fresh machine state for a block kind.
    pub fn for_block(kind: BlockKind) -> Option<Self> {
        match kind {
            BlockKind::Transponder => Some(Self::Transponder(Transponder::default())),
            BlockKind::ThermalHeater => Some(Self::Heater(ThermalHeater::default())),
            BlockKind::GeothermalCore => Some(Self::Core(GeothermalCore::default())),
            BlockKind::AcheronForge => Some(Self::Forge(AcheronForge::default())),
            _ => None,
        }
    }

    /// Block kind this machine lives in.
    pub const fn block_kind(&self) -> BlockKind {
        match self {
            Self::Transponder(_) => BlockKind::Transponder,
            Self::Heater(_) => BlockKind::ThermalHeater,
            Self::Core(_) => BlockKind::GeothermalCore,
            Self::Forge(_) => BlockKind::AcheronForge,
        }
    }

    /// Inventory returned when the machine is removed.
    pub fn drops(&self) -> Vec<ItemStack> {
        match self {
            Self::Transponder(_) => Vec::new(),
            Self::Heater(heater) => heater.drops(),
            Self::Core(core) => core.drops(),
            Self::Forge(forge) => forge.drops(),
        }
    }
}

/// Everything a machine tick reads or writes.
pub struct MachineContext<'a> {
    /// The world.
    pub world: &'a mut dyn VoxelWorld,
    /// Registries kept current by heaters and cores.
    pub registries: &'a mut SpatialRegistries,
    /// Current server tick.
    pub tick: u64,
    /// Transponder tuning.
    pub transponder: TransponderSettings,
}

/// Whether a loaded `kind` block lies within Euclidean `radius` of `pos`.
pub(crate) fn block_within(world: &dyn VoxelWorld, pos: BlockPos, kind: BlockKind, radius: u32) -> bool {
    let reach = i32::try_from(radius).unwrap_or(i32::MAX);
    for dx in reach.saturating_neg()..=reach {
        for dy in reach.saturating_neg()..=reach {
            for dz in reach.saturating_neg()..=reach {
                let cell = pos.offset(dx, dy, dz);
                if cell.within(pos, radius) && world.is_loaded(cell) && world.block(cell).kind == kind {
                    return true;
                }
            }
        }
    }
    false
}

// ---------------------------------------------------------------------------
// MachineStore
// ---------------------------------------------------------------------------

/// One saved machine with its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineEntry {
    /// Block position.
    pub pos: BlockPos,
    /// Machine state.
    pub machine: Machine,
}

/// Every machine in a world, keyed by position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<MachineEntry>", into = "Vec<MachineEntry>")]
pub struct MachineStore {
    machines: BTreeMap<BlockPos, Machine>,
}

impl From<Vec<MachineEntry>> for MachineStore {
    fn from(entries: Vec<MachineEntry>) -> Self {
        Self {
            machines: entries
                .into_iter()
                .map(|entry| (entry.pos, entry.machine))
                .collect(),
        }
    }
}

impl From<MachineStore> for Vec<MachineEntry> {
    fn from(store: MachineStore) -> Self {
        store
            .machines
            .into_iter()
            .map(|(pos, machine)| MachineEntry { pos, machine })
            .collect()
    }
}

impl MachineStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            machines: BTreeMap::new(),
        }
    }

    /// Place a machine block and create its state.
    pub fn place(
        &mut self,
        world: &mut dyn VoxelWorld,
        pos: BlockPos,
        kind: BlockKind,
    ) -> Result<(), WorldError> {
        if self.machines.contains_key(&pos) {
            return Err(WorldError::MachineExists(pos));
        }
        let machine = Machine::for_block(kind).ok_or(WorldError::NotAMachine { pos, kind })?;
        world.set_block(pos, BlockState::of(kind))?;
        self.machines.insert(pos, machine);
        info!(%pos, ?kind, "machine placed");
        Ok(())
    }

    /// Remove a machine and its block, returning its inventory as drops.
    pub fn remove(
        &mut self,
        world: &mut dyn VoxelWorld,
        registries: &mut SpatialRegistries,
        pos: BlockPos,
    ) -> Result<Vec<ItemStack>, WorldError> {
        let machine = self
            .machines
            .remove(&pos)
            .ok_or(WorldError::MachineNotFound(pos))?;
        registries.heaters.remove(pos);
        registries.cores.remove(pos);
        if world.is_loaded(pos) {
            world.set_block(pos, BlockState::AIR)?;
        }
        info!(%pos, kind = ?machine.block_kind(), "machine removed");
        Ok(machine.drops())
    }

    /// Drop machines whose block was replaced by something else.
    ///
    /// Only loaded positions are checked. Returns the drops of every pruned
    /// machine.
    pub fn prune_missing(
        &mut self,
        world: &dyn VoxelWorld,
        registries: &mut SpatialRegistries,
    ) -> Vec<ItemStack> {
        let stale: Vec<BlockPos> = self
            .machines
            .iter()
            .filter(|(pos, machine)| {
                world.is_loaded(**pos) && world.block(**pos).kind != machine.block_kind()
            })
            .map(|(pos, _)| *pos)
            .collect();

        let mut drops = Vec::new();
        for pos in stale {
            if let Some(machine) = self.machines.remove(&pos) {
                warn!(%pos, kind = ?machine.block_kind(), "machine block missing, dropping state");
                registries.heaters.remove(pos);
                registries.cores.remove(pos);
                drops.extend(machine.drops());
            }
        }
        drops
    }

    /// Machine at `pos`.
    pub fn get(&self, pos: BlockPos) -> Option<&Machine> {
        self.machines.get(&pos)
    }

    /// Mutable machine at `pos`.
    pub fn get_mut(&mut self, pos: BlockPos) -> Option<&mut Machine> {
        self.machines.get_mut(&pos)
    }

    /// Transponder at `pos`.
    pub fn transponder_mut(&mut self, pos: BlockPos) -> Result<&mut Transponder, WorldError> {
        match self.machines.get_mut(&pos) {
            Some(Machine::Transponder(transponder)) => Ok(transponder),
            Some(other) => Err(WorldError::NotAMachine {
                pos,
                kind: other.block_kind(),
            }),
            None => Err(WorldError::MachineNotFound(pos)),
        }
    }

    /// Insert items into the machine at `pos`.
    ///
    /// Returns whatever did not fit. Heaters take fuel, cores take upgrade
    /// materials, forges take recipe inputs; anything else is rejected.
    pub fn insert_item(
        &mut self,
        pos: BlockPos,
        stack: ItemStack,
    ) -> Result<Option<ItemStack>, WorldError> {
        let item = stack.kind;
        let machine = self
            .machines
            .get_mut(&pos)
            .ok_or(WorldError::MachineNotFound(pos))?;
        let accepted = match machine {
            Machine::Heater(heater) => heater.insert_fuel(stack),
            Machine::Core(core) => core.insert_item(stack),
            Machine::Forge(forge) => forge.insert_input(stack),
            Machine::Transponder(_) => Err(stack),
        };
        accepted.map_err(|_| WorldError::ItemRejected { pos, item })
    }

    /// Unregister every machine in `chunk`. Call when the chunk unloads.
    ///
    /// Returns the number of registry entries removed.
    pub fn chunk_unloaded(&self, chunk: ChunkPos, registries: &mut SpatialRegistries) -> usize {
        let mut removed: usize = 0;
        for pos in self.machines.keys().filter(|pos| pos.chunk() == chunk) {
            if registries.heaters.remove(*pos) {
                removed = removed.saturating_add(1);
            }
            if registries.cores.remove(*pos) {
                removed = removed.saturating_add(1);
            }
        }
        if removed > 0 {
            debug!(chunk_x = chunk.x, chunk_z = chunk.z, removed, "chunk unloaded, machines unregistered");
        }
        removed
    }

    /// Register the lit heaters and active cores in `chunk`. Call when the
    /// chunk loads.
    ///
    /// Returns the number of machines registered.
    pub fn chunk_loaded(
        &self,
        world: &dyn VoxelWorld,
        chunk: ChunkPos,
        registries: &mut SpatialRegistries,
    ) -> usize {
        let mut added: usize = 0;
        for (pos, machine) in self.machines.iter().filter(|(pos, _)| pos.chunk() == chunk) {
            if world.is_loaded(*pos) && register(*pos, machine, registries) {
                added = added.saturating_add(1);
            }
        }
        if added > 0 {
            debug!(chunk_x = chunk.x, chunk_z = chunk.z, added, "chunk loaded, machines registered");
        }
        added
    }

    /// Bring the registries in line with which chunks are loaded.
    ///
    /// Entries at unloaded positions are evicted and loaded machines that
    /// should be registered are added back. Runs at the start of every
    /// [`tick_all`](Self::tick_all), so chunks the host loads or unloads
    /// behind the store's back are caught within a tick.
    pub fn sync_loaded(&self, world: &dyn VoxelWorld, registries: &mut SpatialRegistries) {
        let stale_heaters: Vec<BlockPos> = registries
            .heaters
            .iter()
            .filter(|pos| !world.is_loaded(*pos))
            .collect();
        for pos in stale_heaters {
            registries.heaters.remove(pos);
        }
        let stale_cores: Vec<BlockPos> = registries
            .cores
            .iter()
            .map(|(pos, _)| pos)
            .filter(|pos| !world.is_loaded(*pos))
            .collect();
        for pos in stale_cores {
            registries.cores.remove(pos);
        }
        for (pos, machine) in &self.machines {
            if world.is_loaded(*pos) {
                register(*pos, machine, registries);
            }
        }
    }

    /// Tick every machine in order: heaters, cores, forges, transponders.
    pub fn tick_all(&mut self, ctx: &mut MachineContext<'_>) -> Vec<MachineEvent> {
        self.sync_loaded(&*ctx.world, ctx.registries);
        let mut events = Vec::new();

        for (pos, machine) in &mut self.machines {
            if let Machine::Heater(heater) = machine
                && ctx.world.is_loaded(*pos)
            {
                heater.tick(ctx, *pos, &mut events);
            }
        }
        for (pos, machine) in &mut self.machines {
            if let Machine::Core(core) = machine
                && ctx.world.is_loaded(*pos)
            {
                core.tick(ctx, *pos, &mut events);
            }
        }
        for (pos, machine) in &mut self.machines {
            if let Machine::Forge(forge) = machine
                && ctx.world.is_loaded(*pos)
            {
                forge.tick(ctx, *pos, &mut events);
            }
        }
        for (pos, machine) in &mut self.machines {
            if let Machine::Transponder(transponder) = machine
                && ctx.world.is_loaded(*pos)
            {
                transponder.tick(ctx, *pos, &mut events);
            }
        }
        events
    }

    /// Repopulate the registries from machine state, e.g. after loading.
    pub fn rebuild_registries(&self, world: &dyn VoxelWorld, registries: &mut SpatialRegistries) {
        registries.heaters.clear();
        registries.cores.clear();
        for (pos, machine) in &self.machines {
            if world.is_loaded(*pos) {
                register(*pos, machine, registries);
            }
        }
    }

    /// Iterate over machines.
    pub fn iter(&self) -> impl Iterator<Item = (BlockPos, &Machine)> + '_ {
        self.machines.iter().map(|(pos, machine)| (*pos, machine))
    }

    /// Number of machines.
    pub fn len(&self) -> usize {
        self.machines.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }
}

/// Add a lit heater or an active core that is missing from the registries.
///
/// Returns whether an entry was added.
fn register(pos: BlockPos, machine: &Machine, registries: &mut SpatialRegistries) -> bool {
    match machine {
        Machine::Heater(heater) if heater.is_lit() => registries.heaters.insert(pos),
        Machine::Core(core) if GeothermalCore::is_active_at(pos) && registries.cores.get(pos).is_none() => {
            registries.cores.upsert(pos, core.reach());
            true
        }
        _ => false,
    }
}
