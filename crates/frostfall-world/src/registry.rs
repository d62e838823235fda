//! Spatial registries of active heat machines.
//!
//! Temperature lookups consult these instead of scanning a volume for
//! machine blocks. A position is present iff the machine there is loaded
//! and active: a heater while lit, a geothermal core while at or below
//! y = 0. Machines add and remove themselves as they tick; after loading a
//! save, [`MachineStore::rebuild_registries`] repopulates both.
//!
//! [`MachineStore::rebuild_registries`]: crate::machines::MachineStore::rebuild_registries

use std::collections::{BTreeMap, BTreeSet};

use frostfall_types::BlockPos;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Warmth radius of a lit thermal heater.
pub const HEATER_RADIUS: u32 = 8;

/// Warmth of a lit thermal heater in °C.
pub const HEATER_WARMTH: f64 = 40.0;

// ---------------------------------------------------------------------------
// HeaterRegistry
// ---------------------------------------------------------------------------

/// Positions of every lit thermal heater.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaterRegistry {
    lit: BTreeSet<BlockPos>,
}

impl HeaterRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            lit: BTreeSet::new(),
        }
    }

    /// Register a lit heater. Returns `false` if it was already present.
    pub fn insert(&mut self, pos: BlockPos) -> bool {
        self.lit.insert(pos)
    }

    /// Unregister a heater. Returns `false` if it was absent.
    pub fn remove(&mut self, pos: BlockPos) -> bool {
        self.lit.remove(&pos)
    }

    /// Whether a lit heater is registered at `pos`.
    pub fn contains(&self, pos: BlockPos) -> bool {
        self.lit.contains(&pos)
    }

    /// Whether any lit heater warms `pos`.
    pub fn warms(&self, pos: BlockPos) -> bool {
        self.lit.iter().any(|heater| heater.within(pos, HEATER_RADIUS))
    }

    /// Iterate over registered heaters.
    pub fn iter(&self) -> impl Iterator<Item = BlockPos> + '_ {
        self.lit.iter().copied()
    }

    /// Number of lit heaters.
    pub fn len(&self) -> usize {
        self.lit.len()
    }

    /// Whether no heater is lit.
    pub fn is_empty(&self) -> bool {
        self.lit.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.lit.clear();
    }
}

// ---------------------------------------------------------------------------
// GeothermalCoreRegistry
// ---------------------------------------------------------------------------

/// What an active geothermal core provides to its surroundings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreReach {
    /// Radius of warmth and transponder power.
    pub range_radius: u32,
    /// Warmth delivered inside the range, in whole °C.
    pub warmth: u32,
    /// Radius of the breathable zone during atmospheric collapse.
    pub o2_radius: u32,
}

/// Every active geothermal core with its current reach.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeothermalCoreRegistry {
    active: BTreeMap<BlockPos, CoreReach>,
}

impl GeothermalCoreRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            active: BTreeMap::new(),
        }
    }

    /// Register or update an active core.
    pub fn upsert(&mut self, pos: BlockPos, reach: CoreReach) {
        self.active.insert(pos, reach);
    }

    /// Unregister a core. Returns `false` if it was absent.
    pub fn remove(&mut self, pos: BlockPos) -> bool {
        self.active.remove(&pos).is_some()
    }

    /// Reach of the core at `pos`, if active.
    pub fn get(&self, pos: BlockPos) -> Option<CoreReach> {
        self.active.get(&pos).copied()
    }

    /// Highest warmth any active core delivers to `pos`.
    pub fn warmth_at(&self, pos: BlockPos) -> Option<u32> {
        self.active
            .iter()
            .filter(|(core, reach)| core.within(pos, reach.range_radius))
            .map(|(_, reach)| reach.warmth)
            .max()
    }

    /// Whether `pos` is inside the range of any active core.
    pub fn powers(&self, pos: BlockPos) -> bool {
        self.active
            .iter()
            .any(|(core, reach)| core.within(pos, reach.range_radius))
    }

    /// Whether `pos` is inside the breathable zone of any active core.
    pub fn breathable(&self, pos: BlockPos) -> bool {
        self.active
            .iter()
            .any(|(core, reach)| core.within(pos, reach.o2_radius))
    }

    /// Iterate over active cores.
    pub fn iter(&self) -> impl Iterator<Item = (BlockPos, CoreReach)> + '_ {
        self.active.iter().map(|(pos, reach)| (*pos, *reach))
    }

    /// Number of active cores.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no core is active.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.active.clear();
    }
}

// ---------------------------------------------------------------------------
// SpatialRegistries
// ---------------------------------------------------------------------------

/// Both registries for one world.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpatialRegistries {
    /// Lit heaters.
    pub heaters: HeaterRegistry,
    /// Active geothermal cores.
    pub cores: GeothermalCoreRegistry,
}

impl SpatialRegistries {
    /// Create empty registries.
    pub const fn new() -> Self {
        Self {
            heaters: HeaterRegistry::new(),
            cores: GeothermalCoreRegistry::new(),
        }
    }

    /// Whether a lit heater or an active core's range covers `pos`.
    pub fn machine_heat_near(&self, pos: BlockPos) -> bool {
        self.heaters.warms(pos) || self.cores.powers(pos)
    }
}
