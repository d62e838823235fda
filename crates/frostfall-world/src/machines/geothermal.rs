//! Geothermal core: an upgradable underground heat and oxygen source.
//!
//! Three independent upgrade tracks each take one material. Every tick a
//! core consumes one item per track that is below its maximum level and
//! adds the track's increment to its progress; reaching 100 gains a level.
//! A core is active only at or below y = 0, and while active keeps its
//! [`CoreReach`] in the registry.

use frostfall_types::{BlockPos, ItemKind, ItemStack};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::heater::leftover;
use super::{MachineContext, MachineEvent, MachineEventKind};
use crate::registry::CoreReach;

/// Highest y at which a core is active.
pub const ACTIVE_MAX_Y: i32 = 0;

/// Progress needed per level.
pub const LEVEL_PROGRESS: u32 = 100;

/// Range radius by range level.
pub const RANGE_RADIUS: [u32; 6] = [8, 12, 16, 24, 32, 48];

/// Warmth by temperature level, in °C.
pub const WARMTH: [u32; 6] = [20, 30, 40, 55, 70, 90];

/// Breathable radius by oxygen level.
pub const O2_RADIUS: [u32; 4] = [4, 8, 16, 32];

/// An upgrade track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreTrack {
    /// Heat and power range.
    Range,
    /// Warmth delivered.
    Temperature,
    /// Breathable radius.
    Oxygen,
}

impl CoreTrack {
    /// All tracks in slot order.
    pub const ALL: [Self; 3] = [Self::Range, Self::Temperature, Self::Oxygen];

    /// Slot index.
    pub const fn index(self) -> usize {
        match self {
            Self::Range => 0,
            Self::Temperature => 1,
            Self::Oxygen => 2,
        }
    }

    /// Material the track consumes.
    pub const fn material(self) -> ItemKind {
        match self {
            Self::Range => ItemKind::CopperBlock,
            Self::Temperature => ItemKind::MagmaCream,
            Self::Oxygen => ItemKind::AcheroniteShard,
        }
    }

    /// Progress added per item.
    pub const fn increment(self) -> u32 {
        match self {
            Self::Range => 25,
            Self::Temperature => 20,
            Self::Oxygen => 10,
        }
    }

    /// Maximum level.
    pub const fn max_level(self) -> u8 {
        match self {
            Self::Range | Self::Temperature => 5,
            Self::Oxygen => 3,
        }
    }

    /// Track consuming `item`, if any.
    pub fn for_material(item: ItemKind) -> Option<Self> {
        Self::ALL.into_iter().find(|track| track.material() == item)
    }
}

/// A geothermal core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeothermalCore {
    /// Range level, 0 to 5.
    pub range_level: u8,
    /// Temperature level, 0 to 5.
    pub temp_level: u8,
    /// Oxygen level, 0 to 3.
    pub o2_level: u8,
    /// Progress per track toward the next level.
    pub progress: [u32; 3],
    /// Material slot per track.
    pub items: [Option<ItemStack>; 3],
}

impl GeothermalCore {
    /// Whether a core at `pos` is active.
    pub const fn is_active_at(pos: BlockPos) -> bool {
        pos.y <= ACTIVE_MAX_Y
    }

    /// Current level of `track`.
    pub const fn level(&self, track: CoreTrack) -> u8 {
        match track {
            CoreTrack::Range => self.range_level,
            CoreTrack::Temperature => self.temp_level,
            CoreTrack::Oxygen => self.o2_level,
        }
    }

    fn level_mut(&mut self, track: CoreTrack) -> &mut u8 {
        match track {
            CoreTrack::Range => &mut self.range_level,
            CoreTrack::Temperature => &mut self.temp_level,
            CoreTrack::Oxygen => &mut self.o2_level,
        }
    }

    /// What the core provides at its current levels.
    pub fn reach(&self) -> CoreReach {
        let pick = |table: &[u32], level: u8| {
            table
                .get(usize::from(level))
                .or_else(|| table.last())
                .copied()
                .unwrap_or(0)
        };
        CoreReach {
            range_radius: pick(&RANGE_RADIUS, self.range_level),
            warmth: pick(&WARMTH, self.temp_level),
            o2_radius: pick(&O2_RADIUS, self.o2_level),
        }
    }

    /// Add upgrade material to its track's slot.
    pub fn insert_item(&mut self, stack: ItemStack) -> Result<Option<ItemStack>, ItemStack> {
        let Some(track) = CoreTrack::for_material(stack.kind) else {
            return Err(stack);
        };
        let Some(slot) = self.items.get_mut(track.index()) else {
            return Err(stack);
        };
        let max = stack.kind.max_stack();
        let queued = slot.get_or_insert_with(|| ItemStack::new(stack.kind, 0));
        let moved = max.saturating_sub(queued.count).min(stack.count);
        queued.count = queued.count.saturating_add(moved);
        Ok(leftover(stack, moved))
    }

    pub(crate) fn tick(
        &mut self,
        ctx: &mut MachineContext<'_>,
        pos: BlockPos,
        events: &mut Vec<MachineEvent>,
    ) {
        if !Self::is_active_at(pos) {
            if ctx.registries.cores.remove(pos) {
                events.push(MachineEvent {
                    pos,
                    kind: MachineEventKind::CoreDeactivated,
                });
            }
            return;
        }

        for track in CoreTrack::ALL {
            if let Some(level) = self.advance(track) {
                info!(%pos, ?track, level, "geothermal core upgraded");
                events.push(MachineEvent {
                    pos,
                    kind: MachineEventKind::CoreLevelUp { track, level },
                });
            }
        }

        if ctx.registries.cores.get(pos).is_none() {
            events.push(MachineEvent {
                pos,
                kind: MachineEventKind::CoreActivated,
            });
        }
        ctx.registries.cores.upsert(pos, self.reach());
    }

    /// Consume one item on `track`; returns the new level on level-up.
    fn advance(&mut self, track: CoreTrack) -> Option<u8> {
        if self.level(track) >= track.max_level() {
            return None;
        }
        let slot = self.items.get_mut(track.index())?;
        let stack = slot.as_mut()?;
        if !stack.take_one() {
            return None;
        }
        if stack.is_empty() {
            *slot = None;
        }

        let progress = self.progress.get_mut(track.index())?;
        *progress = progress.saturating_add(track.increment());
        if *progress < LEVEL_PROGRESS {
            return None;
        }
        *progress = progress.saturating_sub(LEVEL_PROGRESS);
        let level = self.level_mut(track);
        *level = level.saturating_add(1);
        Some(*level)
    }

    /// Unspent materials returned on removal.
    pub fn drops(&self) -> Vec<ItemStack> {
        self.items
            .iter()
            .flatten()
            .filter(|stack| !stack.is_empty())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machines::TransponderSettings;
    use crate::registry::SpatialRegistries;
    use crate::voxel::ChunkedWorld;

    fn tick_n(core: &mut GeothermalCore, pos: BlockPos, registries: &mut SpatialRegistries, n: u64) -> Vec<MachineEvent> {
        let mut world = ChunkedWorld::default();
        world.load_area(0, 0, 0);
        let mut events = Vec::new();
        for tick in 0..n {
            let mut ctx = MachineContext {
                world: &mut world,
                registries: &mut *registries,
                tick,
                transponder: TransponderSettings::default(),
            };
            core.tick(&mut ctx, pos, &mut events);
        }
        events
    }

    #[test]
    fn four_copper_blocks_raise_range_one_level() {
        let mut core = GeothermalCore::default();
        let _ = core.insert_item(ItemStack::new(ItemKind::CopperBlock, 5));
        let mut registries = SpatialRegistries::new();
        let pos = BlockPos::new(0, -20, 0);
        let events = tick_n(&mut core, pos, &mut registries, 10);
        assert_eq!(core.range_level, 1);
        assert_eq!(core.progress, [25, 0, 0]);
        assert!(events.contains(&MachineEvent {
            pos,
            kind: MachineEventKind::CoreLevelUp {
                track: CoreTrack::Range,
                level: 1
            }
        }));
        assert_eq!(registries.cores.get(pos).map(|r| r.range_radius), Some(12));
    }

    #[test]
    fn oxygen_caps_at_level_three_without_consuming() {
        let mut core = GeothermalCore {
            o2_level: 3,
            ..GeothermalCore::default()
        };
        let _ = core.insert_item(ItemStack::new(ItemKind::AcheroniteShard, 8));
        let mut registries = SpatialRegistries::new();
        tick_n(&mut core, BlockPos::new(0, 0, 0), &mut registries, 5);
        assert_eq!(core.o2_level, 3);
        assert_eq!(core.drops(), vec![ItemStack::new(ItemKind::AcheroniteShard, 8)]);
        assert_eq!(core.reach().o2_radius, 32);
    }

    #[test]
    fn cores_above_ground_stay_inactive() {
        let mut core = GeothermalCore::default();
        let _ = core.insert_item(ItemStack::new(ItemKind::MagmaCream, 10));
        let mut registries = SpatialRegistries::new();
        let events = tick_n(&mut core, BlockPos::new(0, 1, 0), &mut registries, 10);
        assert!(events.is_empty());
        assert!(registries.cores.is_empty());
        assert_eq!(core.temp_level, 0);
    }

    #[test]
    fn rejects_foreign_items() {
        let mut core = GeothermalCore::default();
        assert!(core.insert_item(ItemStack::new(ItemKind::Coal, 1)).is_err());
    }
}
