//! Acheron forge: deep, heated acheronite processing.

use frostfall_types::{BlockKind, BlockPos, ItemKind, ItemStack};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::heater::leftover;
use super::{MachineContext, MachineEvent, MachineEventKind, block_within};
use crate::registry::SpatialRegistries;
use crate::sampling::on_interval;
use crate::voxel::VoxelWorld;

/// Highest y at which the forge works.
pub const MAX_WORKING_Y: i32 = -32;

/// Radius within which lava counts as a heat source.
pub const LAVA_RADIUS: u32 = 4;

/// Ticks between gate checks.
pub const CHECK_INTERVAL: u32 = 20;

/// Progress lost per tick while stalled.
pub const DECAY_PER_TICK: u32 = 2;

/// A forge recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForgeRecipe {
    /// Consumed item, one per craft.
    pub input: ItemKind,
    /// Produced item.
    pub output: ItemKind,
    /// Items produced per craft.
    pub count: u32,
    /// Ticks of progress per craft.
    pub ticks: u32,
}

/// Every forge recipe.
pub const RECIPES: [ForgeRecipe; 2] = [
    ForgeRecipe {
        input: ItemKind::AcheroniteShard,
        output: ItemKind::AcheroniteIngot,
        count: 1,
        ticks: 200,
    },
    ForgeRecipe {
        input: ItemKind::AcheroniteCluster,
        output: ItemKind::AcheroniteShard,
        count: 4,
        ticks: 100,
    },
];

impl ForgeRecipe {
    /// Recipe consuming `input`.
    pub fn for_input(input: ItemKind) -> Option<Self> {
        RECIPES.into_iter().find(|recipe| recipe.input == input)
    }
}

/// A forge: input slot 0, output slot 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcheronForge {
    /// Input and output slots.
    pub items: [Option<ItemStack>; 2],
    /// Ticks of progress on the current craft.
    pub processing_progress: u32,
    /// Result of the last gate check.
    pub conditions_met: bool,
    /// Ticks since the last gate check.
    pub ticks_since_check: u32,
}

impl AcheronForge {
    /// Whether depth and heat allow a forge at `pos` to work.
    pub fn conditions_hold(world: &dyn VoxelWorld, registries: &SpatialRegistries, pos: BlockPos) -> bool {
        pos.y <= MAX_WORKING_Y
            && (registries.machine_heat_near(pos)
                || block_within(world, pos, BlockKind::Lava, LAVA_RADIUS))
    }

    /// Add recipe input to slot 0.
    pub fn insert_input(&mut self, stack: ItemStack) -> Result<Option<ItemStack>, ItemStack> {
        if ForgeRecipe::for_input(stack.kind).is_none() {
            return Err(stack);
        }
        let Some(slot) = self.items.get_mut(0) else {
            return Err(stack);
        };
        match slot {
            Some(queued) if queued.kind != stack.kind => Err(stack),
            Some(queued) => {
                let moved = stack.kind.max_stack().saturating_sub(queued.count).min(stack.count);
                queued.count = queued.count.saturating_add(moved);
                Ok(leftover(stack, moved))
            }
            None => {
                let moved = stack.kind.max_stack().min(stack.count);
                *slot = Some(ItemStack::new(stack.kind, moved));
                Ok(leftover(stack, moved))
            }
        }
    }

    /// Take everything from the output slot.
    pub fn take_output(&mut self) -> Option<ItemStack> {
        self.items.get_mut(1).and_then(Option::take)
    }

    /// The recipe the input slot can run, if the output has room for it.
    fn runnable(&self) -> Option<ForgeRecipe> {
        let input = self.items.first()?.as_ref().filter(|stack| !stack.is_empty())?;
        let recipe = ForgeRecipe::for_input(input.kind)?;
        match self.items.get(1)? {
            Some(output) if !output.can_accept(recipe.output, recipe.count) => None,
            _ => Some(recipe),
        }
    }

    pub(crate) fn tick(
        &mut self,
        ctx: &mut MachineContext<'_>,
        pos: BlockPos,
        events: &mut Vec<MachineEvent>,
    ) {
        if self.ticks_since_check == 0 {
            self.conditions_met = Self::conditions_hold(&*ctx.world, ctx.registries, pos);
        }
        let next = self.ticks_since_check.saturating_add(1);
        self.ticks_since_check = if on_interval(u64::from(next), u64::from(CHECK_INTERVAL)) {
            0
        } else {
            next
        };

        let recipe = self.runnable().filter(|_| self.conditions_met);
        let Some(recipe) = recipe else {
            self.processing_progress = self.processing_progress.saturating_sub(DECAY_PER_TICK);
            return;
        };

        self.processing_progress = self.processing_progress.saturating_add(1);
        if self.processing_progress < recipe.ticks {
            return;
        }
        self.processing_progress = 0;
        self.craft(recipe);
        debug!(%pos, output = ?recipe.output, count = recipe.count, "forge crafted");
        events.push(MachineEvent {
            pos,
            kind: MachineEventKind::ForgeCrafted {
                output: recipe.output,
                count: recipe.count,
            },
        });
    }

    fn craft(&mut self, recipe: ForgeRecipe) {
        if let Some(slot) = self.items.get_mut(0) {
            if let Some(input) = slot.as_mut() {
                input.take_one();
            }
            if slot.as_ref().is_some_and(ItemStack::is_empty) {
                *slot = None;
            }
        }
        if let Some(slot) = self.items.get_mut(1) {
            let output = slot.get_or_insert_with(|| ItemStack::new(recipe.output, 0));
            output.count = output.count.saturating_add(recipe.count);
        }
    }

    /// Both slots returned on removal.
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
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use frostfall_types::BlockState;

    use super::*;
    use crate::machines::TransponderSettings;
    use crate::voxel::ChunkedWorld;

    fn setup(lava: bool) -> (ChunkedWorld, BlockPos) {
        let mut world = ChunkedWorld::default();
        world.load_area(0, 0, 8);
        let pos = BlockPos::new(0, -40, 0);
        let _ = world.set_block(pos, BlockState::of(BlockKind::AcheronForge));
        if lava {
            let _ = world.set_block(BlockPos::new(3, -40, 0), BlockState::of(BlockKind::Lava));
        }
        (world, pos)
    }

    fn tick_n(forge: &mut AcheronForge, world: &mut ChunkedWorld, pos: BlockPos, n: u64) -> Vec<MachineEvent> {
        let mut registries = SpatialRegistries::new();
        let mut events = Vec::new();
        for tick in 0..n {
            let mut ctx = MachineContext {
                world: &mut *world,
                registries: &mut registries,
                tick,
                transponder: TransponderSettings::default(),
            };
            forge.tick(&mut ctx, pos, &mut events);
        }
        events
    }

    #[test]
    fn cluster_splits_into_four_shards() {
        let (mut world, pos) = setup(true);
        let mut forge = AcheronForge::default();
        let _ = forge.insert_input(ItemStack::new(ItemKind::AcheroniteCluster, 1));
        let events = tick_n(&mut forge, &mut world, pos, 100);
        assert_eq!(events.len(), 1);
        assert_eq!(forge.take_output(), Some(ItemStack::new(ItemKind::AcheroniteShard, 4)));
        assert_eq!(forge.items.first(), Some(&None));
    }

    #[test]
    fn progress_decays_twice_as_fast_when_heat_is_lost() {
        let (mut world, pos) = setup(true);
        let mut forge = AcheronForge::default();
        let _ = forge.insert_input(ItemStack::new(ItemKind::AcheroniteShard, 1));
        tick_n(&mut forge, &mut world, pos, 60);
        assert_eq!(forge.processing_progress, 60);

        // 60 ticks land on a check boundary, so the next tick sees the loss.
        let _ = world.set_block(BlockPos::new(3, -40, 0), BlockState::AIR);
        tick_n(&mut forge, &mut world, pos, 10);
        assert_eq!(forge.processing_progress, 40);
        tick_n(&mut forge, &mut world, pos, 30);
        assert_eq!(forge.processing_progress, 0);
    }

    #[test]
    fn shallow_forge_never_works() {
        let mut world = ChunkedWorld::default();
        world.load_area(0, 0, 8);
        let pos = BlockPos::new(0, -31, 0);
        let _ = world.set_block(BlockPos::new(1, -31, 0), BlockState::of(BlockKind::Lava));
        let mut forge = AcheronForge::default();
        let _ = forge.insert_input(ItemStack::new(ItemKind::AcheroniteShard, 1));
        tick_n(&mut forge, &mut world, pos, 50);
        assert_eq!(forge.processing_progress, 0);
        assert!(!forge.conditions_met);
    }

    #[test]
    fn full_output_stalls() {
        let (mut world, pos) = setup(true);
        let mut forge = AcheronForge {
            items: [
                Some(ItemStack::new(ItemKind::AcheroniteCluster, 1)),
                Some(ItemStack::new(ItemKind::AcheroniteShard, 62)),
            ],
            ..AcheronForge::default()
        };
        tick_n(&mut forge, &mut world, pos, 20);
        assert_eq!(forge.processing_progress, 0);
    }

    #[test]
    fn only_recipe_inputs_accepted() {
        let mut forge = AcheronForge::default();
        assert!(forge.insert_input(ItemStack::new(ItemKind::Coal, 1)).is_err());
        assert!(forge.insert_input(ItemStack::new(ItemKind::AcheroniteShard, 3)).is_ok());
        assert!(forge.insert_input(ItemStack::new(ItemKind::AcheroniteCluster, 1)).is_err());
    }
}
