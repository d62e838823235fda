//! Fuel-burning thermal heater.

use frostfall_types::{BlockPos, ItemStack};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{MachineContext, MachineEvent, MachineEventKind};

/// A heater: one fuel slot and a burn countdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThermalHeater {
    /// Ticks left on the item currently burning.
    pub burn_time_remaining: u32,
    /// Queued fuel.
    pub fuel: Option<ItemStack>,
    /// Lit flag as last written to the block.
    #[serde(default)]
    lit: bool,
}

impl ThermalHeater {
    /// Whether the heater is burning.
    pub const fn is_lit(&self) -> bool {
        self.lit
    }

    /// Add fuel. Returns the part that did not fit, or the whole stack back
    /// if it is not fuel or does not match the queued kind.
    pub fn insert_fuel(&mut self, stack: ItemStack) -> Result<Option<ItemStack>, ItemStack> {
        if stack.kind.fuel_ticks().is_none() {
            return Err(stack);
        }
        let max = stack.kind.max_stack();
        match &mut self.fuel {
            Some(queued) if queued.kind != stack.kind => Err(stack),
            Some(queued) => {
                let room = max.saturating_sub(queued.count);
                let moved = room.min(stack.count);
                queued.count = queued.count.saturating_add(moved);
                Ok(leftover(stack, moved))
            }
            None => {
                let moved = max.min(stack.count);
                self.fuel = Some(ItemStack::new(stack.kind, moved));
                Ok(leftover(stack, moved))
            }
        }
    }

    /// Advance one tick: burn, refuel when spent, and sync the lit flag.
    ///
    /// The block's `lit` property and the heater registry change only when
    /// the heater goes from burning to cold or back.
    pub(crate) fn tick(
        &mut self,
        ctx: &mut MachineContext<'_>,
        pos: BlockPos,
        events: &mut Vec<MachineEvent>,
    ) {
        self.burn_time_remaining = self.burn_time_remaining.saturating_sub(1);
        if self.burn_time_remaining == 0 {
            self.refuel();
        }

        let burning = self.burn_time_remaining > 0;
        if burning == self.lit {
            return;
        }
        let state = ctx.world.block(pos).with_lit(burning);
        if let Err(err) = ctx.world.set_block(pos, state) {
            debug!(%pos, error = %err, "heater block update skipped");
            return;
        }
        self.lit = burning;
        if burning {
            ctx.registries.heaters.insert(pos);
            events.push(MachineEvent {
                pos,
                kind: MachineEventKind::HeaterLit,
            });
        } else {
            ctx.registries.heaters.remove(pos);
            events.push(MachineEvent {
                pos,
                kind: MachineEventKind::HeaterExtinguished,
            });
        }
    }

    fn refuel(&mut self) {
        let Some(fuel) = &mut self.fuel else {
            return;
        };
        let Some(ticks) = fuel.kind.fuel_ticks() else {
            return;
        };
        if fuel.take_one() {
            self.burn_time_remaining = ticks;
        }
        if fuel.is_empty() {
            self.fuel = None;
        }
    }

    /// Queued fuel returned on removal.
    pub fn drops(&self) -> Vec<ItemStack> {
        self.fuel.iter().filter(|stack| !stack.is_empty()).cloned().collect()
    }
}

/// What remains of `stack` after `moved` items were taken.
pub(crate) fn leftover(stack: ItemStack, moved: u32) -> Option<ItemStack> {
    let rest = stack.count.saturating_sub(moved);
    (rest > 0).then(|| ItemStack { count: rest, ..stack })
}
