//! Food freezing in player inventories.
//!
//! Below the freeze threshold, and unless the player carries an insulated
//! pack, every food stack gains frost: the held stack three times as fast
//! as the rest. Warmer air thaws food again, except that ruined food stays
//! ruined. Frost is tracked in a per-slot cache and only written back to
//! the stack when its stage changes or on the write-back interval, so item
//! data is not rewritten every run. A cache entry belongs to one stack: it
//! is dropped when the slot's revision moves or the stack's own frost no
//! longer matches what the cache last saw.

use std::collections::BTreeMap;

use frostfall_types::{FoodFrostStage, ItemKind};
use tracing::debug;

use crate::config::{FoodFrostConfig, is_due, per_run, stage_index};
use crate::player::PlayerState;

/// Cached frost of one inventory slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SlotFrost {
    kind: ItemKind,
    revision: u32,
    /// `frost_ticks` on the stack itself after the last run.
    stack_frost: u32,
    frost_ticks: u32,
    stage: FoodFrostStage,
}

/// Per-slot frost cache of one player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoodFrostTracker {
    slots: BTreeMap<usize, SlotFrost>,
}

/// Result of one food frost update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FoodFrostReport {
    /// Food stacks examined.
    pub stacks: u32,
    /// Stacks whose stage changed.
    pub stage_changes: u32,
    /// Stacks that became ruined this run.
    pub ruined: u32,
    /// Stacks written back to the inventory.
    pub written: u32,
}

/// Frost stage for a frost tick count.
pub fn stage_for(frost_ticks: u32, config: &FoodFrostConfig) -> FoodFrostStage {
    FoodFrostStage::from_u8(stage_index(frost_ticks, &config.stage_thresholds))
}

impl FoodFrostTracker {
    /// Advance by one tracker run of `elapsed` ticks.
    pub fn update(
        &mut self,
        player: &mut PlayerState,
        temperature: f64,
        tick: u64,
        elapsed: u32,
        config: &FoodFrostConfig,
    ) -> FoodFrostReport {
        let mut report = FoodFrostReport::default();
        let freezing =
            temperature < config.freeze_temperature && !player.has_item(ItemKind::InsulatedPack);
        let write_due = is_due(tick, config.write_back_interval);
        let held = player.held_slot;
        let revisions: Vec<u32> = (0..player.inventory.len())
            .map(|index| player.slot_revision(index))
            .collect();

        for (index, slot) in player.inventory.iter_mut().enumerate() {
            let Some(stack) = slot.as_mut().filter(|stack| stack.kind.is_food()) else {
                self.slots.remove(&index);
                continue;
            };
            report.stacks = report.stacks.saturating_add(1);
            if stack.ruined {
                self.slots.remove(&index);
                continue;
            }

            let revision = revisions.get(index).copied().unwrap_or(0);
            let cached = match self.slots.get(&index) {
                Some(entry)
                    if entry.kind == stack.kind
                        && entry.revision == revision
                        && entry.stack_frost == stack.frost_ticks =>
                {
                    *entry
                }
                _ => SlotFrost {
                    kind: stack.kind,
                    revision,
                    stack_frost: stack.frost_ticks,
                    frost_ticks: stack.frost_ticks,
                    stage: stage_for(stack.frost_ticks, config),
                },
            };

            let frost_ticks = if freezing {
                let rate = if index == held {
                    config.held_rate
                } else {
                    config.inventory_rate
                };
                cached.frost_ticks.saturating_add(per_run(rate, elapsed))
            } else {
                cached.frost_ticks.saturating_sub(per_run(config.thaw_rate, elapsed))
            };
            let stage = stage_for(frost_ticks, config);
            let changed = stage != cached.stage;

            if changed || write_due {
                stack.frost_ticks = frost_ticks;
                report.written = report.written.saturating_add(1);
            }
            if changed {
                report.stage_changes = report.stage_changes.saturating_add(1);
            }
            if stage == FoodFrostStage::Ruined {
                stack.ruined = true;
                stack.frost_ticks = frost_ticks;
                report.ruined = report.ruined.saturating_add(1);
                self.slots.remove(&index);
                debug!(player = %player.id, slot = index, item = ?stack.kind, "food ruined by frost");
                continue;
            }
            self.slots.insert(
                index,
                SlotFrost {
                    kind: stack.kind,
                    revision,
                    stack_frost: stack.frost_ticks,
                    frost_ticks,
                    stage,
                },
            );
        }
        report
    }

    /// Cached frost ticks for `slot`, if cached.
    pub fn cached_frost(&self, slot: usize) -> Option<u32> {
        self.slots.get(&slot).map(|entry| entry.frost_ticks)
    }

    /// Write every cached value back, e.g. before saving.
    pub fn flush(&mut self, player: &mut PlayerState) {
        for (index, entry) in &mut self.slots {
            let revision = player.slot_revision(*index);
            if let Some(Some(stack)) = player.inventory.get_mut(*index)
                && stack.kind == entry.kind
                && entry.revision == revision
                && entry.stack_frost == stack.frost_ticks
                && !stack.ruined
            {
                stack.frost_ticks = entry.frost_ticks;
                entry.stack_frost = entry.frost_ticks;
            }
        }
    }
}
