//! Player and mob state owned by the simulation.
//!
//! The host's entity objects are replaced by these plain structs. Trackers
//! apply effects and damage here; the host reads them back after a tick.

use std::collections::BTreeMap;

use frostfall_types::{
    ArmorTier, BlockPos, EffectInstance, GameMode, ItemKind, ItemStack, MobId, MobKind, PlayerId,
    StatusEffect,
};
use serde::{Deserialize, Serialize};

use crate::error::SurvivalError;

/// Number of inventory slots a player carries.
pub const INVENTORY_SLOTS: usize = 36;

/// Full player health.
pub const MAX_HEALTH: f64 = 20.0;

/// Effects keyed by kind.
pub type ActiveEffects = BTreeMap<StatusEffect, EffectInstance>;

/// Apply `effect` unless an equal or stronger instance is already running.
///
/// A higher amplifier always wins; at equal amplifier the longer duration
/// wins.
fn merge_effect(effects: &mut ActiveEffects, effect: EffectInstance) {
    let replace = effects.get(&effect.effect).is_none_or(|current| {
        effect.amplifier > current.amplifier
            || (effect.amplifier == current.amplifier
                && effect.duration_ticks > current.duration_ticks)
    });
    if replace {
        effects.insert(effect.effect, effect);
    }
}

/// Count down every effect by `elapsed` ticks and drop expired ones.
fn decay_effects(effects: &mut ActiveEffects, elapsed: u32) {
    effects.retain(|_, instance| {
        instance.duration_ticks = instance.duration_ticks.saturating_sub(elapsed);
        instance.duration_ticks > 0
    });
}

// ---------------------------------------------------------------------------
// PlayerState
// ---------------------------------------------------------------------------

/// A connected player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Stable identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Block position of the player's feet.
    pub pos: BlockPos,
    /// Game mode.
    pub game_mode: GameMode,
    /// Protective armor tier.
    pub armor: ArmorTier,
    /// Health, 0.0 to [`MAX_HEALTH`].
    pub health: f64,
    /// Inventory slots.
    pub inventory: Vec<Option<ItemStack>>,
    /// Index of the held hotbar slot.
    pub held_slot: usize,
    /// Running status effects.
    pub effects: ActiveEffects,
    /// Per-slot counters bumped whenever a slot receives a different stack.
    #[serde(skip)]
    slot_revisions: Vec<u32>,
}

impl PlayerState {
    /// A survival player with full health and an empty inventory.
    pub fn new(id: PlayerId, name: impl Into<String>, pos: BlockPos) -> Self {
        Self {
            id,
            name: name.into(),
            pos,
            game_mode: GameMode::Survival,
            armor: ArmorTier::None,
            health: MAX_HEALTH,
            inventory: vec![None; INVENTORY_SLOTS],
            held_slot: 0,
            effects: ActiveEffects::new(),
            slot_revisions: vec![0; INVENTORY_SLOTS],
        }
    }

    /// Whether survival trackers apply to this player.
    pub fn is_tracked(&self) -> bool {
        !self.game_mode.is_exempt() && self.health > 0.0
    }

    /// Whether the player is alive.
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Apply a status effect.
    pub fn apply_effect(&mut self, effect: EffectInstance) {
        merge_effect(&mut self.effects, effect);
    }

    /// Whether `effect` is running.
    pub fn has_effect(&self, effect: StatusEffect) -> bool {
        self.effects.contains_key(&effect)
    }

    /// Count down effects by `elapsed` ticks.
    pub fn tick_effects(&mut self, elapsed: u32) {
        decay_effects(&mut self.effects, elapsed);
    }

    /// Deal damage; returns `true` if this killed the player.
    pub fn damage(&mut self, amount: f64) -> bool {
        let was_alive = self.is_alive();
        self.health = (self.health - amount).max(0.0);
        was_alive && !self.is_alive()
    }

    /// Whether any slot holds `kind`.
    pub fn has_item(&self, kind: ItemKind) -> bool {
        self.inventory
            .iter()
            .flatten()
            .any(|stack| stack.kind == kind && !stack.is_empty())
    }

    /// Revision of `slot`. It changes whenever the slot receives a
    /// different stack through [`set_slot`](Self::set_slot) or
    /// [`give`](Self::give); taking from or topping up a stack keeps it.
    pub fn slot_revision(&self, slot: usize) -> u32 {
        self.slot_revisions.get(slot).copied().unwrap_or(0)
    }

    fn replace_slot_revision(&mut self, slot: usize) {
        if self.slot_revisions.len() < self.inventory.len() {
            self.slot_revisions.resize(self.inventory.len(), 0);
        }
        if let Some(revision) = self.slot_revisions.get_mut(slot) {
            *revision = revision.wrapping_add(1);
        }
    }

    /// Put a stack into `slot`, replacing its contents.
    pub fn set_slot(&mut self, slot: usize, stack: Option<ItemStack>) -> Result<(), SurvivalError> {
        let len = self.inventory.len();
        let cell = self
            .inventory
            .get_mut(slot)
            .ok_or(SurvivalError::SlotOutOfRange { slot, len })?;
        *cell = stack;
        self.replace_slot_revision(slot);
        Ok(())
    }

    /// Take one item from `slot`, returning it as a one-item stack.
    pub fn take_one(&mut self, slot: usize) -> Result<Option<ItemStack>, SurvivalError> {
        let len = self.inventory.len();
        let cell = self
            .inventory
            .get_mut(slot)
            .ok_or(SurvivalError::SlotOutOfRange { slot, len })?;
        let Some(stack) = cell.as_mut() else {
            return Ok(None);
        };
        if !stack.take_one() {
            return Ok(None);
        }
        let taken = ItemStack {
            count: 1,
            ..stack.clone()
        };
        if stack.is_empty() {
            *cell = None;
        }
        Ok(Some(taken))
    }

    /// Merge `stack` into the inventory; returns what did not fit.
    pub fn give(&mut self, mut stack: ItemStack) -> Option<ItemStack> {
        let max = stack.kind.max_stack();
        for slot in self.inventory.iter_mut().flatten() {
            if stack.is_empty() {
                return None;
            }
            if slot.kind == stack.kind && !slot.ruined && slot.count < max {
                let moved = max.saturating_sub(slot.count).min(stack.count);
                slot.count = slot.count.saturating_add(moved);
                stack.count = stack.count.saturating_sub(moved);
            }
        }
        let mut filled = Vec::new();
        for (index, slot) in self.inventory.iter_mut().enumerate() {
            if stack.is_empty() {
                break;
            }
            if slot.is_none() {
                let moved = max.min(stack.count);
                *slot = Some(ItemStack {
                    count: moved,
                    ..stack.clone()
                });
                stack.count = stack.count.saturating_sub(moved);
                filled.push(index);
            }
        }
        for index in filled {
            self.replace_slot_revision(index);
        }
        (!stack.is_empty()).then_some(stack)
    }
}

// ---------------------------------------------------------------------------
// MobState
// ---------------------------------------------------------------------------

/// A non-player mob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobState {
    /// Stable identifier.
    pub id: MobId,
    /// Mob kind.
    pub kind: MobKind,
    /// Block position.
    pub pos: BlockPos,
    /// Health; the mob is dead at 0.0.
    pub health: f64,
    /// Running status effects.
    pub effects: ActiveEffects,
}

impl MobState {
    /// A fresh mob with the given health.
    pub fn new(id: MobId, kind: MobKind, pos: BlockPos, health: f64) -> Self {
        Self {
            id,
            kind,
            pos,
            health,
            effects: ActiveEffects::new(),
        }
    }

    /// Whether the mob is alive.
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Apply a status effect.
    pub fn apply_effect(&mut self, effect: EffectInstance) {
        merge_effect(&mut self.effects, effect);
    }

    /// Count down effects by `elapsed` ticks.
    pub fn tick_effects(&mut self, elapsed: u32) {
        decay_effects(&mut self.effects, elapsed);
    }

    /// Deal damage; returns `true` if this killed the mob.
    pub fn damage(&mut self, amount: f64) -> bool {
        let was_alive = self.is_alive();
        self.health = (self.health - amount).max(0.0);
        was_alive && !self.is_alive()
    }

    /// Kill outright.
    pub const fn kill(&mut self) {
        self.health = 0.0;
    }
}

// ---------------------------------------------------------------------------
// PlayerConditions
// ---------------------------------------------------------------------------

/// World-derived facts about a player's surroundings for one tracker run.
///
/// The caller computes these from the world and registries; trackers never
/// read blocks themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerConditions {
    /// Temperature at the player, in °C.
    pub temperature: f64,
    /// Whether any heat source warms the player.
    pub comforted: bool,
    /// Whether daylight or a light-emitting block reaches the player.
    pub lit: bool,
    /// Whether the player stands inside an active core's breathable zone.
    pub oxygenated: bool,
}

impl Default for PlayerConditions {
    fn default() -> Self {
        Self {
            temperature: 10.0,
            comforted: false,
            lit: true,
            oxygenated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> PlayerState {
        PlayerState::new(PlayerId::new(), "Ada", BlockPos::new(0, 64, 0))
    }

    #[test]
    fn stronger_effects_replace_weaker() {
        let mut p = player();
        p.apply_effect(EffectInstance::new(StatusEffect::Slowness, 0, 100));
        p.apply_effect(EffectInstance::new(StatusEffect::Slowness, 2, 20));
        assert_eq!(p.effects.get(&StatusEffect::Slowness).map(|e| e.amplifier), Some(2));
        p.apply_effect(EffectInstance::new(StatusEffect::Slowness, 1, 500));
        assert_eq!(p.effects.get(&StatusEffect::Slowness).map(|e| e.amplifier), Some(2));
    }

    #[test]
    fn effects_expire() {
        let mut p = player();
        p.apply_effect(EffectInstance::new(StatusEffect::Nausea, 0, 30));
        p.tick_effects(20);
        assert!(p.has_effect(StatusEffect::Nausea));
        p.tick_effects(20);
        assert!(!p.has_effect(StatusEffect::Nausea));
    }

    #[test]
    fn damage_reports_the_killing_blow_once() {
        let mut p = player();
        assert!(!p.damage(19.0));
        assert!(p.damage(5.0));
        assert!(!p.damage(1.0));
        assert!(p.health.abs() < f64::EPSILON);
    }

    #[test]
    fn give_merges_then_fills_empty_slots() {
        let mut p = player();
        let _ = p.set_slot(3, Some(ItemStack::new(ItemKind::Bread, 60)));
        assert!(p.give(ItemStack::new(ItemKind::Bread, 10)).is_none());
        assert_eq!(p.inventory.get(3).cloned().flatten().map(|s| s.count), Some(64));
        assert_eq!(p.inventory.first().cloned().flatten().map(|s| s.count), Some(6));
    }

    #[test]
    fn take_one_empties_slot() {
        let mut p = player();
        let _ = p.set_slot(0, Some(ItemStack::new(ItemKind::Coal, 1)));
        let taken = p.take_one(0).ok().flatten();
        assert_eq!(taken, Some(ItemStack::new(ItemKind::Coal, 1)));
        assert_eq!(p.inventory.first(), Some(&None));
        assert!(matches!(p.take_one(99), Err(SurvivalError::SlotOutOfRange { .. })));
    }

    #[test]
    fn new_stacks_bump_slot_revision_but_taking_does_not() {
        let mut p = player();
        let start = p.slot_revision(0);
        let _ = p.set_slot(0, Some(ItemStack::new(ItemKind::Bread, 4)));
        let placed = p.slot_revision(0);
        assert_ne!(placed, start);
        let _ = p.take_one(0);
        assert!(p.give(ItemStack::new(ItemKind::Bread, 2)).is_none());
        assert_eq!(p.slot_revision(0), placed);
        assert!(p.give(ItemStack::new(ItemKind::Apple, 1)).is_none());
        assert_ne!(p.slot_revision(1), 0);
    }
}
