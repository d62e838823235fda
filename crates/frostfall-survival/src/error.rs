//! Error types for the frostfall-survival crate.
//!
//! Tracker updates themselves cannot fail; these errors come from roster
//! and inventory operations on [`PlayerState`](crate::player::PlayerState).

use frostfall_types::{MobId, PlayerId};

/// Errors that can occur during survival state operations.
#[derive(Debug, thiserror::Error)]
pub enum SurvivalError {
    /// Player with the given ID is not on the roster.
    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// Player with the given ID is already on the roster.
    #[error("player already joined: {0}")]
    DuplicatePlayer(PlayerId),

    /// Mob with the given ID is not tracked.
    #[error("mob not found: {0}")]
    MobNotFound(MobId),

    /// Inventory slot index is past the end of the inventory.
    #[error("inventory slot {slot} out of range (inventory has {len} slots)")]
    SlotOutOfRange {
        /// The requested slot.
        slot: usize,
        /// Number of slots.
        len: usize,
    },
}
