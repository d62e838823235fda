//! Shared type definitions for the Frostfall simulation.
//!
//! This crate is the single source of truth for the values that flow
//! between the world, survival, and core crates: identifiers, block and
//! item kinds, positions, stacks, the per-tick environment snapshot, and
//! the outbound client messages.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for players and mobs
//! - [`enums`] -- Block, item, mob, effect, and stage enumerations
//! - [`structs`] -- Positions, block states, item stacks, environment snapshot
//! - [`messages`] -- Client-bound messages queued by the simulation

pub mod enums;
pub mod ids;
pub mod messages;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    ArmorTier, BlockKind, FoodFrostStage, FrostbiteStage, GameMode, ItemKind, MobFreezeStage,
    MobKind, SanityStage, StatusEffect, Weather,
};
pub use ids::{MobId, PlayerId};
pub use messages::{ClientMessage, MessageTarget, Outbound};
pub use structs::{
    BlockPos, BlockState, CHUNK_WIDTH, ChunkPos, EffectInstance, EnvironmentSnapshot, ItemStack,
    MAX_SNOW_LAYERS,
};
