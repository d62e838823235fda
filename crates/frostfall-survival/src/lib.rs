//! Player and mob survival mechanics for the Frostfall simulation.
//!
//! Trackers here never read the world. The caller measures each player's
//! surroundings into [`PlayerConditions`] and passes them in; the trackers
//! turn those into counters, stages, effects, damage and client messages.
//!
//! # Modules
//!
//! - [`config`] -- Per-tracker tuning with YAML-friendly defaults.
//! - [`player`] -- [`PlayerState`], [`MobState`] and [`PlayerConditions`].
//! - [`frostbite`] -- Cold exposure with armor grace and cooling.
//! - [`exposure`] -- Heat stroke and collapse suffocation.
//! - [`sanity`] -- Isolation, comfort grace and sanity stages.
//! - [`food_frost`] -- Per-slot food freezing with sticky ruin.
//! - [`mob_freeze`] -- Freezing of mobs near players.
//! - [`trackers`] -- The [`SurvivalTrackers`] context that runs them all.
//! - [`error`] -- Error types for roster and inventory operations.

pub mod config;
pub mod error;
pub mod exposure;
pub mod food_frost;
pub mod frostbite;
pub mod mob_freeze;
pub mod player;
pub mod sanity;
pub mod trackers;

// Re-export primary types at crate root.
pub use config::{SurvivalConfig, TRACKER_INTERVAL};
pub use error::SurvivalError;
pub use player::{MobState, PlayerConditions, PlayerState};
pub use trackers::{MobRun, PlayerRun, PlayerTrackers, SurvivalTrackers, TrackerSnapshot};
