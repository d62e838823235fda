//! Apocalypse clock, tick cycle, and orchestration for the Frostfall simulation.
//!
//! This crate owns the ordered tick dispatch that drives the frozen world:
//! Clock, Transitions, Machines, Terrain, Survival, and Sync.
//!
//! # Modules
//!
//! - [`apocalypse`] -- The persistent [`ApocalypseState`] counter and the
//!   [`Timeline`] that turns it into days, phases and an environment.
//! - [`config`] -- Configuration loading from `frostfall-config.yaml` into
//!   strongly-typed structs, plus runtime presets.
//! - [`tick`] -- [`SimulationState`] and the [`run_tick`] dispatcher.
//! - [`sync`] -- Batched client messages.
//! - [`admin`] -- Text admin commands.
//! - [`persistence`] -- JSON world saves.
//!
//! [`ApocalypseState`]: apocalypse::ApocalypseState
//! [`Timeline`]: apocalypse::Timeline
//! [`SimulationState`]: tick::SimulationState
//! [`run_tick`]: tick::run_tick

pub mod admin;
pub mod apocalypse;
pub mod config;
pub mod persistence;
pub mod sync;
pub mod tick;

pub use admin::{AdminCommand, AdminError, AdminReply};
pub use apocalypse::{ApocalypseError, ApocalypseState, Timeline};
pub use config::{ConfigError, Preset, SimulationConfig};
pub use persistence::{LoadReport, PersistError, WorldSave};
pub use tick::{Interaction, InteractOutcome, SimulationState, TickError, TickSummary, run_tick};
