//! Voxel world, temperature, and block transformation for the Frostfall simulation.
//!
//! This crate models everything that lives in blocks: the world seam and
//! its in-memory implementation, the phase curves that drive the
//! environment, local temperature, the sampled engines that freeze and kill
//! terrain, the weather roll, and the block-entity machines with the
//! spatial registries they keep current.
//!
//! # Modules
//!
//! - [`voxel`] -- The [`VoxelWorld`] trait and the chunked in-memory world.
//! - [`phase`] -- Phase boundaries, sub-stages, and the interpolated
//!   environment curves including the depth modifier.
//! - [`temperature`] -- Heat source table and [`TemperatureManager`].
//! - [`registry`] -- Lit heater and active geothermal core registries.
//! - [`sampling`] -- The shared [`BlockEngine`] sampling framework.
//! - [`freezer`], [`vegetation`], [`snow`], [`acheronite`], [`atmosphere`]
//!   -- The five block transformation engines, run in that order.
//! - [`weather`] -- Deterministic weather rolls and the snow lock.
//! - [`machines`] -- Transponder, heater, geothermal core, and forge.
//! - [`error`] -- Error types for world and machine operations.

pub mod acheronite;
pub mod atmosphere;
pub mod error;
pub mod freezer;
pub mod machines;
pub mod phase;
pub mod registry;
pub mod sampling;
pub mod snow;
pub mod temperature;
pub mod vegetation;
pub mod voxel;
pub mod weather;

// Re-export primary types at crate root.
pub use acheronite::AcheroniteGrowth;
pub use atmosphere::FrozenAtmosphereFormation;
pub use error::WorldError;
pub use freezer::BlockFreezer;
pub use machines::{
    AcheronForge, ActivationRefusal, GeothermalCore, Machine, MachineContext, MachineEvent,
    MachineEventKind, MachineStore, ThermalHeater, Transponder, TransponderSettings,
    TransponderState,
};
pub use registry::{CoreReach, SpatialRegistries};
pub use sampling::{BlockEngine, EngineContext, SamplingSettings, TransformReport, run_engine};
pub use snow::SnowAccumulator;
pub use temperature::TemperatureManager;
pub use vegetation::VegetationDecay;
pub use voxel::{ChunkedWorld, VoxelWorld};
pub use weather::WeatherSystem;
