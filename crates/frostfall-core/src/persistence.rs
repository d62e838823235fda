//! World save persistence.
//!
//! A [`WorldSave`] captures everything the simulation owns that must outlive
//! a restart: the apocalypse counter, the satellite flag, survival counters,
//! machine state and runtime config overrides. Blocks themselves belong to
//! the host world and are not saved here, except that machine blocks are
//! re-placed on load so the store and the world agree.
//!
//! Saves are JSON. Tracker entries are kept as raw values so that one
//! malformed entry is dropped with a warning instead of failing the load.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use frostfall_survival::TrackerSnapshot;
use frostfall_survival::frostbite::FrostbiteTracker;
use frostfall_survival::sanity::SanityTracker;
use frostfall_types::{BlockState, PlayerId, Weather};
use frostfall_world::{Machine, MachineStore, VoxelWorld};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::apocalypse::ApocalypseState;
use crate::tick::{SimulationState, TickError};

/// Current save format version.
pub const SAVE_VERSION: u32 = 1;

/// Errors that can occur while reading or writing a save.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Reading or writing the save file failed.
    #[error("save file I/O failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The save is not valid JSON for this format.
    #[error("save file is malformed: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The save was written by a newer format.
    #[error("save version {found} is newer than supported version {SAVE_VERSION}")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
    },

    /// Applying the save to the simulation failed.
    #[error("applying save failed: {source}")]
    Apply {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Runtime config changes that survive a restart (admin presets).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    /// Main timeline length in days.
    pub total_days: Option<u32>,
    /// Geothermal strength multiplier.
    pub geo_strength_multiplier: Option<f64>,
    /// Heat source multiplier.
    pub heat_multiplier: Option<f64>,
}

/// Everything persisted for one world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSave {
    /// Format version.
    pub version: u32,
    /// When the save was written.
    pub saved_at: DateTime<Utc>,
    /// The apocalypse counter.
    pub apocalypse: ApocalypseState,
    /// Whether a transponder completed its broadcast.
    #[serde(default)]
    pub satellite_placed: bool,
    /// Whether the counter was paused.
    #[serde(default)]
    pub paused: bool,
    /// Host world time in ticks.
    #[serde(default)]
    pub world_time: u64,
    /// Weather at save time.
    #[serde(default = "default_weather")]
    pub weather: Weather,
    /// Sanity per player, keyed by UUID string.
    #[serde(default)]
    pub sanity: BTreeMap<String, serde_json::Value>,
    /// Frostbite per player, keyed by UUID string.
    #[serde(default)]
    pub frostbite: BTreeMap<String, serde_json::Value>,
    /// Players allowed to start a transponder.
    #[serde(default)]
    pub unlocked_schematics: Vec<String>,
    /// Machine state.
    #[serde(default)]
    pub machines: MachineStore,
    /// Config overrides.
    #[serde(default)]
    pub overrides: ConfigOverrides,
}

/// What a load kept and what it dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Tracker entries restored.
    pub trackers: u32,
    /// Machines restored.
    pub machines: u32,
    /// Malformed entries skipped.
    pub dropped: u32,
}

impl WorldSave {
    /// Capture the persistent parts of `state`.
    pub fn capture(state: &SimulationState) -> Result<Self, PersistError> {
        let snapshot = state.trackers.snapshot();
        Ok(Self {
            version: SAVE_VERSION,
            saved_at: Utc::now(),
            apocalypse: state.apocalypse,
            satellite_placed: state.satellite_placed,
            paused: state.paused,
            world_time: state.world_time,
            weather: state.weather.current(),
            sanity: keyed_values(snapshot.sanity)?,
            frostbite: keyed_values(snapshot.frostbite)?,
            unlocked_schematics: state
                .unlocked_schematics
                .iter()
                .map(ToString::to_string)
                .collect(),
            machines: state.machines.clone(),
            overrides: ConfigOverrides {
                total_days: Some(state.config.apocalypse.total_days),
                geo_strength_multiplier: Some(state.config.apocalypse.geo_strength_multiplier),
                heat_multiplier: Some(state.config.apocalypse.heat_multiplier),
            },
        })
    }

    /// Restore this save into `state`.
    ///
    /// Malformed tracker keys, tracker values and schematic ids are skipped
    /// with a warning. Machine blocks are written back into loaded chunks and
    /// the spatial registries are rebuilt from the restored machines.
    pub fn apply(self, state: &mut SimulationState) -> Result<LoadReport, PersistError> {
        if self.version > SAVE_VERSION {
            return Err(PersistError::UnsupportedVersion {
                found: self.version,
            });
        }
        let mut report = LoadReport::default();

        let overrides = self.overrides;
        if let Some(days) = overrides.total_days {
            state.config.apocalypse.total_days = days;
        }
        if let Some(geo) = overrides.geo_strength_multiplier {
            state.config.apocalypse.geo_strength_multiplier = geo;
        }
        if let Some(heat) = overrides.heat_multiplier {
            state.config.apocalypse.heat_multiplier = heat;
        }
        state.apply_tuning()?;

        state.apocalypse = self.apocalypse;
        state.satellite_placed = self.satellite_placed;
        state.paused = self.paused;
        state.world_time = self.world_time;
        state.weather.set_current(self.weather);

        let snapshot = TrackerSnapshot {
            sanity: parse_keyed::<SanityTracker>("sanity", self.sanity, &mut report),
            frostbite: parse_keyed::<FrostbiteTracker>("frostbite", self.frostbite, &mut report),
        };
        let restored = snapshot.sanity.len().saturating_add(snapshot.frostbite.len());
        report.trackers = u32::try_from(restored).unwrap_or(u32::MAX);
        state.trackers.clear();
        state.trackers.restore(snapshot);

        state.unlocked_schematics.clear();
        for raw in &self.unlocked_schematics {
            match PlayerId::parse(raw) {
                Some(id) => {
                    state.unlocked_schematics.insert(id);
                }
                None => {
                    warn!(key = %raw, "dropping malformed schematic unlock");
                    report.dropped = report.dropped.saturating_add(1);
                }
            }
        }

        state.machines = self.machines;
        replace_machine_blocks(&state.machines, &mut state.world);
        state
            .machines
            .rebuild_registries(&state.world, &mut state.registries);
        report.machines = u32::try_from(state.machines.len()).unwrap_or(u32::MAX);

        let env = state.refresh_environment();
        info!(
            day = env.day,
            phase = env.phase,
            machines = report.machines,
            trackers = report.trackers,
            dropped = report.dropped,
            "world save applied"
        );
        Ok(report)
    }

    /// Encode as pretty JSON.
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON.
    pub fn from_json(raw: &str) -> Result<Self, PersistError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Write to `path`.
    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        std::fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), "world saved");
        Ok(())
    }

    /// Read from `path`.
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}

const fn default_weather() -> Weather {
    Weather::Clear
}

fn keyed_values<T: Serialize>(
    entries: BTreeMap<PlayerId, T>,
) -> Result<BTreeMap<String, serde_json::Value>, PersistError> {
    entries
        .into_iter()
        .map(|(id, value)| Ok((id.to_string(), serde_json::to_value(value)?)))
        .collect()
}

fn parse_keyed<T: DeserializeOwned>(
    section: &'static str,
    entries: BTreeMap<String, serde_json::Value>,
    report: &mut LoadReport,
) -> BTreeMap<PlayerId, T> {
    let mut parsed = BTreeMap::new();
    for (key, value) in entries {
        let Some(id) = PlayerId::parse(&key) else {
            warn!(section, %key, "dropping entry with malformed player id");
            report.dropped = report.dropped.saturating_add(1);
            continue;
        };
        match serde_json::from_value(value) {
            Ok(tracker) => {
                parsed.insert(id, tracker);
            }
            Err(err) => {
                warn!(section, %key, error = %err, "dropping malformed tracker entry");
                report.dropped = report.dropped.saturating_add(1);
            }
        }
    }
    parsed
}

fn replace_machine_blocks(machines: &MachineStore, world: &mut dyn VoxelWorld) {
    for (pos, machine) in machines.iter() {
        if !world.is_loaded(pos) {
            continue;
        }
        let lit = matches!(machine, Machine::Heater(heater) if heater.is_lit());
        let state = BlockState {
            lit,
            ..BlockState::of(machine.block_kind())
        };
        if let Err(err) = world.set_block(pos, state) {
            warn!(%pos, error = %err, "could not restore machine block");
        }
    }
}
