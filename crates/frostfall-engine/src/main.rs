//! Engine binary for the Frostfall simulation.
//!
//! This is the main entry point that wires together the tick cycle, the
//! demo world, the player spawner and the admin console. It loads
//! configuration, restores the last save if there is one, and runs the
//! simulation loop until stopped.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `frostfall-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the demo terrain
//! 4. Restore the world save, if present
//! 5. Place machines, players and mobs
//! 6. Run the tick loop with the stdin console
//! 7. Save and log the result

mod error;
mod runner;
mod spawner;

use std::path::{Path, PathBuf};
use std::time::Duration;

use frostfall_core::tick::SimulationState;
use frostfall_core::{SimulationConfig, WorldSave};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::runner::RunOptions;
use crate::spawner::DemoConfig;

/// Config file looked up in the working directory.
const CONFIG_PATH: &str = "frostfall-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = Path::new(CONFIG_PATH);
    let found = config_path.exists();
    let config = if found {
        SimulationConfig::from_file(config_path)?
    } else {
        SimulationConfig::default()
    };

    // 2. Initialize structured logging. RUST_LOG wins over the config level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!("frostfall-engine starting");
    if !found {
        info!("Config file not found, using defaults");
    }
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        tick_interval_ms = config.world.tick_interval_ms,
        total_days = config.apocalypse.total_days,
        phase6_enabled = config.apocalypse.phase6_enabled,
        "Configuration loaded"
    );

    // 3. Build the demo terrain.
    let demo = load_demo_config(config_path)?;
    let mut rng = SmallRng::seed_from_u64(config.world.seed);
    let world = spawner::build_world(&config, &demo, &mut rng)?;
    let save_path = PathBuf::from(&config.world.save_path);
    let tick_interval = Duration::from_millis(config.world.tick_interval_ms);
    let mut state = SimulationState::with_world(config, world)?;

    // 4. Restore the world save.
    if save_path.exists() {
        match WorldSave::load(&save_path).and_then(|save| save.apply(&mut state)) {
            Ok(report) => info!(
                path = %save_path.display(),
                machines = report.machines,
                trackers = report.trackers,
                dropped = report.dropped,
                "World save restored"
            ),
            Err(err) => warn!(path = %save_path.display(), error = %err, "World save ignored"),
        }
    }

    // 5. Populate.
    let spawned = spawner::populate(&mut state, &demo, &mut rng)?;
    info!(
        players = spawned.players.len(),
        mobs = spawned.mobs,
        "Demo world ready, entering tick loop"
    );

    // 6. Run.
    let options = RunOptions {
        tick_interval,
        save_path,
        max_ticks: None,
        status_every: 200,
    };
    let input = BufReader::new(tokio::io::stdin());
    let result = runner::run(&mut state, &options, input).await?;

    // 7. Log results.
    runner::log_run_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "frostfall-engine shutdown complete"
    );

    Ok(())
}

/// Load the demo section of the config file.
///
/// If the file does not exist or lacks the `demo` key, defaults are used.
fn load_demo_config(path: &Path) -> Result<DemoConfig, EngineError> {
    if !path.exists() {
        return Ok(DemoConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Spawner {
        message: format!("failed to read config file: {e}"),
    })?;
    let raw: serde_yml::Value = serde_yml::from_str(&contents).map_err(|e| EngineError::Spawner {
        message: format!("failed to parse config YAML: {e}"),
    })?;
    match raw.get("demo") {
        Some(section) => serde_yml::from_value(section.clone()).map_err(|e| EngineError::Spawner {
            message: format!("failed to parse demo config: {e}"),
        }),
        None => Ok(DemoConfig::default()),
    }
}
