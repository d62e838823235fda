//! Cross-module scenarios for `frostfall-core`.
//!
//! Each test drives a [`SimulationState`] through many ticks on a small
//! hand-built world and checks behavior that spans the clock, machines,
//! survival trackers, admin commands and persistence together.

// Scenario tests use unwrap extensively for clarity -- panicking on failure
// is the correct behavior in test code.
#![allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::missing_panics_doc
)]

use frostfall_core::admin;
use frostfall_core::config::SimulationConfig;
use frostfall_core::tick::{Interaction, InteractOutcome, SimulationState, TickSummary, run_tick};
use frostfall_core::WorldSave;
use frostfall_survival::PlayerState;
use frostfall_types::{
    BlockKind, BlockPos, BlockState, ClientMessage, ItemKind, ItemStack, MessageTarget, PlayerId,
};
use frostfall_world::{ChunkedWorld, TransponderState};

// =============================================================================
// Fixtures
// =============================================================================

fn state_with(config: SimulationConfig) -> SimulationState {
    let mut world = ChunkedWorld::new(config.world.min_y, config.world.max_y);
    world.load_area(0, 0, 32);
    SimulationState::with_world(config, world).unwrap()
}

fn join(state: &mut SimulationState, name: &str, pos: BlockPos) -> PlayerId {
    let player = PlayerState::new(PlayerId::new(), name, pos);
    let id = player.id;
    state.player_join(player).unwrap();
    id
}

fn run(state: &mut SimulationState, ticks: u32) -> Vec<TickSummary> {
    (0..ticks).map(|_| run_tick(state).unwrap()).collect()
}

// =============================================================================
// Timeline
// =============================================================================

#[test]
fn accelerated_timeline_walks_every_phase_in_order() {
    let mut config = SimulationConfig::default();
    config.world.ticks_per_day = 100;
    config.apocalypse.total_days = 10;
    config.apocalypse.phase6_days = 2;
    let mut state = state_with(config);

    let summaries = run(&mut state, 1_250);
    let phases: Vec<u8> = summaries.iter().map(|s| s.phase).collect();
    assert!(phases.windows(2).all(|w| w.first() <= w.get(1)));
    for phase in 1..=6 {
        assert!(phases.contains(&phase), "phase {phase} never reached");
    }
    let last = summaries.last().unwrap();
    assert_eq!((last.phase, last.sub_stage), (6, 3));

    let notices = state
        .drain_outbound()
        .into_iter()
        .filter(|o| o.target == MessageTarget::All)
        .filter(|o| matches!(o.message, ClientMessage::Notice { .. }))
        .count();
    // Phases 1-5 plus three collapse sub-stages.
    assert_eq!(notices, 8);
}

#[test]
fn sleeping_through_nights_crosses_a_phase_boundary() {
    let mut state = state_with(SimulationConfig::default());
    run(&mut state, 1);
    admin::handle(&mut state, "set-day 14").unwrap();
    state.drain_outbound();

    state.world_time = 12_000;
    assert_eq!(state.skip_night().unwrap(), 12_000);
    assert_eq!(state.environment().phase, 1);

    state.world_time = 36_000;
    assert_eq!(state.skip_night().unwrap(), 12_000);
    assert_eq!(state.environment().phase, 2);
}

// =============================================================================
// Machines
// =============================================================================

#[test]
fn powered_transponder_with_clear_shaft_places_the_satellite() {
    let mut config = SimulationConfig::default();
    config.world.min_y = -32;
    config.world.max_y = 32;
    config.transponder.total_broadcast_ticks = 300;
    let mut state = state_with(config);

    let id = join(&mut state, "Vale", BlockPos::new(1, -9, 0));
    let pos = BlockPos::new(0, -10, 0);
    state
        .place_block(pos, BlockState::of(BlockKind::Transponder))
        .unwrap();
    state
        .place_block(BlockPos::new(2, -10, 0), BlockState::of(BlockKind::PowerCell))
        .unwrap();

    let locked = state.interact_machine(id, pos, Interaction::Toggle).unwrap();
    assert!(matches!(locked, InteractOutcome::Refused(_)));

    assert!(state.unlock_schematic(id).unwrap());
    let started = state.interact_machine(id, pos, Interaction::Toggle).unwrap();
    assert_eq!(started, InteractOutcome::Transponder(TransponderState::Broadcasting));

    let summaries = run(&mut state, 400);
    assert_eq!(summaries.iter().filter(|s| s.satellite_placed).count(), 1);
    assert!(state.satellite_placed);
    assert!(state.drain_outbound().iter().any(|o| o.target == MessageTarget::All
        && matches!(&o.message, ClientMessage::Notice { text } if text.contains("orbit"))));
}

#[test]
fn fueled_heater_warms_its_surroundings() {
    let mut state = state_with(SimulationConfig::default());
    let timeline = *state.timeline();
    state.apocalypse.set_phase(4, None, &timeline).unwrap();
    let id = join(&mut state, "Ash", BlockPos::new(0, 64, 0));
    let heater = BlockPos::new(1, 64, 0);
    state
        .place_block(heater, BlockState::of(BlockKind::ThermalHeater))
        .unwrap();
    state
        .players
        .get_mut(&id)
        .unwrap()
        .set_slot(0, Some(ItemStack::new(ItemKind::Coal, 8)))
        .unwrap();
    let inserted = state
        .interact_machine(id, heater, Interaction::InsertHeld)
        .unwrap();
    assert_eq!(inserted, InteractOutcome::Inserted { accepted: 8 });

    run(&mut state, 5);
    assert!(state.registries.heaters.warms(BlockPos::new(0, 64, 0)));
    let near = state.temperature_at(BlockPos::new(0, 64, 0));
    let far = state.temperature_at(BlockPos::new(40, 64, 40));
    assert!(near > far, "near {near} should beat far {far}");
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn save_file_restores_progress_after_restart() {
    let mut state = state_with(SimulationConfig::default());
    let id = join(&mut state, "Kestrel", BlockPos::new(0, 64, 0));
    state.unlock_schematic(id).unwrap();
    admin::handle(&mut state, "set-phase 3").unwrap();
    admin::handle(&mut state, "preset long").unwrap();
    run(&mut state, 40);

    let path = std::env::temp_dir().join(format!("frostfall-save-{}.json", PlayerId::new()));
    WorldSave::capture(&state).unwrap().save(&path).unwrap();

    let mut restarted = state_with(SimulationConfig::default());
    let report = WorldSave::load(&path).unwrap().apply(&mut restarted).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(report.dropped, 0);
    assert_eq!(restarted.config.apocalypse.total_days, 200);
    assert_eq!(restarted.apocalypse, state.apocalypse);
    assert_eq!(restarted.environment().phase, state.environment().phase);
    assert!(restarted.unlocked_schematics.contains(&id));
    assert!(restarted.trackers.player(id).is_some());
}
