//! Tick cycle: the ordered dispatch that drives the Frostfall simulation.
//!
//! Each call to [`run_tick`] runs these steps in a fixed order:
//!
//! 1. **Clock** -- advance world time and, unless paused, the apocalypse
//!    counter; derive this tick's [`EnvironmentSnapshot`] and roll weather.
//! 2. **Transitions** -- log and announce phase and sub-stage changes.
//! 3. **Machines** -- heaters, cores, forges, transponders. Heaters and
//!    cores refresh the spatial registries that temperature reads; machines
//!    in unloaded chunks drop out of them first.
//! 4. **Terrain** -- block freezer, vegetation decay, snow, acheronite,
//!    frozen atmosphere.
//! 5. **Survival** -- frostbite, exposure, sanity and food frost for every
//!    player on the tracker interval, then mob freeze on its own interval.
//! 6. **Sync** -- batched client messages.
//!
//! The only path from player behavior back into timing is
//! [`SimulationState::skip_night`], which moves world time and with it the
//! apocalypse counter.

use std::collections::{BTreeMap, BTreeSet};

use frostfall_survival::{
    MobState, PlayerConditions, PlayerState, SurvivalError, SurvivalTrackers,
};
use frostfall_types::{
    BlockPos, BlockState, ChunkPos, ClientMessage, EnvironmentSnapshot, ItemStack, MobId, Outbound,
    PlayerId, Weather,
};
use frostfall_world::machines::MachineEventKind;
use frostfall_world::{
    AcheroniteGrowth, ActivationRefusal, BlockEngine, BlockFreezer, ChunkedWorld, EngineContext,
    FrozenAtmosphereFormation, Machine, MachineContext, MachineEvent, MachineStore,
    SnowAccumulator, SpatialRegistries, TemperatureManager, TransformReport, TransponderState,
    VegetationDecay, VoxelWorld, WeatherSystem, WorldError, run_engine, temperature,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info, warn};

use crate::apocalypse::{ApocalypseError, ApocalypseState, Timeline};
use crate::config::SimulationConfig;
use crate::sync::ClientSync;

/// Errors that can occur during tick execution and player interaction.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The apocalypse counter failed.
    #[error("apocalypse error: {source}")]
    Apocalypse {
        /// The underlying counter error.
        #[from]
        source: ApocalypseError,
    },

    /// A world or machine operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A roster or inventory operation failed.
    #[error("survival error: {source}")]
    Survival {
        /// The underlying survival error.
        #[from]
        source: SurvivalError,
    },

    /// The server tick counter would overflow.
    #[error("server tick counter overflow")]
    TickOverflow,
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Phase during this tick.
    pub phase: u8,
    /// Collapse sub-stage during this tick.
    pub sub_stage: u8,
    /// Weather during this tick.
    pub weather: Weather,
    /// Players the survival trackers ran for (0 off-interval).
    pub players_tracked: u32,
    /// Combined block engine work.
    pub terrain: TransformReport,
    /// What machines did.
    pub machine_events: Vec<MachineEvent>,
    /// Players who died this tick.
    pub deaths: Vec<PlayerId>,
    /// Mobs frozen to death this tick.
    pub mobs_killed: Vec<MobId>,
    /// Whether a transponder completed the satellite this tick.
    pub satellite_placed: bool,
}

/// A player's use of a machine block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Start, pause or resume a transponder.
    Toggle,
    /// Put the held stack into the machine.
    InsertHeld,
    /// Take the forge output.
    TakeOutput,
}

/// Result of an [`Interaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractOutcome {
    /// The transponder is now in this state.
    Transponder(TransponderState),
    /// The transponder refused to start.
    Refused(ActivationRefusal),
    /// Items moved into the machine.
    Inserted {
        /// Number of items the machine took.
        accepted: u32,
    },
    /// The machine does not take the held item (or the hand was empty).
    Rejected,
    /// Output moved to the player.
    Took {
        /// Items that reached the inventory.
        taken: u32,
        /// What did not fit and was dropped.
        dropped: Option<ItemStack>,
    },
}

// ---------------------------------------------------------------------------
// SimulationState
// ---------------------------------------------------------------------------

/// The mutable simulation state passed through the tick cycle.
#[derive(Debug)]
pub struct SimulationState {
    /// Loaded configuration; presets rewrite the apocalypse section.
    pub config: SimulationConfig,
    /// The voxel world.
    pub world: ChunkedWorld,
    /// Lit heaters and active cores.
    pub registries: SpatialRegistries,
    /// Block-entity state.
    pub machines: MachineStore,
    /// Per-player and per-mob survival counters.
    pub trackers: SurvivalTrackers,
    /// Connected players.
    pub players: BTreeMap<PlayerId, PlayerState>,
    /// Mobs in the world.
    pub mobs: BTreeMap<MobId, MobState>,
    /// Weather roll.
    pub weather: WeatherSystem,
    /// The apocalypse counter.
    pub apocalypse: ApocalypseState,
    /// Whether the apocalypse counter is frozen.
    pub paused: bool,
    /// Host world time in ticks; sleep skips it forward.
    pub world_time: u64,
    /// Whether any transponder has completed its broadcast.
    pub satellite_placed: bool,
    /// Players who may start a transponder.
    pub unlocked_schematics: BTreeSet<PlayerId>,
    /// Messages waiting for the host to deliver.
    pub outbound: Vec<Outbound>,
    /// Server ticks executed.
    tick: u64,
    timeline: Timeline,
    temperature: TemperatureManager,
    sync: ClientSync,
    env: EnvironmentSnapshot,
    rng: SmallRng,
}

impl SimulationState {
    /// Build a state around an empty world sized from `config`.
    pub fn new(config: SimulationConfig) -> Result<Self, TickError> {
        let world = ChunkedWorld::new(config.world.min_y, config.world.max_y);
        Self::with_world(config, world)
    }

    /// Build a state around an existing world.
    pub fn with_world(config: SimulationConfig, world: ChunkedWorld) -> Result<Self, TickError> {
        let timeline = Timeline::from_config(&config)?;
        let temperature = TemperatureManager::new(
            config.apocalypse.geo_strength_multiplier,
            config.apocalypse.heat_multiplier,
        );
        Ok(Self {
            world,
            registries: SpatialRegistries::new(),
            machines: MachineStore::new(),
            trackers: SurvivalTrackers::new(config.survival.clone()),
            players: BTreeMap::new(),
            mobs: BTreeMap::new(),
            weather: WeatherSystem::new(config.world.seed),
            apocalypse: ApocalypseState::new(),
            paused: config.apocalypse.paused,
            world_time: 0,
            satellite_placed: false,
            unlocked_schematics: BTreeSet::new(),
            outbound: Vec::new(),
            tick: 0,
            timeline,
            temperature,
            sync: ClientSync::new(config.sync),
            env: EnvironmentSnapshot::calm(),
            rng: SmallRng::seed_from_u64(config.world.seed),
            config,
        })
    }

    /// Server ticks executed so far.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Environment of the last executed tick.
    pub const fn environment(&self) -> &EnvironmentSnapshot {
        &self.env
    }

    /// Timeline derived from the current configuration.
    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Recompute the environment from the counter without ticking.
    pub fn refresh_environment(&mut self) -> EnvironmentSnapshot {
        self.env = self.apocalypse.snapshot(&self.timeline);
        self.env
    }

    /// Re-derive timeline and temperature multipliers after a config change.
    pub fn apply_tuning(&mut self) -> Result<(), TickError> {
        self.timeline = Timeline::from_config(&self.config)?;
        self.temperature = TemperatureManager::new(
            self.config.apocalypse.geo_strength_multiplier,
            self.config.apocalypse.heat_multiplier,
        );
        self.refresh_environment();
        Ok(())
    }

    /// Temperature at `pos` under the last tick's environment.
    pub fn temperature_at(&self, pos: BlockPos) -> f64 {
        self.temperature
            .temperature_at(&self.world, &self.registries, &self.env, pos)
    }

    /// Take every queued message.
    pub fn drain_outbound(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbound)
    }

    /// Return to the calm world: counter, survival counters and the
    /// satellite flag are cleared.
    pub fn reset_apocalypse(&mut self) {
        self.apocalypse.reset();
        self.trackers.clear();
        self.satellite_placed = false;
        self.refresh_environment();
        info!("apocalypse reset");
    }

    // -----------------------------------------------------------------------
    // Roster
    // -----------------------------------------------------------------------

    /// Add a player and catch their client up.
    pub fn player_join(&mut self, player: PlayerState) -> Result<(), TickError> {
        if self.players.contains_key(&player.id) {
            return Err(SurvivalError::DuplicatePlayer(player.id).into());
        }
        let sanity = self
            .trackers
            .player(player.id)
            .map(|t| t.sanity.stage)
            .unwrap_or_default();
        ClientSync::welcome(player.id, &self.env, sanity, &mut self.outbound);
        info!(player = %player.id, name = %player.name, pos = %player.pos, "player joined");
        self.players.insert(player.id, player);
        Ok(())
    }

    /// Remove a player, flushing cached food frost into their inventory.
    pub fn player_leave(&mut self, id: PlayerId) -> Result<PlayerState, TickError> {
        let mut player = self
            .players
            .remove(&id)
            .ok_or(SurvivalError::PlayerNotFound(id))?;
        self.trackers.player_left(&mut player);
        info!(player = %id, name = %player.name, "player left");
        Ok(player)
    }

    /// Bring a dead player back at `pos` with full health and no effects.
    pub fn respawn(&mut self, id: PlayerId, pos: BlockPos) -> Result<(), TickError> {
        let player = self
            .players
            .get_mut(&id)
            .ok_or(SurvivalError::PlayerNotFound(id))?;
        player.health = frostfall_survival::player::MAX_HEALTH;
        player.effects.clear();
        player.pos = pos;
        info!(player = %id, %pos, "player respawned");
        Ok(())
    }

    /// Add a mob.
    pub fn spawn_mob(&mut self, mob: MobState) {
        debug!(mob = %mob.id, kind = ?mob.kind, pos = %mob.pos, "mob spawned");
        self.mobs.insert(mob.id, mob);
    }

    /// Allow `id` to start transponders. Returns `false` if already allowed.
    pub fn unlock_schematic(&mut self, id: PlayerId) -> Result<bool, TickError> {
        if !self.players.contains_key(&id) {
            return Err(SurvivalError::PlayerNotFound(id).into());
        }
        let added = self.unlocked_schematics.insert(id);
        if added {
            info!(player = %id, "transponder schematic unlocked");
        }
        Ok(added)
    }

    // -----------------------------------------------------------------------
    // Blocks and machines
    // -----------------------------------------------------------------------

    /// Place a block, creating machine state for machine blocks.
    ///
    /// Replacing a machine removes its state first; its inventory is
    /// returned as drops.
    pub fn place_block(&mut self, pos: BlockPos, state: BlockState) -> Result<Vec<ItemStack>, TickError> {
        let mut drops = Vec::new();
        if self.machines.get(pos).is_some() {
            drops = self.machines.remove(&mut self.world, &mut self.registries, pos)?;
        }
        if Machine::for_block(state.kind).is_some() {
            self.machines.place(&mut self.world, pos, state.kind)?;
        } else {
            self.world.set_block(pos, state)?;
        }
        Ok(drops)
    }

    /// Break a block, returning what it drops.
    pub fn break_block(&mut self, pos: BlockPos) -> Result<Vec<ItemStack>, TickError> {
        if !self.world.is_loaded(pos) {
            return Err(WorldError::Unloaded(pos).into());
        }
        if self.machines.get(pos).is_some() {
            return Ok(self.machines.remove(&mut self.world, &mut self.registries, pos)?);
        }
        let kind = self.world.block(pos).kind;
        self.world.set_block(pos, BlockState::AIR)?;
        Ok(kind
            .drop_item()
            .map(|item| ItemStack::new(item, 1))
            .into_iter()
            .collect())
    }

    /// Load a chunk and register the active machines inside it.
    pub fn load_chunk(&mut self, chunk: ChunkPos) {
        self.world.load_chunk(chunk);
        self.machines.chunk_loaded(&self.world, chunk, &mut self.registries);
    }

    /// Unload a chunk. Its machines stop warming, powering and supplying
    /// air until the chunk loads again.
    pub fn unload_chunk(&mut self, chunk: ChunkPos) {
        self.world.unload_chunk(chunk);
        self.machines.chunk_unloaded(chunk, &mut self.registries);
    }

    /// Handle a player using the machine at `pos`.
    ///
    /// Gameplay refusals come back as [`InteractOutcome::Refused`] or
    /// [`InteractOutcome::Rejected`] with a notice queued for the player;
    /// only a missing player, machine or slot is an error.
    pub fn interact_machine(
        &mut self,
        player_id: PlayerId,
        pos: BlockPos,
        interaction: Interaction,
    ) -> Result<InteractOutcome, TickError> {
        if !self.players.contains_key(&player_id) {
            return Err(SurvivalError::PlayerNotFound(player_id).into());
        }
        match interaction {
            Interaction::Toggle => self.toggle_transponder(player_id, pos),
            Interaction::InsertHeld => self.insert_held(player_id, pos),
            Interaction::TakeOutput => self.take_output(player_id, pos),
        }
    }

    fn toggle_transponder(&mut self, player_id: PlayerId, pos: BlockPos) -> Result<InteractOutcome, TickError> {
        let unlocked = self.unlocked_schematics.contains(&player_id);
        let transponder = self.machines.transponder_mut(pos)?;
        match transponder.toggle(
            &self.world,
            &self.registries,
            pos,
            &self.config.transponder,
            unlocked,
        ) {
            Ok(state) => {
                self.outbound
                    .push(Outbound::notice(player_id, transponder_notice(state)));
                Ok(InteractOutcome::Transponder(state))
            }
            Err(refusal) => {
                warn!(player = %player_id, %pos, %refusal, "transponder refused to start");
                self.outbound
                    .push(Outbound::notice(player_id, refusal.to_string()));
                Ok(InteractOutcome::Refused(refusal))
            }
        }
    }

    fn insert_held(&mut self, player_id: PlayerId, pos: BlockPos) -> Result<InteractOutcome, TickError> {
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(SurvivalError::PlayerNotFound(player_id))?;
        let slot = player.held_slot;
        let Some(held) = player.inventory.get(slot).cloned().flatten() else {
            return Ok(InteractOutcome::Rejected);
        };
        let offered = held.count;
        let kind = held.kind;
        match self.machines.insert_item(pos, held) {
            Ok(leftover) => {
                let left = leftover.as_ref().map_or(0, |stack| stack.count);
                player.set_slot(slot, leftover)?;
                let accepted = offered.saturating_sub(left);
                debug!(player = %player_id, %pos, item = ?kind, accepted, "items inserted into machine");
                Ok(InteractOutcome::Inserted { accepted })
            }
            Err(WorldError::ItemRejected { item, .. }) => {
                self.outbound
                    .push(Outbound::notice(player_id, format!("That machine has no use for {item:?}.")));
                Ok(InteractOutcome::Rejected)
            }
            Err(other) => Err(other.into()),
        }
    }

    fn take_output(&mut self, player_id: PlayerId, pos: BlockPos) -> Result<InteractOutcome, TickError> {
        let output = match self.machines.get_mut(pos) {
            Some(Machine::Forge(forge)) => forge.take_output(),
            Some(other) => {
                return Err(WorldError::NotAMachine {
                    pos,
                    kind: other.block_kind(),
                }
                .into());
            }
            None => return Err(WorldError::MachineNotFound(pos).into()),
        };
        let Some(stack) = output else {
            return Ok(InteractOutcome::Took {
                taken: 0,
                dropped: None,
            });
        };
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(SurvivalError::PlayerNotFound(player_id))?;
        let total = stack.count;
        let dropped = player.give(stack);
        let taken = total.saturating_sub(dropped.as_ref().map_or(0, |s| s.count));
        Ok(InteractOutcome::Took { taken, dropped })
    }

    // -----------------------------------------------------------------------
    // Sleep
    // -----------------------------------------------------------------------

    /// Skip to the next morning if it is night.
    ///
    /// World time jumps forward and, unless paused, the apocalypse counter
    /// jumps with it. Returns the number of ticks skipped.
    pub fn skip_night(&mut self) -> Result<u64, TickError> {
        if is_daytime(self.world_time, self.config.world.ticks_per_day) {
            return Ok(0);
        }
        let per_day = u64::from(self.config.world.ticks_per_day);
        let time_of_day = self.world_time.checked_rem(per_day).unwrap_or(0);
        let skipped = per_day.saturating_sub(time_of_day);
        self.world_time = self.world_time.saturating_add(skipped);
        if !self.paused {
            self.apocalypse.advance_by(skipped)?;
        }
        let env = self.refresh_environment();
        info!(skipped, day = env.day, phase = env.phase, "night skipped");
        Ok(skipped)
    }
}

/// Whether `world_time` falls in the first half of the day.
pub fn is_daytime(world_time: u64, ticks_per_day: u32) -> bool {
    let per_day = u64::from(ticks_per_day);
    world_time
        .checked_rem(per_day)
        .is_some_and(|time| time < per_day.checked_div(2).unwrap_or(0))
}

/// Whether a light-emitting block lies within `radius` of `pos`.
pub fn light_near(world: &dyn VoxelWorld, pos: BlockPos, radius: u32) -> bool {
    let reach = i32::try_from(radius).unwrap_or(i32::MAX);
    for dx in reach.saturating_neg()..=reach {
        for dy in reach.saturating_neg()..=reach {
            for dz in reach.saturating_neg()..=reach {
                let cell = pos.offset(dx, dy, dz);
                if !cell.within(pos, radius) || !world.is_loaded(cell) {
                    continue;
                }
                let block = world.block(cell);
                if block.kind.emits_light(block.lit) {
                    return true;
                }
            }
        }
    }
    false
}

const fn transponder_notice(state: TransponderState) -> &'static str {
    match state {
        TransponderState::Idle => "The transponder is idle.",
        TransponderState::Broadcasting => "The transponder hums. Broadcasting to orbit.",
        TransponderState::Paused => "The transponder is paused.",
        TransponderState::Complete => "The satellite is in place.",
    }
}

const fn phase_announcement(phase: u8, sub_stage: u8) -> Option<&'static str> {
    match (phase, sub_stage) {
        (1, _) => Some("The sky dims. Snow is coming."),
        (2, _) => Some("The first hard frost grips the land."),
        (3, _) => Some("Rivers freeze solid. Crops will not survive."),
        (4, _) => Some("The cold reaches into the stone."),
        (5, _) => Some("The sun is a pale coin. Nothing grows."),
        (6, 1) => Some("The air itself begins to freeze."),
        (6, 2) => Some("Breathing grows difficult above ground."),
        (6, _) => Some("The atmosphere is collapsing."),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tick cycle
// ---------------------------------------------------------------------------

/// Execute one complete tick.
pub fn run_tick(state: &mut SimulationState) -> Result<TickSummary, TickError> {
    let tick = state.tick.checked_add(1).ok_or(TickError::TickOverflow)?;
    state.tick = tick;

    let previous = state.env;
    let env = step_clock(state)?;
    announce_transitions(state, &previous, &env);

    let machine_events = step_machines(state, tick);
    let satellite_placed = machine_events
        .iter()
        .any(|event| event.kind == MachineEventKind::TransponderCompleted);
    if satellite_placed && !state.satellite_placed {
        state.satellite_placed = true;
        info!(tick, "satellite placed");
        state.outbound.push(Outbound::broadcast(ClientMessage::Notice {
            text: "A signal answers from orbit. The satellite is in place.".to_owned(),
        }));
    }

    let terrain = step_terrain(state, &env, tick);
    let (players_tracked, deaths) = step_players(state, &env, tick);
    let mobs_killed = step_mobs(state, &env, tick);
    step_sync(state, &env, tick);

    Ok(TickSummary {
        tick,
        phase: env.phase,
        sub_stage: env.sub_stage,
        weather: state.weather.current(),
        players_tracked,
        terrain,
        machine_events,
        deaths,
        mobs_killed,
        satellite_placed,
    })
}

fn step_clock(state: &mut SimulationState) -> Result<EnvironmentSnapshot, TickError> {
    state.world_time = state.world_time.saturating_add(1);
    if !state.paused {
        if state.config.apocalypse.auto_start && state.apocalypse.begin() {
            info!(tick = state.tick, "apocalypse begins");
        }
        state.apocalypse.advance()?;
    }
    let env = state.refresh_environment();
    state
        .weather
        .update(state.tick, env.phase, state.timeline.weather_lock_phase);
    Ok(env)
}

fn announce_transitions(state: &mut SimulationState, previous: &EnvironmentSnapshot, env: &EnvironmentSnapshot) {
    if previous.phase == env.phase && previous.sub_stage == env.sub_stage {
        return;
    }
    info!(
        tick = state.tick,
        from_phase = previous.phase,
        to_phase = env.phase,
        sub_stage = env.sub_stage,
        day = env.day,
        temperature = env.temperature_offset,
        "apocalypse phase changed"
    );
    if let Some(text) = phase_announcement(env.phase, env.sub_stage) {
        state.outbound.push(Outbound::broadcast(ClientMessage::Notice {
            text: text.to_owned(),
        }));
    }
}

fn step_machines(state: &mut SimulationState, tick: u64) -> Vec<MachineEvent> {
    let pruned = state.machines.prune_missing(&state.world, &mut state.registries);
    if !pruned.is_empty() {
        debug!(tick, stacks = pruned.len(), "pruned machines dropped their inventory");
    }
    let mut ctx = MachineContext {
        world: &mut state.world,
        registries: &mut state.registries,
        tick,
        transponder: state.config.transponder,
    };
    state.machines.tick_all(&mut ctx)
}

fn step_terrain(state: &mut SimulationState, env: &EnvironmentSnapshot, tick: u64) -> TransformReport {
    let anchors: Vec<BlockPos> = state
        .players
        .values()
        .filter(|p| p.is_tracked())
        .map(|p| p.pos)
        .collect();
    let engines: [&dyn BlockEngine; 5] = [
        &BlockFreezer,
        &VegetationDecay,
        &SnowAccumulator,
        &AcheroniteGrowth,
        &FrozenAtmosphereFormation,
    ];
    let mut ctx = EngineContext {
        world: &mut state.world,
        registries: &state.registries,
        temperature: &state.temperature,
        env,
        anchors: &anchors,
        tick,
        settings: state.config.sampling.settings(),
        rng: &mut state.rng,
    };
    let mut total = TransformReport::default();
    for engine in engines {
        total.merge(run_engine(engine, &mut ctx));
    }
    total
}

fn measure_conditions(state: &SimulationState, env: &EnvironmentSnapshot) -> BTreeMap<PlayerId, PlayerConditions> {
    let sanity = &state.config.survival.sanity;
    let daytime = is_daytime(state.world_time, state.config.world.ticks_per_day);
    state
        .players
        .values()
        .filter(|p| p.is_tracked())
        .map(|p| {
            let pos = p.pos;
            let comforted = temperature::is_warmed(&state.world, &state.registries, env.phase, pos);
            let sky = daytime && env.sky_light >= sanity.min_sky_light && state.world.sees_sky(pos);
            let conditions = PlayerConditions {
                temperature: state
                    .temperature
                    .temperature_at(&state.world, &state.registries, env, pos),
                comforted,
                lit: sky || light_near(&state.world, pos, sanity.light_radius),
                oxygenated: state.registries.cores.breathable(pos),
            };
            (p.id, conditions)
        })
        .collect()
}

fn step_players(state: &mut SimulationState, env: &EnvironmentSnapshot, tick: u64) -> (u32, Vec<PlayerId>) {
    if !SurvivalTrackers::is_due(tick) {
        return (0, Vec::new());
    }
    let conditions = measure_conditions(state, env);
    let mut run = state
        .trackers
        .run_players(&mut state.players, &conditions, env, tick);
    state.outbound.append(&mut run.outbound);
    for id in &run.deaths {
        state
            .outbound
            .push(Outbound::notice(*id, "The cold takes you."));
    }
    if run.food_ruined > 0 {
        debug!(tick, ruined = run.food_ruined, "food lost to frost");
    }
    (run.players, run.deaths)
}

fn step_mobs(state: &mut SimulationState, env: &EnvironmentSnapshot, tick: u64) -> Vec<MobId> {
    if !state.trackers.mobs_due(tick) {
        return Vec::new();
    }
    let world = &state.world;
    let registries = &state.registries;
    let manager = &state.temperature;
    let run = state.trackers.run_mobs(&mut state.mobs, &state.players, env, |mob| {
        manager.temperature_at(world, registries, env, mob.pos)
    });
    for id in &run.killed {
        state.mobs.remove(id);
    }
    if !run.killed.is_empty() {
        info!(tick, killed = run.killed.len(), "mobs frozen solid");
    }
    run.killed
}

fn step_sync(state: &mut SimulationState, env: &EnvironmentSnapshot, tick: u64) {
    state.sync.environment(tick, env, &mut state.outbound);
    if state.sync.temperature_due(tick) {
        let readings: Vec<(PlayerId, f64)> = state
            .players
            .values()
            .filter(|p| p.is_alive())
            .map(|p| (p.id, state.temperature_at(p.pos)))
            .collect();
        state.sync.temperatures(tick, readings, &mut state.outbound);
    }
}
