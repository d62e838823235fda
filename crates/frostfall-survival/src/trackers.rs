//! The survival tracker context.
//!
//! [`SurvivalTrackers`] owns every per-player and per-mob counter and runs
//! the trackers in a fixed order: frostbite, exposure (heat, then
//! suffocation), sanity, food frost. Mob freeze runs separately on its own
//! interval. Exempt players (creative, spectator) are skipped entirely.

use std::collections::BTreeMap;

use frostfall_types::{
    EnvironmentSnapshot, FrostbiteStage, MobId, Outbound, PlayerId, SanityStage,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{SurvivalConfig, TRACKER_INTERVAL, is_due};
use crate::exposure::ExposureTracker;
use crate::food_frost::FoodFrostTracker;
use crate::frostbite::FrostbiteTracker;
use crate::mob_freeze::{MobFreezeTracker, near_any_player};
use crate::player::{MobState, PlayerConditions, PlayerState};
use crate::sanity::{Company, SanityTracker, has_company};

/// All tracker state for one player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerTrackers {
    /// Frostbite counters.
    pub frostbite: FrostbiteTracker,
    /// Heat and suffocation counters.
    pub exposure: ExposureTracker,
    /// Sanity counters.
    pub sanity: SanityTracker,
    /// Food frost cache.
    pub food: FoodFrostTracker,
}

/// Persisted tracker state, keyed by player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    /// Sanity per player.
    pub sanity: BTreeMap<PlayerId, SanityTracker>,
    /// Frostbite per player.
    pub frostbite: BTreeMap<PlayerId, FrostbiteTracker>,
}

/// What one player run produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerRun {
    /// Players updated.
    pub players: u32,
    /// Players that died.
    pub deaths: Vec<PlayerId>,
    /// Sanity stage changes.
    pub sanity_changes: Vec<(PlayerId, SanityStage)>,
    /// Highest frostbite stage among updated players.
    pub worst_frostbite: FrostbiteStage,
    /// Food stacks ruined.
    pub food_ruined: u32,
    /// Queued client messages.
    pub outbound: Vec<Outbound>,
}

/// What one mob run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MobRun {
    /// Mobs updated.
    pub mobs: u32,
    /// Mobs killed.
    pub killed: Vec<MobId>,
}

/// Counters for every player and mob, plus the tuning they use.
#[derive(Debug, Clone, Default)]
pub struct SurvivalTrackers {
    config: SurvivalConfig,
    players: BTreeMap<PlayerId, PlayerTrackers>,
    mobs: MobFreezeTracker,
}

impl SurvivalTrackers {
    /// Create an empty context with the given tuning.
    pub fn new(config: SurvivalConfig) -> Self {
        Self {
            config,
            players: BTreeMap::new(),
            mobs: MobFreezeTracker::new(),
        }
    }

    /// Tuning in use.
    pub const fn config(&self) -> &SurvivalConfig {
        &self.config
    }

    /// Tracker state of `player`.
    pub fn player(&self, player: PlayerId) -> Option<&PlayerTrackers> {
        self.players.get(&player)
    }

    /// Mob freeze state.
    pub const fn mobs(&self) -> &MobFreezeTracker {
        &self.mobs
    }

    /// Whether trackers are due on `tick`.
    pub fn is_due(tick: u64) -> bool {
        is_due(tick, TRACKER_INTERVAL)
    }

    /// Whether mob freeze is due on `tick`.
    pub fn mobs_due(&self, tick: u64) -> bool {
        is_due(tick, self.config.mob_freeze.interval)
    }

    /// Flush a leaving player's food cache and drop it.
    ///
    /// Sanity and frostbite stay so they persist across sessions.
    pub fn player_left(&mut self, player: &mut PlayerState) {
        if let Some(trackers) = self.players.get_mut(&player.id) {
            trackers.food.flush(player);
            trackers.food = FoodFrostTracker::default();
        }
    }

    /// Run every player tracker once.
    ///
    /// `conditions` holds the world-derived facts for each player; a player
    /// missing from it is skipped this run.
    pub fn run_players(
        &mut self,
        players: &mut BTreeMap<PlayerId, PlayerState>,
        conditions: &BTreeMap<PlayerId, PlayerConditions>,
        env: &EnvironmentSnapshot,
        tick: u64,
    ) -> PlayerRun {
        let mut run = PlayerRun::default();
        let elapsed = TRACKER_INTERVAL;

        let company: BTreeMap<PlayerId, bool> = players
            .values()
            .map(|p| {
                (
                    p.id,
                    has_company(p, players.values(), self.config.sanity.social_radius),
                )
            })
            .collect();

        for (id, player) in players.iter_mut() {
            if !player.is_tracked() {
                continue;
            }
            let Some(cond) = conditions.get(id) else {
                continue;
            };
            player.tick_effects(elapsed);
            let trackers = self.players.entry(*id).or_default();
            run.players = run.players.saturating_add(1);

            let frost = trackers.frostbite.update(
                player,
                cond.temperature,
                tick,
                elapsed,
                &self.config.frostbite,
                &mut run.outbound,
            );
            run.worst_frostbite = run.worst_frostbite.max(frost.stage);

            let exposure =
                trackers
                    .exposure
                    .update(player, cond, env, tick, elapsed, &self.config.exposure);

            let before = trackers.sanity.stage;
            let social = company.get(id).copied().unwrap_or(false);
            let stage = trackers.sanity.update(
                player,
                Company::classify(social, cond),
                tick,
                elapsed,
                &self.config.sanity,
                &mut run.outbound,
            );
            if stage != before {
                run.sanity_changes.push((*id, stage));
            }

            let food = trackers
                .food
                .update(player, cond.temperature, tick, elapsed, &self.config.food_frost);
            run.food_ruined = run.food_ruined.saturating_add(food.ruined);

            if frost.killed || exposure.killed {
                info!(player = %id, name = %player.name, "player died of exposure");
                run.deaths.push(*id);
            }
        }
        debug!(players = run.players, deaths = run.deaths.len(), "survival trackers ran");
        run
    }

    /// Run mob freeze for every living mob near a player.
    ///
    /// `temperature_at` supplies the temperature at a mob's position.
    pub fn run_mobs(
        &mut self,
        mobs: &mut BTreeMap<MobId, MobState>,
        players: &BTreeMap<PlayerId, PlayerState>,
        env: &EnvironmentSnapshot,
        mut temperature_at: impl FnMut(&MobState) -> f64,
    ) -> MobRun {
        let mut run = MobRun::default();
        let anchors: Vec<_> = players
            .values()
            .filter(|p| p.is_alive())
            .map(|p| p.pos)
            .collect();
        let radius = self.config.mob_freeze.player_radius;

        for mob in mobs.values_mut() {
            if !mob.is_alive() || !near_any_player(mob.pos, &anchors, radius) {
                continue;
            }
            mob.tick_effects(self.config.mob_freeze.interval);
            let temperature = temperature_at(mob);
            let outcome = self
                .mobs
                .update(mob, temperature, env.phase, &self.config.mob_freeze);
            run.mobs = run.mobs.saturating_add(1);
            if outcome.killed {
                run.killed.push(mob.id);
            }
        }
        self.mobs.retain(|id| mobs.get(&id).is_some_and(MobState::is_alive));
        run
    }

    /// Sanity and frostbite of every known player.
    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            sanity: self
                .players
                .iter()
                .map(|(id, trackers)| (*id, trackers.sanity))
                .collect(),
            frostbite: self
                .players
                .iter()
                .map(|(id, trackers)| (*id, trackers.frostbite))
                .collect(),
        }
    }

    /// Restore persisted sanity and frostbite.
    pub fn restore(&mut self, snapshot: TrackerSnapshot) {
        for (id, sanity) in snapshot.sanity {
            self.players.entry(id).or_default().sanity = sanity;
        }
        for (id, frostbite) in snapshot.frostbite {
            self.players.entry(id).or_default().frostbite = frostbite;
        }
    }

    /// Forget every counter, e.g. on an apocalypse reset.
    pub fn clear(&mut self) {
        self.players.clear();
        self.mobs = MobFreezeTracker::new();
    }
}
