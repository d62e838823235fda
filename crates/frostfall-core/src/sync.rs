//! Batched client sync.
//!
//! The environment snapshot is broadcast on a fixed interval and at once
//! whenever the phase or sub-stage changes. Each player's local temperature
//! goes out on a shorter interval. Sanity stage changes are queued by the
//! sanity tracker itself; a joining player gets a one-off catch-up of both.

use frostfall_types::{ClientMessage, EnvironmentSnapshot, Outbound, PlayerId, SanityStage};
use frostfall_world::sampling::on_interval;
use tracing::debug;

use crate::config::SyncConfig;

/// Decides when client messages go out and queues them.
#[derive(Debug, Clone)]
pub struct ClientSync {
    settings: SyncConfig,
    /// Phase and sub-stage of the last environment broadcast.
    last_sent: Option<(u8, u8)>,
}

impl ClientSync {
    /// Create a scheduler with the given intervals.
    pub const fn new(settings: SyncConfig) -> Self {
        Self {
            settings,
            last_sent: None,
        }
    }

    /// Whether the periodic environment broadcast falls on `tick`.
    pub fn environment_due(&self, tick: u64) -> bool {
        on_interval(tick, u64::from(self.settings.environment_interval))
    }

    /// Whether per-player temperatures go out on `tick`.
    pub fn temperature_due(&self, tick: u64) -> bool {
        on_interval(tick, u64::from(self.settings.temperature_interval))
    }

    /// Queue the environment broadcast if it is due or the phase moved.
    ///
    /// Returns `true` if a broadcast was queued.
    pub fn environment(
        &mut self,
        tick: u64,
        env: &EnvironmentSnapshot,
        outbound: &mut Vec<Outbound>,
    ) -> bool {
        let stage = (env.phase, env.sub_stage);
        let moved = self.last_sent != Some(stage);
        if !moved && !self.environment_due(tick) {
            return false;
        }
        if moved {
            debug!(tick, phase = env.phase, sub_stage = env.sub_stage, "environment sync forced by stage change");
        }
        self.last_sent = Some(stage);
        outbound.push(Outbound::broadcast(ClientMessage::EnvironmentSync {
            snapshot: *env,
        }));
        true
    }

    /// Queue one temperature update per reading if they are due.
    ///
    /// Returns the number of messages queued.
    pub fn temperatures(
        &self,
        tick: u64,
        readings: impl IntoIterator<Item = (PlayerId, f64)>,
        outbound: &mut Vec<Outbound>,
    ) -> u32 {
        if !self.temperature_due(tick) {
            return 0;
        }
        let mut sent: u32 = 0;
        for (player, celsius) in readings {
            outbound.push(Outbound::to_player(
                player,
                ClientMessage::Temperature { celsius },
            ));
            sent = sent.saturating_add(1);
        }
        sent
    }

    /// Catch a joining player up on environment and sanity.
    pub fn welcome(
        player: PlayerId,
        env: &EnvironmentSnapshot,
        sanity: SanityStage,
        outbound: &mut Vec<Outbound>,
    ) {
        outbound.push(Outbound::to_player(
            player,
            ClientMessage::EnvironmentSync { snapshot: *env },
        ));
        outbound.push(Outbound::to_player(
            player,
            ClientMessage::SanityStage { stage: sanity },
        ));
    }
}
