//! Sanity eroded by isolation in the cold and dark.
//!
//! A player is isolated when no other eligible player is near, no heat
//! source comforts them, and neither daylight nor a lamp reaches them.
//! Isolation only accumulates once the comfort grace left by the last warm
//! spell has run out. Warmth drains isolation three times as fast as
//! company or light does.

use frostfall_types::{
    BlockPos, ClientMessage, EffectInstance, GameMode, Outbound, SanityStage, StatusEffect,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{EFFECT_DURATION, SanityConfig, is_due, per_run, stage_index};
use crate::player::{PlayerConditions, PlayerState};

/// Sanity counters of one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanityTracker {
    /// Accumulated isolation.
    pub isolation_ticks: u32,
    /// Ticks of comfort left before isolation starts counting.
    pub comfort_grace_ticks: u32,
    /// Current stage.
    pub stage: SanityStage,
}

/// What kept (or failed to keep) a player company this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Company {
    /// Warmed by a heat source.
    Comforted,
    /// Near another player or in light.
    Social,
    /// Alone in the cold dark.
    Isolated,
}

impl Company {
    /// Classify a player's situation.
    pub const fn classify(social: bool, conditions: &PlayerConditions) -> Self {
        if conditions.comforted {
            Self::Comforted
        } else if social || conditions.lit {
            Self::Social
        } else {
            Self::Isolated
        }
    }
}

impl SanityTracker {
    /// Advance by one tracker run of `elapsed` ticks.
    ///
    /// Returns the stage after the update. A stage change queues a
    /// [`ClientMessage::SanityStage`] for the player.
    pub fn update(
        &mut self,
        player: &mut PlayerState,
        company: Company,
        tick: u64,
        elapsed: u32,
        config: &SanityConfig,
        outbound: &mut Vec<Outbound>,
    ) -> SanityStage {
        match company {
            Company::Comforted => {
                self.isolation_ticks = self
                    .isolation_ticks
                    .saturating_sub(per_run(config.comfort_decay, elapsed));
                self.comfort_grace_ticks = config.comfort_grace;
            }
            Company::Social => {
                self.isolation_ticks = self
                    .isolation_ticks
                    .saturating_sub(per_run(config.social_decay, elapsed));
                self.comfort_grace_ticks = self.comfort_grace_ticks.saturating_sub(elapsed);
            }
            Company::Isolated if self.comfort_grace_ticks > 0 => {
                self.comfort_grace_ticks = self.comfort_grace_ticks.saturating_sub(elapsed);
            }
            Company::Isolated => {
                self.isolation_ticks = self.isolation_ticks.saturating_add(elapsed);
            }
        }

        let before = self.stage;
        self.stage = SanityStage::from_u8(stage_index(self.isolation_ticks, &config.stage_thresholds));
        if self.stage != before {
            info!(player = %player.id, from = ?before, to = ?self.stage, "sanity stage changed");
            outbound.push(Outbound::to_player(
                player.id,
                ClientMessage::SanityStage { stage: self.stage },
            ));
        } else if self.stage != SanityStage::Stable && is_due(tick, config.message_interval) {
            outbound.push(Outbound::notice(player.id, reminder(self.stage)));
        }

        if self.stage == SanityStage::Breaking {
            player.apply_effect(EffectInstance::new(StatusEffect::Darkness, 0, EFFECT_DURATION));
            player.apply_effect(EffectInstance::new(StatusEffect::Nausea, 0, EFFECT_DURATION));
        }
        self.stage
    }
}

fn reminder(stage: SanityStage) -> &'static str {
    match stage {
        SanityStage::Stable | SanityStage::Uneasy => "The silence is getting to you.",
        SanityStage::Paranoid => "Something is watching from the snow.",
        SanityStage::Breaking => "You can't tell what's real anymore.",
    }
}

/// Whether a player counts as company for others.
pub fn is_eligible(player: &PlayerState) -> bool {
    player.is_alive() && player.game_mode != GameMode::Spectator
}

/// Whether any eligible player other than `me` is within `radius` of `pos`.
pub fn has_company<'a>(
    me: &PlayerState,
    others: impl IntoIterator<Item = &'a PlayerState>,
    radius: u32,
) -> bool {
    let pos: BlockPos = me.pos;
    others
        .into_iter()
        .any(|other| other.id != me.id && is_eligible(other) && other.pos.within(pos, radius))
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use frostfall_types::PlayerId;

    use super::*;
    use crate::config::TRACKER_INTERVAL;

    fn player() -> PlayerState {
        PlayerState::new(PlayerId::new(), "Dee", BlockPos::new(0, 64, 0))
    }

    fn run(tracker: &mut SanityTracker, p: &mut PlayerState, company: Company, runs: u64) -> Vec<Outbound> {
        let config = SanityConfig::default();
        let mut out = Vec::new();
        for i in 1..=runs {
            tracker.update(p, company, i * 7, TRACKER_INTERVAL, &config, &mut out);
        }
        out
    }

    #[test]
    fn classify_prefers_comfort() {
        let warm_dark = PlayerConditions {
            comforted: true,
            lit: false,
            ..PlayerConditions::default()
        };
        assert_eq!(Company::classify(false, &warm_dark), Company::Comforted);
        let cold_dark = PlayerConditions {
            comforted: false,
            lit: false,
            ..PlayerConditions::default()
        };
        assert_eq!(Company::classify(true, &cold_dark), Company::Social);
        assert_eq!(Company::classify(false, &cold_dark), Company::Isolated);
    }

    #[test]
    fn comfort_decays_three_times_faster_than_company() {
        let mut comforted = SanityTracker {
            isolation_ticks: 3000,
            ..SanityTracker::default()
        };
        let mut social = comforted;
        let mut p = player();
        run(&mut comforted, &mut p, Company::Comforted, 10);
        run(&mut social, &mut p, Company::Social, 10);
        assert_eq!(3000 - comforted.isolation_ticks, 600);
        assert_eq!(3000 - social.isolation_ticks, 200);
        assert_eq!(comforted.comfort_grace_ticks, 600);
    }

    #[test]
    fn isolation_waits_out_comfort_grace() {
        let mut tracker = SanityTracker {
            comfort_grace_ticks: 600,
            ..SanityTracker::default()
        };
        let mut p = player();
        run(&mut tracker, &mut p, Company::Isolated, 30);
        assert_eq!(tracker.isolation_ticks, 0);
        run(&mut tracker, &mut p, Company::Isolated, 5);
        assert_eq!(tracker.isolation_ticks, 100);
    }

    #[test]
    fn stage_change_queues_sanity_message() {
        let mut tracker = SanityTracker {
            isolation_ticks: 5990,
            ..SanityTracker::default()
        };
        let mut p = player();
        let out = run(&mut tracker, &mut p, Company::Isolated, 1);
        assert_eq!(tracker.stage, SanityStage::Uneasy);
        assert_eq!(
            out.first().map(|o| o.message.clone()),
            Some(ClientMessage::SanityStage {
                stage: SanityStage::Uneasy
            })
        );
    }

    #[test]
    fn breaking_applies_darkness_and_nausea() {
        let mut tracker = SanityTracker {
            isolation_ticks: 24_000,
            stage: SanityStage::Breaking,
            ..SanityTracker::default()
        };
        let mut p = player();
        run(&mut tracker, &mut p, Company::Isolated, 1);
        assert!(p.has_effect(StatusEffect::Darkness));
        assert!(p.has_effect(StatusEffect::Nausea));
    }

    #[test]
    fn spectators_are_not_company() {
        let me = player();
        let mut ghost = player();
        ghost.game_mode = GameMode::Spectator;
        ghost.pos = BlockPos::new(3, 64, 0);
        let mut friend = player();
        friend.pos = BlockPos::new(20, 64, 0);
        assert!(!has_company(&me, [&me, &ghost], 24));
        assert!(has_company(&me, [&me, &ghost, &friend], 24));
        friend.pos = BlockPos::new(30, 64, 0);
        assert!(!has_company(&me, [&friend], 24));
    }
}
