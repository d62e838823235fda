//! Outbound client messages.
//!
//! The simulation never talks to a transport directly. Every packet it
//! would send is pushed as an [`Outbound`] onto a queue that the host
//! drains after each tick.

use serde::{Deserialize, Serialize};

use crate::enums::SanityStage;
use crate::ids::PlayerId;
use crate::structs::EnvironmentSnapshot;

/// Who receives an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "player")]
pub enum MessageTarget {
    /// A single player.
    Player(PlayerId),
    /// Every connected player.
    All,
}

/// Payload of a client-bound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ClientMessage {
    /// Phase, sub-stage and curve multipliers for rendering.
    EnvironmentSync {
        /// The snapshot being broadcast.
        snapshot: EnvironmentSnapshot,
    },
    /// The player's sanity stage changed.
    SanityStage {
        /// New stage.
        stage: SanityStage,
    },
    /// Temperature at the player's position.
    Temperature {
        /// Degrees Celsius.
        celsius: f64,
    },
    /// A status line shown to the player.
    Notice {
        /// Message text.
        text: String,
    },
}

/// A queued client message with its target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outbound {
    /// Recipient.
    pub target: MessageTarget,
    /// Payload.
    pub message: ClientMessage,
}

impl Outbound {
    /// A message addressed to one player.
    pub const fn to_player(player: PlayerId, message: ClientMessage) -> Self {
        Self {
            target: MessageTarget::Player(player),
            message,
        }
    }

    /// A message for every player.
    pub const fn broadcast(message: ClientMessage) -> Self {
        Self {
            target: MessageTarget::All,
            message,
        }
    }

    /// A text notice for one player.
    pub fn notice(player: PlayerId, text: impl Into<String>) -> Self {
        Self::to_player(player, ClientMessage::Notice { text: text.into() })
    }
}
