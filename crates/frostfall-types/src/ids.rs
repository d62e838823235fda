//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Players and mobs are keyed by UUID the same way the host world keys
//! entities, so per-player tracker maps and save data can use the identity
//! directly. Parsing is fallible: save files written by older builds may
//! carry malformed keys, and the loader drops those entries one by one.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random identifier (UUID v4).
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }

            /// Parse an identifier from its hyphenated string form.
            ///
            /// Returns `None` for anything that is not a valid UUID.
            pub fn parse(raw: &str) -> Option<Self> {
                Uuid::parse_str(raw).ok().map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a connected player.
    PlayerId
}

define_id! {
    /// Unique identifier for a non-player mob.
    MobId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_display_form() {
        let id = PlayerId::new();
        assert_eq!(PlayerId::parse(&id.to_string()), Some(id));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(PlayerId::parse("not-a-uuid"), None);
        assert_eq!(MobId::parse(""), None);
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = MobId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<MobId, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }
}
