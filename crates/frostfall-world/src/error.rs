//! Error types for the `frostfall-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`]. A
//! transponder that refuses to start is not an error; see
//! [`ActivationRefusal`](crate::machines::ActivationRefusal).

use frostfall_types::{BlockKind, BlockPos, ItemKind};

/// Errors that can occur during world and machine operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The position lies in a chunk that is not loaded.
    #[error("position {0} is not loaded")]
    Unloaded(BlockPos),

    /// The position is outside the vertical build range.
    #[error("position {pos} is outside the build range {min_y}..={max_y}")]
    OutOfBounds {
        /// The rejected position.
        pos: BlockPos,
        /// Lowest buildable y.
        min_y: i32,
        /// Highest buildable y.
        max_y: i32,
    },

    /// No machine is registered at the position.
    #[error("no machine at {0}")]
    MachineNotFound(BlockPos),

    /// A machine already occupies the position.
    #[error("a machine already exists at {0}")]
    MachineExists(BlockPos),

    /// The block kind does not carry a machine.
    #[error("{kind:?} at {pos} is not a machine block")]
    NotAMachine {
        /// The position.
        pos: BlockPos,
        /// The block kind found there.
        kind: BlockKind,
    },

    /// The machine does not accept the item.
    #[error("machine at {pos} does not accept {item:?}")]
    ItemRejected {
        /// The machine position.
        pos: BlockPos,
        /// The rejected item.
        item: ItemKind,
    },
}
