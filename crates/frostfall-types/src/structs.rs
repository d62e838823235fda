//! Core value structs shared across the Frostfall workspace.
//!
//! Positions, block states, item stacks, effect instances, and the
//! environment snapshot that the phase layer hands to every consumer.

use serde::{Deserialize, Serialize};

use crate::enums::{BlockKind, ItemKind, StatusEffect};

/// Width of a chunk column in blocks along X and Z.
pub const CHUNK_WIDTH: i32 = 16;

/// Maximum number of snow layers in a single cell.
pub const MAX_SNOW_LAYERS: u8 = 8;

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// Integer coordinates of a single world cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    /// East-west coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
    /// North-south coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Create a position from its coordinates.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Position displaced by the given deltas (saturating at the i32 range).
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// The cell directly above.
    pub const fn above(self) -> Self {
        self.offset(0, 1, 0)
    }

    /// The cell directly below.
    pub const fn below(self) -> Self {
        self.offset(0, -1, 0)
    }

    /// The six face-adjacent neighbors.
    pub const fn neighbors(self) -> [Self; 6] {
        [
            self.offset(1, 0, 0),
            self.offset(-1, 0, 0),
            self.offset(0, 1, 0),
            self.offset(0, -1, 0),
            self.offset(0, 0, 1),
            self.offset(0, 0, -1),
        ]
    }

    /// Squared Euclidean distance to another position.
    pub fn distance_sq(self, other: Self) -> i64 {
        let dx = i64::from(other.x).saturating_sub(i64::from(self.x));
        let dy = i64::from(other.y).saturating_sub(i64::from(self.y));
        let dz = i64::from(other.z).saturating_sub(i64::from(self.z));
        dx.saturating_mul(dx)
            .saturating_add(dy.saturating_mul(dy))
            .saturating_add(dz.saturating_mul(dz))
    }

    /// Whether `other` lies within `radius` blocks (Euclidean, inclusive).
    pub fn within(self, other: Self, radius: u32) -> bool {
        let r = i64::from(radius);
        self.distance_sq(other) <= r.saturating_mul(r)
    }

    /// The chunk column containing this position.
    pub const fn chunk(self) -> ChunkPos {
        ChunkPos {
            x: self.x.div_euclid(CHUNK_WIDTH),
            z: self.z.div_euclid(CHUNK_WIDTH),
        }
    }
}

impl core::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Coordinates of a chunk column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    /// Chunk X index.
    pub x: i32,
    /// Chunk Z index.
    pub z: i32,
}

impl ChunkPos {
    /// Create a chunk position.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// The full state of a world cell: kind plus the two properties the
/// simulation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockState {
    /// The block kind.
    pub kind: BlockKind,
    /// Lit property for campfires, furnaces and heaters.
    #[serde(default)]
    pub lit: bool,
    /// Snow layer count for [`BlockKind::SnowLayer`]; 0 for other kinds.
    #[serde(default)]
    pub layers: u8,
}

impl BlockState {
    /// The empty cell.
    pub const AIR: Self = Self::of(BlockKind::Air);

    /// A block of the given kind with default properties.
    pub const fn of(kind: BlockKind) -> Self {
        Self {
            kind,
            lit: false,
            layers: 0,
        }
    }

    /// A lit block of the given kind.
    pub const fn lit(kind: BlockKind) -> Self {
        Self {
            kind,
            lit: true,
            layers: 0,
        }
    }

    /// A snow layer cell; the count is clamped to `1..=MAX_SNOW_LAYERS`.
    pub const fn snow(layers: u8) -> Self {
        let clamped = if layers == 0 {
            1
        } else if layers > MAX_SNOW_LAYERS {
            MAX_SNOW_LAYERS
        } else {
            layers
        };
        Self {
            kind: BlockKind::SnowLayer,
            lit: false,
            layers: clamped,
        }
    }

    /// Same block with a different lit property.
    pub const fn with_lit(self, lit: bool) -> Self {
        Self { lit, ..self }
    }
}

impl Default for BlockState {
    fn default() -> Self {
        Self::AIR
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// A stack of items in an inventory slot or machine slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// The item kind.
    pub kind: ItemKind,
    /// Number of items in the stack.
    pub count: u32,
    /// Accumulated cold exposure for food stacks.
    #[serde(default)]
    pub frost_ticks: u32,
    /// Set once the stack has frozen past saving; never cleared.
    #[serde(default)]
    pub ruined: bool,
}

impl ItemStack {
    /// A fresh stack of `count` items.
    pub const fn new(kind: ItemKind, count: u32) -> Self {
        Self {
            kind,
            count,
            frost_ticks: 0,
            ruined: false,
        }
    }

    /// Whether the stack holds no items.
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Remove one item; returns `false` if the stack was already empty.
    pub const fn take_one(&mut self) -> bool {
        if self.count == 0 {
            return false;
        }
        self.count = self.count.saturating_sub(1);
        true
    }

    /// Whether `extra` more items of `kind` fit into this stack.
    pub fn can_accept(&self, kind: ItemKind, extra: u32) -> bool {
        self.kind == kind && self.count.saturating_add(extra) <= kind.max_stack()
    }
}

/// A status effect with amplifier and remaining duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectInstance {
    /// The effect.
    pub effect: StatusEffect,
    /// Amplifier; 0 is level I.
    pub amplifier: u8,
    /// Remaining ticks.
    pub duration_ticks: u32,
}

impl EffectInstance {
    /// Create an effect instance.
    pub const fn new(effect: StatusEffect, amplifier: u8, duration_ticks: u32) -> Self {
        Self {
            effect,
            amplifier,
            duration_ticks,
        }
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Environmental state derived from apocalypse progress for one tick.
///
/// Computed once per tick by the phase layer, consumed by temperature,
/// block transformation and survival code, and broadcast to clients on the
/// sync interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    /// Elapsed apocalypse ticks.
    pub apocalypse_ticks: u64,
    /// Elapsed days, fractional.
    pub day: f64,
    /// Phase 0 through 6.
    pub phase: u8,
    /// Collapse sub-stage 1 through 3 during phase 6, otherwise 0.
    pub sub_stage: u8,
    /// Main timeline progress, 0.0 through 1.0.
    pub progress: f64,
    /// Collapse progress during phase 6, otherwise 0.0.
    pub collapse_progress: f64,
    /// Surface temperature in degrees Celsius before local modifiers.
    pub temperature_offset: f64,
    /// Rendered sun size multiplier.
    pub sun_scale: f64,
    /// Rendered sun brightness multiplier.
    pub sun_brightness: f64,
    /// Sky light multiplier.
    pub sky_light: f64,
    /// Day length multiplier.
    pub day_length_multiplier: f64,
    /// Whether weather is forced to snow.
    pub weather_locked: bool,
}

impl EnvironmentSnapshot {
    /// The untouched world before the apocalypse begins.
    pub const fn calm() -> Self {
        Self {
            apocalypse_ticks: 0,
            day: 0.0,
            phase: 0,
            sub_stage: 0,
            progress: 0.0,
            collapse_progress: 0.0,
            temperature_offset: 10.0,
            sun_scale: 1.0,
            sun_brightness: 1.0,
            sky_light: 1.0,
            day_length_multiplier: 1.0,
            weather_locked: false,
        }
    }

    /// Whether the atmospheric collapse phase is active.
    pub const fn is_collapse(&self) -> bool {
        self.phase >= 6
    }
}

impl Default for EnvironmentSnapshot {
    fn default() -> Self {
        Self::calm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_of_negative_coordinates_rounds_down() {
        assert_eq!(BlockPos::new(-1, 0, -17).chunk(), ChunkPos::new(-1, -2));
        assert_eq!(BlockPos::new(15, 0, 16).chunk(), ChunkPos::new(0, 1));
    }

    #[test]
    fn within_is_inclusive_euclidean() {
        let origin = BlockPos::new(0, 0, 0);
        assert!(origin.within(BlockPos::new(5, 0, 0), 5));
        assert!(!origin.within(BlockPos::new(4, 3, 1), 5));
        assert!(origin.within(BlockPos::new(3, 4, 0), 5));
    }

    #[test]
    fn snow_layers_are_clamped() {
        assert_eq!(BlockState::snow(0).layers, 1);
        assert_eq!(BlockState::snow(12).layers, MAX_SNOW_LAYERS);
    }

    #[test]
    fn item_stack_take_and_accept() {
        let mut stack = ItemStack::new(ItemKind::Coal, 1);
        assert!(stack.take_one());
        assert!(stack.is_empty());
        assert!(!stack.take_one());
        assert!(stack.can_accept(ItemKind::Coal, 64));
        assert!(!stack.can_accept(ItemKind::Charcoal, 1));
    }

    #[test]
    fn item_stack_frost_field_defaults_when_missing() {
        let json = r#"{"kind":"bread","count":3}"#;
        let stack: Result<ItemStack, _> = serde_json::from_str(json);
        let stack = stack.ok();
        assert_eq!(stack.as_ref().map(|s| s.frost_ticks), Some(0));
        assert_eq!(stack.map(|s| s.ruined), Some(false));
    }
}
