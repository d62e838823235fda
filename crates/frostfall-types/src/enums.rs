//! Enumeration types for the Frostfall simulation.
//!
//! Block, item, mob and effect kinds plus the staged severity enums the
//! survival trackers report. Classification helpers (`is_solid`,
//! `fuel_ticks`, `is_cold_immune`, ...) live next to the variants so every
//! crate agrees on them.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// The kind of block occupying a single world cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    // --- Terrain ---
    /// Empty cell.
    Air,
    /// Natural stone.
    Stone,
    /// Deep stone below y = 0.
    Deepslate,
    /// Unbreakable floor of the world.
    Bedrock,
    /// Plain dirt.
    Dirt,
    /// Dirt with a living grass cover.
    GrassBlock,
    /// Tilled soil holding crops.
    Farmland,
    /// Sand.
    Sand,
    /// Gravel.
    Gravel,
    /// Dirt frozen solid by the cold.
    FrozenDirt,
    /// Ground frozen through, the final soil state.
    Permafrost,

    // --- Building ---
    /// Player-placed cobblestone.
    Cobblestone,
    /// Wooden planks.
    Planks,
    /// Glass pane block.
    Glass,

    // --- Fluids and ice ---
    /// Water source.
    Water,
    /// Lava source.
    Lava,
    /// Regular ice.
    Ice,
    /// Compressed ice.
    PackedIce,
    /// The densest ice.
    BlueIce,
    /// Cooled lava.
    Obsidian,

    // --- Snow ---
    /// Layered snow, 1 to 8 layers (see [`BlockState::layers`]).
    ///
    /// [`BlockState::layers`]: crate::structs::BlockState::layers
    SnowLayer,
    /// A full block of packed snow.
    SnowBlock,

    // --- Vegetation ---
    /// Short grass plant.
    ShortGrass,
    /// Fern plant.
    Fern,
    /// Any flower.
    Flower,
    /// Growing crops on farmland.
    Crops,
    /// Withered plant left behind by the cold.
    DeadBush,
    /// Living tree trunk.
    OakLog,
    /// Living tree foliage.
    OakLeaves,
    /// Trunk killed by the cold.
    DeadLog,
    /// Foliage killed by the cold.
    DeadLeaves,
    /// Dead trunk frozen brittle.
    FrozenLog,
    /// Dead foliage frozen brittle.
    FrozenLeaves,

    // --- Heat and light ---
    /// Campfire; warms only while lit.
    Campfire,
    /// Soul campfire; warms only while lit.
    SoulCampfire,
    /// Furnace; warms only while lit.
    Furnace,
    /// Open fire.
    Fire,
    /// Magma block.
    MagmaBlock,
    /// Wall or floor torch.
    Torch,
    /// Hanging or standing lantern.
    Lantern,
    /// Glowstone; light only, no warmth.
    Glowstone,

    // --- Machines ---
    /// Power source for the transponder.
    PowerCell,
    /// Fuel-burning heater block.
    ThermalHeater,
    /// Upgradable geothermal core.
    GeothermalCore,
    /// Satellite transponder.
    Transponder,
    /// Deep smelter for acheronite.
    AcheronForge,

    // --- Apocalypse growths ---
    /// Crystal cluster that grows on frozen surfaces.
    AcheroniteCluster,
    /// Solidified air formed during atmospheric collapse.
    FrozenAtmosphere,
}

impl BlockKind {
    /// Whether the cell is empty.
    pub const fn is_air(self) -> bool {
        matches!(self, Self::Air)
    }

    /// Whether the block is a full, solid cube.
    ///
    /// Solid blocks count as shelter overhead, can carry snow, and block a
    /// transponder shaft.
    pub const fn is_solid(self) -> bool {
        !matches!(
            self,
            Self::Air
                | Self::Water
                | Self::Lava
                | Self::SnowLayer
                | Self::ShortGrass
                | Self::Fern
                | Self::Flower
                | Self::Crops
                | Self::DeadBush
                | Self::Campfire
                | Self::SoulCampfire
                | Self::Fire
                | Self::Torch
                | Self::Lantern
                | Self::FrozenAtmosphere
                | Self::AcheroniteCluster
        )
    }

    /// Whether the block is a fluid.
    pub const fn is_liquid(self) -> bool {
        matches!(self, Self::Water | Self::Lava)
    }

    /// Whether the block is a small living plant that withers in the cold.
    pub const fn is_plant(self) -> bool {
        matches!(self, Self::ShortGrass | Self::Fern | Self::Flower)
    }

    /// Whether the block is dead or frozen timber that can collapse.
    pub const fn is_dead_timber(self) -> bool {
        matches!(
            self,
            Self::DeadLog | Self::FrozenLog | Self::DeadLeaves | Self::FrozenLeaves
        )
    }

    /// Whether the block is a log that can trigger a tree collapse.
    pub const fn is_dead_log(self) -> bool {
        matches!(self, Self::DeadLog | Self::FrozenLog)
    }

    /// Whether the block is a form of ice.
    pub const fn is_ice(self) -> bool {
        matches!(self, Self::Ice | Self::PackedIce | Self::BlueIce)
    }

    /// Whether the block emits light. `lit` is the block's lit property.
    pub const fn emits_light(self, lit: bool) -> bool {
        match self {
            Self::Campfire | Self::SoulCampfire | Self::Furnace | Self::ThermalHeater => lit,
            Self::Fire | Self::Lava | Self::MagmaBlock | Self::Torch | Self::Lantern
            | Self::Glowstone => true,
            _ => false,
        }
    }

    /// Whether the block carries a machine block entity.
    pub const fn is_machine(self) -> bool {
        matches!(
            self,
            Self::ThermalHeater | Self::GeothermalCore | Self::Transponder | Self::AcheronForge
        )
    }

    /// Item dropped when the block is broken by a collapse, if any.
    pub const fn drop_item(self) -> Option<ItemKind> {
        match self {
            Self::DeadLog | Self::FrozenLog | Self::OakLog => Some(ItemKind::OakLog),
            Self::DeadLeaves | Self::FrozenLeaves => Some(ItemKind::Stick),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// The kind of item held in an inventory slot or machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    // --- Fuel ---
    /// Coal lump.
    Coal,
    /// Charcoal.
    Charcoal,
    /// Oak log item.
    OakLog,
    /// Planks item.
    Planks,
    /// Stick.
    Stick,
    /// Blaze rod.
    BlazeRod,

    // --- Upgrade materials ---
    /// Copper block, the range upgrade for a geothermal core.
    CopperBlock,
    /// Magma cream, the temperature upgrade for a geothermal core.
    MagmaCream,
    /// Acheronite shard, the oxygen upgrade and forge input.
    AcheroniteShard,
    /// Acheronite cluster, forge input.
    AcheroniteCluster,
    /// Acheronite ingot, forge output.
    AcheroniteIngot,

    // --- Food ---
    /// Bread.
    Bread,
    /// Apple.
    Apple,
    /// Cooked beef.
    CookedBeef,
    /// Raw cod.
    RawCod,

    // --- Gear ---
    /// Insulated pack; food carried alongside it does not freeze.
    InsulatedPack,
    /// Satellite transponder schematic.
    TransponderSchematic,
}

impl ItemKind {
    /// Whether the item is food and therefore tracks frost.
    pub const fn is_food(self) -> bool {
        matches!(self, Self::Bread | Self::Apple | Self::CookedBeef | Self::RawCod)
    }

    /// Burn time in ticks when used as heater fuel, or `None` if not a fuel.
    pub const fn fuel_ticks(self) -> Option<u32> {
        match self {
            Self::Coal | Self::Charcoal => Some(1600),
            Self::OakLog | Self::Planks => Some(300),
            Self::BlazeRod => Some(2400),
            _ => None,
        }
    }

    /// Maximum stack size.
    pub const fn max_stack(self) -> u32 {
        match self {
            Self::InsulatedPack | Self::TransponderSchematic => 1,
            _ => 64,
        }
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Protective armor tier worn by a player.
///
/// Higher tiers delay the onset of cold and suffocation trackers; they do
/// not reduce severity once a stage is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorTier {
    /// No protective equipment.
    None,
    /// Leather armor.
    Leather,
    /// Insulated suit.
    Insulated,
    /// Sealed cryo suit.
    Cryo,
}

impl ArmorTier {
    /// Ticks of cold exposure before frostbite starts accumulating.
    pub const fn frostbite_grace_ticks(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Leather => 200,
            Self::Insulated => 600,
            Self::Cryo => 1200,
        }
    }

    /// Extra ticks of breath outside a breathable zone.
    pub const fn suffocation_grace_bonus(self) -> u32 {
        match self {
            Self::None | Self::Leather => 0,
            Self::Insulated => 100,
            Self::Cryo => 600,
        }
    }
}

/// Game mode of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Normal survival play; all trackers apply.
    Survival,
    /// Creative mode; exempt from every tracker.
    Creative,
    /// Spectator mode; exempt and invisible to other players.
    Spectator,
}

impl GameMode {
    /// Whether survival trackers skip this player.
    pub const fn is_exempt(self) -> bool {
        matches!(self, Self::Creative | Self::Spectator)
    }
}

/// Kind of a non-player mob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobKind {
    /// Zombie.
    Zombie,
    /// Skeleton.
    Skeleton,
    /// Stray, the cold-adapted skeleton.
    Stray,
    /// Creeper.
    Creeper,
    /// Spider.
    Spider,
    /// Cow.
    Cow,
    /// Sheep.
    Sheep,
    /// Pig.
    Pig,
    /// Wolf.
    Wolf,
    /// Polar bear.
    PolarBear,
    /// Snow golem.
    SnowGolem,
}

impl MobKind {
    /// Whether the mob ignores cold entirely.
    pub const fn is_cold_immune(self) -> bool {
        matches!(self, Self::Stray | Self::PolarBear | Self::SnowGolem)
    }
}

/// A status effect applied to a player or mob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEffect {
    /// Movement slowed.
    Slowness,
    /// Mining slowed.
    MiningFatigue,
    /// Melee damage reduced.
    Weakness,
    /// Screen wobble.
    Nausea,
    /// Vision pulses dark.
    Darkness,
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Generates a four-step severity enum with numeric conversions.
macro_rules! define_stage {
    (
        $(#[$meta:meta])*
        $name:ident { $s0:ident, $s1:ident, $s2:ident, $s3:ident }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            /// Stage 0: no effect.
            #[default]
            $s0,
            /// Stage 1.
            $s1,
            /// Stage 2.
            $s2,
            /// Stage 3: most severe.
            $s3,
        }

        impl $name {
            /// Numeric stage, 0 through 3.
            pub const fn as_u8(self) -> u8 {
                match self {
                    Self::$s0 => 0,
                    Self::$s1 => 1,
                    Self::$s2 => 2,
                    Self::$s3 => 3,
                }
            }

            /// Stage from a number; values above 3 saturate.
            pub const fn from_u8(value: u8) -> Self {
                match value {
                    0 => Self::$s0,
                    1 => Self::$s1,
                    2 => Self::$s2,
                    _ => Self::$s3,
                }
            }
        }
    };
}

define_stage! {
    /// Frostbite severity of a player.
    FrostbiteStage { Clear, Numb, Frostnip, Frostbite }
}

define_stage! {
    /// Freeze severity of a mob.
    MobFreezeStage { Clear, Chilled, Frozen, Solid }
}

define_stage! {
    /// Sanity stage driven by isolation.
    SanityStage { Stable, Uneasy, Paranoid, Breaking }
}

define_stage! {
    /// Spoilage stage of a food stack.
    FoodFrostStage { Fresh, Chilled, Frozen, Ruined }
}

/// Weather over the loaded world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    /// No precipitation.
    Clear,
    /// Rain.
    Rain,
    /// Snowfall.
    Snow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plants_and_fluids_are_not_solid() {
        assert!(!BlockKind::Water.is_solid());
        assert!(!BlockKind::ShortGrass.is_solid());
        assert!(!BlockKind::SnowLayer.is_solid());
        assert!(BlockKind::Stone.is_solid());
        assert!(BlockKind::OakLeaves.is_solid());
    }

    #[test]
    fn campfire_light_follows_lit_property() {
        assert!(BlockKind::Campfire.emits_light(true));
        assert!(!BlockKind::Campfire.emits_light(false));
        assert!(BlockKind::Glowstone.emits_light(false));
    }

    #[test]
    fn armor_grace_grows_with_tier() {
        let tiers = [ArmorTier::None, ArmorTier::Leather, ArmorTier::Insulated, ArmorTier::Cryo];
        for pair in tiers.windows(2) {
            if let [lower, higher] = pair {
                assert!(lower.frostbite_grace_ticks() < higher.frostbite_grace_ticks());
            }
        }
    }

    #[test]
    fn stage_numeric_roundtrip_saturates() {
        assert_eq!(SanityStage::from_u8(2), SanityStage::Paranoid);
        assert_eq!(SanityStage::from_u8(9), SanityStage::Breaking);
        assert_eq!(FoodFrostStage::Ruined.as_u8(), 3);
        assert_eq!(FrostbiteStage::default(), FrostbiteStage::Clear);
    }

    #[test]
    fn fuel_values() {
        assert_eq!(ItemKind::Coal.fuel_ticks(), Some(1600));
        assert_eq!(ItemKind::BlazeRod.fuel_ticks(), Some(2400));
        assert_eq!(ItemKind::Bread.fuel_ticks(), None);
    }
}
