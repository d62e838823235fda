//! Satellite transponder: the broadcast that ends the scenario.
//!
//! A transponder is `Idle` until a player with the schematic starts it.
//! While `Broadcasting` it counts down to `Complete`. It drops to `Paused`
//! on its own when power fails or its sky shaft fills in, and resumes once
//! both are back. A player can also pause it by hand; a manual pause is
//! sticky and only another toggle lifts it.
//!
//! Every `shaft_check_interval` ticks, while broadcasting or auto-paused,
//! the transponder clears snow and frozen atmosphere from its shaft and
//! re-validates it.

use frostfall_types::{BlockKind, BlockPos, BlockState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{MachineContext, MachineEvent, MachineEventKind, block_within};
use crate::registry::SpatialRegistries;
use crate::voxel::VoxelWorld;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Transponder tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransponderSettings {
    /// Ticks a full broadcast takes.
    #[serde(default = "default_total_broadcast_ticks")]
    pub total_broadcast_ticks: u32,
    /// Highest y a transponder may start at.
    #[serde(default)]
    pub max_y: i32,
    /// Radius within which a power cell powers the transponder.
    #[serde(default = "default_power_radius")]
    pub power_radius: u32,
    /// Ticks between shaft clearing passes.
    #[serde(default = "default_shaft_check_interval")]
    pub shaft_check_interval: u32,
}

const fn default_total_broadcast_ticks() -> u32 {
    12_000
}

const fn default_power_radius() -> u32 {
    4
}

const fn default_shaft_check_interval() -> u32 {
    100
}

impl Default for TransponderSettings {
    fn default() -> Self {
        Self {
            total_broadcast_ticks: default_total_broadcast_ticks(),
            max_y: 0,
            power_radius: default_power_radius(),
            shaft_check_interval: default_shaft_check_interval(),
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Lifecycle of a transponder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransponderState {
    /// Not yet started.
    #[default]
    Idle,
    /// Counting down.
    Broadcasting,
    /// Finished; the satellite is placed.
    Complete,
    /// Stopped partway, by hand or by lost conditions.
    Paused,
}

/// Why a transponder refused to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActivationRefusal {
    /// The transponder sits above the allowed height.
    #[error("the transponder must be at or below y={max_y} (it is at y={y})")]
    TooHigh {
        /// Transponder y.
        y: i32,
        /// Highest allowed y.
        max_y: i32,
    },
    /// The player has not unlocked the schematic.
    #[error("you have not unlocked the transponder schematic")]
    SchematicLocked,
    /// No power cell or active geothermal core is in reach.
    #[error("the transponder has no power source")]
    NoPower,
    /// Something solid blocks the sky above.
    #[error("the shaft to the sky is blocked")]
    ShaftBlocked,
    /// The broadcast already finished.
    #[error("the broadcast is already complete")]
    AlreadyComplete,
}

/// A transponder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transponder {
    /// Lifecycle state.
    pub state: TransponderState,
    /// Ticks left in the broadcast.
    pub broadcast_ticks_remaining: u32,
    /// Length of the broadcast when it started.
    pub total_broadcast_ticks: u32,
    /// Result of the last shaft validation.
    pub shaft_clear: bool,
    /// Whether a player paused it.
    pub manually_paused: bool,
    /// Ticks since the last shaft pass.
    pub ticks_since_shaft_check: u32,
}

impl Default for Transponder {
    fn default() -> Self {
        Self {
            state: TransponderState::Idle,
            broadcast_ticks_remaining: 0,
            total_broadcast_ticks: 0,
            shaft_clear: true,
            manually_paused: false,
            ticks_since_shaft_check: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// Whether a shaft cell lets the signal through.
const fn is_clear_cell(kind: BlockKind) -> bool {
    matches!(
        kind,
        BlockKind::Air | BlockKind::SnowLayer | BlockKind::SnowBlock | BlockKind::FrozenAtmosphere
    )
}

/// Whether every cell above `pos` up to the build limit is loaded and clear.
pub fn shaft_is_clear(world: &dyn VoxelWorld, pos: BlockPos) -> bool {
    let top = world.max_y();
    (pos.y.saturating_add(1)..=top).all(|y| {
        let cell = BlockPos::new(pos.x, y, pos.z);
        world.is_loaded(cell) && is_clear_cell(world.block(cell).kind)
    })
}

/// Remove snow and frozen atmosphere above `pos`. Returns cells cleared.
pub fn clear_shaft(world: &mut dyn VoxelWorld, pos: BlockPos) -> u32 {
    let mut cleared: u32 = 0;
    for y in pos.y.saturating_add(1)..=world.max_y() {
        let cell = BlockPos::new(pos.x, y, pos.z);
        if !world.is_loaded(cell) {
            break;
        }
        let kind = world.block(cell).kind;
        if matches!(
            kind,
            BlockKind::SnowLayer | BlockKind::SnowBlock | BlockKind::FrozenAtmosphere
        ) && world.set_block(cell, BlockState::AIR).is_ok()
        {
            cleared = cleared.saturating_add(1);
        }
    }
    cleared
}

/// Whether a power cell or an active geothermal core reaches `pos`.
pub fn has_power(
    world: &dyn VoxelWorld,
    registries: &SpatialRegistries,
    pos: BlockPos,
    settings: &TransponderSettings,
) -> bool {
    registries.cores.powers(pos)
        || block_within(world, pos, BlockKind::PowerCell, settings.power_radius)
}

// ---------------------------------------------------------------------------
// Behavior
// ---------------------------------------------------------------------------

impl Transponder {
    /// Handle a player toggling the transponder.
    ///
    /// Starts an idle transponder once every precondition holds, pauses a
    /// broadcasting one, and lifts a manual pause. Lifting a manual pause
    /// resumes only if power and shaft are fine; otherwise the transponder
    /// stays paused until they return on their own.
    pub fn toggle(
        &mut self,
        world: &dyn VoxelWorld,
        registries: &SpatialRegistries,
        pos: BlockPos,
        settings: &TransponderSettings,
        schematic_unlocked: bool,
    ) -> Result<TransponderState, ActivationRefusal> {
        match self.state {
            TransponderState::Complete => Err(ActivationRefusal::AlreadyComplete),
            TransponderState::Idle => {
                if pos.y > settings.max_y {
                    return Err(ActivationRefusal::TooHigh {
                        y: pos.y,
                        max_y: settings.max_y,
                    });
                }
                if !schematic_unlocked {
                    return Err(ActivationRefusal::SchematicLocked);
                }
                if !has_power(world, registries, pos, settings) {
                    return Err(ActivationRefusal::NoPower);
                }
                if !shaft_is_clear(world, pos) {
                    return Err(ActivationRefusal::ShaftBlocked);
                }
                self.state = TransponderState::Broadcasting;
                self.total_broadcast_ticks = settings.total_broadcast_ticks;
                self.broadcast_ticks_remaining = settings.total_broadcast_ticks;
                self.shaft_clear = true;
                self.manually_paused = false;
                self.ticks_since_shaft_check = 0;
                info!(%pos, ticks = self.total_broadcast_ticks, "transponder broadcast started");
                Ok(self.state)
            }
            TransponderState::Broadcasting => {
                self.state = TransponderState::Paused;
                self.manually_paused = true;
                info!(%pos, "transponder paused by player");
                Ok(self.state)
            }
            TransponderState::Paused if self.manually_paused => {
                self.manually_paused = false;
                self.shaft_clear = shaft_is_clear(world, pos);
                if self.shaft_clear && has_power(world, registries, pos, settings) {
                    self.state = TransponderState::Broadcasting;
                    info!(%pos, "transponder resumed by player");
                } else {
                    info!(%pos, "transponder released but conditions not met");
                }
                Ok(self.state)
            }
            TransponderState::Paused => {
                self.manually_paused = true;
                info!(%pos, "transponder held by player");
                Ok(self.state)
            }
        }
    }

    /// Fraction of the broadcast done, 0.0 to 1.0.
    pub fn progress(&self) -> f64 {
        if self.total_broadcast_ticks == 0 {
            return if self.state == TransponderState::Complete { 1.0 } else { 0.0 };
        }
        let done = self
            .total_broadcast_ticks
            .saturating_sub(self.broadcast_ticks_remaining);
        f64::from(done) / f64::from(self.total_broadcast_ticks)
    }

    pub(crate) fn tick(
        &mut self,
        ctx: &mut MachineContext<'_>,
        pos: BlockPos,
        events: &mut Vec<MachineEvent>,
    ) {
        let auto_paused = self.state == TransponderState::Paused && !self.manually_paused;
        if self.state != TransponderState::Broadcasting && !auto_paused {
            return;
        }

        let settings = ctx.transponder;
        self.ticks_since_shaft_check = self.ticks_since_shaft_check.saturating_add(1);
        if self.ticks_since_shaft_check >= settings.shaft_check_interval {
            self.ticks_since_shaft_check = 0;
            let cleared = clear_shaft(&mut *ctx.world, pos);
            self.shaft_clear = shaft_is_clear(&*ctx.world, pos);
            debug!(%pos, cleared, shaft_clear = self.shaft_clear, "transponder shaft pass");
        }
        let powered = has_power(&*ctx.world, ctx.registries, pos, &settings);

        if auto_paused {
            if powered && self.shaft_clear {
                self.state = TransponderState::Broadcasting;
                info!(%pos, "transponder resumed");
                events.push(MachineEvent {
                    pos,
                    kind: MachineEventKind::TransponderResumed,
                });
            }
            return;
        }

        if !powered || !self.shaft_clear {
            self.state = TransponderState::Paused;
            self.manually_paused = false;
            info!(%pos, powered, shaft_clear = self.shaft_clear, "transponder lost conditions");
            events.push(MachineEvent {
                pos,
                kind: MachineEventKind::TransponderPaused { manual: false },
            });
            return;
        }

        self.broadcast_ticks_remaining = self.broadcast_ticks_remaining.saturating_sub(1);
        if self.broadcast_ticks_remaining == 0 {
            self.state = TransponderState::Complete;
            info!(%pos, "transponder broadcast complete");
            events.push(MachineEvent {
                pos,
                kind: MachineEventKind::TransponderCompleted,
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::voxel::ChunkedWorld;

    const SETTINGS: TransponderSettings = TransponderSettings {
        total_broadcast_ticks: 300,
        max_y: 0,
        power_radius: 4,
        shaft_check_interval: 100,
    };

    fn world() -> (ChunkedWorld, BlockPos) {
        let mut world = ChunkedWorld::new(-32, 32);
        world.load_area(0, 0, 8);
        let pos = BlockPos::new(0, -10, 0);
        let _ = world.set_block(pos, BlockState::of(BlockKind::Transponder));
        let _ = world.set_block(BlockPos::new(2, -10, 0), BlockState::of(BlockKind::PowerCell));
        (world, pos)
    }

    fn tick_n(
        transponder: &mut Transponder,
        world: &mut ChunkedWorld,
        pos: BlockPos,
        n: u64,
    ) -> Vec<MachineEventKind> {
        let mut registries = SpatialRegistries::new();
        let mut events = Vec::new();
        for tick in 0..n {
            let mut ctx = MachineContext {
                world: &mut *world,
                registries: &mut registries,
                tick,
                transponder: SETTINGS,
            };
            transponder.tick(&mut ctx, pos, &mut events);
        }
        events.into_iter().map(|event| event.kind).collect()
    }

    fn started(world: &ChunkedWorld, pos: BlockPos) -> Transponder {
        let mut transponder = Transponder::default();
        let result = transponder.toggle(world, &SpatialRegistries::new(), pos, &SETTINGS, true);
        assert_eq!(result, Ok(TransponderState::Broadcasting));
        transponder
    }

    #[test]
    fn preconditions_refuse_in_order() {
        let (mut world, pos) = world();
        let registries = SpatialRegistries::new();
        let mut transponder = Transponder::default();

        let high = BlockPos::new(0, 5, 0);
        assert_eq!(
            transponder.toggle(&world, &registries, high, &SETTINGS, true),
            Err(ActivationRefusal::TooHigh { y: 5, max_y: 0 })
        );
        assert_eq!(
            transponder.toggle(&world, &registries, pos, &SETTINGS, false),
            Err(ActivationRefusal::SchematicLocked)
        );

        let _ = world.set_block(pos.offset(0, 4, 0), BlockState::of(BlockKind::Stone));
        assert_eq!(
            transponder.toggle(&world, &registries, pos, &SETTINGS, true),
            Err(ActivationRefusal::ShaftBlocked)
        );

        let _ = world.set_block(BlockPos::new(2, -10, 0), BlockState::AIR);
        assert_eq!(
            transponder.toggle(&world, &registries, pos, &SETTINGS, true),
            Err(ActivationRefusal::NoPower)
        );
        assert_eq!(transponder.state, TransponderState::Idle);
    }

    #[test]
    fn snow_in_the_shaft_does_not_block() {
        let (mut world, pos) = world();
        let _ = world.set_block(pos.offset(0, 3, 0), BlockState::of(BlockKind::SnowBlock));
        let _ = world.set_block(pos.offset(0, 20, 0), BlockState::of(BlockKind::FrozenAtmosphere));
        assert!(shaft_is_clear(&world, pos));
        assert_eq!(clear_shaft(&mut world, pos), 2);
    }

    #[test]
    fn completes_after_full_broadcast() {
        let (mut world, pos) = world();
        let mut transponder = started(&world, pos);
        let events = tick_n(&mut transponder, &mut world, pos, 300);
        assert_eq!(events, vec![MachineEventKind::TransponderCompleted]);
        assert_eq!(transponder.state, TransponderState::Complete);
        assert!((transponder.progress() - 1.0).abs() < f64::EPSILON);
        assert_eq!(
            transponder.toggle(&world, &SpatialRegistries::new(), pos, &SETTINGS, true),
            Err(ActivationRefusal::AlreadyComplete)
        );
    }

    #[test]
    fn power_loss_auto_pauses_and_recovery_resumes() {
        let (mut world, pos) = world();
        let mut transponder = started(&world, pos);
        tick_n(&mut transponder, &mut world, pos, 10);

        let _ = world.set_block(BlockPos::new(2, -10, 0), BlockState::AIR);
        let events = tick_n(&mut transponder, &mut world, pos, 5);
        assert_eq!(events, vec![MachineEventKind::TransponderPaused { manual: false }]);
        assert_eq!(transponder.state, TransponderState::Paused);
        assert_eq!(transponder.broadcast_ticks_remaining, 290);

        let _ = world.set_block(BlockPos::new(0, -10, 3), BlockState::of(BlockKind::PowerCell));
        let events = tick_n(&mut transponder, &mut world, pos, 1);
        assert_eq!(events, vec![MachineEventKind::TransponderResumed]);
        assert_eq!(transponder.state, TransponderState::Broadcasting);
    }

    #[test]
    fn manual_pause_is_sticky() {
        let (mut world, pos) = world();
        let registries = SpatialRegistries::new();
        let mut transponder = started(&world, pos);

        assert_eq!(
            transponder.toggle(&world, &registries, pos, &SETTINGS, true),
            Ok(TransponderState::Paused)
        );
        assert!(transponder.manually_paused);
        // Conditions are fine, yet a manual pause never lifts on its own.
        assert!(tick_n(&mut transponder, &mut world, pos, 200).is_empty());
        assert_eq!(transponder.broadcast_ticks_remaining, 300);

        // Releasing without power leaves it auto-paused.
        let _ = world.set_block(BlockPos::new(2, -10, 0), BlockState::AIR);
        assert_eq!(
            transponder.toggle(&world, &registries, pos, &SETTINGS, true),
            Ok(TransponderState::Paused)
        );
        assert!(!transponder.manually_paused);

        let _ = world.set_block(BlockPos::new(2, -10, 0), BlockState::of(BlockKind::PowerCell));
        let events = tick_n(&mut transponder, &mut world, pos, 1);
        assert_eq!(events, vec![MachineEventKind::TransponderResumed]);
    }

    #[test]
    fn core_range_powers_a_transponder() {
        use crate::registry::CoreReach;

        let (mut world, pos) = world();
        let _ = world.set_block(BlockPos::new(2, -10, 0), BlockState::AIR);
        let mut registries = SpatialRegistries::new();
        registries.cores.upsert(
            BlockPos::new(0, -20, 0),
            CoreReach {
                range_radius: 12,
                warmth: 20,
                o2_radius: 4,
            },
        );
        let mut transponder = Transponder::default();
        assert_eq!(
            transponder.toggle(&world, &registries, pos, &SETTINGS, true),
            Ok(TransponderState::Broadcasting)
        );
    }
}
