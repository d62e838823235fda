//! Admin command tree for runtime apocalypse control.
//!
//! Commands arrive as text lines (the engine reads them from stdin) and
//! are applied to the [`SimulationState`] between ticks. Every command
//! answers with an [`AdminReply`]; malformed input is an [`AdminError`].
//!
//! | Command | Effect |
//! |---------|--------|
//! | `status` | Day, phase, temperature, weather and flags |
//! | `set-day <day>` | Jump to the start of a day |
//! | `set-phase <1-6> [substage]` | Jump to the start of a phase |
//! | `pause` | Freeze or unfreeze the apocalypse counter |
//! | `start` | Begin the apocalypse if it has not begun |
//! | `reset` | Return to the calm world |
//! | `preset <name>` | Apply `short`, `normal`, `long` or `brutal` |

use serde::Serialize;
use tracing::info;

use crate::apocalypse::ApocalypseError;
use crate::config::Preset;
use crate::tick::{SimulationState, TickError};

/// Errors that can occur while parsing or running an admin command.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// The line held no command.
    #[error("no command given")]
    Empty,

    /// The command word is not known.
    #[error("unknown command: {name}")]
    UnknownCommand {
        /// The unrecognized word.
        name: String,
    },

    /// A required argument is missing.
    #[error("{command} needs <{argument}>")]
    MissingArgument {
        /// The command.
        command: &'static str,
        /// The missing argument.
        argument: &'static str,
    },

    /// An argument is not a valid number.
    #[error("{argument} must be a number, got {value:?}")]
    InvalidNumber {
        /// The argument name.
        argument: &'static str,
        /// What was given.
        value: String,
    },

    /// The preset name is not known.
    #[error("unknown preset: {name} (try short, normal, long, brutal)")]
    UnknownPreset {
        /// The unrecognized name.
        name: String,
    },

    /// The apocalypse counter rejected the change.
    #[error("{source}")]
    Apocalypse {
        /// The underlying counter error.
        #[from]
        source: ApocalypseError,
    },

    /// Re-deriving the simulation tuning failed.
    #[error("{source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// A parsed admin command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    /// Report current state.
    Status,
    /// Jump to the start of a day.
    SetDay(u32),
    /// Jump to a phase, with an optional collapse sub-stage.
    SetPhase {
        /// Phase 1 through 6.
        phase: u8,
        /// Sub-stage 1 through 3 for phase 6.
        sub_stage: Option<u8>,
    },
    /// Toggle the counter pause.
    Pause,
    /// Begin the apocalypse.
    Start,
    /// Return to the calm world.
    Reset,
    /// Apply a preset.
    Preset(Preset),
}

/// Answer to an admin command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminReply {
    /// Human-readable message.
    pub message: String,
}

impl AdminReply {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl AdminCommand {
    /// Parse a command line.
    pub fn parse(line: &str) -> Result<Self, AdminError> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(AdminError::Empty)?;
        match name.to_ascii_lowercase().as_str() {
            "status" => Ok(Self::Status),
            "set-day" => {
                let day = words.next().ok_or(AdminError::MissingArgument {
                    command: "set-day",
                    argument: "day",
                })?;
                Ok(Self::SetDay(number(day, "day")?))
            }
            "set-phase" => {
                let phase = words.next().ok_or(AdminError::MissingArgument {
                    command: "set-phase",
                    argument: "phase",
                })?;
                let phase = number(phase, "phase")?;
                let sub_stage = words.next().map(|raw| number(raw, "substage")).transpose()?;
                Ok(Self::SetPhase { phase, sub_stage })
            }
            "pause" => Ok(Self::Pause),
            "start" => Ok(Self::Start),
            "reset" => Ok(Self::Reset),
            "preset" => {
                let raw = words.next().ok_or(AdminError::MissingArgument {
                    command: "preset",
                    argument: "name",
                })?;
                Preset::parse(raw)
                    .map(Self::Preset)
                    .ok_or_else(|| AdminError::UnknownPreset {
                        name: raw.to_owned(),
                    })
            }
            other => Err(AdminError::UnknownCommand {
                name: other.to_owned(),
            }),
        }
    }

    /// Apply the command.
    pub fn execute(self, state: &mut SimulationState) -> Result<AdminReply, AdminError> {
        let timeline = *state.timeline();
        match self {
            Self::Status => Ok(AdminReply::new(status_line(state))),
            Self::SetDay(day) => {
                state.apocalypse.set_day(day, &timeline);
                let env = state.refresh_environment();
                info!(day, phase = env.phase, "admin set day");
                Ok(AdminReply::new(format!("Day set to {day} (phase {}).", env.phase)))
            }
            Self::SetPhase { phase, sub_stage } => {
                state.apocalypse.set_phase(phase, sub_stage, &timeline)?;
                let env = state.refresh_environment();
                info!(phase, sub_stage = env.sub_stage, day = env.day, "admin set phase");
                Ok(AdminReply::new(format!(
                    "Phase set to {} (day {:.1}).",
                    env.phase, env.day
                )))
            }
            Self::Pause => {
                state.paused = !state.paused;
                info!(paused = state.paused, "admin toggled pause");
                Ok(AdminReply::new(if state.paused {
                    "Apocalypse paused."
                } else {
                    "Apocalypse resumed."
                }))
            }
            Self::Start => {
                let started = state.apocalypse.begin();
                state.refresh_environment();
                info!(started, "admin start");
                Ok(AdminReply::new(if started {
                    "The apocalypse begins."
                } else {
                    "The apocalypse is already under way."
                }))
            }
            Self::Reset => {
                state.reset_apocalypse();
                Ok(AdminReply::new("Apocalypse reset to day 0."))
            }
            Self::Preset(preset) => {
                preset.apply(&mut state.config.apocalypse);
                state.apply_tuning()?;
                info!(preset = preset.name(), total_days = state.config.apocalypse.total_days, "admin applied preset");
                Ok(AdminReply::new(format!(
                    "Preset {} applied ({} days).",
                    preset.name(),
                    state.config.apocalypse.total_days
                )))
            }
        }
    }
}

/// Parse and run one command line.
pub fn handle(state: &mut SimulationState, line: &str) -> Result<AdminReply, AdminError> {
    AdminCommand::parse(line)?.execute(state)
}

fn number<T: std::str::FromStr>(raw: &str, argument: &'static str) -> Result<T, AdminError> {
    raw.parse().map_err(|_err| AdminError::InvalidNumber {
        argument,
        value: raw.to_owned(),
    })
}

fn status_line(state: &SimulationState) -> String {
    let env = state.environment();
    format!(
        "day {:.2}/{} phase {} sub-stage {} surface {:.1}C weather {:?}{}{} players {} machines {}",
        env.day,
        state.config.apocalypse.total_days,
        env.phase,
        env.sub_stage,
        env.temperature_offset,
        state.weather.current(),
        if state.paused { " [paused]" } else { "" },
        if state.satellite_placed { " [satellite placed]" } else { "" },
        state.players.len(),
        state.machines.len(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;

    fn state() -> SimulationState {
        SimulationState::new(SimulationConfig::default()).unwrap()
    }

    #[test]
    fn parses_every_command() {
        assert_eq!(AdminCommand::parse("status").ok(), Some(AdminCommand::Status));
        assert_eq!(AdminCommand::parse("set-day 42").ok(), Some(AdminCommand::SetDay(42)));
        assert_eq!(
            AdminCommand::parse("set-phase 6 2").ok(),
            Some(AdminCommand::SetPhase {
                phase: 6,
                sub_stage: Some(2)
            })
        );
        assert_eq!(AdminCommand::parse("  PAUSE ").ok(), Some(AdminCommand::Pause));
        assert_eq!(AdminCommand::parse("reset").ok(), Some(AdminCommand::Reset));
        assert_eq!(
            AdminCommand::parse("preset brutal").ok(),
            Some(AdminCommand::Preset(Preset::Brutal))
        );
    }

    #[test]
    fn malformed_lines_are_errors() {
        assert!(matches!(AdminCommand::parse("   "), Err(AdminError::Empty)));
        assert!(matches!(
            AdminCommand::parse("thaw"),
            Err(AdminError::UnknownCommand { .. })
        ));
        assert!(matches!(
            AdminCommand::parse("set-day"),
            Err(AdminError::MissingArgument { .. })
        ));
        assert!(matches!(
            AdminCommand::parse("set-day soon"),
            Err(AdminError::InvalidNumber { .. })
        ));
        assert!(matches!(
            AdminCommand::parse("preset endless"),
            Err(AdminError::UnknownPreset { .. })
        ));
    }

    #[test]
    fn set_day_and_phase_move_the_counter() {
        let mut s = state();
        assert!(handle(&mut s, "set-day 50").is_ok());
        assert_eq!(s.environment().phase, 3);
        assert!(handle(&mut s, "set-phase 6 3").is_ok());
        assert_eq!(s.environment().phase, 6);
        assert_eq!(s.environment().sub_stage, 3);
        assert!(matches!(
            handle(&mut s, "set-phase 9"),
            Err(AdminError::Apocalypse { .. })
        ));
    }

    #[test]
    fn pause_toggles() {
        let mut s = state();
        assert!(!s.paused);
        assert!(handle(&mut s, "pause").is_ok());
        assert!(s.paused);
        assert!(handle(&mut s, "pause").is_ok());
        assert!(!s.paused);
    }

    #[test]
    fn reset_returns_to_phase_zero() {
        let mut s = state();
        assert!(handle(&mut s, "set-day 80").is_ok());
        s.satellite_placed = true;
        assert!(handle(&mut s, "reset").is_ok());
        assert_eq!(s.environment().phase, 0);
        assert!(!s.satellite_placed);
    }

    #[test]
    fn preset_changes_phase_of_same_day() {
        let mut s = state();
        assert!(handle(&mut s, "set-day 30").is_ok());
        assert_eq!(s.environment().phase, 2);
        assert!(handle(&mut s, "preset short").is_ok());
        assert_eq!(s.config.apocalypse.total_days, 30);
        assert_eq!(s.environment().phase, 6);
    }

    #[test]
    fn status_mentions_phase_and_pause() {
        let mut s = state();
        assert!(handle(&mut s, "set-day 20").is_ok());
        assert!(handle(&mut s, "pause").is_ok());
        let reply = handle(&mut s, "status").unwrap();
        assert!(reply.message.contains("phase 2"));
        assert!(reply.message.contains("[paused]"));
    }
}
