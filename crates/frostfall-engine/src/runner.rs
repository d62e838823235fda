//! Paced tick loop with a stdin admin console.
//!
//! [`run`] drives [`run_tick`] on a fixed interval and, in the same task,
//! reads command lines from its input (stdin in the binary). Simulation
//! commands go to the admin command tree; the console itself understands
//! `save` and `quit`. The loop ends on `quit`, Ctrl-C, or an optional tick
//! limit, and the world is saved on the way out. Closing the input only
//! stops the console.
//!
//! Outbound client messages have no transport here: each is written to the
//! log as JSON, notices at `info`, everything else at `debug`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use frostfall_core::tick::{SimulationState, TickSummary, run_tick};
use frostfall_core::{WorldSave, admin};
use frostfall_types::{ClientMessage, Outbound};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::EngineError;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// `quit` was entered.
    Quit,
    /// Ctrl-C.
    Interrupted,
    /// The tick limit was reached.
    TickLimit,
}

/// Result of a run.
#[derive(Debug)]
pub struct RunResult {
    /// Why the loop stopped.
    pub end_reason: EndReason,
    /// Ticks executed during this run.
    pub total_ticks: u64,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
}

/// Options for [`run`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Real time between ticks.
    pub tick_interval: Duration,
    /// Where to save on shutdown and on `save`.
    pub save_path: PathBuf,
    /// Stop after this many ticks.
    pub max_ticks: Option<u64>,
    /// Log a status line every this many ticks (0 disables).
    pub status_every: u64,
}

/// Run the simulation until a stop condition, then save.
pub async fn run<R>(
    state: &mut SimulationState,
    options: &RunOptions,
    input: R,
) -> Result<RunResult, EngineError>
where
    R: AsyncBufRead + Unpin,
{
    let mut interval = tokio::time::interval(options.tick_interval.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut lines = input.lines();
    let mut input_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut total_ticks: u64 = 0;
    let mut final_summary: Option<TickSummary> = None;

    info!(
        tick_interval_ms = u64::try_from(options.tick_interval.as_millis()).unwrap_or(u64::MAX),
        max_ticks = options.max_ticks,
        save_path = %options.save_path.display(),
        "tick loop starting"
    );

    let end_reason = loop {
        tokio::select! {
            _ = interval.tick() => {
                let summary = run_tick(state)?;
                total_ticks = total_ticks.saturating_add(1);
                deliver(state.drain_outbound());
                log_summary(&summary, options.status_every);
                final_summary = Some(summary);
                if options.max_ticks.is_some_and(|max| total_ticks >= max) {
                    break EndReason::TickLimit;
                }
            }
            line = lines.next_line(), if input_open => {
                match line? {
                    Some(line) => {
                        if let Some(reason) = console(state, &line, &options.save_path) {
                            break reason;
                        }
                        deliver(state.drain_outbound());
                    }
                    None => {
                        input_open = false;
                        if options.max_ticks.is_none() {
                            info!("console input closed; press Ctrl-C to stop");
                        }
                    }
                }
            }
            _ = &mut ctrl_c => {
                break EndReason::Interrupted;
            }
        }
    };

    save(state, &options.save_path)?;
    Ok(RunResult {
        end_reason,
        total_ticks,
        final_summary,
    })
}

/// Handle one console line. Returns a reason if the loop should stop.
fn console(state: &mut SimulationState, line: &str, save_path: &Path) -> Option<EndReason> {
    match line.trim() {
        "" => None,
        "quit" | "exit" | "stop" => Some(EndReason::Quit),
        "save" => {
            if let Err(err) = save(state, save_path) {
                warn!(error = %err, "save failed");
            }
            None
        }
        command => {
            match admin::handle(state, command) {
                Ok(reply) => info!(command, reply = %reply.message, "admin"),
                Err(err) => warn!(command, error = %err, "admin command rejected"),
            }
            None
        }
    }
}

fn save(state: &SimulationState, path: &Path) -> Result<(), EngineError> {
    WorldSave::capture(state)?.save(path)?;
    Ok(())
}

/// Hand outbound messages to the log.
fn deliver(outbound: Vec<Outbound>) {
    for message in outbound {
        if let ClientMessage::Notice { text } = &message.message {
            info!(to = ?message.target, text = %text, "notice");
        } else {
            let json = serde_json::to_string(&message).unwrap_or_default();
            debug!(message = %json, "client message");
        }
    }
}

fn log_summary(summary: &TickSummary, every: u64) {
    if !summary.deaths.is_empty() {
        info!(tick = summary.tick, deaths = summary.deaths.len(), "players died");
    }
    if summary.terrain.transformed > 0 || summary.terrain.collapsed > 0 {
        debug!(
            tick = summary.tick,
            transformed = summary.terrain.transformed,
            collapsed = summary.terrain.collapsed,
            "terrain transformed"
        );
    }
    if every > 0 && summary.tick.checked_rem(every) == Some(0) {
        info!(
            tick = summary.tick,
            phase = summary.phase,
            sub_stage = summary.sub_stage,
            weather = ?summary.weather,
            players_tracked = summary.players_tracked,
            "status"
        );
    }
}

/// Log the end of a run.
pub fn log_run_end(result: &RunResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        final_phase = result.final_summary.as_ref().map(|s| s.phase),
        "run ended"
    );
    if result.final_summary.is_none() {
        warn!("run ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use frostfall_core::SimulationConfig;

    use super::*;

    fn state() -> SimulationState {
        SimulationState::new(SimulationConfig::default()).unwrap()
    }

    #[test]
    fn console_quits_and_forwards_admin_commands() {
        let mut s = state();
        let path = std::env::temp_dir().join("frostfall-console-unused.json");
        assert_eq!(console(&mut s, "quit", &path), Some(EndReason::Quit));
        assert_eq!(console(&mut s, "  ", &path), None);
        assert_eq!(console(&mut s, "set-day 50", &path), None);
        assert_eq!(s.environment().phase, 3);
        assert_eq!(console(&mut s, "set-day never", &path), None);
    }

    #[tokio::test]
    async fn tick_limit_stops_and_saves() {
        let mut s = state();
        let path = std::env::temp_dir().join(format!(
            "frostfall-run-{}.json",
            frostfall_types::PlayerId::new()
        ));
        let options = RunOptions {
            tick_interval: Duration::from_millis(1),
            save_path: path.clone(),
            max_ticks: Some(30),
            status_every: 0,
        };
        let input: &[u8] = b"set-day 50\npause\n";
        let result = run(&mut s, &options, input).await.unwrap();
        assert_eq!(result.end_reason, EndReason::TickLimit);
        assert_eq!(result.total_ticks, 30);
        assert_eq!(s.tick(), 30);
        assert!(s.paused);
        assert_eq!(s.environment().phase, 3);
        let saved = WorldSave::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(saved.apocalypse, s.apocalypse);
    }
}

