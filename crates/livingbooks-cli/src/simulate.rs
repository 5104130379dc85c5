//! Line-oriented marker simulator.
//!
//! Each input line is either a command (`start`, `pause`, `resume`,
//! `complete`, `quit`, `reset`) or a sighting (`see <name>`,
//! `limited <name>`, `lose <name>`). Blank lines and `#` comments are
//! skipped.

use std::collections::HashMap;

use livingbooks_coordinator::MarkerSessionCoordinator;
use livingbooks_core::clock::Clock;
use livingbooks_core::error::DomainError;
use livingbooks_core::observation::{MarkerObservation, Pose, TrackableId, TrackingQuality};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::error::AppError;

/// A coordinator command typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorCommand {
    Start,
    Pause,
    Resume,
    Complete,
    Quit,
    Reset,
}

impl SimulatorCommand {
    /// Runs the command against `coordinator`.
    ///
    /// # Errors
    ///
    /// Returns the coordinator's `DomainError` if the command is not valid in
    /// the current state.
    pub fn apply(self, coordinator: &mut MarkerSessionCoordinator) -> Result<(), DomainError> {
        match self {
            Self::Start => coordinator.request_start(),
            Self::Pause => coordinator.request_pause(),
            Self::Resume => coordinator.request_resume(),
            Self::Complete => coordinator.notify_session_completed(),
            Self::Quit => coordinator.request_quit(),
            Self::Reset => coordinator.request_reset(),
        }
    }
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulatorInput {
    Observe(MarkerObservation),
    Command(SimulatorCommand),
}

/// Turns input lines into commands and observations. Every simulated name
/// keeps one trackable id for the life of the simulator.
#[derive(Debug, Default)]
pub struct MarkerSimulator {
    ids: HashMap<String, TrackableId>,
}

impl MarkerSimulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one line. Returns `Ok(None)` for blank lines and comments.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Input` for unknown verbs or a sighting without a
    /// name.
    pub fn parse_line(&mut self, line: &str) -> Result<Option<SimulatorInput>, AppError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));

        let command = match verb {
            "start" => Some(SimulatorCommand::Start),
            "pause" => Some(SimulatorCommand::Pause),
            "resume" => Some(SimulatorCommand::Resume),
            "complete" => Some(SimulatorCommand::Complete),
            "quit" => Some(SimulatorCommand::Quit),
            "reset" => Some(SimulatorCommand::Reset),
            _ => None,
        };
        if let Some(command) = command {
            return Ok(Some(SimulatorInput::Command(command)));
        }

        let quality = match verb {
            "see" => TrackingQuality::Tracking,
            "limited" => TrackingQuality::Limited,
            "lose" => TrackingQuality::None,
            _ => return Err(AppError::Input(line.to_owned())),
        };
        if rest.is_empty() {
            return Err(AppError::Input(format!("{verb} needs a marker name")));
        }
        let id = self.id_for(rest);
        Ok(Some(SimulatorInput::Observe(MarkerObservation::new(
            id,
            rest,
            Pose::IDENTITY,
            quality,
        ))))
    }

    fn id_for(&mut self, name: &str) -> TrackableId {
        *self
            .ids
            .entry(name.to_owned())
            .or_insert_with(TrackableId::new_random)
    }
}

/// Feeds one input to the coordinator in arrival order. Sightings are
/// queued; a command first runs a pass so every sighting typed before it
/// has been reconciled.
///
/// # Errors
///
/// Returns the coordinator's `DomainError` if a command is rejected.
pub fn handle_input(
    coordinator: &mut MarkerSessionCoordinator,
    input: SimulatorInput,
) -> Result<(), DomainError> {
    match input {
        SimulatorInput::Observe(observation) => {
            coordinator.submit(vec![observation]);
            Ok(())
        }
        SimulatorInput::Command(command) => {
            coordinator.run_pass();
            command.apply(coordinator)
        }
    }
}

/// Runs passes until no timer is pending, sleeping until each one is due.
/// Returns the number of passes run.
pub async fn settle_timers(
    coordinator: &mut MarkerSessionCoordinator,
    clock: &dyn Clock,
) -> usize {
    let mut passes = 1;
    coordinator.run_pass();
    while let Some(due) = coordinator.next_timer_due() {
        let wait = (due - clock.now()).to_std().unwrap_or_default();
        debug!(?wait, "waiting for pending timers");
        tokio::time::sleep(wait).await;
        coordinator.run_pass();
        passes += 1;
    }
    passes
}

/// Reads lines until end of input and forwards every parsed sighting and
/// command, in input order, to `inputs`. Unparsable lines are logged and
/// skipped. Returns the number of lines forwarded.
///
/// # Errors
///
/// Returns `AppError::Io` if reading fails and `AppError::Domain` if the
/// receiving side has gone away.
pub async fn pump_lines<R>(
    reader: R,
    inputs: UnboundedSender<SimulatorInput>,
) -> Result<usize, AppError>
where
    R: AsyncBufRead + Unpin,
{
    let mut simulator = MarkerSimulator::new();
    let mut lines = reader.lines();
    let mut handled = 0;

    while let Some(line) = lines.next_line().await? {
        match simulator.parse_line(&line) {
            Ok(Some(input)) => {
                debug!(?input, "simulated input");
                inputs.send(input).map_err(|_| DomainError::ChannelClosed)?;
                handled += 1;
            }
            Ok(None) => {}
            Err(err) => warn!(%err, "ignoring input line"),
        }
    }
    Ok(handled)
}
