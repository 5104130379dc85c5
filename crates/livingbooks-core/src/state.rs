//! Application session states and the triggers that move between them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level application state. Exactly one value exists per coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Start menu; tracking results are ignored.
    #[default]
    Idle,
    /// Waiting for a qualifying marker.
    Scanning,
    /// A marker owns the interactive session.
    Active,
    /// The active session is frozen by the user.
    Paused,
    /// The experience was quit.
    Ended,
}

impl SessionState {
    /// Returns the snake-case name used in logs and errors.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Ended => "ended",
        }
    }

    /// Whether a marker currently owns the session (`Active` or `Paused`).
    #[must_use]
    pub fn has_session(self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs to the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionTrigger {
    /// The user asked to start scanning.
    StartRequested,
    /// A qualifying marker was reported by the coordinator.
    MarkerQualified,
    /// Story logic finished the narrative for the active marker.
    SessionCompleted,
    /// The user paused the session.
    PauseRequested,
    /// The user resumed a paused session.
    ResumeRequested,
    /// The user quit the experience.
    QuitRequested,
    /// The user returned to the start menu.
    ResetRequested,
}

impl SessionTrigger {
    /// Returns the snake-case name used in logs and errors.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartRequested => "start_requested",
            Self::MarkerQualified => "marker_qualified",
            Self::SessionCompleted => "session_completed",
            Self::PauseRequested => "pause_requested",
            Self::ResumeRequested => "resume_requested",
            Self::QuitRequested => "quit_requested",
            Self::ResetRequested => "reset_requested",
        }
    }
}

impl fmt::Display for SessionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
