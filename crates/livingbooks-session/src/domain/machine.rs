//! The top-level application state machine.

use chrono::{DateTime, Utc};
use livingbooks_core::error::DomainError;
use livingbooks_core::observation::TrackableId;
use livingbooks_core::state::{SessionState, SessionTrigger};
use tracing::info;
use uuid::Uuid;

use super::debounce::DebounceLedger;

/// The marker that currently owns the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub session_id: Uuid,
    pub marker_name: String,
    /// The trackable instance whose content belongs to the session.
    pub owner: TrackableId,
    pub started_at: DateTime<Utc>,
}

/// A state change (or a self-loop) produced by a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SessionState,
    pub to: SessionState,
}

impl Transition {
    #[must_use]
    pub fn changed(self) -> bool {
        self.from != self.to
    }
}

/// How the machine answered a qualified marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Qualification {
    /// Scanning → Active for the marker.
    Started(ActiveSession),
    /// Active → Active; a different marker took over.
    Replaced {
        previous: ActiveSession,
        current: ActiveSession,
    },
    /// The marker already owns the session; `previous_owner` is the instance
    /// that owned it before this report.
    Redetected { previous_owner: TrackableId },
    /// The marker is inside its debounce window.
    Suppressed,
    /// The current state does not take markers.
    Ignored,
}

/// Idle → Scanning → Active ⇄ Paused, any → Ended.
///
/// `active` is `Some` iff the state is `Active` or `Paused`, so two owners
/// cannot exist at once.
#[derive(Debug, Default)]
pub struct SessionStateMachine {
    state: SessionState,
    active: Option<ActiveSession>,
}

impl SessionStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn active_marker_name(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.marker_name.as_str())
    }

    /// Idle/Ended → Scanning.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` from any other state.
    pub fn request_start(&mut self) -> Result<Transition, DomainError> {
        match self.state {
            SessionState::Idle | SessionState::Ended => {
                Ok(self.enter(SessionState::Scanning, SessionTrigger::StartRequested))
            }
            state => Err(rejected(state, SessionTrigger::StartRequested)),
        }
    }

    /// Evaluates a qualified marker report.
    ///
    /// Suppression is only consulted when the report would start or take over
    /// a session; re-detection of the owning marker is never suppressed.
    pub fn qualify(
        &mut self,
        marker_name: &str,
        owner: TrackableId,
        now: DateTime<Utc>,
        ledger: &DebounceLedger,
    ) -> Qualification {
        if let Some(active) = self.active.as_mut() {
            if active.marker_name == marker_name {
                let previous_owner = active.owner;
                active.owner = owner;
                return Qualification::Redetected { previous_owner };
            }
        }

        match self.state {
            SessionState::Scanning | SessionState::Active => {}
            SessionState::Idle | SessionState::Paused | SessionState::Ended => {
                return Qualification::Ignored;
            }
        }
        if ledger.is_suppressed(marker_name, now) {
            return Qualification::Suppressed;
        }

        let current = ActiveSession {
            session_id: Uuid::now_v7(),
            marker_name: marker_name.to_owned(),
            owner,
            started_at: now,
        };
        let previous = self.active.replace(current.clone());
        self.enter(SessionState::Active, SessionTrigger::MarkerQualified);
        match previous {
            Some(previous) => Qualification::Replaced { previous, current },
            None => Qualification::Started(current),
        }
    }

    /// Checks that a completion signal can be accepted and returns the
    /// session it applies to.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the state is `Active`.
    pub fn check_completion(&self) -> Result<&ActiveSession, DomainError> {
        match (self.state, self.active.as_ref()) {
            (SessionState::Active, Some(active)) => Ok(active),
            (state, _) => Err(rejected(state, SessionTrigger::SessionCompleted)),
        }
    }

    /// Active → Scanning for `session_id`, once the settle delay elapsed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the state is `Active`,
    /// and `DomainError::Validation` if `session_id` is no longer the active
    /// session.
    pub fn complete(&mut self, session_id: Uuid) -> Result<ActiveSession, DomainError> {
        let active = self.check_completion()?;
        if active.session_id != session_id {
            return Err(DomainError::Validation(format!(
                "session {session_id} was superseded by {}",
                active.session_id
            )));
        }
        let ended = self.active.take();
        self.enter(SessionState::Scanning, SessionTrigger::SessionCompleted);
        ended.ok_or_else(|| rejected(self.state, SessionTrigger::SessionCompleted))
    }

    /// Active → Paused.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the state is `Active`.
    pub fn pause(&mut self) -> Result<Transition, DomainError> {
        match self.state {
            SessionState::Active => {
                Ok(self.enter(SessionState::Paused, SessionTrigger::PauseRequested))
            }
            state => Err(rejected(state, SessionTrigger::PauseRequested)),
        }
    }

    /// Paused → Active.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the state is `Paused`.
    pub fn resume(&mut self) -> Result<Transition, DomainError> {
        match self.state {
            SessionState::Paused => {
                Ok(self.enter(SessionState::Active, SessionTrigger::ResumeRequested))
            }
            state => Err(rejected(state, SessionTrigger::ResumeRequested)),
        }
    }

    /// Any → Ended. Returns the session that was live, if any.
    pub fn quit(&mut self) -> (Transition, Option<ActiveSession>) {
        let ended = self.active.take();
        (
            self.enter(SessionState::Ended, SessionTrigger::QuitRequested),
            ended,
        )
    }

    /// Any → Idle. Returns the session that was live, if any.
    pub fn reset(&mut self) -> (Transition, Option<ActiveSession>) {
        let ended = self.active.take();
        (
            self.enter(SessionState::Idle, SessionTrigger::ResetRequested),
            ended,
        )
    }

    fn enter(&mut self, to: SessionState, trigger: SessionTrigger) -> Transition {
        let from = self.state;
        self.state = to;
        if !to.has_session() {
            self.active = None;
        }
        if from != to {
            info!(%from, %to, %trigger, "session state changed");
        }
        Transition { from, to }
    }
}

fn rejected(state: SessionState, trigger: SessionTrigger) -> DomainError {
    DomainError::InvalidTransition { state, trigger }
}
