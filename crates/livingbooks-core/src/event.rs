//! Session events and the observer interface that receives them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::observation::TrackableId;
use crate::state::SessionState;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Story logic completed the narrative and the settle delay elapsed.
    Completed,
    /// A different qualifying marker took over.
    Replaced,
    /// The experience was quit.
    Quit,
    /// The application returned to the start menu.
    Reset,
}

/// Configuration gaps surfaced while reconciling observations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// No template is registered for the marker name.
    MissingTemplate {
        trackable_id: TrackableId,
        marker_name: String,
    },
    /// More than one live trackable claims the same marker name.
    DuplicateMarkerName {
        trackable_id: TrackableId,
        marker_name: String,
    },
    /// The marker name is empty.
    InvalidMarkerName { trackable_id: TrackableId },
}

/// Event type identifier for [`SessionEvent::StateChanged`].
pub const STATE_CHANGED_EVENT_TYPE: &str = "session.state_changed";

/// Event type identifier for [`SessionEvent::SessionStarted`].
pub const SESSION_STARTED_EVENT_TYPE: &str = "session.started";

/// Event type identifier for [`SessionEvent::SessionEnded`].
pub const SESSION_ENDED_EVENT_TYPE: &str = "session.ended";

/// Event type identifier for [`SessionEvent::Diagnostic`].
pub const DIAGNOSTIC_EVENT_TYPE: &str = "session.diagnostic";

/// Everything the coordinator reports to the outside world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The application state changed.
    StateChanged {
        previous: SessionState,
        state: SessionState,
    },
    /// A marker took ownership of the session.
    SessionStarted {
        session_id: Uuid,
        marker_name: String,
    },
    /// The session owned by `marker_name` is over.
    SessionEnded {
        session_id: Uuid,
        marker_name: String,
        reason: EndReason,
    },
    /// A configuration gap was found.
    Diagnostic(Diagnostic),
}

impl SessionEvent {
    /// Returns the event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => STATE_CHANGED_EVENT_TYPE,
            Self::SessionStarted { .. } => SESSION_STARTED_EVENT_TYPE,
            Self::SessionEnded { .. } => SESSION_ENDED_EVENT_TYPE,
            Self::Diagnostic(_) => DIAGNOSTIC_EVENT_TYPE,
        }
    }

    /// Serializes the event to JSON.
    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Receives session events. UI and audio layers implement the callbacks they
/// care about; every method defaults to a no-op.
pub trait SessionObserver: Send + Sync {
    /// Called for every event before the specific callback.
    fn on_event(&self, _event: &SessionEvent) {}

    fn on_state_changed(&self, _state: SessionState) {}

    fn on_session_started(&self, _marker_name: &str) {}

    fn on_session_ended(&self, _marker_name: &str) {}

    fn on_diagnostic(&self, _diagnostic: &Diagnostic) {}
}

/// Delivers `event` to `observer` through the matching callback.
pub fn dispatch(observer: &dyn SessionObserver, event: &SessionEvent) {
    observer.on_event(event);
    match event {
        SessionEvent::StateChanged { state, .. } => observer.on_state_changed(*state),
        SessionEvent::SessionStarted { marker_name, .. } => {
            observer.on_session_started(marker_name);
        }
        SessionEvent::SessionEnded { marker_name, .. } => observer.on_session_ended(marker_name),
        SessionEvent::Diagnostic(diagnostic) => observer.on_diagnostic(diagnostic),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Calls(Mutex<Vec<String>>);

    impl SessionObserver for Calls {
        fn on_state_changed(&self, state: SessionState) {
            self.0.lock().unwrap().push(format!("state:{state}"));
        }

        fn on_session_started(&self, marker_name: &str) {
            self.0.lock().unwrap().push(format!("started:{marker_name}"));
        }
    }

    #[test]
    fn test_dispatch_routes_to_specific_callbacks() {
        let calls = Calls::default();

        dispatch(
            &calls,
            &SessionEvent::StateChanged {
                previous: SessionState::Idle,
                state: SessionState::Scanning,
            },
        );
        dispatch(
            &calls,
            &SessionEvent::SessionStarted {
                session_id: Uuid::nil(),
                marker_name: "fox".into(),
            },
        );
        dispatch(
            &calls,
            &SessionEvent::SessionEnded {
                session_id: Uuid::nil(),
                marker_name: "fox".into(),
                reason: EndReason::Quit,
            },
        );

        assert_eq!(
            *calls.0.lock().unwrap(),
            vec!["state:scanning".to_owned(), "started:fox".to_owned()]
        );
    }

    #[test]
    fn test_payload_is_tagged_with_type() {
        let event = SessionEvent::SessionStarted {
            session_id: Uuid::nil(),
            marker_name: "owl".into(),
        };

        let payload = event.to_payload();

        assert_eq!(event.event_type(), "session.started");
        assert_eq!(payload["type"], "session_started");
        assert_eq!(payload["marker_name"], "owl");
    }
}
