//! Recording session observer.

use std::sync::Mutex;

use livingbooks_core::event::{SessionEvent, SessionObserver};
use livingbooks_core::state::SessionState;

/// Records every event it receives.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all events received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Marker names of every `SessionStarted` event, in order.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::SessionStarted { marker_name, .. } => Some(marker_name),
                _ => None,
            })
            .collect()
    }

    /// Marker names of every `SessionEnded` event, in order.
    pub fn ended(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::SessionEnded { marker_name, .. } => Some(marker_name),
                _ => None,
            })
            .collect()
    }

    /// Target state of every `StateChanged` event, in order.
    pub fn states(&self) -> Vec<SessionState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::StateChanged { state, .. } => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl SessionObserver for RecordingObserver {
    fn on_event(&self, event: &SessionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
