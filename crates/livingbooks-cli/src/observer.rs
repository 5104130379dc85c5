//! Prints session events as JSON lines.

use std::io::Write;
use std::sync::Mutex;

use livingbooks_core::event::{SessionEvent, SessionObserver};
use tracing::warn;

/// Writes one JSON object per event to the wrapped writer.
#[derive(Debug)]
pub struct JsonEventPrinter<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonEventPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<W: Write + Send> SessionObserver for JsonEventPrinter<W> {
    fn on_event(&self, event: &SessionEvent) {
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Err(err) = writeln!(out, "{}", event.to_payload()) {
            warn!(%err, event_type = event.event_type(), "failed to print event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livingbooks_core::state::SessionState;

    #[test]
    fn test_prints_one_json_line_per_event() {
        let printer = JsonEventPrinter::new(Vec::new());

        printer.on_event(&SessionEvent::StateChanged {
            previous: SessionState::Idle,
            state: SessionState::Scanning,
        });
        printer.on_event(&SessionEvent::StateChanged {
            previous: SessionState::Scanning,
            state: SessionState::Active,
        });

        let text = String::from_utf8(printer.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["state"], "active");
    }
}
