//! Per-marker refusal windows after a completed session.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

/// Tracks, per marker name, the instant before which that marker may not
/// start a new session.
///
/// After a session completes the page is usually still in view; without a
/// window the same story would restart immediately.
#[derive(Debug, Default, Clone)]
pub struct DebounceLedger {
    suppress_until: HashMap<String, DateTime<Utc>>,
}

impl DebounceLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `now + duration` for `name` and returns it. Negative durations
    /// count as zero; a deadline past the representable range saturates.
    pub fn suppress(&mut self, name: &str, duration: Duration, now: DateTime<Utc>) -> DateTime<Utc> {
        let until = now
            .checked_add_signed(duration.max(Duration::zero()))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.suppress_until.insert(name.to_owned(), until);
        until
    }

    /// True iff an entry exists for `name` and `now` is before it.
    #[must_use]
    pub fn is_suppressed(&self, name: &str, now: DateTime<Utc>) -> bool {
        self.suppress_until
            .get(name)
            .is_some_and(|until| now < *until)
    }

    #[must_use]
    pub fn suppressed_until(&self, name: &str) -> Option<DateTime<Utc>> {
        self.suppress_until.get(name).copied()
    }

    /// Drops the entry for `name`. Returns whether one existed.
    pub fn clear(&mut self, name: &str) -> bool {
        self.suppress_until.remove(name).is_some()
    }

    /// Drops every entry that no longer suppresses anything. Returns how many
    /// were removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.suppress_until.len();
        self.suppress_until.retain(|_, until| now < *until);
        before - self.suppress_until.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.suppress_until.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.suppress_until.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livingbooks_test_support::fixed_instant;

    #[test]
    fn test_suppressed_until_window_elapses() {
        let mut ledger = DebounceLedger::new();
        let now = fixed_instant();

        let until = ledger.suppress("fox", Duration::milliseconds(1500), now);

        assert_eq!(until, now + Duration::milliseconds(1500));
        assert!(ledger.is_suppressed("fox", now));
        assert!(ledger.is_suppressed("fox", now + Duration::milliseconds(1499)));
        assert!(!ledger.is_suppressed("fox", now + Duration::milliseconds(1500)));
        assert!(!ledger.is_suppressed("owl", now));
    }

    #[test]
    fn test_zero_duration_never_suppresses() {
        let mut ledger = DebounceLedger::new();
        let now = fixed_instant();

        ledger.suppress("fox", Duration::zero(), now);
        ledger.suppress("owl", Duration::milliseconds(-20), now);

        assert!(!ledger.is_suppressed("fox", now));
        assert!(!ledger.is_suppressed("owl", now));
        assert_eq!(ledger.suppressed_until("owl"), Some(now));
    }

    #[test]
    fn test_overflowing_window_saturates_instead_of_panicking() {
        let mut ledger = DebounceLedger::new();
        let now = fixed_instant();

        let until = ledger.suppress("fox", Duration::MAX, now);

        assert_eq!(until, DateTime::<Utc>::MAX_UTC);
        assert!(ledger.is_suppressed("fox", now));
    }

    #[test]
    fn test_expired_entries_are_purged() {
        let mut ledger = DebounceLedger::new();
        let now = fixed_instant();
        ledger.suppress("fox", Duration::seconds(1), now);
        ledger.suppress("owl", Duration::seconds(5), now);

        let removed = ledger.purge_expired(now + Duration::seconds(2));

        assert_eq!(removed, 1);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.suppressed_until("fox").is_none());
    }

    #[test]
    fn test_clear_lifts_suppression() {
        let mut ledger = DebounceLedger::new();
        let now = fixed_instant();
        ledger.suppress("fox", Duration::seconds(10), now);

        assert!(ledger.clear("fox"));
        assert!(!ledger.clear("fox"));
        assert!(!ledger.is_suppressed("fox", now));
        assert!(ledger.is_empty());
    }
}
