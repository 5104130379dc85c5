//! Cancellable deferred callbacks driven by an explicit clock.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

/// Handle for a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// Payloads waiting for a due time. Nothing fires on its own; the owner
/// calls [`TimerQueue::pop_due`] from its loop.
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_handle: u64,
    queue: BTreeMap<(DateTime<Utc>, u64), T>,
    due_by_handle: HashMap<u64, DateTime<Utc>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next_handle: 0,
            queue: BTreeMap::new(),
            due_by_handle: HashMap::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `payload` to fire at `due`.
    pub fn schedule(&mut self, due: DateTime<Utc>, payload: T) -> TimerHandle {
        self.next_handle += 1;
        let id = self.next_handle;
        self.queue.insert((due, id), payload);
        self.due_by_handle.insert(id, due);
        TimerHandle(id)
    }

    /// Cancels a pending timer and returns its payload. Cancelling a fired or
    /// unknown timer returns `None`.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        let due = self.due_by_handle.remove(&handle.0)?;
        self.queue.remove(&(due, handle.0))
    }

    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.due_by_handle.contains_key(&handle.0)
    }

    /// When a pending timer will fire.
    #[must_use]
    pub fn due(&self, handle: TimerHandle) -> Option<DateTime<Utc>> {
        self.due_by_handle.get(&handle.0).copied()
    }

    /// Removes and returns every timer due at or before `now`, ordered by due
    /// time, then by scheduling order.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Vec<(TimerHandle, T)> {
        let mut fired = Vec::new();
        while let Some(entry) = self.queue.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let ((_, id), payload) = entry.remove_entry();
            self.due_by_handle.remove(&id);
            fired.push((TimerHandle(id), payload));
        }
        fired
    }

    #[must_use]
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Cancels everything.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.due_by_handle.clear();
    }
}
