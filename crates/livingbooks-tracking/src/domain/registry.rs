//! Process-wide lookup from marker name to its latest live observation.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use livingbooks_core::observation::{MarkerObservation, TrackableId};

/// Name → latest observation. Pure data, no policy.
///
/// Only the coordinator writes; readers (pose followers, UI) may hold a shared
/// reference from other threads, hence the internal lock.
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    by_name: RwLock<HashMap<String, MarkerObservation>>,
}

impl MarkerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts the observation for `name`. Last write wins; empty names are ignored.
    pub fn set(&self, name: &str, observation: MarkerObservation) {
        if name.is_empty() {
            return;
        }
        self.by_name
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_owned(), observation);
    }

    /// Removes the entry for `name` only if it still belongs to `trackable_id`.
    ///
    /// A stale remove from an instance that no longer owns the name is a
    /// no-op. Returns whether an entry was removed.
    pub fn remove(&self, name: &str, trackable_id: TrackableId) -> bool {
        let mut by_name = self.by_name.write().unwrap_or_else(PoisonError::into_inner);
        match by_name.get(name) {
            Some(current) if current.trackable_id == trackable_id => {
                by_name.remove(name);
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<MarkerObservation> {
        self.by_name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .by_name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.by_name
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
