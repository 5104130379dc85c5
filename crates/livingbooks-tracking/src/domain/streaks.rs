//! Per-instance tracking streaks and per-name claims.

use std::collections::{BTreeSet, HashMap, HashSet};

use livingbooks_core::observation::{MarkerObservation, TrackableId};
use tracing::trace;

/// Kinds of naming problems reported once per trackable id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameWarning {
    /// Empty marker name.
    Invalid,
    /// Another live instance claims the same name.
    Duplicate,
}

/// What the table learned from one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sighting {
    /// The instance was not tracked (or not known) before this observation.
    pub newly_tracked: bool,
}

#[derive(Debug, Clone)]
struct TrackedMarker {
    latest: MarkerObservation,
    reported: bool,
}

/// Latest observation per trackable id, whether the current streak was
/// already reported, and which live ids claim each name.
#[derive(Debug, Default)]
pub struct TrackingTable {
    markers: HashMap<TrackableId, TrackedMarker>,
    claims: HashMap<String, BTreeSet<TrackableId>>,
    warned: HashSet<(TrackableId, NameWarning)>,
}

impl TrackingTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `observation` and updates name claims.
    pub fn observe(&mut self, observation: &MarkerObservation) -> Sighting {
        let id = observation.trackable_id;
        let previous = self.markers.get(&id).map(|m| m.latest.clone());
        let newly_tracked = previous.as_ref().is_none_or(|p| !p.is_tracked());

        if let Some(previous) = &previous {
            if previous.name != observation.name {
                self.release_claim(&previous.name, id);
            }
        }

        if observation.is_tracked() && observation.has_usable_name() {
            self.claims
                .entry(observation.name.clone())
                .or_default()
                .insert(id);
        } else {
            self.release_claim(&observation.name, id);
        }

        match self.markers.get_mut(&id) {
            Some(marker) => marker.latest = observation.clone(),
            None => {
                self.markers.insert(
                    id,
                    TrackedMarker {
                        latest: observation.clone(),
                        reported: false,
                    },
                );
            }
        }

        Sighting { newly_tracked }
    }

    /// Number of live instances currently claiming `name`.
    #[must_use]
    pub fn claimants(&self, name: &str) -> usize {
        self.claims.get(name).map_or(0, BTreeSet::len)
    }

    /// The latest observation of some other live instance claiming `name`.
    #[must_use]
    pub fn other_claimant(&self, name: &str, except: TrackableId) -> Option<&MarkerObservation> {
        self.claims
            .get(name)?
            .iter()
            .find(|id| **id != except)
            .and_then(|id| self.markers.get(id))
            .map(|marker| &marker.latest)
    }

    /// Whether the current qualifying streak of `id` was already reported.
    #[must_use]
    pub fn is_reported(&self, id: TrackableId) -> bool {
        self.markers.get(&id).is_some_and(|marker| marker.reported)
    }

    pub fn mark_reported(&mut self, id: TrackableId) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.reported = true;
        }
    }

    /// Ends the qualifying streak of `id`.
    pub fn reset_streak(&mut self, id: TrackableId) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.reported = false;
        }
    }

    /// Ends every streak, so instances still in view are evaluated afresh.
    pub fn reset_all_reports(&mut self) {
        for marker in self.markers.values_mut() {
            marker.reported = false;
        }
        trace!(instances = self.markers.len(), "tracking streaks re-armed");
    }

    /// Forgets instances whose latest observation is untracked, unless
    /// `keep` holds on to them. Returns the forgotten ids.
    pub fn prune_lost(&mut self, keep: impl Fn(TrackableId) -> bool) -> Vec<TrackableId> {
        let mut lost: Vec<TrackableId> = self
            .markers
            .iter()
            .filter(|(id, marker)| !marker.latest.is_tracked() && !keep(**id))
            .map(|(id, _)| *id)
            .collect();
        lost.sort_unstable();
        for id in &lost {
            self.markers.remove(id);
        }
        self.warned.retain(|(id, _)| lost.binary_search(id).is_err());
        if !lost.is_empty() {
            trace!(forgotten = lost.len(), "lost instances pruned");
        }
        lost
    }

    /// Returns `true` the first time `warning` is raised for `id`.
    pub fn take_warning(&mut self, id: TrackableId, warning: NameWarning) -> bool {
        self.warned.insert((id, warning))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    fn release_claim(&mut self, name: &str, id: TrackableId) {
        if let Some(ids) = self.claims.get_mut(name) {
            ids.remove(&id);
            if ids.is_empty() {
                self.claims.remove(name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livingbooks_core::observation::TrackingQuality;
    use livingbooks_test_support::observation;

    #[test]
    fn test_first_sighting_is_newly_tracked() {
        let mut table = TrackingTable::new();
        let id = TrackableId::new_random();

        let first = table.observe(&observation(id, "fox", TrackingQuality::Tracking));
        let second = table.observe(&observation(id, "fox", TrackingQuality::Tracking));

        assert!(first.newly_tracked);
        assert!(!second.newly_tracked);
    }

    #[test]
    fn test_tracking_after_loss_is_newly_tracked() {
        let mut table = TrackingTable::new();
        let id = TrackableId::new_random();
        table.observe(&observation(id, "fox", TrackingQuality::Tracking));
        table.observe(&observation(id, "fox", TrackingQuality::None));

        let sighting = table.observe(&observation(id, "fox", TrackingQuality::Limited));

        assert!(sighting.newly_tracked);
    }

    #[test]
    fn test_two_live_instances_with_one_name_are_duplicates() {
        let mut table = TrackingTable::new();
        let a = TrackableId::new_random();
        let b = TrackableId::new_random();
        table.observe(&observation(a, "fox", TrackingQuality::Tracking));

        table.observe(&observation(b, "fox", TrackingQuality::Tracking));

        assert_eq!(table.claimants("fox"), 2);
        assert_eq!(table.other_claimant("fox", b).unwrap().trackable_id, a);
    }

    #[test]
    fn test_lost_instance_releases_its_claim() {
        let mut table = TrackingTable::new();
        let a = TrackableId::new_random();
        let b = TrackableId::new_random();
        table.observe(&observation(a, "fox", TrackingQuality::Tracking));
        table.observe(&observation(b, "fox", TrackingQuality::Tracking));

        table.observe(&observation(a, "fox", TrackingQuality::None));
        table.observe(&observation(b, "fox", TrackingQuality::Tracking));

        assert_eq!(table.claimants("fox"), 1);
        assert!(table.other_claimant("fox", b).is_none());
    }

    #[test]
    fn test_renamed_instance_moves_its_claim() {
        let mut table = TrackingTable::new();
        let id = TrackableId::new_random();
        table.observe(&observation(id, "fox", TrackingQuality::Tracking));

        table.observe(&observation(id, "owl", TrackingQuality::Tracking));

        assert_eq!(table.claimants("fox"), 0);
        assert_eq!(table.claimants("owl"), 1);
    }

    #[test]
    fn test_reports_are_per_streak() {
        let mut table = TrackingTable::new();
        let a = TrackableId::new_random();
        let b = TrackableId::new_random();
        table.observe(&observation(a, "fox", TrackingQuality::Tracking));
        table.observe(&observation(b, "owl", TrackingQuality::Tracking));
        table.mark_reported(a);
        table.mark_reported(b);

        table.reset_streak(a);
        assert!(!table.is_reported(a));
        assert!(table.is_reported(b));

        table.reset_all_reports();
        assert!(!table.is_reported(b));
    }

    #[test]
    fn test_unknown_ids_are_never_reported() {
        let mut table = TrackingTable::new();
        let id = TrackableId::new_random();

        table.mark_reported(id);

        assert!(!table.is_reported(id));
        assert!(table.is_empty());
    }

    #[test]
    fn test_warnings_fire_once_per_id_and_kind() {
        let mut table = TrackingTable::new();
        let id = TrackableId::new_random();

        assert!(table.take_warning(id, NameWarning::Duplicate));
        assert!(!table.take_warning(id, NameWarning::Duplicate));
        assert!(table.take_warning(id, NameWarning::Invalid));
    }

    #[test]
    fn test_prune_forgets_lost_instances_and_their_warnings() {
        let mut table = TrackingTable::new();
        let lost = TrackableId::new_random();
        let held = TrackableId::new_random();
        let live = TrackableId::new_random();
        table.observe(&observation(lost, "fox", TrackingQuality::None));
        table.observe(&observation(held, "owl", TrackingQuality::None));
        table.observe(&observation(live, "bear", TrackingQuality::Tracking));
        table.take_warning(lost, NameWarning::Invalid);

        let pruned = table.prune_lost(|id| id == held);

        assert_eq!(pruned, vec![lost]);
        assert_eq!(table.len(), 2);
        assert!(table.take_warning(lost, NameWarning::Invalid));
        assert_eq!(table.claimants("bear"), 1);
    }
}
