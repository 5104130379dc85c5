//! Observation builders.

use std::collections::HashMap;

use livingbooks_core::observation::{
    MarkerObservation, Pose, TrackableId, TrackingQuality, Vec3,
};

/// Builds an observation at the origin.
#[must_use]
pub fn observation(
    trackable_id: TrackableId,
    name: &str,
    quality: TrackingQuality,
) -> MarkerObservation {
    MarkerObservation::new(trackable_id, name, Pose::IDENTITY, quality)
}

/// Hands out one stable trackable id per marker name, like a tracking source
/// following one physical page per name.
#[derive(Debug, Default)]
pub struct MarkerScript {
    ids: HashMap<String, TrackableId>,
}

impl MarkerScript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The trackable id currently used for `name`.
    pub fn id(&mut self, name: &str) -> TrackableId {
        *self
            .ids
            .entry(name.to_owned())
            .or_insert_with(TrackableId::new_random)
    }

    /// Gives `name` a fresh trackable id, as after a tracker reset.
    pub fn renew(&mut self, name: &str) -> TrackableId {
        let id = TrackableId::new_random();
        self.ids.insert(name.to_owned(), id);
        id
    }

    pub fn tracking(&mut self, name: &str) -> MarkerObservation {
        let id = self.id(name);
        observation(id, name, TrackingQuality::Tracking)
    }

    pub fn limited(&mut self, name: &str) -> MarkerObservation {
        let id = self.id(name);
        observation(id, name, TrackingQuality::Limited)
    }

    pub fn lost(&mut self, name: &str) -> MarkerObservation {
        let id = self.id(name);
        observation(id, name, TrackingQuality::None)
    }

    /// A `Tracking` observation at a given position.
    pub fn tracking_at(&mut self, name: &str, position: Vec3) -> MarkerObservation {
        let id = self.id(name);
        MarkerObservation::new(id, name, Pose::at(position), TrackingQuality::Tracking)
    }
}
