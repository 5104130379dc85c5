//! Tracking source collaborator interface.

use crate::observation::ObservationBatch;

/// A poll-style producer of observation batches.
///
/// Sources that deliver on their own thread or task push batches through the
/// coordinator's observation sender instead.
pub trait TrackingSource: Send {
    /// Returns every batch produced since the last poll, oldest first.
    fn poll_batches(&mut self) -> Vec<ObservationBatch>;
}
