//! Scripted tracking source.

use std::collections::VecDeque;

use livingbooks_core::observation::ObservationBatch;
use livingbooks_core::tracking::TrackingSource;

/// A tracking source that yields queued batches, one tick's worth per poll.
#[derive(Debug, Default)]
pub struct ScriptedTrackingSource {
    ticks: VecDeque<Vec<ObservationBatch>>,
}

impl ScriptedTrackingSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the batches the next unconsumed poll will return.
    pub fn push_tick(&mut self, batches: Vec<ObservationBatch>) {
        self.ticks.push_back(batches);
    }

    #[must_use]
    pub fn remaining_ticks(&self) -> usize {
        self.ticks.len()
    }
}

impl TrackingSource for ScriptedTrackingSource {
    fn poll_batches(&mut self) -> Vec<ObservationBatch> {
        self.ticks.pop_front().unwrap_or_default()
    }
}
