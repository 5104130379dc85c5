//! Single-consumer queue for observation batches.
//!
//! Tracking callbacks may arrive on any thread or task; they are marshalled
//! here and drained by the reconciliation pass strictly in delivery order.

use livingbooks_core::error::DomainError;
use livingbooks_core::observation::ObservationBatch;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Cloneable producer side of the coordinator's observation queue.
#[derive(Debug, Clone)]
pub struct ObservationSender {
    tx: UnboundedSender<ObservationBatch>,
}

impl ObservationSender {
    /// Queues a batch for the next reconciliation pass.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ChannelClosed` if the coordinator was dropped.
    pub fn submit(&self, batch: ObservationBatch) -> Result<(), DomainError> {
        self.tx.send(batch).map_err(|_| DomainError::ChannelClosed)
    }

    /// Whether the coordinator is gone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[derive(Debug)]
pub(crate) struct ObservationInbox {
    tx: UnboundedSender<ObservationBatch>,
    rx: UnboundedReceiver<ObservationBatch>,
}

impl ObservationInbox {
    pub(crate) fn new() -> Self {
        let (tx, rx) = unbounded_channel();
        Self { tx, rx }
    }

    pub(crate) fn sender(&self) -> ObservationSender {
        ObservationSender {
            tx: self.tx.clone(),
        }
    }

    /// Queues a batch from the owning thread.
    pub(crate) fn push(&self, batch: ObservationBatch) {
        // The inbox owns a receiver, so the channel cannot be closed here.
        let _ = self.tx.send(batch);
    }

    /// Takes every batch queued so far, oldest first.
    pub(crate) fn drain(&mut self) -> Vec<ObservationBatch> {
        let mut batches = Vec::new();
        while let Ok(batch) = self.rx.try_recv() {
            batches.push(batch);
        }
        batches
    }
}
