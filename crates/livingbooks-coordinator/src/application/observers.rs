//! Ordered observer list with explicit unsubscribe.

use std::sync::Arc;

use livingbooks_core::event::{SessionEvent, SessionObserver, dispatch};

/// Identifies one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Observers in subscription order.
#[derive(Default)]
pub(crate) struct ObserverList {
    next_id: u64,
    observers: Vec<(SubscriptionId, Arc<dyn SessionObserver>)>,
}

impl std::fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverList")
            .field("subscribers", &self.observers.len())
            .finish()
    }
}

impl ObserverList {
    pub(crate) fn subscribe(&mut self, observer: Arc<dyn SessionObserver>) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.observers.push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn publish(&self, event: &SessionEvent) {
        for (_, observer) in &self.observers {
            dispatch(observer.as_ref(), event);
        }
    }
}
