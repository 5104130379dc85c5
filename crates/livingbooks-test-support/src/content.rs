//! Recording content host and a static template resolver for tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use livingbooks_core::content::{ContentHandle, ContentHost, TemplateRef, TemplateResolver};
use livingbooks_core::observation::Pose;

/// One call made against a [`RecordingContentHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Instantiate {
        handle: ContentHandle,
        template: TemplateRef,
        pose: Pose,
    },
    Reposition {
        handle: ContentHandle,
        pose: Pose,
    },
    SetVisible {
        handle: ContentHandle,
        visible: bool,
    },
    Destroy {
        handle: ContentHandle,
    },
}

#[derive(Debug, Default)]
struct HostState {
    next_handle: u64,
    calls: Vec<HostCall>,
    live: BTreeSet<ContentHandle>,
}

/// A content host that hands out sequential handles and records every call.
#[derive(Debug, Default)]
pub struct RecordingContentHost {
    state: Mutex<HostState>,
}

impl RecordingContentHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all calls so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<HostCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of instances created and not yet destroyed.
    pub fn live_instances(&self) -> usize {
        self.state.lock().unwrap().live.len()
    }

    pub fn instantiate_count(&self) -> usize {
        self.count(|call| matches!(call, HostCall::Instantiate { .. }))
    }

    pub fn destroy_count(&self) -> usize {
        self.count(|call| matches!(call, HostCall::Destroy { .. }))
    }

    /// Templates instantiated so far, in order.
    pub fn instantiated_templates(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Instantiate { template, .. } => Some(template.0),
                _ => None,
            })
            .collect()
    }

    /// Forgets recorded calls but keeps live instances and the handle counter.
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn count(&self, predicate: impl Fn(&HostCall) -> bool) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }
}

impl ContentHost for RecordingContentHost {
    fn instantiate(&self, template: &TemplateRef, pose: Pose) -> ContentHandle {
        let mut state = self.state.lock().unwrap();
        state.next_handle += 1;
        let handle = ContentHandle(state.next_handle);
        state.live.insert(handle);
        state.calls.push(HostCall::Instantiate {
            handle,
            template: template.clone(),
            pose,
        });
        handle
    }

    fn reposition(&self, handle: ContentHandle, pose: Pose) {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(HostCall::Reposition { handle, pose });
    }

    fn set_visible(&self, handle: ContentHandle, visible: bool) {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(HostCall::SetVisible { handle, visible });
    }

    fn destroy(&self, handle: ContentHandle) {
        let mut state = self.state.lock().unwrap();
        state.live.remove(&handle);
        state.calls.push(HostCall::Destroy { handle });
    }
}

/// A resolver backed by a fixed map; template references are `scenes/<name>`.
#[derive(Debug, Default, Clone)]
pub struct StaticTemplates {
    templates: HashMap<String, TemplateRef>,
}

impl StaticTemplates {
    /// Registers `scenes/<name>` for each name.
    #[must_use]
    pub fn for_markers(names: &[&str]) -> Self {
        let templates = names
            .iter()
            .map(|name| ((*name).to_owned(), TemplateRef::new(format!("scenes/{name}"))))
            .collect();
        Self { templates }
    }
}

impl TemplateResolver for StaticTemplates {
    fn resolve(&self, marker_name: &str) -> Option<TemplateRef> {
        self.templates.get(marker_name).cloned()
    }
}
