//! Tracked marker instance → spawned content instance.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use livingbooks_core::config::PoseFollowConfig;
use livingbooks_core::content::{ContentHandle, ContentHost, TemplateResolver};
use livingbooks_core::observation::{Pose, Quat, TrackableId};
use tracing::{debug, warn};

use super::follow::next_pose;

/// The content spawned for one trackable instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentBinding {
    pub handle: ContentHandle,
    /// The marker name the content was spawned for.
    pub marker_name: String,
    pub visible: bool,
    /// Last pose handed to the host.
    pub pose: Pose,
    spawn_rotation: Quat,
}

/// Result of [`ContentBinder::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The instance already had content.
    Existing(ContentHandle),
    /// Content was instantiated (hidden).
    Spawned(ContentHandle),
    /// No template is registered for the name.
    NoContent {
        /// This is the first time the gap was seen for the instance.
        first_warning: bool,
    },
}

impl EnsureOutcome {
    #[must_use]
    pub fn handle(self) -> Option<ContentHandle> {
        match self {
            Self::Existing(handle) | Self::Spawned(handle) => Some(handle),
            Self::NoContent { .. } => None,
        }
    }
}

/// Owns at most one content instance per trackable id and drives the
/// content host for every create, move, show, hide and destroy.
pub struct ContentBinder {
    host: Arc<dyn ContentHost>,
    resolver: Arc<dyn TemplateResolver>,
    follow: PoseFollowConfig,
    bindings: HashMap<TrackableId, ContentBinding>,
    missing_warned: HashSet<TrackableId>,
}

impl fmt::Debug for ContentBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentBinder")
            .field("follow", &self.follow)
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

impl ContentBinder {
    #[must_use]
    pub fn new(
        host: Arc<dyn ContentHost>,
        resolver: Arc<dyn TemplateResolver>,
        follow: PoseFollowConfig,
    ) -> Self {
        Self {
            host,
            resolver,
            follow,
            bindings: HashMap::new(),
            missing_warned: HashSet::new(),
        }
    }

    /// Returns the content for `id`, spawning it at `pose` if there is none.
    ///
    /// New content starts hidden. A missing template is warned about once
    /// per trackable id.
    pub fn ensure(&mut self, id: TrackableId, marker_name: &str, pose: Pose) -> EnsureOutcome {
        if let Some(binding) = self.bindings.get(&id) {
            return EnsureOutcome::Existing(binding.handle);
        }

        let Some(template) = self.resolver.resolve(marker_name) else {
            let first_warning = self.missing_warned.insert(id);
            if first_warning {
                warn!(
                    marker = marker_name,
                    trackable_id = %id,
                    "no template registered for marker"
                );
            }
            return EnsureOutcome::NoContent { first_warning };
        };

        let handle = self.host.instantiate(&template, pose);
        self.host.set_visible(handle, false);
        debug!(
            marker = marker_name,
            trackable_id = %id,
            %handle,
            %template,
            "content spawned"
        );
        self.bindings.insert(
            id,
            ContentBinding {
                handle,
                marker_name: marker_name.to_owned(),
                visible: false,
                pose,
                spawn_rotation: pose.rotation,
            },
        );
        EnsureOutcome::Spawned(handle)
    }

    /// Makes the content for `id` visible. Returns whether anything changed.
    pub fn show(&mut self, id: TrackableId) -> bool {
        self.set_visible(id, true)
    }

    /// Hides the content for `id` without destroying it. Returns whether
    /// anything changed.
    pub fn hide(&mut self, id: TrackableId) -> bool {
        self.set_visible(id, false)
    }

    /// Moves the content for `id` towards the marker pose `target`.
    pub fn follow(&mut self, id: TrackableId, target: Pose) {
        let Some(binding) = self.bindings.get_mut(&id) else {
            return;
        };
        let pose = next_pose(binding.pose, target, binding.spawn_rotation, &self.follow);
        if pose != binding.pose {
            binding.pose = pose;
            self.host.reposition(binding.handle, pose);
        }
    }

    /// Moves the binding of `from` to `to`, keeping the same content instance.
    ///
    /// Returns `false` and changes nothing if `from` has no binding or `to`
    /// already has one.
    pub fn rebind(&mut self, from: TrackableId, to: TrackableId) -> bool {
        if from == to || self.bindings.contains_key(&to) {
            return false;
        }
        let Some(binding) = self.bindings.remove(&from) else {
            return false;
        };
        debug!(from = %from, to = %to, handle = %binding.handle, "content rebound");
        self.bindings.insert(to, binding);
        true
    }

    /// Destroys the content for `id`. Idempotent.
    pub fn destroy(&mut self, id: TrackableId) -> Option<ContentBinding> {
        let binding = self.bindings.remove(&id)?;
        self.host.destroy(binding.handle);
        debug!(trackable_id = %id, handle = %binding.handle, "content destroyed");
        Some(binding)
    }

    /// Destroys every instance. Returns how many were destroyed.
    pub fn destroy_all(&mut self) -> usize {
        let mut ids: Vec<TrackableId> = self.bindings.keys().copied().collect();
        ids.sort_unstable();
        for id in &ids {
            self.destroy(*id);
        }
        ids.len()
    }

    /// Drops per-instance bookkeeping for an instance the tracker has lost.
    /// Instances that still own content are kept. Returns whether anything
    /// was forgotten.
    pub fn forget(&mut self, id: TrackableId) -> bool {
        if self.bindings.contains_key(&id) {
            return false;
        }
        self.missing_warned.remove(&id)
    }

    #[must_use]
    pub fn binding(&self, id: TrackableId) -> Option<&ContentBinding> {
        self.bindings.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: TrackableId) -> bool {
        self.bindings.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn set_visible(&mut self, id: TrackableId, visible: bool) -> bool {
        match self.bindings.get_mut(&id) {
            Some(binding) if binding.visible != visible => {
                binding.visible = visible;
                self.host.set_visible(binding.handle, visible);
                true
            }
            _ => false,
        }
    }
}
