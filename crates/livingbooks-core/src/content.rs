//! Collaborator interfaces for spawning marker content.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::observation::Pose;

/// Reference to a content template (for example a prefab or scene asset path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateRef(pub String);

impl TemplateRef {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle to a content instance owned by the content host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHandle(pub u64);

impl fmt::Display for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "content#{}", self.0)
    }
}

/// Looks up the template bound to a marker name. Pure, no side effects.
pub trait TemplateResolver: Send + Sync {
    /// Returns the template for `marker_name`, if one is registered.
    fn resolve(&self, marker_name: &str) -> Option<TemplateRef>;
}

/// The engine side that actually creates and places content.
///
/// Every creation and destruction the coordinator performs goes through an
/// explicit call here.
pub trait ContentHost: Send + Sync {
    /// Creates an instance of `template` at `pose` and returns its handle.
    fn instantiate(&self, template: &TemplateRef, pose: Pose) -> ContentHandle;

    /// Moves the content root to `pose`.
    fn reposition(&self, handle: ContentHandle, pose: Pose);

    /// Shows or hides the instance without destroying it.
    fn set_visible(&self, handle: ContentHandle, visible: bool);

    /// Destroys the instance. The handle is dead afterwards.
    fn destroy(&self, handle: ContentHandle);
}
