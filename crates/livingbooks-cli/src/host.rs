//! A content host that only logs what a renderer would do.

use std::sync::atomic::{AtomicU64, Ordering};

use livingbooks_core::content::{ContentHandle, ContentHost, TemplateRef};
use livingbooks_core::observation::Pose;
use tracing::info;

/// Hands out sequential handles and logs every call.
#[derive(Debug, Default)]
pub struct LoggingContentHost {
    next_handle: AtomicU64,
}

impl LoggingContentHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContentHost for LoggingContentHost {
    fn instantiate(&self, template: &TemplateRef, pose: Pose) -> ContentHandle {
        let handle = ContentHandle(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1);
        info!(%handle, %template, position = ?pose.position, "instantiate content");
        handle
    }

    fn reposition(&self, handle: ContentHandle, pose: Pose) {
        info!(%handle, position = ?pose.position, rotation = ?pose.rotation, "reposition content");
    }

    fn set_visible(&self, handle: ContentHandle, visible: bool) {
        info!(%handle, visible, "set content visibility");
    }

    fn destroy(&self, handle: ContentHandle) {
        info!(%handle, "destroy content");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_sequential() {
        let host = LoggingContentHost::new();
        let template = TemplateRef::new("scenes/fox");

        let first = host.instantiate(&template, Pose::IDENTITY);
        let second = host.instantiate(&template, Pose::IDENTITY);

        assert_eq!(first, ContentHandle(1));
        assert_eq!(second, ContentHandle(2));
    }
}
