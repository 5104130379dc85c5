//! Shared test mocks and utilities for the Living Books coordinator.

mod clock;
mod content;
mod observation;
mod observer;
mod source;

pub use clock::{FixedClock, ManualClock, fixed_instant};
pub use content::{HostCall, RecordingContentHost, StaticTemplates};
pub use observation::{MarkerScript, observation};
pub use observer::RecordingObserver;
pub use source::ScriptedTrackingSource;
