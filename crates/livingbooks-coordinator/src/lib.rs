//! Living Books — marker session coordination.
//!
//! Consumes marker observations, decides which marker owns the interactive
//! session, and drives content and the session state machine together.

pub mod application;

pub use application::coordinator::{MarkerSessionCoordinator, PassReport};
pub use application::inbox::ObservationSender;
pub use application::observers::SubscriptionId;
