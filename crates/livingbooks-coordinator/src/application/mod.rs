//! Application services for the coordinator.

pub mod coordinator;
pub mod inbox;
pub mod observers;
