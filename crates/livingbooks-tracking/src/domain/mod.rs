//! Tracking domain types.

pub mod registry;
pub mod streaks;
