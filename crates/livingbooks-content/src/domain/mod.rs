//! Content domain types.

pub mod binder;
pub mod follow;
pub mod templates;
