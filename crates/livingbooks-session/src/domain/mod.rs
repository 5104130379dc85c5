//! Session domain types.

pub mod debounce;
pub mod machine;
pub mod timers;
