//! Living Books — session bounded context.
//!
//! The application state machine, the per-marker debounce ledger, and the
//! cancellable timers used for deferred completion.

pub mod domain;
