//! Living Books Core — shared vocabulary for the marker session coordinator.
//!
//! This crate defines the types and collaborator traits every other crate
//! depends on. It contains no session policy.

pub mod clock;
pub mod config;
pub mod content;
pub mod error;
pub mod event;
pub mod observation;
pub mod state;
pub mod tracking;
