//! Living Books — storybook simulator.
//!
//! Loads a storybook manifest, wires the marker session coordinator to a
//! logging content host, and feeds it simulated sightings and commands.

pub mod config;
pub mod error;
pub mod host;
pub mod observer;
pub mod simulate;
