//! Living Books — marker tracking bounded context.
//!
//! Keeps the latest observation per marker name and per trackable instance,
//! and answers which instances are live, duplicated, or already reported.

pub mod domain;
