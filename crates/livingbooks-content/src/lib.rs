//! Living Books — content binding bounded context.
//!
//! Owns the mapping from tracked marker instances to spawned content, the
//! static marker → template table, and how content follows its marker.

pub mod domain;
