//! Marker observations delivered by the tracking source.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one physical tracking session of a marker.
///
/// Stable while the tracking source keeps following the same instance; a
/// marker that is lost and found again may come back under a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackableId(pub Uuid);

impl TrackableId {
    /// Creates a fresh random id.
    #[must_use]
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TrackableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A point or direction in tracking space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Linear interpolation from `self` towards `target`; `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn lerp(self, target: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
            z: self.z + (target.z - self.z) * t,
        }
    }
}

/// Orientation as a unit quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Position and orientation of a marker or content root.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// A pose at `position` with identity rotation.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

/// How well the tracking source currently follows a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingQuality {
    /// Not tracked. Reported once when an instance is lost.
    None,
    /// Tracked with a degraded pose estimate.
    Limited,
    /// Fully tracked.
    Tracking,
}

/// One tick's report about one marker instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerObservation {
    pub trackable_id: TrackableId,
    /// Logical marker label from the reference library; may be empty.
    pub name: String,
    pub pose: Pose,
    pub quality: TrackingQuality,
}

impl MarkerObservation {
    #[must_use]
    pub fn new(
        trackable_id: TrackableId,
        name: impl Into<String>,
        pose: Pose,
        quality: TrackingQuality,
    ) -> Self {
        Self {
            trackable_id,
            name: name.into(),
            pose,
            quality,
        }
    }

    /// Whether the marker label can identify a session at all.
    #[must_use]
    pub fn has_usable_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Whether the instance is currently followed (`Limited` or `Tracking`).
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        self.quality != TrackingQuality::None
    }
}

/// All observations delivered together by the tracking source, in delivery order.
pub type ObservationBatch = Vec<MarkerObservation>;
