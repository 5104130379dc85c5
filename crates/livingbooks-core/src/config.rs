//! Coordinator configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Longest accepted delay or window, in seconds (one day).
pub const MAX_SECONDS: f64 = 86_400.0;

/// How spawned content follows its marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseFollowConfig {
    /// Move the content root with the marker.
    pub follow_position: bool,
    /// Rotate the content root with the marker; otherwise keep the spawn rotation.
    pub follow_rotation: bool,
    /// Fraction of the remaining distance covered per observation.
    /// `0` snaps straight to the marker.
    pub position_lerp: f32,
}

impl Default for PoseFollowConfig {
    fn default() -> Self {
        Self {
            follow_position: true,
            follow_rotation: true,
            position_lerp: 0.0,
        }
    }
}

/// Settings for the marker session coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Treat `Limited` tracking as qualifying.
    pub allow_limited_tracking: bool,
    /// Delay between a completion signal and the return to scanning.
    pub settle_delay_seconds: f64,
    /// How long a completed marker is refused a new session.
    pub suppression_window_seconds: f64,
    /// How long hidden content may stay out of view before it is destroyed.
    /// The session itself is kept; `None` keeps hidden content until the
    /// session ends.
    pub lost_teardown_seconds: Option<f64>,
    pub pose_follow: PoseFollowConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            allow_limited_tracking: false,
            settle_delay_seconds: 1.5,
            suppression_window_seconds: 1.5,
            lost_teardown_seconds: None,
            pose_follow: PoseFollowConfig::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Checks durations and the lerp factor.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Configuration` for negative, non-finite or
    /// longer than [`MAX_SECONDS`] durations, or a `position_lerp` outside
    /// `[0, 1]`.
    pub fn validate(&self) -> Result<(), DomainError> {
        check_seconds("settle_delay_seconds", self.settle_delay_seconds)?;
        check_seconds("suppression_window_seconds", self.suppression_window_seconds)?;
        if let Some(seconds) = self.lost_teardown_seconds {
            check_seconds("lost_teardown_seconds", seconds)?;
        }
        let lerp = self.pose_follow.position_lerp;
        if !(0.0..=1.0).contains(&lerp) {
            return Err(DomainError::Configuration(format!(
                "pose_follow.position_lerp must be within [0, 1], got {lerp}"
            )));
        }
        Ok(())
    }

    /// The settle delay as a duration.
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        seconds_to_duration(self.settle_delay_seconds)
    }

    /// The suppression window as a duration.
    #[must_use]
    pub fn suppression_window(&self) -> Duration {
        seconds_to_duration(self.suppression_window_seconds)
    }

    /// How long hidden content survives, if it is torn down at all.
    #[must_use]
    pub fn lost_teardown(&self) -> Option<Duration> {
        self.lost_teardown_seconds.map(seconds_to_duration)
    }
}

fn check_seconds(field: &str, value: f64) -> Result<(), DomainError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::Configuration(format!(
            "{field} must be a finite, non-negative number of seconds, got {value}"
        )));
    }
    if value > MAX_SECONDS {
        return Err(DomainError::Configuration(format!(
            "{field} must be at most {MAX_SECONDS} seconds, got {value}"
        )));
    }
    Ok(())
}

/// Converts seconds to a millisecond-precision duration, clamped to
/// `[0, MAX_SECONDS]`.
#[allow(clippy::cast_possible_truncation)]
fn seconds_to_duration(seconds: f64) -> Duration {
    let seconds = if seconds.is_finite() {
        seconds.clamp(0.0, MAX_SECONDS)
    } else {
        0.0
    };
    Duration::milliseconds((seconds * 1000.0).round() as i64)
}
