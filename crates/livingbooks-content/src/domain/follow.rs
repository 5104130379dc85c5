//! Pose following for content roots parented to a marker.

use livingbooks_core::config::PoseFollowConfig;
use livingbooks_core::observation::{Pose, Quat};

/// Computes where a content root moves when its marker is seen at `target`.
///
/// Position snaps to the marker when `position_lerp` is zero, otherwise it
/// covers that fraction of the remaining distance. Rotation either follows
/// the marker or stays at `spawn_rotation`.
#[must_use]
pub fn next_pose(
    current: Pose,
    target: Pose,
    spawn_rotation: Quat,
    config: &PoseFollowConfig,
) -> Pose {
    let position = if !config.follow_position {
        current.position
    } else if config.position_lerp <= 0.0 {
        target.position
    } else {
        current.position.lerp(target.position, config.position_lerp)
    };
    let rotation = if config.follow_rotation {
        target.rotation
    } else {
        spawn_rotation
    };
    Pose { position, rotation }
}
