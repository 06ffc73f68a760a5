//! The transform boundary between operator points and native poses.
//!
//! Outgoing: a work point (position, surface normal, relative rotation) in the
//! user frame is turned into an orientation whose tool axis follows the
//! normal, then mapped through user→world into a [`NativePose`].
//!
//! Incoming: native telemetry is mapped through world→user into a
//! [`BotPosition`] for the UI.

use std::f64::consts::PI;

use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};
use thiserror::Error;

use crate::conversion::wpr_to_quaternion;
use crate::pose::{BotPosition, NativePose};

/// Normals shorter than this are treated as zero.
pub const NORMAL_EPSILON: f64 = 1e-9;

/// Errors raised at the transform boundary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    /// Surface normal has zero length, so no tool axis can be derived
    #[error("Surface normal is degenerate (zero length)")]
    DegenerateNormal,

    /// Frame matrix has too few values
    #[error("Frame transform needs 12 values, got {0}")]
    FrameValueCount(usize),

    /// Frame matrix contains NaN or infinity
    #[error("Frame transform contains a non-finite value")]
    NonFiniteFrameValue,
}

/// Rotation that takes the tool Z axis onto `normal`.
///
/// An anti-parallel normal (tool pointing straight down -Z) has no unique
/// shortest arc; it is resolved as a half turn about X.
pub fn tool_axis_rotation(normal: &Vector3<f64>) -> Result<UnitQuaternion<f64>, TransformError> {
    let normal = Unit::try_new(*normal, NORMAL_EPSILON).ok_or(TransformError::DegenerateNormal)?;

    Ok(UnitQuaternion::rotation_between_axis(&Vector3::z_axis(), &normal)
        .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI)))
}

/// Orientation of a work point in the user frame.
///
/// `relative_angle` holds W/P/R degrees applied intrinsically in the frame
/// whose Z axis is the surface normal.
pub fn work_orientation(
    normal: &Vector3<f64>,
    relative_angle: &Vector3<f64>,
) -> Result<UnitQuaternion<f64>, TransformError> {
    let aligned = tool_axis_rotation(normal)?;
    let delta = wpr_to_quaternion(relative_angle.x, relative_angle.y, relative_angle.z);
    Ok(aligned * delta)
}

/// Build the native pose for a work point.
///
/// The returned pose carries default arm flags; callers attach the session's
/// configuration with [`NativePose::with_config`].
pub fn to_native_pose(
    position: &Vector3<f64>,
    normal: &Vector3<f64>,
    relative_angle: &Vector3<f64>,
    user_to_world: &Isometry3<f64>,
) -> Result<NativePose, TransformError> {
    let orientation = work_orientation(normal, relative_angle)?;
    let local = Isometry3::from_parts(Translation3::from(*position), orientation);
    let native = user_to_world * local;

    Ok(NativePose::from_isometry(&native, Default::default()))
}

/// Map native telemetry into the operator's frame.
pub fn to_operator_position(pose: &NativePose, world_to_user: &Isometry3<f64>) -> BotPosition {
    BotPosition::from_isometry(&(world_to_user * pose.to_isometry()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::angle_distance;
    use crate::frame::FrameTransforms;

    const TOLERANCE: f64 = 1e-6;

    fn sample_frames() -> FrameTransforms {
        FrameTransforms::from_world_to_user(Isometry3::new(
            Vector3::new(120.0, -45.0, 310.0),
            Vector3::new(0.2, -0.4, 1.1),
        ))
    }

    #[test]
    fn test_zero_normal_rejected() {
        let err = to_native_pose(
            &Vector3::new(1.0, 2.0, 3.0),
            &Vector3::zeros(),
            &Vector3::zeros(),
            &Isometry3::identity(),
        )
        .unwrap_err();
        assert_eq!(err, TransformError::DegenerateNormal);
    }

    #[test]
    fn test_up_normal_is_identity_orientation() {
        let pose = to_native_pose(
            &Vector3::new(10.0, 20.0, 30.0),
            &Vector3::z(),
            &Vector3::zeros(),
            &Isometry3::identity(),
        )
        .unwrap();

        assert!((pose.x - 10.0).abs() < TOLERANCE);
        assert!((pose.y - 20.0).abs() < TOLERANCE);
        assert!((pose.z - 30.0).abs() < TOLERANCE);
        assert!(pose.w.abs() < TOLERANCE, "W should be 0, got {}", pose.w);
        assert!(pose.p.abs() < TOLERANCE, "P should be 0, got {}", pose.p);
        assert!(pose.r.abs() < TOLERANCE, "R should be 0, got {}", pose.r);
    }

    #[test]
    fn test_down_normal_is_half_turn() {
        let pose = to_native_pose(
            &Vector3::zeros(),
            &-Vector3::z(),
            &Vector3::zeros(),
            &Isometry3::identity(),
        )
        .unwrap();

        let tool_z = pose.to_isometry().rotation * Vector3::z();
        assert!(
            (tool_z + Vector3::z()).norm() < TOLERANCE,
            "tool axis should point down: {}",
            tool_z
        );
        assert!(angle_distance(pose.w, 180.0) < TOLERANCE, "W should be ±180, got {}", pose.w);
    }

    #[test]
    fn test_tool_axis_follows_normal() {
        let normal = Vector3::new(1.0, 1.0, 0.0);
        let q = work_orientation(&normal, &Vector3::new(0.0, 0.0, 37.0)).unwrap();
        let tool_z = q * Vector3::z();
        assert!((tool_z - normal.normalize()).norm() < TOLERANCE);
    }

    #[test]
    fn test_roundtrip_through_inverse_pair() {
        let frames = sample_frames();
        let cases = [
            (Vector3::new(0.0, 0.0, 0.0), Vector3::z(), Vector3::zeros()),
            (
                Vector3::new(512.5, -80.0, 12.0),
                Vector3::new(0.0, 1.0, 1.0),
                Vector3::new(0.0, 0.0, 90.0),
            ),
            (Vector3::new(-30.0, 44.0, 900.0), -Vector3::z(), Vector3::new(10.0, -20.0, 179.9)),
        ];

        for (position, normal, angle) in cases {
            let native =
                to_native_pose(&position, &normal, &angle, frames.user_to_world()).unwrap();
            let back = to_operator_position(&native, frames.world_to_user());

            assert!((back.x - position.x).abs() < TOLERANCE, "X mismatch {}", back.x);
            assert!((back.y - position.y).abs() < TOLERANCE, "Y mismatch {}", back.y);
            assert!((back.z - position.z).abs() < TOLERANCE, "Z mismatch {}", back.z);

            let expected = work_orientation(&normal, &angle).unwrap();
            let actual = wpr_to_quaternion(back.w, back.p, back.r);
            let drift = expected.angle_to(&actual);
            assert!(drift < 1e-6, "orientation drifted by {}", drift);
        }
    }
}
