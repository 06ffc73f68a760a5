//! The world ↔ user frame transform pair.
//!
//! The operator authors points in the world frame; the controller works in a
//! calibrated user frame. Both directions are loaded together once per session
//! and are never updated independently.

use nalgebra::{Isometry3, Matrix3, Rotation3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use crate::transform::TransformError;

/// Number of values in a row-major 3×4 rigid transform matrix.
pub const FRAME_VALUE_COUNT: usize = 12;

/// world→user and user→world rigid transforms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameTransforms {
    world_to_user: Isometry3<f64>,
    user_to_world: Isometry3<f64>,
}

impl Default for FrameTransforms {
    fn default() -> Self {
        Self::identity()
    }
}

impl FrameTransforms {
    /// Both directions are the identity (no user frame calibrated).
    pub fn identity() -> Self {
        Self {
            world_to_user: Isometry3::identity(),
            user_to_world: Isometry3::identity(),
        }
    }

    /// Build the pair from a world→user transform, deriving the inverse.
    pub fn from_world_to_user(world_to_user: Isometry3<f64>) -> Self {
        Self {
            user_to_world: world_to_user.inverse(),
            world_to_user,
        }
    }

    /// Build the pair from two 12-value row-major 3×4 matrices.
    ///
    /// Only the first twelve values of each slice are used.
    pub fn from_values(
        world_to_user: &[f64],
        user_to_world: &[f64],
    ) -> Result<Self, TransformError> {
        Ok(Self {
            world_to_user: isometry_from_values(world_to_user)?,
            user_to_world: isometry_from_values(user_to_world)?,
        })
    }

    /// Build the pair from optional configuration values.
    ///
    /// A missing or malformed side leaves both directions at identity.
    pub fn from_optional_values(
        world_to_user: Option<&[f64]>,
        user_to_world: Option<&[f64]>,
    ) -> Result<Self, TransformError> {
        match (world_to_user, user_to_world) {
            (Some(w2u), Some(u2w)) => Self::from_values(w2u, u2w),
            _ => Ok(Self::identity()),
        }
    }

    pub fn world_to_user(&self) -> &Isometry3<f64> {
        &self.world_to_user
    }

    pub fn user_to_world(&self) -> &Isometry3<f64> {
        &self.user_to_world
    }

    /// Largest translation error of `world_to_user * user_to_world` applied to
    /// the origin and unit axes. Near zero when the pair are true inverses.
    pub fn inverse_mismatch(&self) -> f64 {
        let composed = self.world_to_user * self.user_to_world;
        let probes = [
            nalgebra::Point3::origin(),
            nalgebra::Point3::new(1.0, 0.0, 0.0),
            nalgebra::Point3::new(0.0, 1.0, 0.0),
            nalgebra::Point3::new(0.0, 0.0, 1.0),
        ];
        probes
            .iter()
            .map(|p| (composed * *p - *p).norm())
            .fold(0.0, f64::max)
    }
}

/// Parse a row-major 3×4 matrix `[r11 r12 r13 tx r21 r22 r23 ty r31 r32 r33 tz]`.
///
/// The rotation block is projected onto the nearest proper rotation so that
/// rounding in persisted values cannot introduce shear.
pub fn isometry_from_values(values: &[f64]) -> Result<Isometry3<f64>, TransformError> {
    if values.len() < FRAME_VALUE_COUNT {
        return Err(TransformError::FrameValueCount(values.len()));
    }
    let v = &values[..FRAME_VALUE_COUNT];
    if v.iter().any(|x| !x.is_finite()) {
        return Err(TransformError::NonFiniteFrameValue);
    }

    let m = Matrix3::new(v[0], v[1], v[2], v[4], v[5], v[6], v[8], v[9], v[10]);
    let rotation = Rotation3::from_matrix(&m);
    Ok(Isometry3::from_parts(
        Translation3::new(v[3], v[7], v[11]),
        UnitQuaternion::from_rotation_matrix(&rotation),
    ))
}

/// Inverse of [`isometry_from_values`].
#[cfg(test)]
pub(crate) fn isometry_to_values(iso: &Isometry3<f64>) -> [f64; FRAME_VALUE_COUNT] {
    let m = iso.rotation.to_rotation_matrix();
    let m = m.matrix();
    let t = &iso.translation;
    [
        m[(0, 0)], m[(0, 1)], m[(0, 2)], t.x,
        m[(1, 0)], m[(1, 1)], m[(1, 2)], t.y,
        m[(2, 0)], m[(2, 1)], m[(2, 2)], t.z,
    ]
}
