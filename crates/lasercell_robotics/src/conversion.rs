//! Quaternion ↔ Euler angle conversion utilities.
//!
//! Poses carry their orientation as W-P-R in degrees, where:
//! - W: rotation around the fixed X axis (applied first)
//! - P: rotation around the fixed Y axis (applied second)
//! - R: rotation around the fixed Z axis (applied last)
//!
//! That is `R = Rz(r) * Ry(p) * Rx(w)`, the same order nalgebra uses for
//! `Rotation3::from_euler_angles(roll, pitch, yaw)`.

use nalgebra::{Rotation3, UnitQuaternion};

/// Convert a unit quaternion to extrinsic XYZ angles in degrees.
///
/// The quaternion is renormalised first so that accumulated drift never leaks
/// into the extracted angles. Returns `(w, p, r)`.
///
/// # Gimbal Lock
/// When P = ±90°, W and R become coupled; nalgebra resolves this by folding
/// the whole rotation into one of them.
pub fn quaternion_to_wpr(q: &UnitQuaternion<f64>) -> (f64, f64, f64) {
    let mut q = *q;
    q.renormalize();
    let (w_rad, p_rad, r_rad) = q.to_rotation_matrix().euler_angles();

    (w_rad.to_degrees(), p_rad.to_degrees(), r_rad.to_degrees())
}

/// Convert extrinsic XYZ angles in degrees to a unit quaternion.
pub fn wpr_to_quaternion(w_deg: f64, p_deg: f64, r_deg: f64) -> UnitQuaternion<f64> {
    let rotation = Rotation3::from_euler_angles(
        w_deg.to_radians(),
        p_deg.to_radians(),
        r_deg.to_radians(),
    );
    UnitQuaternion::from_rotation_matrix(&rotation)
}

/// Wrap an angle in degrees into `(-180, 180]`.
#[cfg(test)]
pub(crate) fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Angular distance between two angles in degrees, honouring wrap-around.
#[cfg(test)]
pub(crate) fn angle_distance(a: f64, b: f64) -> f64 {
    normalize_degrees(a - b).abs()
}
