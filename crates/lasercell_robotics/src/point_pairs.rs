//! Rigid part referencing from point correspondences.
//!
//! Given points measured on the part model (global frame) and the same points
//! touched up with the robot, recover the part→robot transform.

use nalgebra::{Isometry3, Matrix3, Rotation3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of correspondences for a unique rigid fit.
pub const MIN_POINT_PAIRS: usize = 3;

/// Ratio below which the second singular value marks collinear input.
const DEGENERACY_RATIO: f64 = 1e-9;

/// One correspondence: a point on the part and where the robot observed it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointPair {
    pub global: Vector3<f64>,
    pub robot: Vector3<f64>,
}

impl PointPair {
    pub fn new(global: Vector3<f64>, robot: Vector3<f64>) -> Self {
        Self { global, robot }
    }
}

/// Error type for point-pair fitting.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PointPairError {
    #[error("At least {MIN_POINT_PAIRS} point pairs are required, got {0}")]
    TooFewPairs(usize),

    #[error("Point pairs are collinear or coincident")]
    DegeneratePoints,

    #[error("SVD did not converge")]
    SvdFailed,
}

/// Black-box solver contract: correspondences in, part→robot transform out.
pub trait PointPairSolver {
    fn solve(&self, pairs: &[PointPair]) -> Result<Isometry3<f64>, PointPairError>;
}

/// Least-squares rigid fit (Kabsch): SVD rotation alignment of the centred
/// point sets followed by the translation between centroids.
#[derive(Clone, Copy, Debug, Default)]
pub struct KabschSolver;

impl PointPairSolver for KabschSolver {
    fn solve(&self, pairs: &[PointPair]) -> Result<Isometry3<f64>, PointPairError> {
        fit_rigid_transform(pairs)
    }
}

/// Fit `T` such that `robot ≈ T * global` for every pair.
pub fn fit_rigid_transform(pairs: &[PointPair]) -> Result<Isometry3<f64>, PointPairError> {
    if pairs.len() < MIN_POINT_PAIRS {
        return Err(PointPairError::TooFewPairs(pairs.len()));
    }

    let n = pairs.len() as f64;
    let mut c_g = Vector3::zeros();
    let mut c_r = Vector3::zeros();
    for pair in pairs {
        c_g += pair.global;
        c_r += pair.robot;
    }
    c_g /= n;
    c_r /= n;

    let mut h = Matrix3::zeros();
    for pair in pairs {
        h += (pair.robot - c_r) * (pair.global - c_g).transpose();
    }

    let svd = h.svd(true, true);
    let largest = svd.singular_values.max();
    let mut sorted = [svd.singular_values[0], svd.singular_values[1], svd.singular_values[2]];
    sorted.sort_by(|a, b| b.total_cmp(a));
    if largest <= f64::EPSILON || sorted[1] <= largest * DEGENERACY_RATIO {
        return Err(PointPairError::DegeneratePoints);
    }

    let u = svd.u.ok_or(PointPairError::SvdFailed)?;
    let v_t = svd.v_t.ok_or(PointPairError::SvdFailed)?;
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        // Flip the axis of least variance; nalgebra does not sort singular values.
        let weakest = svd.singular_values.imin();
        let mut u_fix = u;
        u_fix.column_mut(weakest).neg_mut();
        r = u_fix * v_t;
    }

    let t = c_r - r * c_g;
    let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r));
    Ok(Isometry3::from_parts(Translation3::from(t), rotation))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs_under(transform: &Isometry3<f64>) -> Vec<PointPair> {
        [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(100.0, 0.0, 0.0),
            Vector3::new(0.0, 50.0, 0.0),
            Vector3::new(10.0, 20.0, 30.0),
        ]
        .into_iter()
        .map(|g| PointPair::new(g, transform.transform_vector(&g) + transform.translation.vector))
        .collect()
    }

    #[test]
    fn test_recovers_known_transform() {
        let truth = Isometry3::new(Vector3::new(400.0, -120.0, 35.0), Vector3::new(0.1, -0.3, 0.7));
        let fitted = fit_rigid_transform(&pairs_under(&truth)).unwrap();

        assert!((fitted.translation.vector - truth.translation.vector).norm() < 1e-6);
        assert!(fitted.rotation.angle_to(&truth.rotation) < 1e-9);
    }

    #[test]
    fn test_three_pairs_are_enough() {
        let truth = Isometry3::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, 0.5));
        let pairs = pairs_under(&truth);
        let fitted = KabschSolver.solve(&pairs[..3]).unwrap();
        assert!((fitted.translation.vector - truth.translation.vector).norm() < 1e-6);
    }

    #[test]
    fn test_too_few_pairs() {
        let pairs = pairs_under(&Isometry3::identity());
        assert_eq!(fit_rigid_transform(&pairs[..2]), Err(PointPairError::TooFewPairs(2)));
    }

    #[test]
    fn test_collinear_pairs_rejected() {
        let pairs: Vec<_> = (0..4)
            .map(|i| {
                let p = Vector3::new(i as f64 * 10.0, 0.0, 0.0);
                PointPair::new(p, p)
            })
            .collect();
        assert_eq!(fit_rigid_transform(&pairs), Err(PointPairError::DegeneratePoints));
    }
}
