//! One-shot rigid calibration of the part from point correspondences.

use lasercell_robotics::{BotPosition, PointPair, PointPairSolver, MIN_POINT_PAIRS};
use tracing::{info, warn};

use crate::components::{CalibPoint, CalibResult, ShapeType};
use crate::traits::BotObserver;

/// Fit the part pose from `points` and report it as the new `Part` pose.
///
/// The task queue is not involved; this may run while idle or mid-run.
pub fn exec_calibration(
    points: &[CalibPoint],
    solver: &dyn PointPairSolver,
    observer: &dyn BotObserver,
) -> CalibResult {
    if points.len() < MIN_POINT_PAIRS {
        warn!("Part calibration needs {} points, got {}", MIN_POINT_PAIRS, points.len());
        return CalibResult::Failed;
    }

    let pairs: Vec<PointPair> = points.iter().map(PointPair::from).collect();

    let transform = match solver.solve(&pairs) {
        Ok(transform) => transform,
        Err(e) => {
            warn!("Part calibration failed: {}", e);
            return CalibResult::Failed;
        }
    };

    let position = BotPosition::from_isometry(&transform);
    info!(
        "Part calibrated: xyz = {:.3} {:.3} {:.3} wpr = {:.3} {:.3} {:.3}",
        position.x, position.y, position.z, position.w, position.p, position.r
    );
    observer.shape_calibration_changed(ShapeType::Part, &position);
    CalibResult::Ok
}

#[cfg(test)]
mod tests {
    use lasercell_robotics::{KabschSolver, PointPairError};
    use nalgebra::{Isometry3, Vector3};

    use super::*;
    use crate::testing::{ObserverEvent, RecordingObserver};

    const TOLERANCE: f64 = 1e-6;

    struct FailingSolver;

    impl PointPairSolver for FailingSolver {
        fn solve(&self, _pairs: &[PointPair]) -> Result<Isometry3<f64>, PointPairError> {
            Err(PointPairError::SvdFailed)
        }
    }

    fn shifted(points: &[Vector3<f64>], offset: Vector3<f64>) -> Vec<CalibPoint> {
        points.iter().map(|p| CalibPoint::new(*p, p + offset)).collect()
    }

    #[test]
    fn test_reports_part_translation() {
        let observer = RecordingObserver::default();
        let points = shifted(
            &[
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(100.0, 0.0, 0.0),
                Vector3::new(0.0, 100.0, 0.0),
            ],
            Vector3::new(5.0, -3.0, 12.0),
        );

        assert_eq!(exec_calibration(&points, &KabschSolver, &observer), CalibResult::Ok);

        let events = observer.events();
        let [ObserverEvent::ShapeCalibration(ShapeType::Part, position)] = events.as_slice() else {
            panic!("unexpected events: {:?}", events);
        };
        assert!((position.x - 5.0).abs() < TOLERANCE);
        assert!((position.y + 3.0).abs() < TOLERANCE);
        assert!((position.z - 12.0).abs() < TOLERANCE);
        assert!(position.w.abs() < TOLERANCE);
        assert!(position.p.abs() < TOLERANCE);
        assert!(position.r.abs() < TOLERANCE);
    }

    #[test]
    fn test_too_few_points_fails_quietly() {
        let observer = RecordingObserver::default();
        let points = shifted(&[Vector3::zeros(), Vector3::x()], Vector3::zeros());

        assert_eq!(exec_calibration(&points, &KabschSolver, &observer), CalibResult::Failed);
        assert!(observer.events().is_empty());
    }

    #[test]
    fn test_solver_failure_is_reported() {
        let observer = RecordingObserver::default();
        let points = shifted(&[Vector3::zeros(), Vector3::x(), Vector3::y()], Vector3::zeros());

        assert_eq!(exec_calibration(&points, &FailingSolver, &observer), CalibResult::Failed);
        assert!(observer.events().is_empty());
    }
}
