//! Observer that logs every notification.

use lasercell_execution::{BotObserver, DeviceState, PrepareResult, ShapeType, WorkResult};
use lasercell_robotics::BotPosition;
use nalgebra::{Isometry3, Vector3};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::sim::SimCamera;

pub struct LoggingObserver {
    finished: mpsc::UnboundedSender<WorkResult>,
    camera: SimCamera,
    laser_head: Isometry3<f64>,
}

impl LoggingObserver {
    pub fn new(finished: mpsc::UnboundedSender<WorkResult>, camera: SimCamera) -> Self {
        Self {
            finished,
            camera,
            laser_head: Isometry3::identity(),
        }
    }
}

impl BotObserver for LoggingObserver {
    fn prepare_complete(&self, result: PrepareResult) {
        info!(?result, "Prepare complete");
    }

    fn tasks_complete(&self, result: WorkResult) {
        info!(?result, "Tasks complete");
        let _ = self.finished.send(result);
    }

    fn connection_state_changed(&self, state: DeviceState) {
        info!(?state, "Connection state");
    }

    fn laser_head_position_changed(&self, position: &BotPosition) {
        debug!(
            "Laser head at {:.2} {:.2} {:.2} / {:.2} {:.2} {:.2}",
            position.x, position.y, position.z, position.w, position.p, position.r
        );
    }

    fn shape_calibration_changed(&self, shape: ShapeType, position: &BotPosition) {
        info!(?shape, ?position, "Shape calibrated");
    }

    fn shape_transform(&self, shape: ShapeType) -> Isometry3<f64> {
        match shape {
            ShapeType::LaserHead => self.laser_head,
            ShapeType::Part | ShapeType::Grip => Isometry3::identity(),
        }
    }

    fn make_snapshot(&self, file_name: &str) {
        self.camera.capture(file_name);
    }

    fn snapshot_calibration_data_received(&self, delta: &Vector3<f64>) {
        info!("Correction applied: {:.3} {:.3} {:.3}", delta.x, delta.y, delta.z);
    }

    fn calibration_warning(&self) -> bool {
        warn!("Calibration failed, continuing without correction");
        true
    }
}
