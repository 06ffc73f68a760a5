//! BotObserver - the callback surface the UI implements.

use lasercell_robotics::BotPosition;
use nalgebra::{Isometry3, Vector3};

use crate::components::{DeviceState, PrepareResult, ShapeType, WorkResult};

/// Receives every outward notification of the socket.
///
/// All methods have defaults so an observer only implements what it shows.
/// Callbacks are invoked from the socket task and must not block.
pub trait BotObserver: Send + Sync {
    fn prepare_complete(&self, _result: PrepareResult) {}

    fn tasks_complete(&self, _result: WorkResult) {}

    fn connection_state_changed(&self, _state: DeviceState) {}

    /// Current tool position in the user frame.
    fn laser_head_position_changed(&self, _position: &BotPosition) {}

    fn grip_position_changed(&self, _position: &BotPosition) {}

    /// A calibration produced a new pose for `shape`.
    fn shape_calibration_changed(&self, _shape: ShapeType, _position: &BotPosition) {}

    fn shape_transform_changed(&self, _shape: ShapeType, _transform: &Isometry3<f64>) {}

    /// Current transform of `shape` as known to the UI.
    fn shape_transform(&self, _shape: ShapeType) -> Isometry3<f64> {
        Isometry3::identity()
    }

    /// Ask the UI to capture a camera image into `file_name`.
    fn make_snapshot(&self, _file_name: &str) {}

    /// The correction that was applied to the remaining points.
    fn snapshot_calibration_data_received(&self, _delta: &Vector3<f64>) {}

    /// Ask the operator whether to continue without a correction.
    ///
    /// `true` continues with a zero correction, `false` aborts the run.
    fn calibration_warning(&self) -> bool {
        false
    }
}

/// Observer that ignores every notification and declines warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl BotObserver for NoopObserver {}
