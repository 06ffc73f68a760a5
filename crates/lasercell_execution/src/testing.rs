//! Recording doubles for the links, observer and scheduler.

use std::sync::Mutex;
use std::time::Duration;

use lasercell_robotics::{BotPosition, NativePose};
use nalgebra::{Isometry3, Vector3};

use crate::components::{DeviceState, PrepareResult, ShapeType, WorkResult};
use crate::scheduler::{Scheduler, Wakeup, WakeupKind};
use crate::traits::{BotObserver, DeviceError, RelayLink};

#[derive(Debug, Default)]
pub struct RecordingRelay {
    pub moves: Vec<NativePose>,
    pub stops: usize,
    pub disconnects: usize,
    /// Refuse every motion synchronously
    pub refuse: bool,
}

impl RelayLink for RecordingRelay {
    fn connected(&self) -> bool {
        !self.refuse
    }

    fn move_point(&mut self, pose: &NativePose) -> Result<(), DeviceError> {
        if self.refuse {
            return Err(DeviceError::NotConnected);
        }
        self.moves.push(*pose);
        Ok(())
    }

    fn stop(&mut self) {
        self.stops += 1;
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
    }
}

/// Timers are only recorded; tests fire them in arming order.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pending: Vec<(Duration, Wakeup)>,
    pub cancelled: usize,
}

impl ManualScheduler {
    pub fn armed(&self) -> Vec<(Duration, WakeupKind)> {
        self.pending.iter().map(|(after, w)| (*after, w.kind)).collect()
    }

    pub fn take_next(&mut self) -> Option<(Duration, Wakeup)> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, after: Duration, wakeup: Wakeup) {
        self.pending.push((after, wakeup));
    }

    fn cancel_all(&mut self) {
        self.pending.clear();
        self.cancelled += 1;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    Prepare(PrepareResult),
    TasksComplete(WorkResult),
    Connection(DeviceState),
    ShapeCalibration(ShapeType, BotPosition),
    Snapshot(String),
    Correction(Vector3<f64>),
    Warning,
}

#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
    warning_answer: Mutex<bool>,
    laser_head: Mutex<Option<Isometry3<f64>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn set_warning_answer(&self, answer: bool) {
        *self.warning_answer.lock().unwrap() = answer;
    }

    pub fn set_laser_head(&self, transform: Isometry3<f64>) {
        *self.laser_head.lock().unwrap() = Some(transform);
    }

    fn push(&self, event: ObserverEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl BotObserver for RecordingObserver {
    fn prepare_complete(&self, result: PrepareResult) {
        self.push(ObserverEvent::Prepare(result));
    }

    fn tasks_complete(&self, result: WorkResult) {
        self.push(ObserverEvent::TasksComplete(result));
    }

    fn connection_state_changed(&self, state: DeviceState) {
        self.push(ObserverEvent::Connection(state));
    }

    fn shape_calibration_changed(&self, shape: ShapeType, position: &BotPosition) {
        self.push(ObserverEvent::ShapeCalibration(shape, *position));
    }

    fn shape_transform(&self, shape: ShapeType) -> Isometry3<f64> {
        match shape {
            ShapeType::LaserHead => {
                self.laser_head.lock().unwrap().unwrap_or_else(Isometry3::identity)
            }
            _ => Isometry3::identity(),
        }
    }

    fn make_snapshot(&self, file_name: &str) {
        self.push(ObserverEvent::Snapshot(file_name.to_string()));
    }

    fn snapshot_calibration_data_received(&self, delta: &Vector3<f64>) {
        self.push(ObserverEvent::Correction(*delta));
    }

    fn calibration_warning(&self) -> bool {
        self.push(ObserverEvent::Warning);
        *self.warning_answer.lock().unwrap()
    }
}
