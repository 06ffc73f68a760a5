//! Simulated robot links and camera.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lasercell_execution::{DeviceError, LinkEvent, LinkSender, RelayLink, StateLink};
use lasercell_robotics::NativePose;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Time the simulated controller takes to accept a motion.
const ENQUEUE_LATENCY: Duration = Duration::from_millis(250);

/// Telemetry period.
const POSE_PERIOD: Duration = Duration::from_millis(500);

/// Shared state of the simulated controller.
#[derive(Clone)]
pub struct SimRobot {
    telemetry_up: Arc<AtomicBool>,
    command_up: Arc<AtomicBool>,
    pose: watch::Sender<NativePose>,
    events: LinkSender,
}

impl SimRobot {
    pub fn new(events: LinkSender) -> Self {
        let (pose, _) = watch::channel(NativePose::default());
        Self {
            telemetry_up: Arc::new(AtomicBool::new(true)),
            command_up: Arc::new(AtomicBool::new(true)),
            pose,
            events,
        }
    }

    pub fn state_link(&self) -> SimState {
        SimState {
            robot: self.clone(),
        }
    }

    pub fn relay_link(&self) -> SimRelay {
        SimRelay {
            robot: self.clone(),
        }
    }

    /// Stream the current pose until the socket goes away.
    pub fn spawn_telemetry(&self) -> JoinHandle<()> {
        let robot = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(POSE_PERIOD);
            loop {
                ticker.tick().await;
                if !robot.telemetry_up.load(Ordering::SeqCst) {
                    continue;
                }
                let pose = *robot.pose.borrow();
                if robot.events.send(LinkEvent::PoseReceived(pose)).is_err() {
                    break;
                }
            }
        })
    }
}

pub struct SimState {
    robot: SimRobot,
}

impl StateLink for SimState {
    fn connected(&self) -> bool {
        self.robot.telemetry_up.load(Ordering::SeqCst)
    }
}

/// Jumps to each target and acknowledges it after a fixed latency.
pub struct SimRelay {
    robot: SimRobot,
}

impl RelayLink for SimRelay {
    fn connected(&self) -> bool {
        self.robot.command_up.load(Ordering::SeqCst)
    }

    fn move_point(&mut self, pose: &NativePose) -> Result<(), DeviceError> {
        if !self.connected() {
            return Err(DeviceError::NotConnected);
        }
        debug!(?pose, "Simulated move");
        self.robot.pose.send_replace(*pose);

        let events = self.robot.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ENQUEUE_LATENCY).await;
            let _ = events.send(LinkEvent::PointEnqueued);
        });
        Ok(())
    }

    fn stop(&mut self) {
        info!("Simulated stop");
    }

    fn disconnect(&mut self) {
        warn!("Simulated command link disconnected");
        self.robot.command_up.store(false, Ordering::SeqCst);
        let _ = self.robot.events.send(LinkEvent::RelayConnectionChanged(false));
    }
}

/// Drops a fixed correction where the calibration workflow looks for it.
#[derive(Debug, Clone)]
pub struct SimCamera {
    pub result_path: PathBuf,
    pub line: String,
}

impl SimCamera {
    pub fn capture(&self, file_name: &str) {
        info!("Simulated snapshot {}", file_name);
        if let Err(e) = std::fs::write(&self.result_path, &self.line) {
            warn!("Simulated camera could not write {:?}: {}", self.result_path, e);
        }
    }
}
