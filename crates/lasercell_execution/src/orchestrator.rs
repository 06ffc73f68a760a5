//! TaskRunner - the task queue state machine.
//!
//! The runner is synchronous. Every input (start, stop, motion
//! acknowledgement, timer wakeup) is a method call that takes a
//! [`RunnerContext`] with the links, the observer and a [`Scheduler`]; the
//! runner never sleeps, it arms a timer and returns. Exactly one motion is
//! outstanding at a time and the next step is taken only when the previous
//! one completes.

use std::path::PathBuf;
use std::time::Duration;

use lasercell_robotics::{ArmConfiguration, FrameTransforms, NativePose, TransformError};
use nalgebra::Vector3;
use tracing::{debug, error, info, warn};

use crate::calibration::{
    CalibrationArtifact, CalibrationPoll, CalibrationWorkflow, CALIBRATION_GRACE, POLL_INTERVAL,
};
use crate::components::{HomePoint, ShapeType, TaskBuffer, TaskPoint, WorkResult};
use crate::scheduler::{Scheduler, Wakeup, WakeupKind};
use crate::traits::{BotObserver, RelayLink};

/// Corrections shorter than this are treated as no correction.
pub const CORRECTION_EPSILON: f64 = 1e-7;

/// Session constants the runner needs to build poses and run calibration.
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub frames: FrameTransforms,
    pub arm: ArmConfiguration,
    /// Settle time before the snapshot is requested
    pub camera_delay: Duration,
    pub snapshot_name: String,
    pub calibration_result: PathBuf,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            frames: FrameTransforms::identity(),
            arm: ArmConfiguration::default(),
            camera_delay: Duration::from_millis(3000),
            snapshot_name: "snapshot.bmp".to_string(),
            calibration_result: PathBuf::from("calib_result.txt"),
        }
    }
}

/// Everything outside the runner that a step may touch.
pub struct RunnerContext<'a> {
    pub relay: &'a mut dyn RelayLink,
    pub observer: &'a dyn BotObserver,
    pub scheduler: &'a mut dyn Scheduler,
    /// Both links are up
    pub link_ready: bool,
}

/// What the runner is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// No run in progress
    #[default]
    Idle,
    /// A motion was issued, waiting for its acknowledgement
    Moving,
    /// Waiting out the post-motion delay of the last point
    Delaying,
    /// Calibration cycle in progress for the front point
    Calibrating,
}

#[derive(Debug)]
pub struct TaskRunner {
    settings: RunnerSettings,
    buffer: TaskBuffer,
    home_points: Vec<HomePoint>,
    /// Delay of the last issued point, consumed once its motion completes
    pending_delay: Duration,
    /// The last issued point asked for calibration
    needs_calibration: bool,
    calibration: CalibrationWorkflow,
    generation: u64,
    state: RunState,
    /// Acknowledgements still owed for motions abandoned by a stop or restart
    stale_acks: u32,
}

impl TaskRunner {
    pub fn new(settings: RunnerSettings) -> Self {
        let artifact = CalibrationArtifact::new(settings.calibration_result.clone());
        Self {
            settings,
            buffer: TaskBuffer::new(),
            home_points: Vec::new(),
            pending_delay: Duration::ZERO,
            needs_calibration: false,
            calibration: CalibrationWorkflow::new(artifact),
            generation: 0,
            state: RunState::Idle,
            stale_acks: 0,
        }
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Incremented on every start and stop; wakeups from older generations are dropped.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Points not yet issued (plus the front point while it is being calibrated).
    pub fn remaining(&self) -> &TaskBuffer {
        &self.buffer
    }

    pub fn is_running(&self) -> bool {
        self.state != RunState::Idle
    }

    /// Replace the queue and start working through it.
    pub fn start_tasks(
        &mut self,
        home_points: Vec<HomePoint>,
        task_points: Vec<TaskPoint>,
        ctx: &mut RunnerContext<'_>,
    ) {
        info!("Starting run: {} task points, {} home points", task_points.len(), home_points.len());
        self.reset(ctx);
        self.home_points = home_points;
        self.buffer.replace(task_points);
        self.complete_path(WorkResult::Ok, ctx);
    }

    /// Drop the queue and halt the command link. No completion is reported.
    pub fn stop_tasks(&mut self, ctx: &mut RunnerContext<'_>) {
        info!("Stopping run with {} points left", self.buffer.len());
        self.reset(ctx);
        self.buffer.clear();
        ctx.relay.stop();
    }

    /// Acknowledgement of the outstanding motion.
    pub fn on_ack(&mut self, enqueued: bool, ctx: &mut RunnerContext<'_>) {
        if self.stale_acks > 0 {
            self.stale_acks -= 1;
            debug!(enqueued, "Dropping acknowledgement of an abandoned motion");
            return;
        }
        if self.state != RunState::Moving {
            debug!(state = ?self.state, enqueued, "Ignoring acknowledgement");
            return;
        }
        // The motion is settled; whatever comes next sets its own state.
        self.state = RunState::Idle;
        let result = if enqueued { WorkResult::Ok } else { WorkResult::Error };
        self.complete_path(result, ctx);
    }

    pub fn on_wakeup(&mut self, wakeup: Wakeup, ctx: &mut RunnerContext<'_>) {
        if wakeup.generation != self.generation {
            debug!(?wakeup, current = self.generation, "Dropping stale wakeup");
            return;
        }

        match (wakeup.kind, self.state) {
            (WakeupKind::DelayElapsed, RunState::Delaying) => {
                self.complete_path(WorkResult::Ok, ctx)
            }
            (WakeupKind::Snapshot, RunState::Calibrating) => {
                ctx.observer.make_snapshot(&self.settings.snapshot_name);
            }
            (WakeupKind::CalibrationPoll, RunState::Calibrating) => self.poll_calibration(ctx),
            (kind, state) => debug!(?kind, ?state, "Wakeup does not apply"),
        }
    }

    fn reset(&mut self, ctx: &mut RunnerContext<'_>) {
        if self.state == RunState::Moving {
            self.stale_acks += 1;
        }
        self.generation += 1;
        ctx.scheduler.cancel_all();
        self.pending_delay = Duration::ZERO;
        self.needs_calibration = false;
        self.state = RunState::Idle;
    }

    /// Take the next step after the previous one finished with `result`.
    fn complete_path(&mut self, result: WorkResult, ctx: &mut RunnerContext<'_>) {
        if !result.is_ok() {
            self.fail(ctx);
            return;
        }

        if self.needs_calibration {
            info!("Point needs calibration");
            self.needs_calibration = false;
            self.begin_calibration(ctx);
            return;
        }

        if !self.pending_delay.is_zero() {
            info!("Task delay {:?}", self.pending_delay);
            self.state = RunState::Delaying;
            ctx.scheduler.schedule(
                self.pending_delay,
                Wakeup::new(self.generation, WakeupKind::DelayElapsed),
            );
            self.pending_delay = Duration::ZERO;
            return;
        }

        match self.next_pose() {
            Some(Ok(pose)) => self.send(pose, ctx),
            Some(Err(e)) => {
                error!("Cannot build pose: {}", e);
                self.fail(ctx);
            }
            None => self.finish(ctx),
        }
    }

    /// Pose for the next motion, consuming the front point's flags.
    /// `None` once the queue is drained.
    fn next_pose(&mut self) -> Option<Result<NativePose, TransformError>> {
        let frames = &self.settings.frames;
        let arm = self.settings.arm;
        let point = self.buffer.front_mut()?;

        info!(
            "Task {} (home={}, calib={}): xyz = {:?} normal = {:?} angle = {:?}",
            point.task_type, point.use_home_point, point.needs_calibration,
            point.global_pos, point.normal, point.angle
        );

        if point.use_home_point {
            if let Some(home) = self.home_points.first() {
                info!("Home point detour");
                point.use_home_point = false;
                return Some(home.native_pose(frames.user_to_world(), arm));
            }
        }

        let pose = match point.native_pose(frames.user_to_world(), arm) {
            Ok(pose) => pose,
            Err(e) => return Some(Err(e)),
        };

        self.pending_delay = point.delay_duration();
        self.needs_calibration = point.needs_calibration;
        if self.needs_calibration {
            // Stays queued so the correction reaches it before it is re-issued.
            point.needs_calibration = false;
        } else {
            self.buffer.pop();
        }
        Some(Ok(pose))
    }

    fn send(&mut self, pose: NativePose, ctx: &mut RunnerContext<'_>) {
        if !ctx.link_ready {
            warn!("Robot not ready, cannot issue motion");
            self.fail(ctx);
            return;
        }

        debug!(?pose, "Issuing motion");
        match ctx.relay.move_point(&pose) {
            Ok(()) => self.state = RunState::Moving,
            Err(e) => {
                warn!("Motion refused: {}", e);
                self.complete_path(WorkResult::Error, ctx);
            }
        }
    }

    fn begin_calibration(&mut self, ctx: &mut RunnerContext<'_>) {
        self.state = RunState::Calibrating;
        self.calibration.begin();

        let delay = self.settings.camera_delay;
        ctx.scheduler.schedule(delay, Wakeup::new(self.generation, WakeupKind::Snapshot));
        ctx.scheduler.schedule(
            delay + CALIBRATION_GRACE,
            Wakeup::new(self.generation, WakeupKind::CalibrationPoll),
        );
    }

    fn poll_calibration(&mut self, ctx: &mut RunnerContext<'_>) {
        match self.calibration.poll() {
            CalibrationPoll::Pending => {
                ctx.scheduler.schedule(
                    POLL_INTERVAL,
                    Wakeup::new(self.generation, WakeupKind::CalibrationPoll),
                );
            }
            CalibrationPoll::Correction(delta) => self.apply_correction(delta, ctx),
            CalibrationPoll::Exhausted | CalibrationPoll::Rejected(_) => {
                if ctx.observer.calibration_warning() {
                    warn!("Operator chose to continue without correction");
                    self.apply_correction(Vector3::zeros(), ctx);
                } else {
                    warn!("Operator aborted the run after calibration failure");
                    self.complete_path(WorkResult::Error, ctx);
                }
            }
        }
    }

    /// Rotate `delta` into the laser head frame and shift every remaining point.
    fn apply_correction(&mut self, delta: Vector3<f64>, ctx: &mut RunnerContext<'_>) {
        if delta.norm() > CORRECTION_EPSILON {
            let head = ctx.observer.shape_transform(ShapeType::LaserHead);
            let rotated = head.rotation * delta;
            info!("Delta: {:?}; rotated delta: {:?}", delta, rotated);

            self.buffer.apply_offset(&rotated);
            ctx.observer.snapshot_calibration_data_received(&rotated);
        }
        self.complete_path(WorkResult::Ok, ctx);
    }

    fn fail(&mut self, ctx: &mut RunnerContext<'_>) {
        error!("Run failed with {} points left", self.buffer.len());
        self.buffer.clear();
        self.reset(ctx);
        ctx.observer.tasks_complete(WorkResult::Error);
    }

    fn finish(&mut self, ctx: &mut RunnerContext<'_>) {
        info!("Finish");
        self.state = RunState::Idle;
        ctx.observer.tasks_complete(WorkResult::Ok);
    }
}
