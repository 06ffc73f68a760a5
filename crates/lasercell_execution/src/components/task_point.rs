//! TaskPoint, HomePoint and CalibPoint - the units of work handed in by the operator.

use std::time::Duration;

use lasercell_robotics::{to_native_pose, ArmConfiguration, NativePose, PointPair, TransformError};
use nalgebra::{Isometry3, Vector3};
use serde::{Deserialize, Serialize};

/// A queued work target in the user frame.
///
/// While queued, calibration may shift `global_pos`. The two flags are
/// one-shot: each is cleared by the runner once acted upon and never re-set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPoint {
    /// Target position
    pub global_pos: Vector3<f64>,

    /// Surface normal at the target; the tool axis is aligned with it
    pub normal: Vector3<f64>,

    /// Relative W/P/R rotation in degrees about the aligned frame
    pub angle: Vector3<f64>,

    /// Operator-defined task tag, logged but not interpreted
    #[serde(default)]
    pub task_type: i32,

    /// Visit the first home point before this point
    #[serde(default)]
    pub use_home_point: bool,

    /// Run camera calibration once the robot reaches this point
    #[serde(default)]
    pub needs_calibration: bool,

    /// Pause after the motion, in seconds
    #[serde(default)]
    pub delay: f64,
}

impl TaskPoint {
    /// Create a task point with no rotation, flags or delay.
    pub fn new(global_pos: Vector3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            global_pos,
            normal,
            angle: Vector3::zeros(),
            task_type: 0,
            use_home_point: false,
            needs_calibration: false,
            delay: 0.0,
        }
    }

    pub fn with_angle(mut self, angle: Vector3<f64>) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_task_type(mut self, task_type: i32) -> Self {
        self.task_type = task_type;
        self
    }

    pub fn with_home_point(mut self) -> Self {
        self.use_home_point = true;
        self
    }

    pub fn with_calibration(mut self) -> Self {
        self.needs_calibration = true;
        self
    }

    /// Set the post-motion delay in seconds.
    pub fn with_delay(mut self, seconds: f64) -> Self {
        self.delay = seconds;
        self
    }

    /// Post-motion delay. Negative or non-finite delays count as none.
    pub fn delay_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay).unwrap_or(Duration::ZERO)
    }

    /// Convert to the controller's pose encoding.
    pub fn native_pose(
        &self,
        user_to_world: &Isometry3<f64>,
        config: ArmConfiguration,
    ) -> Result<NativePose, TransformError> {
        let pose = to_native_pose(&self.global_pos, &self.normal, &self.angle, user_to_world)?;
        Ok(pose.with_config(config))
    }
}

/// A safe intermediate pose visited before certain task points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomePoint {
    pub global_pos: Vector3<f64>,
    pub normal: Vector3<f64>,
    pub angle: Vector3<f64>,
}

impl HomePoint {
    pub fn new(global_pos: Vector3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            global_pos,
            normal,
            angle: Vector3::zeros(),
        }
    }

    pub fn with_angle(mut self, angle: Vector3<f64>) -> Self {
        self.angle = angle;
        self
    }

    /// Convert to the controller's pose encoding.
    pub fn native_pose(
        &self,
        user_to_world: &Isometry3<f64>,
        config: ArmConfiguration,
    ) -> Result<NativePose, TransformError> {
        let pose = to_native_pose(&self.global_pos, &self.normal, &self.angle, user_to_world)?;
        Ok(pose.with_config(config))
    }
}

/// Correspondence for shape calibration: a model point and where the robot saw it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibPoint {
    pub global_pos: Vector3<f64>,
    pub bot_pos: Vector3<f64>,
}

impl CalibPoint {
    pub fn new(global_pos: Vector3<f64>, bot_pos: Vector3<f64>) -> Self {
        Self { global_pos, bot_pos }
    }
}

impl From<&CalibPoint> for PointPair {
    fn from(point: &CalibPoint) -> Self {
        PointPair::new(point.global_pos, point.bot_pos)
    }
}
