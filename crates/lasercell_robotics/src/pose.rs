//! Pose types on both sides of the transform boundary.

use nalgebra::{Isometry3, Translation3};
use serde::{Deserialize, Serialize};

use crate::conversion::{quaternion_to_wpr, wpr_to_quaternion};

/// Arm configuration flags sent with every motion command.
///
/// Several joint solutions reach the same cartesian target; these select
/// which one the controller should use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmConfiguration {
    /// Wrist flipped (mirrored) instead of no-flip
    pub flip: bool,
    /// Elbow up instead of elbow down
    pub up: bool,
    /// Arm above (top) instead of below the shoulder
    pub top: bool,
}

impl Default for ArmConfiguration {
    fn default() -> Self {
        Self {
            flip: false,
            up: true,
            top: true,
        }
    }
}

/// Robot-native pose: XYZ in the controller's length unit plus W/P/R in degrees.
///
/// Only produced right before a motion command is issued, or received as
/// telemetry from the state channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NativePose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
    pub p: f64,
    pub r: f64,
    pub config: ArmConfiguration,
}

impl NativePose {
    /// Create a pose from XYZ position and WPR rotation with default arm flags.
    pub fn from_xyz_wpr(x: f64, y: f64, z: f64, w: f64, p: f64, r: f64) -> Self {
        Self {
            x,
            y,
            z,
            w,
            p,
            r,
            config: ArmConfiguration::default(),
        }
    }

    /// Set the arm configuration and return self for chaining.
    pub fn with_config(mut self, config: ArmConfiguration) -> Self {
        self.config = config;
        self
    }

    /// The rigid transform described by this pose.
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::new(self.x, self.y, self.z),
            wpr_to_quaternion(self.w, self.p, self.r),
        )
    }

    /// Build a pose from a rigid transform, keeping the given arm flags.
    pub fn from_isometry(iso: &Isometry3<f64>, config: ArmConfiguration) -> Self {
        let (w, p, r) = quaternion_to_wpr(&iso.rotation);
        Self {
            x: iso.translation.x,
            y: iso.translation.y,
            z: iso.translation.z,
            w,
            p,
            r,
            config,
        }
    }
}

/// Position and orientation in the operator's frame.
///
/// The only pose representation handed to the UI layer. Angles are degrees
/// in the same W/P/R convention as [`NativePose`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BotPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
    pub p: f64,
    pub r: f64,
}

impl BotPosition {
    pub fn new(x: f64, y: f64, z: f64, w: f64, p: f64, r: f64) -> Self {
        Self { x, y, z, w, p, r }
    }

    /// Decompose a rigid transform into position and W/P/R degrees.
    pub fn from_isometry(iso: &Isometry3<f64>) -> Self {
        let (w, p, r) = quaternion_to_wpr(&iso.rotation);
        Self {
            x: iso.translation.x,
            y: iso.translation.y,
            z: iso.translation.z,
            w,
            p,
            r,
        }
    }

    /// Get translation components.
    pub fn translation(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }
}
