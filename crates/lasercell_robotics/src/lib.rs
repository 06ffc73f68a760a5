//! Coordinate types and conversion utilities for the laser cell.
//!
//! Poses are handled as nalgebra `Isometry3<f64>` (SE3) internally and only
//! turned into Euler angles at the edges:
//! - **Operator side**: [`BotPosition`] in the calibrated user frame
//! - **Controller side**: [`NativePose`], XYZ + W/P/R + arm configuration flags
//! - **Frame pair**: [`FrameTransforms`] holding world→user and user→world
//!
//! [`point_pairs`] fits the part→robot transform used for one-shot shape
//! calibration.
//!
//! # Example
//!
//! ```rust
//! use lasercell_robotics::{to_native_pose, to_operator_position, FrameTransforms};
//! use nalgebra::{Isometry3, Vector3};
//!
//! let frames = FrameTransforms::from_world_to_user(Isometry3::translation(0.0, 0.0, -500.0));
//! let native = to_native_pose(
//!     &Vector3::new(100.0, 200.0, 300.0),
//!     &Vector3::z(),
//!     &Vector3::zeros(),
//!     frames.user_to_world(),
//! )
//! .unwrap();
//! let back = to_operator_position(&native, frames.world_to_user());
//! assert!((back.z - 300.0).abs() < 1e-9);
//! ```

#![deny(trivial_casts, trivial_numeric_casts, unused_import_braces)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]

pub mod conversion;
pub mod frame;
pub mod point_pairs;
pub mod pose;
pub mod transform;

pub use conversion::{quaternion_to_wpr, wpr_to_quaternion};
pub use frame::{isometry_from_values, FrameTransforms, FRAME_VALUE_COUNT};
pub use point_pairs::{
    fit_rigid_transform, KabschSolver, PointPair, PointPairError, PointPairSolver, MIN_POINT_PAIRS,
};
pub use pose::{ArmConfiguration, BotPosition, NativePose};
pub use transform::{to_native_pose, to_operator_position, work_orientation, TransformError};
