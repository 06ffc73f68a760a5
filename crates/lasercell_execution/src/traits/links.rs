//! StateLink and RelayLink - the two connections to the robot controller.

use lasercell_robotics::NativePose;

use super::DeviceError;

/// Telemetry link. Streams the robot's current pose.
///
/// Pose updates and connection changes are delivered to the socket as
/// [`LinkEvent`](crate::socket::LinkEvent)s; the socket only asks the link
/// whether it believes it is up.
pub trait StateLink: Send {
    fn connected(&self) -> bool;
}

/// Command link. Accepts motion targets and acknowledges when each has
/// been enqueued by the controller.
///
/// Acknowledgements arrive asynchronously as `PointEnqueued` /
/// `PointEnqueueFailed` events; `move_point` returning `Err` means the
/// request never left.
pub trait RelayLink: Send {
    fn connected(&self) -> bool;

    /// Issue a motion to `pose`.
    fn move_point(&mut self, pose: &NativePose) -> Result<(), DeviceError>;

    /// Abort the current motion, if any.
    fn stop(&mut self);

    /// Drop the connection.
    fn disconnect(&mut self);
}
