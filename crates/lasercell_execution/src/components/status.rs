//! Result codes and derived states reported to the observer.

use serde::{Deserialize, Serialize};

/// Outcome of a whole task run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkResult {
    Ok,
    Error,
}

impl WorkResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, WorkResult::Ok)
    }
}

/// Outcome of `prepare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrepareResult {
    Ok,
    Error,
}

/// Outcome of a one-shot shape calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibResult {
    Ok,
    Failed,
}

/// Shapes the observer keeps calibrated transforms for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeType {
    /// The workpiece
    Part,
    /// The laser head mounted on the flange
    LaserHead,
    /// The gripper
    Grip,
}

/// Device state derived from the two link-health booleans.
///
/// `Degraded` (exactly one link up) is only used for diagnostics; observers
/// are notified with [`DeviceState::external`], which folds it into
/// `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceState {
    #[default]
    Disconnected,
    Degraded,
    Ready,
}

impl DeviceState {
    /// Detailed state from the telemetry and command link flags.
    pub fn derive(telemetry: bool, command: bool) -> Self {
        match (telemetry, command) {
            (true, true) => DeviceState::Ready,
            (false, false) => DeviceState::Disconnected,
            _ => DeviceState::Degraded,
        }
    }

    /// State as reported to observers: Ready or Disconnected.
    pub fn external(self) -> Self {
        match self {
            DeviceState::Ready => DeviceState::Ready,
            DeviceState::Degraded | DeviceState::Disconnected => DeviceState::Disconnected,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, DeviceState::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_and_external() {
        assert_eq!(DeviceState::derive(true, true), DeviceState::Ready);
        assert_eq!(DeviceState::derive(true, false), DeviceState::Degraded);
        assert_eq!(DeviceState::derive(false, true), DeviceState::Degraded);
        assert_eq!(DeviceState::derive(false, false), DeviceState::Disconnected);
        assert_eq!(DeviceState::Degraded.external(), DeviceState::Disconnected);
        assert_eq!(DeviceState::Ready.external(), DeviceState::Ready);
    }
}
