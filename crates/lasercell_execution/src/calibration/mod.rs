//! Camera calibration sub-state-machine.
//!
//! A calibration cycle runs while the robot sits on a point that asked for
//! it: the old result file is removed, a snapshot is requested once the
//! camera has settled, and the result file is then polled at a fixed
//! interval. The runner owns the timers; this module only tracks attempts
//! and interprets what the file says.

mod artifact;

use std::time::Duration;

use nalgebra::Vector3;
use tracing::{info, warn};

pub use artifact::{ArtifactError, CalibrationArtifact, CorrectionResult};

/// Extra wait after the snapshot request before the first poll.
pub const CALIBRATION_GRACE: Duration = Duration::from_secs(1);

/// Interval between polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Polls after the first one before giving up.
pub const MAX_RETRIES: u32 = 3;

/// Outcome of one poll of the result file.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationPoll {
    /// Not there yet; poll again after [`POLL_INTERVAL`]
    Pending,
    /// Never appeared; the operator decides
    Exhausted,
    /// Appeared but unusable; the operator decides
    Rejected(String),
    /// Usable correction in the operator frame
    Correction(Vector3<f64>),
}

/// Attempt counter and result file for the active cycle.
#[derive(Debug, Clone)]
pub struct CalibrationWorkflow {
    artifact: CalibrationArtifact,
    retries: u32,
}

impl CalibrationWorkflow {
    pub fn new(artifact: CalibrationArtifact) -> Self {
        Self { artifact, retries: 0 }
    }

    pub fn artifact(&self) -> &CalibrationArtifact {
        &self.artifact
    }

    /// Start a cycle: reset the counter and drop any stale result.
    pub fn begin(&mut self) {
        self.retries = 0;
        if let Err(e) = self.artifact.clear() {
            warn!("Could not remove stale calibration result {:?}: {}", self.artifact.path(), e);
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn poll(&mut self) -> CalibrationPoll {
        match self.artifact.read() {
            Ok(None) => {
                info!("Waiting for calibration result; attempt {}", self.retries);
                if self.retries < MAX_RETRIES {
                    self.retries += 1;
                    CalibrationPoll::Pending
                } else {
                    warn!("No calibration result after {} retries", MAX_RETRIES);
                    self.retries = 0;
                    CalibrationPoll::Exhausted
                }
            }
            Ok(Some(result)) if result.is_success() => {
                info!("Calibration result found: {:?}", result.delta);
                CalibrationPoll::Correction(result.delta)
            }
            Ok(Some(result)) => {
                warn!("Calibration reported status {}", result.status);
                CalibrationPoll::Rejected(format!("status {}", result.status))
            }
            Err(e) => {
                warn!("Unusable calibration result: {}", e);
                CalibrationPoll::Rejected(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn workflow() -> (tempfile::TempDir, CalibrationWorkflow) {
        let dir = tempfile::tempdir().unwrap();
        let artifact = CalibrationArtifact::new(dir.path().join("calib_result.txt"));
        (dir, CalibrationWorkflow::new(artifact))
    }

    #[test]
    fn test_exhausts_after_first_check_and_retries() {
        let (_dir, mut calib) = workflow();
        calib.begin();

        for _ in 0..MAX_RETRIES {
            assert_eq!(calib.poll(), CalibrationPoll::Pending);
        }
        assert_eq!(calib.poll(), CalibrationPoll::Exhausted);
        assert_eq!(calib.retries(), 0);
    }

    #[test]
    fn test_begin_removes_stale_result() {
        let (_dir, mut calib) = workflow();
        fs::write(calib.artifact().path(), "9;9;9;0").unwrap();

        calib.begin();

        assert_eq!(calib.poll(), CalibrationPoll::Pending);
    }

    #[test]
    fn test_correction_and_rejection() {
        let (_dir, mut calib) = workflow();
        calib.begin();

        fs::write(calib.artifact().path(), "1;0;-2;0").unwrap();
        assert_eq!(calib.poll(), CalibrationPoll::Correction(Vector3::new(1.0, 0.0, -2.0)));

        fs::write(calib.artifact().path(), "1;0;-2;1").unwrap();
        assert!(matches!(calib.poll(), CalibrationPoll::Rejected(_)));

        fs::write(calib.artifact().path(), "garbage").unwrap();
        assert!(matches!(calib.poll(), CalibrationPoll::Rejected(_)));
    }
}
