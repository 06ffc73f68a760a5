//! The correction file dropped by the camera pipeline.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use nalgebra::Vector3;
use thiserror::Error;

/// Fields in a result line: `dx;dy;dz;status`.
const FIELD_COUNT: usize = 4;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to access calibration result: {0}")]
    Io(#[from] io::Error),

    #[error("calibration result is empty")]
    Empty,

    #[error("expected 4 fields in calibration result, found {0}")]
    FieldCount(usize),

    #[error("invalid value {value:?} in field {field}")]
    InvalidNumber { field: usize, value: String },
}

/// One parsed result line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionResult {
    pub delta: Vector3<f64>,
    /// 0 means the camera found the feature
    pub status: i32,
}

impl CorrectionResult {
    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

impl FromStr for CorrectionResult {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.lines().next().map(str::trim).unwrap_or_default();
        if line.is_empty() {
            return Err(ArtifactError::Empty);
        }

        let fields: Vec<&str> = line.split(';').map(str::trim).collect();
        if fields.len() != FIELD_COUNT {
            return Err(ArtifactError::FieldCount(fields.len()));
        }

        let number = |field: usize| -> Result<f64, ArtifactError> {
            fields[field]
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ArtifactError::InvalidNumber {
                    field,
                    value: fields[field].to_string(),
                })
        };

        let status = fields[3].parse::<i32>().map_err(|_| ArtifactError::InvalidNumber {
            field: 3,
            value: fields[3].to_string(),
        })?;

        Ok(Self {
            delta: Vector3::new(number(0)?, number(1)?, number(2)?),
            status,
        })
    }
}

/// Location of the result file. Its presence is the completion signal.
#[derive(Debug, Clone)]
pub struct CalibrationArtifact {
    path: PathBuf,
}

impl CalibrationArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove a leftover result from a previous cycle.
    pub fn clear(&self) -> Result<(), ArtifactError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// `Ok(None)` while the file has not appeared yet.
    pub fn read(&self) -> Result<Option<CorrectionResult>, ArtifactError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => content.parse().map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
