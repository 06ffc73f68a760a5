//! LasercellConfig - session constants loaded with figment.
//!
//! Values come from a TOML file merged with `LASERCELL_`-prefixed environment
//! variables, environment last:
//!
//! ```toml
//! world2user = [1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0]
//! user2world = [1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0]
//! flip = false
//! up = true
//! top = true
//! cam_delay_ms = 3000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use lasercell_robotics::{ArmConfiguration, FrameTransforms};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::orchestrator::RunnerSettings;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration load error: {0}")]
    Load(#[from] figment::Error),
    #[error("Configuration validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LasercellConfig {
    /// Row-major 3x4 world to user transform
    #[serde(default)]
    pub world2user: Option<Vec<f64>>,

    /// Row-major 3x4 user to world transform
    #[serde(default)]
    pub user2world: Option<Vec<f64>>,

    #[serde(default)]
    pub flip: bool,

    #[serde(default = "default_true")]
    pub up: bool,

    #[serde(default = "default_true")]
    pub top: bool,

    /// Camera settle time before the snapshot, in milliseconds
    #[serde(default = "default_cam_delay_ms")]
    pub cam_delay_ms: u64,

    #[serde(default = "default_calib_result_path")]
    pub calib_result_path: PathBuf,

    #[serde(default = "default_snapshot_name")]
    pub snapshot_name: String,
}

fn default_true() -> bool {
    true
}

fn default_cam_delay_ms() -> u64 {
    3000
}

fn default_calib_result_path() -> PathBuf {
    PathBuf::from("calib_result.txt")
}

fn default_snapshot_name() -> String {
    "snapshot.bmp".to_string()
}

impl Default for LasercellConfig {
    fn default() -> Self {
        Self {
            world2user: None,
            user2world: None,
            flip: false,
            up: default_true(),
            top: default_true(),
            cam_delay_ms: default_cam_delay_ms(),
            calib_result_path: default_calib_result_path(),
            snapshot_name: default_snapshot_name(),
        }
    }
}

impl LasercellConfig {
    /// Load from `path` (missing file means defaults) and the environment.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Self::default()))
                .merge(Toml::file(path.as_ref()))
                .merge(Env::prefixed("LASERCELL_")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot_name.trim().is_empty() {
            return Err(ConfigError::Validation("snapshot_name must not be empty".into()));
        }
        if self.calib_result_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation("calib_result_path must not be empty".into()));
        }
        Ok(())
    }

    /// Frame pair. A missing or malformed transform falls back to identity for both.
    pub fn frames(&self) -> FrameTransforms {
        if self.world2user.is_none() || self.user2world.is_none() {
            warn!("Frame transforms not configured, using identity");
        }
        let world_to_user = self.world2user.as_deref();
        let user_to_world = self.user2world.as_deref();
        FrameTransforms::from_optional_values(world_to_user, user_to_world)
            .unwrap_or_else(|e| {
                warn!("Invalid frame transforms ({}), using identity", e);
                FrameTransforms::identity()
            })
    }

    pub fn arm_configuration(&self) -> ArmConfiguration {
        ArmConfiguration {
            flip: self.flip,
            up: self.up,
            top: self.top,
        }
    }

    pub fn camera_delay(&self) -> Duration {
        Duration::from_millis(self.cam_delay_ms)
    }

    pub fn runner_settings(&self) -> RunnerSettings {
        RunnerSettings {
            frames: self.frames(),
            arm: self.arm_configuration(),
            camera_delay: self.camera_delay(),
            snapshot_name: self.snapshot_name.clone(),
            calibration_result: self.calib_result_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    const TOLERANCE: f64 = 1e-9;

    fn parse(toml: &str) -> Result<LasercellConfig, ConfigError> {
        let figment = Figment::from(Serialized::defaults(LasercellConfig::default()))
            .merge(Toml::string(toml));
        LasercellConfig::from_figment(figment)
    }

    #[test]
    fn test_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, LasercellConfig::default());
        assert_eq!(config.arm_configuration(), ArmConfiguration::default());
        assert_eq!(config.camera_delay(), Duration::from_secs(3));
        assert!(config.frames().inverse_mismatch() < TOLERANCE);
    }

    #[test]
    fn test_translation_frames() {
        let config = parse(
            r#"
            world2user = [1, 0, 0, -10, 0, 1, 0, 0, 0, 0, 1, 0]
            user2world = [1, 0, 0, 10, 0, 1, 0, 0, 0, 0, 1, 0]
            flip = true
            cam_delay_ms = 500
            "#,
        )
        .unwrap();

        let frames = config.frames();
        let p = frames.user_to_world() * nalgebra::Point3::origin();
        assert!((p.coords - Vector3::new(10.0, 0.0, 0.0)).norm() < TOLERANCE);
        assert!(config.flip);
        assert_eq!(config.camera_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_short_transform_falls_back_to_identity() {
        let config = parse(
            r#"
            world2user = [1, 0, 0]
            user2world = [1, 0, 0, 10, 0, 1, 0, 0, 0, 0, 1, 0]
            "#,
        )
        .unwrap();

        let frames = config.frames();
        let p = frames.user_to_world() * nalgebra::Point3::origin();
        assert!(p.coords.norm() < TOLERANCE);
    }

    #[test]
    fn test_empty_snapshot_name_rejected() {
        let result = parse(r#"snapshot_name = " ""#);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = LasercellConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.snapshot_name, "snapshot.bmp");
    }
}
