use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::layout::Breakpoints;
use crate::spring::{SettleTolerance, SpringParams};

/// Larger buffers make the culled cell count explode quadratically.
const MAX_BUFFER_FACTOR: f32 = 4.0;

/// Tunables for the canvas engine. Defaults match the shipped product grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub breakpoints: Breakpoints,
    /// Extra margin around the viewport, as a fraction of its size, that still gets tiles.
    pub buffer_factor: f32,
    /// Distance normalization constant for the center falloff.
    pub falloff: f32,
    pub snap_spring: SpringParams,
    /// Release velocity is scaled by this before seeding the snap springs.
    pub release_velocity_scale: f32,
    pub settle_displacement: f32,
    pub settle_velocity: f32,
    /// Upper bound on a snap; both axes are forced onto target after this.
    pub max_snap_duration_secs: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            breakpoints: Breakpoints::default(),
            buffer_factor: 0.8,
            falloff: 0.8,
            snap_spring: SpringParams::default(),
            release_velocity_scale: 0.1,
            settle_displacement: 0.5,
            settle_velocity: 5.0,
            max_snap_duration_secs: 3.0,
        }
    }
}

impl EngineConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.buffer_factor >= 0.0 && self.buffer_factor <= MAX_BUFFER_FACTOR) {
            return Err(ConfigError::Invalid(format!(
                "buffer_factor must be in [0, {}], got {}",
                MAX_BUFFER_FACTOR, self.buffer_factor
            )));
        }
        if !(self.falloff > 0.0) {
            return Err(ConfigError::Invalid(format!("falloff must be > 0, got {}", self.falloff)));
        }
        let spring = &self.snap_spring;
        if !(spring.stiffness > 0.0 && spring.mass > 0.0 && spring.damping >= 0.0) {
            return Err(ConfigError::Invalid(format!("invalid snap spring {:?}", spring)));
        }
        if !(self.max_snap_duration_secs > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_snap_duration_secs must be > 0, got {}",
                self.max_snap_duration_secs
            )));
        }
        if !(self.breakpoints.aspect_ratio > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "aspect_ratio must be > 0, got {}",
                self.breakpoints.aspect_ratio
            )));
        }
        Ok(())
    }

    pub fn settle_tolerance(&self) -> SettleTolerance {
        SettleTolerance {
            displacement: self.settle_displacement,
            velocity: self.settle_velocity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"buffer_factor": 0.25, "snap_spring": {"stiffness": 200.0, "damping": 30.0, "mass": 1.0}}"#)
            .unwrap();

        let config = EngineConfig::from_path(file.path()).unwrap();
        assert_eq!(config.buffer_factor, 0.25);
        assert_eq!(config.snap_spring.stiffness, 200.0);
        assert_eq!(config.falloff, 0.8);
        assert_eq!(config.breakpoints, Breakpoints::default());
    }

    #[test]
    fn test_negative_buffer_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"buffer_factor": -1.0}"#).unwrap();
        assert!(matches!(EngineConfig::from_path(file.path()), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_oversized_buffer_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"buffer_factor": 10000.0}"#).unwrap();
        assert!(matches!(EngineConfig::from_path(file.path()), Err(ConfigError::Invalid(_))));

        let edge = EngineConfig {
            buffer_factor: 4.0,
            ..EngineConfig::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_missing_file() {
        let result = EngineConfig::from_path(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
