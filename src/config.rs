// src/config.rs - Extraction thresholds and grading policy
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GradeError, Result};

/// Every fixed cutoff used by the feature extractor. Distances are in the
/// normalized image-relative units of the landmarks. All comparisons are strict
/// (`<`), so a value exactly on a threshold does not trigger the flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Thumb tip to pinky MCP distance below which the thumb is folded.
    pub thumb_fold_distance: f64,
    /// Fingertip-pair distance below which two fingers touch.
    pub fingertip_contact: f64,
    /// Unit-vector component magnitude that classifies an axis direction.
    pub orientation_axis: f64,
    /// Wrist to chin distance below which the hand is at the chin/face.
    pub chin_proximity: f64,
    /// Vertical gap to the shoulder line below which the hand is at the chest.
    pub chest_band: f64,
    pub hand_distance_close: f64,
    pub finger_tips_facing: f64,
    pub single_shape_distance: f64,
    /// Per-axis 2D gap between index and middle tips that counts as crossed.
    pub crossing_gap: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            thumb_fold_distance: 0.15,
            fingertip_contact: 0.04,
            orientation_axis: 0.6,
            chin_proximity: 0.15,
            chest_band: 0.15,
            hand_distance_close: 0.15,
            finger_tips_facing: 0.08,
            single_shape_distance: 0.25,
            crossing_gap: 0.02,
        }
    }
}

/// When an attempt counts as correct. The default is strict: every flag must
/// match (`score == 1.0`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassPolicy {
    pub pass_threshold: f64,
}

impl Default for PassPolicy {
    fn default() -> Self {
        Self { pass_threshold: 1.0 }
    }
}

impl PassPolicy {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn with_threshold(pass_threshold: f64) -> Self {
        Self { pass_threshold }
    }

    pub fn passes(&self, score: f64) -> bool {
        score >= self.pass_threshold
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
    pub thresholds: Thresholds,
    pub policy: PassPolicy,
}

impl GradingConfig {
    const FILE_NAME: &'static str = "config.json";

    /// `<platform config dir>/sign-grader/config.json`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "sign-grader")
            .map(|dirs| dirs.config_dir().join(Self::FILE_NAME))
    }

    /// Loads the explicit path, else the platform default, else built-in
    /// defaults. A missing file is not an error; a malformed one is.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => {
                debug!("No configuration directory available, using defaults");
                return Ok(Self::default());
            }
        };

        if !path.exists() {
            if explicit.is_some() {
                return Err(GradeError::Io {
                    path,
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            debug!("Configuration file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let config = Self::load_file(&path)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| GradeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GradingConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let io_err = |source| GradeError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(io_err)
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        let distances = [
            ("thumb_fold_distance", t.thumb_fold_distance),
            ("fingertip_contact", t.fingertip_contact),
            ("chin_proximity", t.chin_proximity),
            ("chest_band", t.chest_band),
            ("hand_distance_close", t.hand_distance_close),
            ("finger_tips_facing", t.finger_tips_facing),
            ("single_shape_distance", t.single_shape_distance),
            ("crossing_gap", t.crossing_gap),
        ];
        for (name, value) in distances {
            if !value.is_finite() || value <= 0.0 {
                return Err(GradeError::InvalidConfig(format!(
                    "{} must be a positive distance, got {}",
                    name, value
                )));
            }
        }

        if !(t.orientation_axis > 0.0 && t.orientation_axis <= 1.0) {
            return Err(GradeError::InvalidConfig(format!(
                "orientation_axis must be in (0, 1], got {}",
                t.orientation_axis
            )));
        }

        let pass = self.policy.pass_threshold;
        if !(0.0..=1.0).contains(&pass) {
            return Err(GradeError::InvalidConfig(format!(
                "pass_threshold must be in [0, 1], got {}",
                pass
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("sign_grader_{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_defaults_are_valid_and_strict() {
        let config = GradingConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.policy.passes(1.0));
        assert!(!config.policy.passes(0.999));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config: GradingConfig =
            serde_json::from_str(r#"{"thresholds": {"fingertip_contact": 0.05}}"#).unwrap();
        assert_eq!(config.thresholds.fingertip_contact, 0.05);
        assert_eq!(config.thresholds.thumb_fold_distance, 0.15);
        assert_eq!(config.policy.pass_threshold, 1.0);
    }

    #[test]
    fn test_tolerance_band_policy() {
        let policy = PassPolicy::with_threshold(0.9);
        assert!(policy.passes(0.9));
        assert!(!policy.passes(0.899));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GradingConfig::default();
        config.thresholds.crossing_gap = 0.0;
        assert!(matches!(config.validate(), Err(GradeError::InvalidConfig(_))));

        let mut config = GradingConfig::default();
        config.thresholds.orientation_axis = 1.5;
        assert!(config.validate().is_err());

        let mut config = GradingConfig::default();
        config.policy.pass_threshold = 1.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_then_load_file() {
        let dir = scratch_dir();
        let path = dir.join("config.json");
        let mut config = GradingConfig::default();
        config.policy = PassPolicy::with_threshold(0.95);
        config.save(&path).unwrap();

        let loaded = GradingConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let path = scratch_dir().join("missing.json");
        assert!(matches!(GradingConfig::load(Some(&path)), Err(GradeError::Io { .. })));
    }

    #[test]
    fn test_malformed_file_is_not_replaced_by_defaults() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(GradingConfig::load_file(&path), Err(GradeError::Schema(_))));
        let _ = fs::remove_dir_all(dir);
    }
}
