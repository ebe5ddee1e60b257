use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    profile::DEFAULT_TOLERANCE, JointAngleName, NatyaError, PoseProfile, PoseType, Result,
};

/// Top-level configuration structure for the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scoring: ScoringConfig,
    pub level: LevelConfig,
    pub feedback: FeedbackConfig,
    /// Target angles overriding the built-in stances.
    pub references: BTreeMap<PoseType, BTreeMap<JointAngleName, f32>>,
}

impl AppConfig {
    /// Reads a JSON config file. Missing sections fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let tolerance = self.scoring.default_tolerance;
        if tolerance.is_nan() || tolerance <= 0.0 {
            return Err(NatyaError::InvalidInput("tolerance must be positive"));
        }
        if self.level.window == 0 {
            return Err(NatyaError::InvalidInput("level window must hold at least one sample"));
        }
        if self.level.min_samples > self.level.window {
            return Err(NatyaError::InvalidInput(
                "level min_samples cannot exceed the window",
            ));
        }
        Ok(())
    }

    /// Complete profiles for every configured reference override.
    pub fn reference_profiles(&self) -> Result<Vec<PoseProfile>> {
        self.references
            .iter()
            .map(|(&pose, targets)| {
                PoseProfile::from_targets(pose, targets, self.scoring.default_tolerance)
            })
            .collect()
    }
}

/// Thresholds used when comparing a frame to its reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Allowed deviation per joint, in degrees.
    pub default_tolerance: f32,
    /// Overall accuracy above which the pose counts as recognised.
    pub identify_threshold: f32,
    pub perfect_threshold: f32,
    pub very_good_threshold: f32,
    /// Number of corrections shown on screen.
    pub primary_suggestions: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_tolerance: DEFAULT_TOLERANCE,
            identify_threshold: 85.0,
            perfect_threshold: 95.0,
            very_good_threshold: 90.0,
            primary_suggestions: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub window: usize,
    pub min_samples: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            window: 10,
            min_samples: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Scored frames to wait after speaking a correction.
    pub cooldown_frames: u32,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            cooldown_frames: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("natya-pose-{}-{name}", std::process::id()))
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "feedback": { "cooldown_frames": 10 } }"#).unwrap();

        assert_eq!(config.feedback.cooldown_frames, 10);
        assert_eq!(config.scoring, ScoringConfig::default());
        assert_eq!(config.level.window, 10);
        assert!(config.references.is_empty());
    }

    #[test]
    fn save_and_load_preserve_references() {
        let mut config = AppConfig::default();
        config.references.insert(
            PoseType::Samapadam,
            JointAngleName::ALL.iter().map(|&joint| (joint, 170.0)).collect(),
        );

        let path = temp_path("roundtrip.json");
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
        let profiles = loaded.reference_profiles().unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].target(JointAngleName::Back), 170.0);
    }

    #[test]
    fn incomplete_reference_fails() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "references": { "Araimandi": { "left_knee": 100.0, "back": 140.0 } } }"#,
        )
        .unwrap();

        let err = config.reference_profiles().unwrap_err();
        assert!(matches!(
            err,
            NatyaError::MissingReferenceAngle {
                pose: PoseType::Araimandi,
                joint: JointAngleName::RightKnee,
            }
        ));
    }

    #[test]
    fn rejects_non_positive_tolerance() {
        let mut config = AppConfig::default();
        config.scoring.default_tolerance = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AppConfig::load(temp_path("absent.json")).unwrap_err();
        assert!(matches!(err, NatyaError::Io(_)));
    }
}
