//! Deployment configuration for the series engine.
//!
//! Loaded once at startup from an optional TOML file, with `DEMO_MODE` from
//! the environment forcing relaxed mode. The validated [`EngineConfig`] is
//! immutable and handed to the engine by value.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::composite::CompositeWeights;
use crate::gapfill::GapStrategy;
use crate::interval::IntervalUnit;

/// Alpha substituted for the configured one in relaxed (demo) deployments.
pub const RELAXED_ALPHA: f64 = 0.5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("alpha must be in (0, 1], got {0}")]
    InvalidAlpha(f64),

    #[error("composite weights must be finite, non-negative and not all zero")]
    InvalidWeights,

    #[error("default_max_points {default} must be between 1 and max_points_ceiling {ceiling}")]
    InvalidMaxPoints { default: usize, ceiling: usize },

    #[error("unknown default_interval `{0}`")]
    InvalidInterval(String),

    #[error("unknown gap_strategy `{0}`")]
    InvalidStrategy(String),
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    series: RawSeriesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RawSeriesConfig {
    pub default_interval: String,
    pub default_max_points: usize,
    pub max_points_ceiling: usize,
    pub gap_strategy: String,
    pub alpha: f64,
    pub demo_mode: bool,
    pub weights: RawWeights,
}

impl Default for RawSeriesConfig {
    fn default() -> Self {
        Self {
            default_interval: "day".to_string(),
            default_max_points: 180,
            max_points_ceiling: 1000,
            gap_strategy: "linear".to_string(),
            alpha: 0.3,
            demo_mode: false,
            weights: RawWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RawWeights {
    pub teacher: f64,
    pub mentor: f64,
    pub student: f64,
}

impl Default for RawWeights {
    fn default() -> Self {
        Self {
            teacher: 0.5,
            mentor: 0.3,
            student: 0.2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub default_interval: IntervalUnit,
    pub default_max_points: usize,
    pub max_points_ceiling: usize,
    pub gap_strategy: GapStrategy,
    /// Effective alpha, already swapped for [`RELAXED_ALPHA`] in relaxed mode.
    pub alpha: f64,
    pub relaxed: bool,
    pub weights: CompositeWeights,
}

impl EngineConfig {
    pub fn from_raw(raw: RawSeriesConfig) -> Result<Self, ConfigError> {
        let default_interval = raw
            .default_interval
            .parse::<IntervalUnit>()
            .map_err(|_| ConfigError::InvalidInterval(raw.default_interval.clone()))?;
        let gap_strategy = raw
            .gap_strategy
            .parse::<GapStrategy>()
            .map_err(ConfigError::InvalidStrategy)?;

        if !(raw.alpha > 0.0 && raw.alpha <= 1.0) {
            return Err(ConfigError::InvalidAlpha(raw.alpha));
        }
        if raw.default_max_points == 0 || raw.default_max_points > raw.max_points_ceiling {
            return Err(ConfigError::InvalidMaxPoints {
                default: raw.default_max_points,
                ceiling: raw.max_points_ceiling,
            });
        }
        let weights =
            CompositeWeights::normalize(raw.weights.teacher, raw.weights.mentor, raw.weights.student)
                .ok_or(ConfigError::InvalidWeights)?;

        Ok(Self {
            default_interval,
            default_max_points: raw.default_max_points,
            max_points_ceiling: raw.max_points_ceiling,
            gap_strategy,
            alpha: if raw.demo_mode { RELAXED_ALPHA } else { raw.alpha },
            relaxed: raw.demo_mode,
            weights,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Self::from_raw(file.series)
    }

    /// Reads `path` when given, otherwise starts from defaults. `DEMO_MODE`
    /// in the environment turns relaxed mode on.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut raw = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                toml::from_str::<ConfigFile>(&content)?.series
            }
            None => RawSeriesConfig::default(),
        };

        if std::env::var("DEMO_MODE").is_ok_and(|value| parse_flag(&value)) {
            raw.demo_mode = true;
        }

        Self::from_raw(raw)
    }
}

/// `1`, `true` and `yes` (any case) switch a flag on; anything else is off.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::from_raw(RawSeriesConfig::default()).expect("valid defaults");
        assert_eq!(config.default_interval, IntervalUnit::Day);
        assert_eq!(config.gap_strategy, GapStrategy::Linear);
        assert_eq!(config.alpha, 0.3);
        assert!(!config.relaxed);
    }

    #[test]
    fn parses_toml_and_normalizes_weights() {
        let config = EngineConfig::from_toml_str(
            r#"
            [series]
            default_interval = "week"
            default_max_points = 52
            max_points_ceiling = 104
            gap_strategy = "carry"
            alpha = 0.8

            [series.weights]
            teacher = 2.0
            mentor = 1.0
            student = 1.0
            "#,
        )
        .expect("valid config");

        assert_eq!(config.default_interval, IntervalUnit::Week);
        assert_eq!(config.default_max_points, 52);
        assert_eq!(config.gap_strategy, GapStrategy::Carry);
        assert_eq!(config.weights.teacher, 0.5);
        assert_eq!(config.weights.mentor, 0.25);
        assert_eq!(config.weights.student, 0.25);
    }

    #[test]
    fn relaxed_mode_overrides_alpha() {
        let config = EngineConfig::from_toml_str("[series]\nalpha = 0.1\ndemo_mode = true\n")
            .expect("valid config");
        assert!(config.relaxed);
        assert_eq!(config.alpha, RELAXED_ALPHA);
    }

    #[test]
    fn demo_flag_accepts_truthy_values() {
        for value in ["1", "true", "TRUE", "yes", " Yes "] {
            assert!(parse_flag(value), "{value} should be on");
        }
        for value in ["", "0", "false", "no", "on", "enabled"] {
            assert!(!parse_flag(value), "{value} should be off");
        }
    }

    #[test]
    fn loads_config_file_from_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("series.toml");
        std::fs::write(
            &path,
            "[series]\ndefault_interval = \"week\"\ngap_strategy = \"carry\"\n\n[series.weights]\nteacher = 1.0\nmentor = 1.0\nstudent = 2.0\n",
        )
        .expect("write config");

        let config = EngineConfig::load(Some(&path)).expect("valid config");
        assert_eq!(config.default_interval, IntervalUnit::Week);
        assert_eq!(config.gap_strategy, GapStrategy::Carry);
        assert_eq!(config.weights.student, 0.5);
    }

    #[test]
    fn missing_config_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.toml");

        match EngineConfig::load(Some(&path)) {
            Err(ConfigError::Read { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn zero_weights_fail_at_load() {
        let err = EngineConfig::from_toml_str(
            "[series.weights]\nteacher = 0.0\nmentor = 0.0\nstudent = 0.0\n",
        )
        .expect_err("zero weights");
        assert!(matches!(err, ConfigError::InvalidWeights));
    }

    #[test]
    fn rejects_out_of_range_settings() {
        assert!(matches!(
            EngineConfig::from_toml_str("[series]\nalpha = 0.0\n"),
            Err(ConfigError::InvalidAlpha(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[series]\nalpha = 1.5\n"),
            Err(ConfigError::InvalidAlpha(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[series]\ndefault_max_points = 2000\n"),
            Err(ConfigError::InvalidMaxPoints { .. })
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[series]\ndefault_interval = \"month\"\n"),
            Err(ConfigError::InvalidInterval(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[series]\ngap_strategy = \"spline\"\n"),
            Err(ConfigError::InvalidStrategy(_))
        ));
    }
}
