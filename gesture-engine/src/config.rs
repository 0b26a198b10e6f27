//! Engine configuration, loaded from JSON.
//!
//! Every section falls back to its defaults, so a partial file (or `{}`)
//! is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::recognition::classifier::ClassifierConfig;
use crate::recognition::recorder::RecorderConfig;
use crate::recognition::router::RouterConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub classifier: ClassifierConfig,
    pub router: RouterConfig,
    pub recorder: RecorderConfig,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.recorder.target_samples, 6);
        assert_eq!(config.router.landmark_history, 30);
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "router": { "multiplier": { "hold_duration_s": 1.0 } },
            "recorder": { "countdown_s": 5 }
        }"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.router.multiplier.hold_duration_s, 1.0);
        assert_eq!(config.router.multiplier.max_product, 25);
        assert_eq!(config.recorder.countdown_s, 5);
        assert_eq!(config.recorder.static_capture_s, 2.0);
        assert_eq!(config.classifier, ClassifierConfig::default());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            EngineConfig::from_json_str("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EngineConfig::load(Path::new("/nonexistent/engine.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
