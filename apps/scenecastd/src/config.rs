//! Daemon configuration.
//!
//! One JSON document; every section and key is optional and merges
//! over compiled-in defaults, so a minimal deployment can ship a config
//! with nothing but the OBS password.

use std::path::{Path, PathBuf};

use scenecast_orchestrator::{SceneConfig, TimingConfig};
use scenecast_scoreboard::StateMachineConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/scenecast/config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObsSection {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

impl Default for ObsSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 4455,
            password: None,
        }
    }
}

impl ObsSection {
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

/// State-machine thresholds, mirrored into [`StateMachineConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSection {
    pub jump_threshold_secs: u32,
    pub common_start_values: Vec<u32>,
    pub pause_samples: u32,
    pub intermission_samples: u32,
}

impl Default for DetectionSection {
    fn default() -> Self {
        let defaults = StateMachineConfig::default();
        Self {
            jump_threshold_secs: defaults.jump_threshold_secs,
            common_start_values: defaults.common_start_values,
            pause_samples: defaults.pause_samples,
            intermission_samples: defaults.intermission_samples,
        }
    }
}

impl From<DetectionSection> for StateMachineConfig {
    fn from(section: DetectionSection) -> Self {
        Self {
            jump_threshold_secs: section.jump_threshold_secs,
            common_start_values: section.common_start_values,
            pause_samples: section.pause_samples,
            intermission_samples: section.intermission_samples,
        }
    }
}

/// One monitored field and the snapshot file its scraper writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSection {
    pub name: String,
    pub snapshot_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub obs: ObsSection,
    pub scenes: SceneConfig,
    pub timings: TimingConfig,
    pub detection: DetectionSection,
    /// Rule document; hot-reloaded while the daemon runs. No rules file
    /// means built-in behavior only.
    pub rules_path: Option<PathBuf>,
    /// Sentinel file operators touch to take manual control.
    pub pause_sentinel: PathBuf,
    pub fields: Vec<FieldSection>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            obs: ObsSection::default(),
            scenes: SceneConfig::default(),
            timings: TimingConfig::default(),
            detection: DetectionSection::default(),
            rules_path: None,
            pause_sentinel: PathBuf::from("/tmp/scenecast-pause"),
            fields: vec![FieldSection {
                name: "field1".into(),
                snapshot_path: PathBuf::from("/tmp/scenecast-field1.json"),
            }],
        }
    }
}

impl Config {
    /// Loads the config file. A missing file is not an error: the
    /// daemon starts with defaults so a fresh install comes up.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_merges_over_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "obs": {"password": "hunter2"},
                "scenes": {"game": "Court 1"},
                "fields": [{"name": "court1", "snapshot_path": "/run/court1.json"}]
            }"#,
        )
        .unwrap();

        assert_eq!(config.obs.url(), "ws://127.0.0.1:4455");
        assert_eq!(config.obs.password.as_deref(), Some("hunter2"));
        assert_eq!(config.scenes.game, "Court 1");
        assert_eq!(config.scenes.breakout, "breakout");
        assert_eq!(config.detection.jump_threshold_secs, 60);
        assert_eq!(config.fields.len(), 1);
        assert_eq!(config.fields[0].name, "court1");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(&tmp.path().join("absent.json")).unwrap();
        assert_eq!(config.fields.len(), 1);
        assert!(config.rules_path.is_none());
    }

    #[test]
    fn malformed_file_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{broken").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }
}
