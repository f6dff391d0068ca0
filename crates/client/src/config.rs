use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Client settings. Every field has a default; a YAML file may set any subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub username: String,
    /// Directory that sprite and background references resolve against.
    pub asset_root: PathBuf,
    /// Full-world background image reference. No minimap without it.
    pub background: Option<String>,
    pub world_width: f32,
    pub world_height: f32,
    pub surface_width: f32,
    pub surface_height: f32,
    /// Render tick period.
    pub tick_ms: u64,
    /// Constant delay between reconnect attempts.
    pub retry_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:8080".to_owned(),
            username: "guest".to_owned(),
            asset_root: PathBuf::from("."),
            background: None,
            world_width: 2048.0,
            world_height: 2048.0,
            surface_width: 800.0,
            surface_height: 600.0,
            tick_ms: 16,
            retry_delay_ms: 2000,
        }
    }
}

impl ClientConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::Invalid("username must not be empty".into()));
        }
        let dims = [
            ("world_width", self.world_width),
            ("world_height", self.world_height),
            ("surface_width", self.surface_width),
            ("surface_height", self.surface_height),
        ];
        for (name, value) in dims {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid("tick_ms must be at least 1".into()));
        }
        Ok(())
    }

    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.world_width, self.world_height)
    }

    pub fn surface_size(&self) -> Vec2 {
        Vec2::new(self.surface_width, self.surface_height)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
