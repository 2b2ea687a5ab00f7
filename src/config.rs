use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Tunables for rendering and polling. Every field has a default, so a config
/// file only needs to list what it overrides.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub canvas: CanvasConfig,
    pub handles: HandleConfig,
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    pub min_width: f64,
    pub base_min_height: f64,
    pub border_radius: f64,
    /// Minimum vertical distance between two handles on the same side.
    pub handle_spacing: f64,
    /// Space kept free above the first and below the last handle.
    pub padding: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_width: 160.0,
            base_min_height: 80.0,
            border_radius: 8.0,
            handle_spacing: 30.0,
            padding: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HandleConfig {
    pub max_supported_inputs: usize,
    pub max_supported_outputs: usize,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            max_supported_inputs: 32,
            max_supported_outputs: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PollingConfig {
    pub default_interval_ms: u64,
    pub min_interval_ms: u64,
    /// A fetch is abandoned after this many intervals.
    pub timeout_factor: u32,
    /// Consecutive failures before the loop slows down.
    pub failure_threshold: u32,
    pub max_backoff_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            default_interval_ms: 1000,
            min_interval_ms: 250,
            timeout_factor: 5,
            failure_threshold: 3,
            max_backoff_ms: 30_000,
        }
    }
}

impl PollingConfig {
    /// The effective poll interval for a requested value, clamped to the minimum.
    pub fn interval(&self, requested_ms: Option<u64>) -> Duration {
        let ms = requested_ms
            .unwrap_or(self.default_interval_ms)
            .max(self.min_interval_ms);
        Duration::from_millis(ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

impl EngineConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::JsonParseError(e.to_string()))
    }

    /// Loads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }
}
