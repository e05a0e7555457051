use crate::models::model_asset::{ModelAsset, ModelComplexity};
use crate::platform;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name of the method channel the host talks to
    pub channel_name: String,
    /// Which published pose landmarker to use
    pub model_complexity: ModelComplexity,
    /// Overrides the download URL of the selected model
    pub model_url: Option<String>,
    /// Where the model file is cached
    pub model_dir: PathBuf,
    /// Whole-request timeout for the model download
    pub download_timeout_secs: u64,
    /// Requests executed concurrently by the worker pool
    pub max_concurrent_requests: usize,
    /// Requests buffered before callers wait to enqueue
    pub request_queue_size: usize,
    /// Used when `initialize` omits minDetectionConfidence (0.0-1.0)
    pub default_min_detection_confidence: f32,
    /// Used when `initialize` omits minTrackingConfidence (0.0-1.0)
    pub default_min_tracking_confidence: f32,
    /// One of error, warn, info, debug, trace
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            channel_name: "mediapipe_pose_channel".to_string(),
            model_complexity: ModelComplexity::Full,
            model_url: None,
            model_dir: platform::data_directory().join("models"),
            download_timeout_secs: 300,
            max_concurrent_requests: 4,
            request_queue_size: 32,
            default_min_detection_confidence: 0.5,
            default_min_tracking_confidence: 0.5,
            log_level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from the default location, creating it with defaults if it doesn't exist
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::get_config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Load and validate configuration from a specific file
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: BridgeConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, value) in [
            ("default_min_detection_confidence", self.default_min_detection_confidence),
            ("default_min_tracking_confidence", self.default_min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "Invalid {}: {}. Must be between 0.0 and 1.0",
                    name, value
                )));
            }
        }

        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_requests must be at least 1".to_string(),
            ));
        }

        if self.request_queue_size == 0 {
            return Err(ConfigError::Invalid(
                "request_queue_size must be at least 1".to_string(),
            ));
        }

        if self.download_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "download_timeout_secs must be at least 1".to_string(),
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if let Some(url) = &self.model_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "Invalid model URL: {}. Must be http or https",
                    url
                )));
            }
        }

        Ok(())
    }

    /// The model asset this configuration points at
    pub fn model_asset(&self) -> ModelAsset {
        let mut asset = ModelAsset::pose_landmarker(self.model_complexity);
        if let Some(url) = &self.model_url {
            asset.url = url.clone();
        }
        asset
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    /// Get the configuration file path
    fn get_config_path() -> PathBuf {
        platform::data_directory().join("config.json")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
