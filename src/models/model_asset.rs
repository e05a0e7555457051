// Data models for the cached pose landmarker model

use serde::{Deserialize, Serialize};

const POSE_LANDMARKER_BASE_URL: &str =
    "https://storage.googleapis.com/mediapipe-models/pose_landmarker";

/// Published pose landmarker variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelComplexity {
    Lite,  // Fastest, less accurate
    #[default]
    Full,  // Balanced
    Heavy, // Slowest, most accurate
}

impl ModelComplexity {
    pub fn to_string(&self) -> &'static str {
        match self {
            ModelComplexity::Lite => "lite",
            ModelComplexity::Full => "full",
            ModelComplexity::Heavy => "heavy",
        }
    }
}

/// A model file identified by its cache file name and download URL.
/// Once present and non-empty on disk it is trusted indefinitely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAsset {
    pub file_name: String,
    pub url: String,
}

impl ModelAsset {
    pub fn new(file_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            url: url.into(),
        }
    }

    /// float16 pose landmarker task bundle for the given variant
    pub fn pose_landmarker(complexity: ModelComplexity) -> Self {
        let variant = format!("pose_landmarker_{}", complexity.to_string());
        Self {
            file_name: format!("{}.task", variant),
            url: format!(
                "{}/{}/float16/1/{}.task",
                POSE_LANDMARKER_BASE_URL, variant, variant
            ),
        }
    }
}

/// Error types for model download and caching
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model download failed: {0}")]
    NetworkFailure(String),

    #[error("Model cache I/O failed: {0}")]
    IoFailure(#[from] std::io::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;
