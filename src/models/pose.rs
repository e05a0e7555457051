// Data models for pose landmark detection

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of landmarks the pose landmarker reports per subject
pub const POSE_LANDMARK_COUNT: usize = 33;

// ==============================================================================
// Engine Configuration
// ==============================================================================

/// How the engine treats consecutive frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunningMode {
    /// Every frame is an independent still image
    Image,
}

/// Settings the engine is constructed with. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub min_detection_confidence: f32, // [0, 1], default 0.5
    pub min_tracking_confidence: f32,  // [0, 1], default 0.5
    pub max_poses: u32,                // Always 1
    pub running_mode: RunningMode,
}

impl EngineConfig {
    pub const DEFAULT_CONFIDENCE: f32 = 0.5;

    /// Build a single-subject, single-image configuration
    pub fn new(min_detection_confidence: f32, min_tracking_confidence: f32) -> SessionResult<Self> {
        check_confidence("minDetectionConfidence", min_detection_confidence)?;
        check_confidence("minTrackingConfidence", min_tracking_confidence)?;

        Ok(Self {
            min_detection_confidence,
            min_tracking_confidence,
            max_poses: 1,
            running_mode: RunningMode::Image,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_detection_confidence: Self::DEFAULT_CONFIDENCE,
            min_tracking_confidence: Self::DEFAULT_CONFIDENCE,
            max_poses: 1,
            running_mode: RunningMode::Image,
        }
    }
}

fn check_confidence(name: &str, value: f32) -> SessionResult<()> {
    // NaN fails the range check as well
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SessionError::InvalidConfig(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

// ==============================================================================
// Engine Output (unit-normalized)
// ==============================================================================

/// A landmark as the engine reports it, relative to the image size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedLandmark {
    pub x: f32,                  // [0, 1] of image width
    pub y: f32,                  // [0, 1] of image height
    pub z: f32,                  // Relative depth, same scale as x
    pub visibility: Option<f32>, // Not every engine build reports it
}

impl NormalizedLandmark {
    pub fn new(x: f32, y: f32, z: f32, visibility: Option<f32>) -> Self {
        Self { x, y, z, visibility }
    }
}

/// Raw detection result: one landmark list per detected subject
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutput {
    pub poses: Vec<Vec<NormalizedLandmark>>,
}

impl EngineOutput {
    pub fn empty() -> Self {
        Self::default()
    }
}

// ==============================================================================
// Portable Result (pixel space)
// ==============================================================================

/// One skeletal point in pixel coordinates of the unrotated frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub likelihood: f32,
}

/// All landmarks of one subject, keyed by their stable landmark index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub landmarks: BTreeMap<usize, Landmark>,
}

impl Pose {
    pub fn landmark(&self, which: BodyLandmark) -> Option<&Landmark> {
        self.landmarks.get(&which.index())
    }
}

/// Response payload of `processImage`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseResult {
    pub poses: Vec<Pose>,
}

/// MediaPipe Pose Landmark indices (33 total)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BodyLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl BodyLandmark {
    pub fn index(self) -> usize {
        self as usize
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

/// Failures reported by the inference engine itself
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Model loading failed: {0}")]
    ModelLoadFailed(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Engine task crashed: {0}")]
    Crashed(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Failures of an engine session operation
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("PoseLandmarker not initialized")]
    NotInitialized,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Model(#[from] crate::models::model_asset::ModelError),

    #[error(transparent)]
    Decode(#[from] crate::models::frame::DecodeError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type SessionResult<T> = Result<T, SessionError>;
