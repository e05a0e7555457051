// Data structures for camera frames handed over by the host

use serde::{Deserialize, Serialize};

/// Dense RGB image consumed by the inference engine
pub type PixelGrid = image::RgbImage;

/// A raw camera frame as received in a `processImage` request
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub rotation_degrees: i32, // Informational only, never applied to pixels
    pub format: PixelFormat,
}

impl RawFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            rotation_degrees: 0,
            format: PixelFormat::default(),
        }
    }

    pub fn with_rotation(mut self, rotation_degrees: i32) -> Self {
        self.rotation_degrees = rotation_degrees;
        self
    }

    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }
}

/// Layout of a 4:2:0 camera frame: a full luma plane followed by one
/// half-resolution plane of interleaved chroma pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Chroma pairs ordered V, U (Android camera default)
    #[default]
    Nv21,
    /// Chroma pairs ordered U, V
    Nv12,
}

impl PixelFormat {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "nv21" => Some(PixelFormat::Nv21),
            "nv12" => Some(PixelFormat::Nv12),
            _ => None,
        }
    }
}

/// Error types for frame conversion
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid dimensions: {width}x{height} needs {required} bytes, got {actual}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        required: usize,
        actual: usize,
    },

    #[error("Conversion failed: {0}")]
    ConversionFailure(String),
}

pub type DecodeResult<T> = Result<T, DecodeError>;
