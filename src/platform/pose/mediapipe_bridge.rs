// MediaPipe integration bridge
// Abstraction over the native pose landmarker so the session never depends on a concrete backend

use crate::models::frame::PixelGrid;
use crate::models::pose::{EngineConfig, EngineError, EngineOutput, EngineResult};
use std::path::Path;

/// A live pose landmarker instance.
///
/// Implementations are not required to be reentrant: the session guarantees
/// that `detect` is never entered from two threads at once.
pub trait PoseEngine: Send {
    /// Run inference on one decoded frame
    fn detect(&mut self, image: &PixelGrid) -> EngineResult<EngineOutput>;

    /// Release the native handle. Consumes the engine, so it runs at most once.
    fn close(self: Box<Self>);

    /// Human-readable backend description for logs
    fn describe(&self) -> String;
}

/// Constructs engines from a cached model file
pub trait EngineFactory: Send + Sync {
    fn create(&self, model_path: &Path, config: &EngineConfig) -> EngineResult<Box<dyn PoseEngine>>;
}

// ==============================================================================
// Dummy Implementation (no native landmarker linked)
// ==============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct DummyMediaPipe;

impl EngineFactory for DummyMediaPipe {
    fn create(&self, model_path: &Path, config: &EngineConfig) -> EngineResult<Box<dyn PoseEngine>> {
        let metadata = std::fs::metadata(model_path).map_err(|e| {
            EngineError::ModelLoadFailed(format!("{}: {}", model_path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(EngineError::ModelLoadFailed(format!(
                "{} is not a file",
                model_path.display()
            )));
        }

        log::warn!("Using dummy MediaPipe implementation (no inference)");
        log::info!(
            "Dummy engine configured: detection >= {}, tracking >= {}, max poses {}",
            config.min_detection_confidence,
            config.min_tracking_confidence,
            config.max_poses
        );

        Ok(Box::new(DummyPoseEngine {
            model_bytes: metadata.len(),
        }))
    }
}

struct DummyPoseEngine {
    model_bytes: u64,
}

impl PoseEngine for DummyPoseEngine {
    fn detect(&mut self, _image: &PixelGrid) -> EngineResult<EngineOutput> {
        Ok(EngineOutput::empty())
    }

    fn close(self: Box<Self>) {
        log::debug!("Dummy engine released");
    }

    fn describe(&self) -> String {
        format!(
            "Dummy MediaPipe (no ML inference, model of {} bytes loaded)",
            self.model_bytes
        )
    }
}

// ==============================================================================
// Default Backend Selection
// ==============================================================================

pub type DefaultEngineFactory = DummyMediaPipe;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_requires_model_file() {
        let missing = std::env::temp_dir().join(format!("missing-{}.task", uuid::Uuid::new_v4()));
        let result = DummyMediaPipe.create(&missing, &EngineConfig::default());
        assert!(matches!(result, Err(EngineError::ModelLoadFailed(_))));
    }

    #[test]
    fn test_dummy_reports_no_poses() {
        let path = std::env::temp_dir().join(format!("dummy-{}.task", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"model").unwrap();

        let mut engine = DummyMediaPipe.create(&path, &EngineConfig::default()).unwrap();
        assert!(engine.describe().contains("5 bytes"));

        let output = engine.detect(&PixelGrid::new(4, 4)).unwrap();
        assert!(output.poses.is_empty());

        engine.close();
        std::fs::remove_file(&path).ok();
    }
}
