// Pose estimation platform integration
// Provides the MediaPipe engine seam and the default backend

pub mod mediapipe_bridge;

#[cfg(test)]
pub mod test_support;

pub use mediapipe_bridge::{DefaultEngineFactory, DummyMediaPipe, EngineFactory, PoseEngine};
