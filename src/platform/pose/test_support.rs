// Scripted engine used by session and bridge tests

use super::mediapipe_bridge::{EngineFactory, PoseEngine};
use crate::core::frame_decoder;
use crate::models::frame::{PixelGrid, RawFrame};
use crate::models::model_asset::ModelAsset;
use crate::models::pose::{
    EngineConfig, EngineError, EngineOutput, EngineResult, NormalizedLandmark, POSE_LANDMARK_COUNT,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;
use std::time::Duration;

pub const TEST_MODEL_FILE: &str = "pose_landmarker_test.task";

/// Asset whose URL refuses connections, so only a cached copy can satisfy it
pub fn unreachable_asset() -> ModelAsset {
    ModelAsset::new(TEST_MODEL_FILE, "http://127.0.0.1:1/pose_landmarker_test.task")
}

/// Fresh cache directory, optionally pre-populated with the test model
pub fn model_dir(cached: bool) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pose_bridge_session_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    if cached {
        std::fs::write(dir.join(TEST_MODEL_FILE), b"test-model").unwrap();
    }
    dir
}

/// Mid-grey NV21 frame of exactly the required size
pub fn nv21_frame(width: u32, height: u32) -> RawFrame {
    let len = frame_decoder::required_len(width, height).unwrap();
    RawFrame::new(vec![128; len], width, height)
}

/// Shared counters observed by tests
#[derive(Default)]
pub struct MockStats {
    pub created: AtomicUsize,
    pub closed: AtomicUsize,
    pub detect_calls: AtomicUsize,
    /// Entries into `create`, `detect` or `close` while another was running
    pub overlapping_calls: AtomicUsize,
    in_engine: AtomicBool,
    pub last_config: Mutex<Option<EngineConfig>>,
    /// Thread the most recent `close` ran on
    pub closed_on: Mutex<Option<ThreadId>>,
}

impl MockStats {
    pub fn live_engines(&self) -> usize {
        self.created.load(Ordering::SeqCst) - self.closed.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        if self.in_engine.swap(true, Ordering::SeqCst) {
            self.overlapping_calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn leave(&self) {
        self.in_engine.store(false, Ordering::SeqCst);
    }
}

pub struct MockEngineFactory {
    pub stats: Arc<MockStats>,
    pub fail_create: AtomicBool,
    pub fail_detect: AtomicBool,
    pub panic_detect: AtomicBool,
    pub poses: usize,
    pub detect_delay: Duration,
    pub create_delay: Duration,
}

impl MockEngineFactory {
    /// Factory whose engines report `poses` subjects per frame
    pub fn new(poses: usize) -> Self {
        Self {
            stats: Arc::new(MockStats::default()),
            fail_create: AtomicBool::new(false),
            fail_detect: AtomicBool::new(false),
            panic_detect: AtomicBool::new(false),
            poses,
            detect_delay: Duration::ZERO,
            create_delay: Duration::ZERO,
        }
    }

    pub fn with_detect_delay(mut self, delay: Duration) -> Self {
        self.detect_delay = delay;
        self
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }
}

impl EngineFactory for MockEngineFactory {
    fn create(&self, _model_path: &Path, config: &EngineConfig) -> EngineResult<Box<dyn PoseEngine>> {
        self.stats.enter();
        if !self.create_delay.is_zero() {
            std::thread::sleep(self.create_delay);
        }

        if self.fail_create.load(Ordering::SeqCst) {
            self.stats.leave();
            return Err(EngineError::ModelLoadFailed("scripted failure".to_string()));
        }

        self.stats.created.fetch_add(1, Ordering::SeqCst);
        *self.stats.last_config.lock().unwrap() = Some(*config);
        self.stats.leave();

        Ok(Box::new(MockEngine {
            stats: self.stats.clone(),
            fail_detect: self.fail_detect.load(Ordering::SeqCst),
            panic_detect: self.panic_detect.load(Ordering::SeqCst),
            poses: self.poses,
            delay: self.detect_delay,
        }))
    }
}

struct MockEngine {
    stats: Arc<MockStats>,
    fail_detect: bool,
    panic_detect: bool,
    poses: usize,
    delay: Duration,
}

impl PoseEngine for MockEngine {
    fn detect(&mut self, _image: &PixelGrid) -> EngineResult<EngineOutput> {
        self.stats.enter();
        self.stats.detect_calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        if self.panic_detect {
            self.stats.leave();
            panic!("scripted engine crash");
        }

        let result = if self.fail_detect {
            Err(EngineError::InferenceFailed("scripted failure".to_string()))
        } else {
            let landmarks = (0..POSE_LANDMARK_COUNT)
                .map(|i| {
                    let t = i as f32 / POSE_LANDMARK_COUNT as f32;
                    let visibility = if i % 2 == 0 { Some(0.9) } else { None };
                    NormalizedLandmark::new(t, 1.0 - t, -0.1, visibility)
                })
                .collect::<Vec<_>>();
            Ok(EngineOutput {
                poses: vec![landmarks; self.poses],
            })
        };

        self.stats.leave();
        result
    }

    fn close(self: Box<Self>) {
        self.stats.enter();
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        *self.stats.closed_on.lock().unwrap() = Some(std::thread::current().id());
        self.stats.leave();
    }

    fn describe(&self) -> String {
        "Mock pose engine".to_string()
    }
}
