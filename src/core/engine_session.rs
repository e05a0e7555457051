// Engine session - owns the single pose landmarker and sequences its lifecycle

use crate::core::frame_decoder;
use crate::core::landmark_normalizer;
use crate::core::ml_models::ModelStore;
use crate::models::frame::RawFrame;
use crate::models::model_asset::ModelAsset;
use crate::models::pose::{EngineConfig, EngineError, PoseResult, SessionError, SessionResult};
use crate::platform::pose::{EngineFactory, PoseEngine};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

enum SessionState {
    Uninitialized,
    Ready {
        engine: Box<dyn PoseEngine>,
        config: EngineConfig,
    },
    Disposed,
}

/// Observable lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Uninitialized,
    Ready,
    Disposed,
}

/// The one live engine of the process.
///
/// Every operation holds the state lock for its whole duration, so the native
/// engine is never entered concurrently and `dispose` waits for in-flight work.
/// Operations run on their own task: dropping the caller's future does not
/// interrupt them, and the engine is always put back or released.
pub struct EngineSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: ModelStore,
    asset: ModelAsset,
    factory: Arc<dyn EngineFactory>,
    state: Mutex<SessionState>,
}

impl EngineSession {
    pub fn new(store: ModelStore, asset: ModelAsset, factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                store,
                asset,
                factory,
                state: Mutex::new(SessionState::Uninitialized),
            }),
        }
    }

    pub async fn status(&self) -> SessionStatus {
        match *self.inner.state.lock().await {
            SessionState::Uninitialized => SessionStatus::Uninitialized,
            SessionState::Ready { .. } => SessionStatus::Ready,
            SessionState::Disposed => SessionStatus::Disposed,
        }
    }

    /// Configuration of the live engine, if any
    pub async fn config(&self) -> Option<EngineConfig> {
        match &*self.inner.state.lock().await {
            SessionState::Ready { config, .. } => Some(*config),
            _ => None,
        }
    }

    /// Fetch the model if needed and construct a fresh engine.
    ///
    /// An existing engine is released first. On failure the session is left
    /// uninitialized.
    pub async fn initialize(&self, config: EngineConfig) -> SessionResult<()> {
        let inner = self.inner.clone();
        detached(async move { inner.initialize(config).await }).await
    }

    /// Decode one frame, run inference and return pixel-space landmarks.
    ///
    /// Fails with `NotInitialized` before touching the frame when no engine is
    /// live. A failed call, including a panicking engine, leaves the session
    /// ready.
    pub async fn process(&self, frame: RawFrame) -> SessionResult<PoseResult> {
        let inner = self.inner.clone();
        detached(async move { inner.process(frame).await }).await
    }

    /// Release the engine, if any. Always succeeds and is idempotent.
    pub async fn dispose(&self) {
        let inner = self.inner.clone();
        let task = tokio::spawn(async move { inner.dispose().await });
        if let Err(e) = task.await {
            log::error!("Dispose task failed: {}", e);
        }
    }
}

impl SessionInner {
    async fn initialize(&self, config: EngineConfig) -> SessionResult<()> {
        let mut state = self.state.lock().await;

        if let SessionState::Ready { engine, .. } =
            std::mem::replace(&mut *state, SessionState::Uninitialized)
        {
            log::info!("Releasing current PoseLandmarker before re-initializing");
            release(engine).await;
        }

        let model_path = self.store.ensure_available(&self.asset).await?;
        log::debug!("Model file exists: {:?}", model_path);

        let factory = self.factory.clone();
        let engine = tokio::task::spawn_blocking(move || {
            panic::catch_unwind(AssertUnwindSafe(|| factory.create(&model_path, &config)))
                .unwrap_or_else(|payload| Err(EngineError::Crashed(panic_message(payload))))
        })
        .await
        .map_err(|e| EngineError::Crashed(format!("Task join error: {}", e)))??;

        log::info!(
            "PoseLandmarker initialized successfully: {} (detection >= {}, tracking >= {})",
            engine.describe(),
            config.min_detection_confidence,
            config.min_tracking_confidence
        );

        *state = SessionState::Ready { engine, config };
        Ok(())
    }

    async fn process(&self, frame: RawFrame) -> SessionResult<PoseResult> {
        let mut state = self.state.lock().await;

        if !matches!(*state, SessionState::Ready { .. }) {
            return Err(SessionError::NotInitialized);
        }

        // Undersized buffers never reach the engine
        frame_decoder::check_dimensions(&frame)?;

        let (mut engine, config) = match std::mem::replace(&mut *state, SessionState::Uninitialized) {
            SessionState::Ready { engine, config } => (engine, config),
            other => {
                *state = other;
                return Err(SessionError::NotInitialized);
            }
        };

        if frame.rotation_degrees != 0 {
            log::debug!(
                "Frame rotation {} ignored, landmarks stay in sensor orientation",
                frame.rotation_degrees
            );
        }

        let start_time = Instant::now();
        let task = tokio::task::spawn_blocking(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| run_inference(engine.as_mut(), &frame)))
                .unwrap_or_else(|payload| Err(EngineError::Crashed(panic_message(payload)).into()));
            (engine, result)
        });

        match task.await {
            Ok((engine, result)) => {
                *state = SessionState::Ready { engine, config };
                log::debug!(
                    "Frame processed in {} ms",
                    start_time.elapsed().as_millis()
                );
                result
            }
            Err(e) => {
                // Only reachable when the runtime shuts down mid-inference
                log::error!("Inference task cancelled, engine lost: {}", e);
                Err(EngineError::Crashed(format!("Task join error: {}", e)).into())
            }
        }
    }

    async fn dispose(&self) {
        let mut state = self.state.lock().await;

        match std::mem::replace(&mut *state, SessionState::Disposed) {
            SessionState::Ready { engine, .. } => {
                release(engine).await;
                log::info!("PoseLandmarker disposed");
            }
            _ => log::debug!("Dispose called without a live PoseLandmarker"),
        }
    }
}

/// Run a session operation on its own task so the caller can't cancel it halfway
async fn detached<T, F>(operation: F) -> SessionResult<T>
where
    T: Send + 'static,
    F: Future<Output = SessionResult<T>> + Send + 'static,
{
    match tokio::spawn(operation).await {
        Ok(result) => result,
        Err(e) => Err(EngineError::Crashed(format!("Session task failed: {}", e)).into()),
    }
}

fn run_inference(engine: &mut dyn PoseEngine, frame: &RawFrame) -> SessionResult<PoseResult> {
    let grid = frame_decoder::decode(frame)?;
    let output = engine.detect(&grid)?;
    Ok(landmark_normalizer::normalize(&output, frame.width, frame.height))
}

async fn release(engine: Box<dyn PoseEngine>) {
    let description = engine.describe();
    match tokio::task::spawn_blocking(move || engine.close()).await {
        Ok(()) => log::debug!("Released engine: {}", description),
        Err(e) => log::error!("Failed to release engine {}: {}", description, e),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("engine panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("engine panicked: {}", message)
    } else {
        "engine panicked".to_string()
    }
}
