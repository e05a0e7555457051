// Bridge service - translates method calls into engine session operations

use crate::core::config::BridgeConfig;
use crate::core::engine_session::EngineSession;
use crate::core::ml_models::ModelStore;
use crate::models::channel::{
    ArgumentError, ErrorCode, MethodCall, MethodResponse, METHOD_DISPOSE, METHOD_INITIALIZE,
    METHOD_PROCESS_IMAGE,
};
use crate::models::frame::{DecodeError, PixelFormat, RawFrame};
use crate::models::model_asset::ModelResult;
use crate::models::pose::{EngineConfig, SessionError};
use crate::platform::pose::EngineFactory;
use std::fmt::Display;
use std::sync::Arc;

/// Composition root: owns the engine session and answers host requests.
///
/// Every failure is turned into a structured response; nothing propagates to
/// the transport.
pub struct BridgeService {
    session: EngineSession,
    default_min_detection_confidence: f32,
    default_min_tracking_confidence: f32,
}

impl BridgeService {
    /// Service with an HTTP-backed model store configured from `config`
    pub fn new(config: &BridgeConfig, factory: Arc<dyn EngineFactory>) -> ModelResult<Self> {
        let store = ModelStore::with_http(config.model_dir.clone(), config.download_timeout())?;
        let session = EngineSession::new(store, config.model_asset(), factory);
        Ok(Self::with_session(session, config))
    }

    pub fn with_session(session: EngineSession, config: &BridgeConfig) -> Self {
        Self {
            session,
            default_min_detection_confidence: config.default_min_detection_confidence,
            default_min_tracking_confidence: config.default_min_tracking_confidence,
        }
    }

    pub fn session(&self) -> &EngineSession {
        &self.session
    }

    /// Handle one request
    pub async fn handle(&self, call: MethodCall) -> MethodResponse {
        match call.method.as_str() {
            METHOD_INITIALIZE => self.initialize(&call).await,
            METHOD_PROCESS_IMAGE => self.process_image(call).await,
            METHOD_DISPOSE => self.dispose().await,
            other => {
                log::warn!("Method not implemented: {}", other);
                MethodResponse::NotImplemented
            }
        }
    }

    async fn initialize(&self, call: &MethodCall) -> MethodResponse {
        let config = match self.engine_config(call) {
            Ok(config) => config,
            Err(e) => return init_error(e),
        };

        match self.session.initialize(config).await {
            Ok(()) => MethodResponse::success(true),
            Err(e) => init_error(e),
        }
    }

    fn engine_config(&self, call: &MethodCall) -> Result<EngineConfig, String> {
        let detection = confidence(call, "minDetectionConfidence", self.default_min_detection_confidence)
            .map_err(|e| e.to_string())?;
        let tracking = confidence(call, "minTrackingConfidence", self.default_min_tracking_confidence)
            .map_err(|e| e.to_string())?;

        EngineConfig::new(detection, tracking).map_err(|e| e.to_string())
    }

    async fn process_image(&self, mut call: MethodCall) -> MethodResponse {
        let frame = match parse_frame(&mut call) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Rejected processImage arguments: {}", e);
                return MethodResponse::error(ErrorCode::InvalidArgs, e.to_string());
            }
        };

        match self.session.process(frame).await {
            Ok(result) => match serde_json::to_value(&result) {
                Ok(value) => MethodResponse::success(value),
                Err(e) => process_error(e),
            },
            Err(SessionError::NotInitialized) => MethodResponse::error(
                ErrorCode::NotInitialized,
                SessionError::NotInitialized.to_string(),
            ),
            Err(SessionError::Decode(e @ DecodeError::InvalidDimensions { .. })) => {
                log::warn!("Rejected frame: {}", e);
                MethodResponse::error(ErrorCode::InvalidArgs, e.to_string())
            }
            Err(e) => process_error(e),
        }
    }

    async fn dispose(&self) -> MethodResponse {
        self.session.dispose().await;
        MethodResponse::success(true)
    }
}

fn confidence(call: &MethodCall, key: &str, default: f32) -> Result<f32, ArgumentError> {
    match call.argument::<f64>(key)? {
        // Checked before narrowing so values just above 1.0 can't round into range
        Some(value) if !(0.0..=1.0).contains(&value) => Err(out_of_range(key, value)),
        Some(value) => Ok(value as f32),
        None => Ok(default),
    }
}

fn parse_frame(call: &mut MethodCall) -> Result<RawFrame, ArgumentError> {
    let image_data = call.take_argument::<Vec<u8>>("imageData")?;
    let width = call.argument::<i64>("width")?;
    let height = call.argument::<i64>("height")?;

    let (Some(image_data), Some(width), Some(height)) = (image_data, width, height) else {
        return Err(ArgumentError::MissingImageFields);
    };

    let rotation = call.argument::<i64>("rotation")?.unwrap_or(0);
    let rotation = i32::try_from(rotation).map_err(|_| out_of_range("rotation", rotation))?;

    let format = match call.argument::<String>("format")? {
        Some(name) => PixelFormat::from_string(&name).ok_or_else(|| out_of_range("format", name))?,
        None => PixelFormat::default(),
    };

    Ok(RawFrame::new(image_data, dimension("width", width)?, dimension("height", height)?)
        .with_rotation(rotation)
        .with_format(format))
}

fn dimension(key: &str, value: i64) -> Result<u32, ArgumentError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| out_of_range(key, value))
}

fn out_of_range(key: &str, value: impl Display) -> ArgumentError {
    ArgumentError::OutOfRange {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn init_error(cause: impl Display) -> MethodResponse {
    log::error!("Error initializing PoseLandmarker: {}", cause);
    MethodResponse::error(ErrorCode::InitError, format!("Failed to initialize: {}", cause))
}

fn process_error(cause: impl Display) -> MethodResponse {
    log::error!("Error processing image: {}", cause);
    MethodResponse::error(ErrorCode::ProcessError, format!("Failed to process: {}", cause))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine_session::SessionStatus;
    use crate::models::channel::ArgValue;
    use crate::platform::pose::test_support::{self, MockEngineFactory};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn service_with(factory: Arc<MockEngineFactory>, cached: bool) -> BridgeService {
        let store = ModelStore::with_http(test_support::model_dir(cached), Duration::from_secs(2)).unwrap();
        let session = EngineSession::new(store, test_support::unreachable_asset(), factory);
        BridgeService::with_session(session, &BridgeConfig::default())
    }

    fn process_call(data: Vec<u8>, width: i64, height: i64) -> MethodCall {
        MethodCall::new(METHOD_PROCESS_IMAGE)
            .with_arg("imageData", data)
            .with_arg("width", width)
            .with_arg("height", height)
            .with_arg("rotation", 0i64)
    }

    fn valid_frame_bytes(width: u32, height: u32) -> Vec<u8> {
        test_support::nv21_frame(width, height).data
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let factory = Arc::new(MockEngineFactory::new(1));
        let service = service_with(factory.clone(), true);

        let init = service
            .handle(
                MethodCall::new(METHOD_INITIALIZE)
                    .with_arg("minDetectionConfidence", 0.6)
                    .with_arg("minTrackingConfidence", 0.6),
            )
            .await;
        assert_eq!(init, MethodResponse::success(true));

        let processed = service.handle(process_call(valid_frame_bytes(640, 480), 640, 480)).await;
        let result = processed.result().expect("processImage should succeed");
        let poses = result["poses"].as_array().unwrap();
        assert_eq!(poses.len(), 1);
        let nose = &poses[0]["landmarks"]["0"];
        assert_eq!(nose["y"], 480.0);
        assert!(nose["likelihood"].as_f64().unwrap() > 0.0);

        let short = service.handle(process_call(vec![0; 100], 640, 480)).await;
        assert_eq!(short.error_code(), Some(ErrorCode::InvalidArgs));
        assert_eq!(factory.stats.detect_calls.load(Ordering::SeqCst), 1);

        let disposed = service.handle(MethodCall::new(METHOD_DISPOSE)).await;
        assert_eq!(disposed, MethodResponse::success(true));
        assert_eq!(factory.stats.live_engines(), 0);
    }

    #[tokio::test]
    async fn test_defaults_applied_when_confidences_absent() {
        let factory = Arc::new(MockEngineFactory::new(0));
        let service = service_with(factory.clone(), true);

        let init = service
            .handle(MethodCall::new(METHOD_INITIALIZE).with_arg("minTrackingConfidence", ArgValue::Null))
            .await;
        assert!(init.is_success());

        let config = factory.stats.last_config.lock().unwrap().unwrap();
        assert_eq!(config.min_detection_confidence, 0.5);
        assert_eq!(config.min_tracking_confidence, 0.5);
        assert_eq!(config.max_poses, 1);
    }

    #[tokio::test]
    async fn test_initialize_rejects_bad_confidence() {
        let factory = Arc::new(MockEngineFactory::new(1));
        let service = service_with(factory.clone(), true);

        let wrong_type = service
            .handle(MethodCall::new(METHOD_INITIALIZE).with_arg("minDetectionConfidence", "high"))
            .await;
        assert_eq!(wrong_type.error_code(), Some(ErrorCode::InitError));

        let out_of_range = service
            .handle(MethodCall::new(METHOD_INITIALIZE).with_arg("minTrackingConfidence", 2.0))
            .await;
        assert_eq!(out_of_range.error_code(), Some(ErrorCode::InitError));

        let just_above_one = service
            .handle(MethodCall::new(METHOD_INITIALIZE).with_arg("minDetectionConfidence", 1.00000001))
            .await;
        assert_eq!(just_above_one.error_code(), Some(ErrorCode::InitError));

        let negative = service
            .handle(MethodCall::new(METHOD_INITIALIZE).with_arg("minTrackingConfidence", -0.0001))
            .await;
        assert_eq!(negative.error_code(), Some(ErrorCode::InitError));
        assert_eq!(factory.stats.created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_initialize_download_failure() {
        let factory = Arc::new(MockEngineFactory::new(1));
        let service = service_with(factory, false);

        let response = service.handle(MethodCall::new(METHOD_INITIALIZE)).await;
        match response {
            MethodResponse::Error { code, message } => {
                assert_eq!(code, ErrorCode::InitError);
                assert!(message.starts_with("Failed to initialize:"), "{}", message);
            }
            other => panic!("expected INIT_ERROR, got {:?}", other),
        }
        assert_eq!(service.session().status().await, SessionStatus::Uninitialized);
    }

    #[tokio::test]
    async fn test_process_before_initialize() {
        let factory = Arc::new(MockEngineFactory::new(1));
        let service = service_with(factory.clone(), true);

        let response = service.handle(process_call(valid_frame_bytes(32, 32), 32, 32)).await;
        assert_eq!(
            response,
            MethodResponse::error(ErrorCode::NotInitialized, "PoseLandmarker not initialized")
        );
        assert_eq!(factory.stats.detect_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_or_malformed_arguments() {
        let factory = Arc::new(MockEngineFactory::new(1));
        let service = service_with(factory.clone(), true);
        service.handle(MethodCall::new(METHOD_INITIALIZE)).await;

        let missing = MethodCall::new(METHOD_PROCESS_IMAGE)
            .with_arg("imageData", valid_frame_bytes(8, 8))
            .with_arg("width", 8i64);
        let wrong_type = process_call(valid_frame_bytes(8, 8), 8, 8).with_arg("height", 8.0);
        let negative = process_call(valid_frame_bytes(8, 8), -8, 8);
        let bad_format = process_call(valid_frame_bytes(8, 8), 8, 8).with_arg("format", "yuyv");

        for call in [missing, wrong_type, negative, bad_format] {
            let response = service.handle(call).await;
            assert_eq!(response.error_code(), Some(ErrorCode::InvalidArgs));
        }

        assert_eq!(factory.stats.detect_calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.session().status().await, SessionStatus::Ready);
    }

    #[tokio::test]
    async fn test_missing_arguments_before_initialize() {
        let service = service_with(Arc::new(MockEngineFactory::new(1)), true);

        let response = service.handle(MethodCall::new(METHOD_PROCESS_IMAGE)).await;
        assert_eq!(
            response,
            MethodResponse::error(ErrorCode::InvalidArgs, "Missing image data, width, or height")
        );
        assert_eq!(service.session().status().await, SessionStatus::Uninitialized);
    }

    #[tokio::test]
    async fn test_engine_failure_reports_process_error() {
        let factory = Arc::new(MockEngineFactory::new(1));
        factory.fail_detect.store(true, Ordering::SeqCst);
        let service = service_with(factory, true);
        service.handle(MethodCall::new(METHOD_INITIALIZE)).await;

        let response = service.handle(process_call(valid_frame_bytes(16, 16), 16, 16)).await;
        match response {
            MethodResponse::Error { code, message } => {
                assert_eq!(code, ErrorCode::ProcessError);
                assert!(message.starts_with("Failed to process:"), "{}", message);
            }
            other => panic!("expected PROCESS_ERROR, got {:?}", other),
        }
        assert_eq!(service.session().status().await, SessionStatus::Ready);
    }

    #[tokio::test]
    async fn test_nv12_format_and_rotation_accepted() {
        let service = service_with(Arc::new(MockEngineFactory::new(0)), true);
        service.handle(MethodCall::new(METHOD_INITIALIZE)).await;

        let call = process_call(valid_frame_bytes(16, 16), 16, 16)
            .with_arg("format", "nv12")
            .with_arg("rotation", 270i64);
        let response = service.handle(call).await;
        assert_eq!(response.result().map(|r| r["poses"].as_array().map(|p| p.len())), Some(Some(0)));
    }

    #[tokio::test]
    async fn test_dispose_twice() {
        let factory = Arc::new(MockEngineFactory::new(1));
        let service = service_with(factory.clone(), true);
        service.handle(MethodCall::new(METHOD_INITIALIZE)).await;

        let first = service.handle(MethodCall::new(METHOD_DISPOSE)).await;
        let second = service.handle(MethodCall::new(METHOD_DISPOSE)).await;
        assert_eq!(first, MethodResponse::success(true));
        assert_eq!(second, MethodResponse::success(true));
        assert_eq!(factory.stats.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_method_not_implemented() {
        let service = service_with(Arc::new(MockEngineFactory::new(1)), true);

        let response = service.handle(MethodCall::new("getPlatformVersion")).await;
        assert_eq!(response, MethodResponse::NotImplemented);
        assert_eq!(response.error_code(), None);
    }
}
