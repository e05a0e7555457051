pub mod core;
pub mod models;
pub mod platform;

use core::config::ConfigError;
use models::model_asset::ModelError;
use platform::pose::DefaultEngineFactory;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub use core::bridge_service::BridgeService;
pub use core::config::BridgeConfig;
pub use core::dispatcher::{spawn, ChannelError, ChannelHandle};
pub use core::engine_session::{EngineSession, SessionStatus};
pub use core::logging::init_logging;
pub use models::channel::{ArgValue, ErrorCode, MethodCall, MethodResponse};
pub use models::pose::{BodyLandmark, Landmark, Pose, PoseResult};

#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to set up model store: {0}")]
    Model(#[from] ModelError),
}

/// Attach the bridge to a host: validate `config`, install logging and start
/// serving the channel with the default pose backend.
///
/// Must be called from within a tokio runtime.
pub fn attach(config: &BridgeConfig) -> Result<(ChannelHandle, JoinHandle<()>), AttachError> {
    config.validate()?;
    init_logging(config.log_level_filter());

    let service = BridgeService::new(config, Arc::new(DefaultEngineFactory::default()))?;
    log::info!("Pose bridge attached on '{}'", config.channel_name);
    Ok(spawn(service, config))
}
