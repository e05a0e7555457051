// Data models for camera frames, model assets, pose results, and the method channel

pub mod channel;
pub mod frame;
pub mod model_asset;
pub mod pose;
