pub mod config;
pub mod logging;

// Model acquisition and frame handling
pub mod ml_models;
pub mod frame_decoder;
pub mod landmark_normalizer;

// Engine lifecycle and request handling
pub mod engine_session;
pub mod bridge_service;
pub mod dispatcher;
