// Request/response types exchanged with the host over the method channel

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_PROCESS_IMAGE: &str = "processImage";
pub const METHOD_DISPOSE: &str = "dispose";

// ==============================================================================
// Arguments
// ==============================================================================

/// A single argument value as sent by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl ArgValue {
    fn type_name(&self) -> &'static str {
        match self {
            ArgValue::Null => "null",
            ArgValue::Bool(_) => "bool",
            ArgValue::Int(_) => "int",
            ArgValue::Float(_) => "float",
            ArgValue::String(_) => "string",
            ArgValue::Bytes(_) => "bytes",
        }
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Int(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        ArgValue::Int(value as i64)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Float(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::String(value.to_string())
    }
}

impl From<Vec<u8>> for ArgValue {
    fn from(value: Vec<u8>) -> Self {
        ArgValue::Bytes(value)
    }
}

/// Conversion from a raw argument into a typed value
pub trait FromArgValue: Sized {
    const EXPECTED: &'static str;

    fn from_arg(value: ArgValue) -> Option<Self>;
}

impl FromArgValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_arg(value: ArgValue) -> Option<Self> {
        match value {
            ArgValue::Float(v) => Some(v),
            ArgValue::Int(v) => Some(v as f64),
            _ => None,
        }
    }
}

impl FromArgValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_arg(value: ArgValue) -> Option<Self> {
        match value {
            ArgValue::Int(v) => Some(v),
            _ => None,
        }
    }
}

impl FromArgValue for String {
    const EXPECTED: &'static str = "string";

    fn from_arg(value: ArgValue) -> Option<Self> {
        match value {
            ArgValue::String(v) => Some(v),
            _ => None,
        }
    }
}

impl FromArgValue for Vec<u8> {
    const EXPECTED: &'static str = "bytes";

    fn from_arg(value: ArgValue) -> Option<Self> {
        match value {
            ArgValue::Bytes(v) => Some(v),
            _ => None,
        }
    }
}

/// A request from the host: a method name plus named arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: HashMap<String, ArgValue>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: HashMap::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Typed lookup. Absent keys and explicit nulls both read as `None`.
    pub fn argument<T: FromArgValue>(&self, key: &str) -> Result<Option<T>, ArgumentError> {
        convert(key, self.arguments.get(key).cloned())
    }

    /// Like `argument`, but moves the value out of the call
    pub fn take_argument<T: FromArgValue>(&mut self, key: &str) -> Result<Option<T>, ArgumentError> {
        convert(key, self.arguments.remove(key))
    }
}

fn convert<T: FromArgValue>(key: &str, value: Option<ArgValue>) -> Result<Option<T>, ArgumentError> {
    match value {
        None | Some(ArgValue::Null) => Ok(None),
        Some(value) => {
            let found = value.type_name();
            T::from_arg(value).map(Some).ok_or_else(|| ArgumentError::WrongType {
                key: key.to_string(),
                expected: T::EXPECTED,
                found,
            })
        }
    }
}

/// Malformed request arguments. Never reaches engine state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArgumentError {
    #[error("Missing image data, width, or height")]
    MissingImageFields,

    #[error("Argument '{key}' must be {expected}, got {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Argument '{key}' is out of range: {value}")]
    OutOfRange { key: String, value: String },
}

// ==============================================================================
// Responses
// ==============================================================================

/// Stable error codes understood by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InitError,
    InvalidArgs,
    NotInitialized,
    ProcessError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InitError => "INIT_ERROR",
            ErrorCode::InvalidArgs => "INVALID_ARGS",
            ErrorCode::NotInitialized => "NOT_INITIALIZED",
            ErrorCode::ProcessError => "PROCESS_ERROR",
        }
    }
}

/// Outcome of one method call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResponse {
    Success { result: serde_json::Value },
    Error { code: ErrorCode, message: String },
    /// The method name is not handled here; not a failure
    NotImplemented,
}

impl MethodResponse {
    pub fn success(result: impl Into<serde_json::Value>) -> Self {
        MethodResponse::Success {
            result: result.into(),
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        MethodResponse::Error {
            code,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MethodResponse::Success { .. })
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            MethodResponse::Error { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&serde_json::Value> {
        match self {
            MethodResponse::Success { result } => Some(result),
            _ => None,
        }
    }
}
