/*
[INPUT]:  Error sources (transport, timeouts, schema validation, server errors, config)
[OUTPUT]: Structured error type with stable codes and retry/auth hints
[POS]:    Error handling layer - unified error type for the entire crate
[UPDATE]: When adding new error sources or server error codes
*/

use serde_json::Value;
use thiserror::Error;

use crate::schema::ValidationError;

/// Server error codes that mean the session token is unusable.
const AUTHORIZATION_CODES: &[&str] = &[
    "InvalidToken",
    "AuthorizationRequired",
    "InvalidAppID",
    "DisabledClient",
    "SelfExclusion",
];

/// Main error type for the tradelink adapter
#[derive(Error, Debug)]
pub enum TradelinkError {
    /// Socket-level failure
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The transport dropped after the request was written
    #[error("Connection lost before a reply to req_id {req_id} arrived")]
    ConnectionLost { req_id: u64 },

    /// The manager was explicitly disconnected
    #[error("Connection manager disconnected")]
    Disconnected,

    /// A connect attempt or reconnect sequence is already running
    #[error("Connection attempt already in progress")]
    ConnectInProgress,

    /// Reconnection gave up after the configured number of attempts
    #[error("Reconnect failed after {attempts} attempts")]
    ReconnectFailed { attempts: u32 },

    /// No reply arrived before the request deadline
    #[error("Request {req_id} timed out after {duration_ms}ms")]
    Timeout { req_id: u64, duration_ms: u64 },

    /// Request or response failed structural validation
    #[error("Schema validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Server rejected the session token
    #[error("Authorization failed ({code}): {message}")]
    Authorization { code: String, message: String },

    /// Server reported an error for this request
    #[error("API error ({code}): {message}")]
    Api { code: String, message: String },

    /// Caller supplied parameters that cannot form a valid request
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Configuration error, including insecure transport in production
    #[error("Configuration error: {0}")]
    Config(String),

    /// Endpoint name missing from the schema registry
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// API name not registered with the API manager
    #[error("Unknown API: {0}")]
    UnknownApi(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TradelinkError {
    /// Build the error for a server `error` object, splitting authorization failures out.
    pub fn from_server_error(error: &Value) -> Self {
        let code = error
            .get("code")
            .and_then(Value::as_str)
            .unwrap_or("UnknownError")
            .to_string();
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if AUTHORIZATION_CODES.contains(&code.as_str()) {
            TradelinkError::Authorization { code, message }
        } else {
            TradelinkError::Api { code, message }
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &str {
        match self {
            TradelinkError::WebSocket(_) => "WebSocketError",
            TradelinkError::ConnectionLost { .. } => "ConnectionLost",
            TradelinkError::Disconnected => "Disconnected",
            TradelinkError::ConnectInProgress => "ConnectInProgress",
            TradelinkError::ReconnectFailed { .. } => "ReconnectFailed",
            TradelinkError::Timeout { .. } => "Timeout",
            TradelinkError::Validation(_) => "ValidationError",
            TradelinkError::Authorization { code, .. } => code,
            TradelinkError::Api { code, .. } => code,
            TradelinkError::InvalidParams(_) => "InvalidParameters",
            TradelinkError::Config(_) => "ConfigError",
            TradelinkError::UnknownEndpoint(_) => "UnknownEndpoint",
            TradelinkError::UnknownApi(_) => "UnknownApi",
            TradelinkError::Serialization(_) => "SerializationError",
        }
    }

    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            TradelinkError::WebSocket(_)
            | TradelinkError::ConnectionLost { .. }
            | TradelinkError::Timeout { .. } => true,
            TradelinkError::Api { code, .. } => code == "RateLimit",
            _ => false,
        }
    }

    /// Check if error indicates the session token should be discarded
    pub fn is_auth_error(&self) -> bool {
        matches!(self, TradelinkError::Authorization { .. })
    }

    /// Check if error comes from the transport rather than the server
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            TradelinkError::WebSocket(_)
                | TradelinkError::ConnectionLost { .. }
                | TradelinkError::ReconnectFailed { .. }
        )
    }
}

/// Result type alias for tradelink operations
pub type Result<T> = std::result::Result<T, TradelinkError>;
