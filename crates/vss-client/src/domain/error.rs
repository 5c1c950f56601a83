//! Client error types.
//!
//! Connection and authorization failures are fatal at startup; everything
//! else is scoped to the single operation that raised it.

use crate::domain::array::ElementType;
use serde_json::Value;
use std::fmt;

/// Error payload reported by the server in a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    /// Numeric error code (`number` on the message transport, `code` on gRPC)
    pub code: Option<i64>,
    /// Short reason phrase, e.g. "Path not found"
    pub reason: Option<String>,
    /// Human readable message
    pub message: String,
}

impl ServerError {
    pub fn new(code: Option<i64>, reason: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            reason,
            message: message.into(),
        }
    }

    /// Build from the `error` member of a reply document.
    ///
    /// Unstructured payloads keep their JSON text as the message.
    pub fn from_payload(payload: &Value) -> Self {
        let Value::Object(fields) = payload else {
            let message = match payload {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Self::new(None, None, message);
        };

        let code = fields
            .get("number")
            .or_else(|| fields.get("code"))
            .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())));
        let reason = fields
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string);
        let message = fields
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| payload.to_string());

        Self::new(code, reason, message)
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code {
            write!(f, "[{}] ", code)?;
        }
        match &self.reason {
            Some(reason) if !reason.is_empty() => write!(f, "{}: {}", reason, self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Failure to turn caller-supplied text into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// An array element did not parse as the expected element type
    #[error("invalid {expected} element: {token:?}")]
    InvalidElement { token: String, expected: ElementType },

    /// A scalar did not parse as the expected type
    #[error("invalid {expected} value: {value:?}")]
    InvalidValue { value: String, expected: ElementType },

    /// The signal's datatype has no text encoding
    #[error("unsupported data type: {0}")]
    UnsupportedDataType(String),
}

/// Errors surfaced by the client library.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Could not establish or keep the transport connection
    #[error("connection error: {0}")]
    Connection(String),

    /// Missing or rejected token
    #[error("authorization error: {0}")]
    Authorization(String),

    /// No reply arrived before the per-request deadline
    #[error("request timeout: {action}")]
    Timeout { action: String },

    /// The server answered with an error payload
    #[error("server error: {0}")]
    Server(ServerError),

    /// Caller-supplied value could not be parsed
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Reply did not have the expected shape
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Attribute name not known, or not usable for this operation
    #[error("unsupported attribute: {0}")]
    UnsupportedAttribute(String),

    /// The connection's background loops have stopped
    #[error("connection closed")]
    Closed,

    /// Local file access (token file, TLS material, config)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// gRPC call failed with a status
    #[error("rpc error: {0}")]
    Rpc(Box<tonic::Status>),
}

impl ClientError {
    pub fn timeout(action: impl Into<String>) -> Self {
        Self::Timeout {
            action: action.into(),
        }
    }

    /// Whether the error should abort the program rather than a single operation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Authorization(_))
    }
}

impl From<tonic::Status> for ClientError {
    fn from(status: tonic::Status) -> Self {
        match status.code() {
            tonic::Code::Unauthenticated | tonic::Code::PermissionDenied => {
                Self::Authorization(status.message().to_string())
            }
            tonic::Code::DeadlineExceeded => Self::timeout(status.message()),
            _ => Self::Rpc(Box::new(status)),
        }
    }
}

impl From<tonic::transport::Error> for ClientError {
    fn from(e: tonic::transport::Error) -> Self {
        Self::Connection(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Connection(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Protocol(e.to_string())
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
