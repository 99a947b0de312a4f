use std::net::SocketAddr;
use thiserror::Error;

/// Failure of an automation handler operation
///
/// The `Display` form is the error string sent back to the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AutomationError {
    #[error("target value is empty")]
    InvalidTarget,

    #[error("unsupported target kind: {0}")]
    UnsupportedTargetKind(String),

    #[error("target not found by {by}: {value}")]
    NotFound { by: &'static str, value: String },

    #[error("root object is not configured")]
    RootNotConfigured,

    #[error("{0}")]
    ActionNotSupported(String),

    #[error("unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("property not found: {0}")]
    PropertyNotFound(String),

    #[error("failed to capture screenshot: {0}")]
    CaptureFailed(String),

    #[error("Handler is not configured")]
    HandlerNotConfigured,
}

impl AutomationError {
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::ActionNotSupported(message.into())
    }
}

/// Reasons an inbound frame is dropped without a reply
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame is not valid JSON")]
    InvalidJson,

    #[error("frame is not a JSON object")]
    NotAnObject,

    #[error("request id is missing or not a non-negative integer")]
    InvalidId,

    #[error("request method is empty")]
    EmptyMethod,
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid bind address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AutomationError>;
