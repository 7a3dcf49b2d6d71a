//! Error types for the Tinyphone client

use thiserror::Error;

/// Result alias used throughout the crate.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the event socket and the command API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The WebSocket connection could not be established.
    #[error("connect failed: {message}")]
    ConnectFailed {
        /// Human-readable cause (the underlying handshake or I/O error).
        message: String,
    },

    /// Transport-level WebSocket error during send or receive.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Operation requires an open transport.
    #[error("not connected")]
    NotConnected,

    /// Operation attempted after the socket was shut down.
    #[error("socket has been shut down")]
    Disposed,

    /// Operation did not complete within its deadline.
    #[error("operation timed out after {timeout_ms}ms")]
    Timeout {
        /// The deadline that was exceeded, in milliseconds.
        timeout_ms: u64,
    },

    /// The configured base address cannot be turned into an event endpoint.
    #[error("invalid endpoint: {message}")]
    InvalidEndpoint {
        /// What was wrong with the address.
        message: String,
    },

    /// The base address failed to parse as a URL.
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// A reassembled message was not valid UTF-8.
    #[error("invalid UTF-8 in message payload")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Events were dropped because the event queue was full.
    ///
    /// Delivered once per overflow episode on the event channel; the
    /// receive cycle itself keeps running.
    #[error("event queue full, events were dropped")]
    QueueFull,

    /// HTTP transport error from the command API.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered a query with a non-success HTTP status.
    #[error("unexpected HTTP status {status}")]
    UnexpectedStatus {
        /// The status code the server returned.
        status: reqwest::StatusCode,
        /// The response body, for diagnostics.
        body: String,
    },
}

impl ClientError {
    /// Build a [`ClientError::ConnectFailed`] from any displayable cause.
    pub fn connect_failed(message: impl Into<String>) -> Self {
        ClientError::ConnectFailed {
            message: message.into(),
        }
    }

    /// Build a [`ClientError::InvalidEndpoint`] from any displayable cause.
    pub fn invalid_endpoint(message: impl Into<String>) -> Self {
        ClientError::InvalidEndpoint {
            message: message.into(),
        }
    }
}
