//! Error types for the Tandem client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server refused the WebSocket handshake (wrong path, proxy error...)
    #[error("Server rejected the connection: {0}")]
    Rejected(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A frame could not be encoded
    #[error("Failed to encode event: {0}")]
    Encode(String),
}

/// Errors raised by the media engine while negotiating a peer link
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("malformed session description: {0}")]
    MalformedDescription(String),

    #[error("malformed ICE candidate: {0}")]
    MalformedCandidate(String),

    #[error("no negotiation in progress with peer '{0}'")]
    NoSession(String),
}

/// Errors in a typed command line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("unknown command '{0}' (try /help)")]
    Unknown(String),
}
