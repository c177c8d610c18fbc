//! Error types for the Hollows client.

use thiserror::Error;

/// Errors from the game server's request/response API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a usable response
    #[error("request failed: {0}")]
    Transport(String),

    /// The server refused the request; `message` is shown to the user as-is
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The configured server address cannot be used
    #[error("invalid server url: {0}")]
    InvalidUrl(String),
}

/// Push channel errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    /// Opening the channel failed
    #[error("push channel connect failed: {0}")]
    Connect(String),

    /// The open channel broke while reading
    #[error("push channel read failed: {0}")]
    Read(String),
}

/// Client-level errors reported by the binary
#[derive(Debug, Error)]
pub enum ClientError {
    /// Creating or joining the room failed
    #[error("could not enter room: {0}")]
    Api(#[from] ApiError),

    /// The server address could not be turned into a push channel address
    #[error("push channel unavailable: {0}")]
    Push(#[from] PushError),
}
