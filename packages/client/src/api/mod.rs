//! Request/response interface to the game server.
//!
//! The [`GameApi`] trait is the seam between the client core and the server's
//! HTTP API; [`HttpGameApi`] is the production implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, snapshot::Snapshot};

pub mod http;

pub use http::HttpGameApi;

/// Body of `POST /api/state`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRequest {
    pub code: String,
}

/// Body of `POST /api/input`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub player: String,
    pub code: String,
    pub index: usize,
    #[serde(default)]
    pub reset: bool,
}

/// Body of `POST /api/create`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub size: usize,
    pub hotseat: bool,
}

/// Response of `POST /api/create`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub code: String,
}

/// Body of `POST /api/join`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub code: String,
    pub name: String,
}

/// Body of `POST /api/ping`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingRequest {
    pub code: String,
    pub name: String,
}

/// Error payload the server returns with non-success statuses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Game server operations used by the client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameApi: Send + Sync {
    /// Fetch the authoritative state of room `code`.
    async fn fetch_state(&self, code: &str) -> Result<Snapshot, ApiError>;

    /// Submit a move (or a restart when `reset` is set).
    async fn submit_move(&self, request: &MoveRequest) -> Result<(), ApiError>;

    /// Create a room and return its code.
    async fn create_room(&self, request: &CreateRoomRequest) -> Result<String, ApiError>;

    /// Join a room; returns the room as it is after joining.
    async fn join_room(&self, request: &JoinRequest) -> Result<Snapshot, ApiError>;

    /// Ask the current player to hurry up.
    async fn ping(&self, request: &PingRequest) -> Result<(), ApiError>;
}

/// Create a room and join it as `name`.
///
/// Returns the room code together with the first snapshot.
pub async fn create_and_join(
    api: &dyn GameApi,
    size: usize,
    hotseat: bool,
    name: &str,
) -> Result<(String, Snapshot), ApiError> {
    let code = api
        .create_room(&CreateRoomRequest { size, hotseat })
        .await?;
    tracing::info!("Room '{}' created", code);

    let snapshot = api
        .join_room(&JoinRequest {
            code: code.clone(),
            name: name.to_string(),
        })
        .await?;
    Ok((code, snapshot))
}
