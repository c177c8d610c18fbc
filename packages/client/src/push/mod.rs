//! Push channel: server-to-client change notifications.
//!
//! ## 概要
//!
//! The server keeps one WebSocket per player open and writes small JSON
//! messages to it. Only two kinds carry meaning of their own; every other
//! well-formed message just says "something changed, refetch".
//!
//! ## 実装
//!
//! - `websocket`: `tokio-tungstenite` を使った実装

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::PushError;

pub mod websocket;

pub use websocket::WsPushConnector;

/// Decoded push channel message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushMessage {
    /// Keep-alive; proves the channel works, nothing changed
    Heartbeat,
    /// Another player asks the local player to hurry up
    HurryUp { from: String },
    /// Room state changed on the server
    Changed,
}

impl PushMessage {
    /// Decode a text frame.
    ///
    /// Returns `None` for frames that are not JSON at all; those are dropped.
    pub fn parse(text: &str) -> Option<Self> {
        let value: serde_json::Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Ignoring malformed push message {:?}: {}", text, e);
                return None;
            }
        };

        if value.get("heartbeat").is_some() {
            return Some(Self::Heartbeat);
        }
        if let Some(ping) = value.get("ping") {
            let from = match ping.as_str() {
                Some(name) => name.to_string(),
                None => ping.to_string(),
            };
            return Some(Self::HurryUp { from });
        }
        Some(Self::Changed)
    }
}

/// Stream of messages from one open push channel.
///
/// The stream ends when the server closes the channel.
pub type PushStream = BoxStream<'static, Result<PushMessage, PushError>>;

/// Opens push channels for a player in a room.
#[async_trait]
pub trait PushConnector: Send + Sync {
    /// Open a new channel for `player` in room `code`.
    async fn open(&self, code: &str, player: &str) -> Result<PushStream, PushError>;
}
