//! WebSocket を使った PushConnector 実装
//!
//! The server exposes the channel at `/api/stream?name=<player>&code=<room>`
//! on the same host as the HTTP API, with `http(s)` swapped for `ws(s)`.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Url;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::{api::http::base_url, error::PushError};

use super::{PushConnector, PushMessage, PushStream};

/// Push connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone)]
pub struct WsPushConnector {
    base: Url,
}

impl WsPushConnector {
    /// Create a connector for the server at `server` (its HTTP address).
    pub fn new(server: &str) -> Result<Self, PushError> {
        let base = base_url(server).map_err(|e| PushError::Connect(e.to_string()))?;
        Ok(Self { base })
    }

    /// WebSocket URL of the stream endpoint for `player` in room `code`.
    pub fn stream_url(&self, code: &str, player: &str) -> Result<Url, PushError> {
        let mut url = self
            .base
            .join("api/stream")
            .map_err(|e| PushError::Connect(e.to_string()))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| PushError::Connect(format!("cannot use {scheme} for {url}")))?;
        url.query_pairs_mut()
            .append_pair("name", player)
            .append_pair("code", code);
        Ok(url)
    }
}

#[async_trait]
impl PushConnector for WsPushConnector {
    async fn open(&self, code: &str, player: &str) -> Result<PushStream, PushError> {
        let url = self.stream_url(code, player)?;

        let (ws_stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| PushError::Connect(e.to_string()))?;
        tracing::info!("Push channel connected to {}", url);

        let stream = ws_stream.filter_map(|message| async move {
            match message {
                Ok(Message::Text(text)) => PushMessage::parse(&text).map(Ok),
                Ok(Message::Close(frame)) => {
                    tracing::debug!("Server closed the push channel: {:?}", frame);
                    None
                }
                // Binary frames, pings and pongs carry nothing for us
                Ok(_) => None,
                Err(e) => Some(Err(PushError::Read(e.to_string()))),
            }
        });

        Ok(stream.boxed())
    }
}
