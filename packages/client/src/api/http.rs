//! HTTP implementation of [`GameApi`] on top of `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Serialize;

use crate::{error::ApiError, snapshot::Snapshot};

use super::{
    CreateRoomRequest, CreateRoomResponse, ErrorBody, GameApi, JoinRequest, MoveRequest,
    PingRequest, StateRequest,
};

/// Game server reached over JSON `POST` requests under `<server>/api/`.
#[derive(Debug, Clone)]
pub struct HttpGameApi {
    client: Client,
    base: Url,
}

impl HttpGameApi {
    /// Create an API client for the server at `server` (e.g. `http://127.0.0.1:4000`).
    pub fn new(server: &str) -> Result<Self, ApiError> {
        Self::with_client(Client::new(), server)
    }

    /// Same as [`HttpGameApi::new`] with a preconfigured `reqwest` client.
    pub fn with_client(client: Client, server: &str) -> Result<Self, ApiError> {
        Ok(Self {
            client,
            base: base_url(server)?,
        })
    }

    fn endpoint(&self, route: &str) -> Result<Url, ApiError> {
        self.base
            .join(&format!("api/{route}"))
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }

    async fn post<B>(&self, route: &str, body: &B) -> Result<Response, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.endpoint(route)?;
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(rejection(response).await)
        }
    }
}

/// Parse `server` and make sure relative routes resolve below its path.
pub(crate) fn base_url(server: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(server).map_err(|e| ApiError::InvalidUrl(format!("{server}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::InvalidUrl(format!(
            "{server}: expected an http or https address"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Turn a non-success response into [`ApiError::Rejected`].
///
/// The server's `{"error": ...}` message is kept verbatim when present.
async fn rejection(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => format!("server responded with status {status}"),
    };
    ApiError::Rejected { status, message }
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn fetch_state(&self, code: &str) -> Result<Snapshot, ApiError> {
        let request = StateRequest {
            code: code.to_string(),
        };
        self.post("state", &request)
            .await?
            .json::<Snapshot>()
            .await
            .map_err(|e| ApiError::Transport(format!("unreadable room state: {e}")))
    }

    async fn submit_move(&self, request: &MoveRequest) -> Result<(), ApiError> {
        self.post("input", request).await?;
        Ok(())
    }

    async fn create_room(&self, request: &CreateRoomRequest) -> Result<String, ApiError> {
        let created = self
            .post("create", request)
            .await?
            .json::<CreateRoomResponse>()
            .await
            .map_err(|e| ApiError::Transport(format!("unreadable create response: {e}")))?;
        Ok(created.code)
    }

    async fn join_room(&self, request: &JoinRequest) -> Result<Snapshot, ApiError> {
        self.post("join", request)
            .await?
            .json::<Snapshot>()
            .await
            .map_err(|e| ApiError::Transport(format!("unreadable room state: {e}")))
    }

    async fn ping(&self, request: &PingRequest) -> Result<(), ApiError> {
        self.post("ping", request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_resolves_below_server_root() {
        // テスト項目: API のルートがサーバーのルート直下の /api/ に解決される
        // given (前提条件):
        let api = HttpGameApi::new("http://127.0.0.1:4000").unwrap();

        // when (操作):
        let url = api.endpoint("state").unwrap();

        // then (期待する結果):
        assert_eq!(url.as_str(), "http://127.0.0.1:4000/api/state");
    }

    #[test]
    fn test_endpoint_keeps_server_path_prefix() {
        // テスト項目: サーバーのパスにプレフィックスがある場合も保持される
        // given (前提条件):
        let api = HttpGameApi::new("https://games.example.com/hollows").unwrap();

        // when (操作):
        let url = api.endpoint("input").unwrap();

        // then (期待する結果):
        assert_eq!(url.as_str(), "https://games.example.com/hollows/api/input");
    }

    #[test]
    fn test_base_url_rejects_non_http_scheme() {
        // テスト項目: http/https 以外のスキームはエラーになる
        // given (前提条件):
        let server = "ftp://127.0.0.1";

        // when (操作):
        let result = base_url(server);

        // then (期待する結果):
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }
}
