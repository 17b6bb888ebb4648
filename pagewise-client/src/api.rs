use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use pagewise::wire::{
    Envelope, ITEMS_PATH, ORDER_PATH, SELECTED_PATH, STATE_PATH, SaveOrderRequest,
    SaveSelectedRequest, WriteAck,
};
use pagewise::{CurrentState, ItemId, PageRequest, PageResult, StateService, StateVersion};
use serde::de::DeserializeOwned;

use crate::{ClientError, Result};

/// The server operations the client engine depends on.
///
/// Implemented over HTTP by [`HttpItemsApi`] and in-process by [`pagewise::StateService`].
#[async_trait]
pub trait ItemsApi: Send + Sync {
    async fn get_items(&self, request: &PageRequest) -> Result<PageResult>;

    async fn get_state(&self) -> Result<CurrentState>;

    async fn save_order(
        &self,
        order: &[ItemId],
        version: Option<StateVersion>,
    ) -> Result<StateVersion>;

    async fn save_selected(
        &self,
        selected: &[ItemId],
        version: Option<StateVersion>,
    ) -> Result<StateVersion>;
}

/// Runs one api call, failing with [`ClientError::Timeout`] if it takes longer than `timeout_ms`.
pub(crate) async fn bounded<T>(timeout_ms: u64, call: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(Duration::from_millis(timeout_ms), call)
        .await
        .unwrap_or(Err(ClientError::Timeout(timeout_ms)))
}

/// [`ItemsApi`] over the JSON HTTP interface.
#[derive(Clone, Debug)]
pub struct HttpItemsApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpItemsApi {
    /// `base_url` is the server origin, e.g. `http://localhost:3000`.
    ///
    /// Every request is bounded by [`crate::DEFAULT_FETCH_TIMEOUT_MS`].
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(crate::DEFAULT_FETCH_TIMEOUT_MS))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl ItemsApi for HttpItemsApi {
    async fn get_items(&self, request: &PageRequest) -> Result<PageResult> {
        let response = self
            .client
            .get(self.url(ITEMS_PATH))
            .query(&[
                ("page", request.page.to_string()),
                ("limit", request.page_size.to_string()),
                ("search", request.search.clone()),
            ])
            .send()
            .await?;
        decode(response).await
    }

    async fn get_state(&self) -> Result<CurrentState> {
        let response = self.client.get(self.url(STATE_PATH)).send().await?;
        decode(response).await
    }

    async fn save_order(
        &self,
        order: &[ItemId],
        version: Option<StateVersion>,
    ) -> Result<StateVersion> {
        let body = SaveOrderRequest {
            order: order.to_vec(),
            version,
        };
        let response = self
            .client
            .post(self.url(ORDER_PATH))
            .json(&body)
            .send()
            .await?;
        decode::<WriteAck>(response).await.map(|ack| ack.version)
    }

    async fn save_selected(
        &self,
        selected: &[ItemId],
        version: Option<StateVersion>,
    ) -> Result<StateVersion> {
        let body = SaveSelectedRequest {
            selected: selected.to_vec(),
            version,
        };
        let response = self
            .client
            .post(self.url(SELECTED_PATH))
            .json(&body)
            .send()
            .await?;
        decode::<WriteAck>(response).await.map(|ack| ack.version)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let http_status = response.status();
    let bytes = response.bytes().await?;
    let envelope: Envelope<T> = match serde_json::from_slice(&bytes) {
        Ok(envelope) => envelope,
        Err(e) if http_status.is_success() => return Err(ClientError::Decode(e.to_string())),
        Err(_) => {
            return Err(ClientError::Status {
                status: http_status.as_u16(),
                message: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
    };

    if !http_status.is_success() || envelope.status >= 400 {
        return Err(ClientError::Status {
            status: envelope.status,
            message: envelope.error.unwrap_or(envelope.message),
        });
    }
    envelope
        .data
        .ok_or_else(|| ClientError::Decode("envelope has no data".to_string()))
}

/// In-process backend, useful when the list and the store live in the same program.
#[async_trait]
impl ItemsApi for StateService {
    async fn get_items(&self, request: &PageRequest) -> Result<PageResult> {
        self.query(request).map_err(status_error)
    }

    async fn get_state(&self) -> Result<CurrentState> {
        Ok(self.state())
    }

    async fn save_order(
        &self,
        order: &[ItemId],
        version: Option<StateVersion>,
    ) -> Result<StateVersion> {
        self.set_order(order.to_vec(), version).map_err(status_error)
    }

    async fn save_selected(
        &self,
        selected: &[ItemId],
        version: Option<StateVersion>,
    ) -> Result<StateVersion> {
        self.set_selected(selected.to_vec(), version)
            .map_err(status_error)
    }
}

fn status_error(e: pagewise::Error) -> ClientError {
    let status = match e {
        pagewise::Error::Conflict { .. } => 409,
        _ => 400,
    };
    ClientError::Status {
        status,
        message: e.to_string(),
    }
}
