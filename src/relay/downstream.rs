//! HTTP client for the downstream execution service.

use super::{InvocationPayload, RelayError};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::time::Duration;
use tracing::debug;

/// Body chunks of a downstream response, in arrival order.
pub type ChunkStream = BoxStream<'static, Result<Bytes, RelayError>>;

/// The service that actually runs tools.
#[async_trait]
pub trait ExecutionService: Send + Sync {
    /// Starts one invocation and returns its response body as a stream.
    ///
    /// Whatever connection backs the stream is released when the stream is dropped.
    async fn invoke(&self, payload: &InvocationPayload) -> Result<ChunkStream, RelayError>;
}

/// [`ExecutionService`] reached over HTTP.
///
/// Every invocation builds its own `reqwest::Client` with pooling disabled,
/// so no connection is shared between two inbound requests.
pub struct HttpExecutionService {
    base_url: String,
    timeout: Duration,
}

impl HttpExecutionService {
    /// # Arguments
    /// * `base_url` - Base URL of the execution service (e.g., "http://127.0.0.1:9000")
    /// * `timeout_sec` - Bound on a whole invocation, body included
    pub fn new(base_url: String, timeout_sec: u64) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            timeout: Duration::from_secs(timeout_sec),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn build_client(&self) -> Result<reqwest::Client, RelayError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()
            .map_err(RelayError::from)
    }
}

#[async_trait]
impl ExecutionService for HttpExecutionService {
    async fn invoke(&self, payload: &InvocationPayload) -> Result<ChunkStream, RelayError> {
        let body = payload.to_body().map_err(RelayError::Encode)?;
        let url = format!("{}{}", self.base_url, payload.endpoint());
        debug!("POST {} ({} bytes)", url, body.len());

        let client = self.build_client()?;
        let response = client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Status(status));
        }

        Ok(response.bytes_stream().map_err(RelayError::from).boxed())
    }
}
