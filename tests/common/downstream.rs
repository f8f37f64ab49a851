//! Mock execution service
//!
//! Serves `/run-wasm` and `/run-system`, records every request it receives
//! and answers with a scripted, chunked response.

use super::constants::*;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// How the mock answers every invocation.
#[derive(Clone, Debug)]
pub enum Script {
    /// Sends the chunks, then completes normally.
    Chunks(Vec<&'static str>),
    /// Sends the chunks, then aborts the connection mid-body.
    ChunksThenFail(Vec<&'static str>),
    /// Sends the chunks, then never completes.
    ChunksThenHang(Vec<&'static str>),
    /// Answers with a non-success status and no stream.
    Status(StatusCode),
}

/// A request as seen by the execution service.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub path: String,
    pub content_type: Option<String>,
    pub content_length: Option<usize>,
    pub transfer_encoding: Option<String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn body_text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("Body is not UTF-8")
    }
}

struct MockState {
    script: Script,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct MockDownstream {
    /// Base URL to hand to the relay (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    state: Arc<MockState>,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl MockDownstream {
    pub async fn spawn(script: Script) -> Self {
        let state = Arc::new(MockState {
            script,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/run-wasm", post(record_and_respond))
            .route("/run-system", post(record_and_respond))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock downstream");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Mock downstream failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Number of invocations received so far
    pub fn calls(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// The only request received, panics otherwise
    pub fn single_request(&self) -> RecordedRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "Expected exactly one downstream call");
        requests.into_iter().next().unwrap()
    }
}

impl Drop for MockDownstream {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

async fn record_and_respond(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        content_type: header_string(&headers, header::CONTENT_TYPE),
        content_length: header_string(&headers, header::CONTENT_LENGTH)
            .and_then(|v| v.parse().ok()),
        transfer_encoding: header_string(&headers, header::TRANSFER_ENCODING),
        body: body.to_vec(),
    });

    let chunks = match &state.script {
        Script::Status(status) => return (*status, "rejected by mock").into_response(),
        Script::Chunks(chunks) => delayed(chunks).boxed(),
        Script::ChunksThenFail(chunks) => delayed(chunks)
            .chain(stream::once(async {
                tokio::time::sleep(Duration::from_millis(CHUNK_DELAY_MS)).await;
                Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "execution aborted",
                ))
            }))
            .boxed(),
        Script::ChunksThenHang(chunks) => delayed(chunks).chain(stream::pending()).boxed(),
    };

    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(chunks),
    )
        .into_response()
}

fn delayed(chunks: &[&'static str]) -> BoxStream<'static, Result<Bytes, std::io::Error>> {
    stream::iter(chunks.to_vec())
        .then(|chunk| async move {
            tokio::time::sleep(Duration::from_millis(CHUNK_DELAY_MS)).await;
            Ok(Bytes::from_static(chunk.as_bytes()))
        })
        .boxed()
}
