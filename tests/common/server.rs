//! Test server lifecycle management
//!
//! Each test gets an isolated relay with its own definitions file, pointed at
//! whatever execution service the test provides.

use super::constants::*;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::net::TcpListener;
use tool_relay::relay::{ExecutionService, HttpExecutionService};
use tool_relay::server::{make_app, RequestsLoggingLevel, ServerConfig};
use tool_relay::ToolRegistry;

/// Relay instance under test
///
/// When dropped, the server gracefully shuts down and the definitions file is removed.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    // Private fields - keep resources alive until drop
    _tools_file: NamedTempFile,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a relay forwarding to `downstream_url` with the default timeout
    pub async fn spawn(downstream_url: &str) -> Self {
        Self::spawn_with_timeout(downstream_url, DOWNSTREAM_TIMEOUT_SECS).await
    }

    /// Spawns a relay on a random port
    ///
    /// This function:
    /// 1. Writes the test tool definitions to a temporary file
    /// 2. Loads the registry from it, like the binary does
    /// 3. Binds to a random port (127.0.0.1:0)
    /// 4. Spawns the server in a background task
    /// 5. Waits for the server to be ready
    ///
    /// # Panics
    ///
    /// Panics if any of the steps above fails.
    pub async fn spawn_with_timeout(downstream_url: &str, timeout_secs: u64) -> Self {
        let mut tools_file = NamedTempFile::new().expect("Failed to create tools file");
        tools_file
            .write_all(TEST_TOOLS_JSON.as_bytes())
            .expect("Failed to write tools file");

        let tool_registry =
            Arc::new(ToolRegistry::load(tools_file.path()).expect("Failed to load test tools"));
        let execution_service: Arc<dyn ExecutionService> = Arc::new(HttpExecutionService::new(
            downstream_url.to_string(),
            timeout_secs,
        ));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            host: "127.0.0.1".to_string(),
            port,
        };
        let app = make_app(config, tool_registry, execution_service);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            _tools_file: tools_file,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the / endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .no_proxy()
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
