use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderName},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::{log_requests, state::*, ServerConfig};
use crate::registry::ToolRegistry;
use crate::relay::{relay, resolve_invocation, ExecutionService};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub tools_count: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct StreamQuery {
    pub tool: String,
    pub target: String,
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        tools_count: state.tool_registry.len(),
    };
    Json(stats)
}

async fn get_tools(State(tool_registry): State<GuardedToolRegistry>) -> Json<ToolRegistry> {
    Json(tool_registry.as_ref().clone())
}

/// GET /stream?tool=<id>&target=<target>
///
/// Unknown tools, unsupported kinds and invalid targets are rejected with 400
/// before the execution service is contacted. Anything that goes wrong after
/// that is reported inside the event stream.
async fn stream_tool(
    State(tool_registry): State<GuardedToolRegistry>,
    State(execution_service): State<GuardedExecutionService>,
    Query(query): Query<StreamQuery>,
) -> Response {
    let payload = match resolve_invocation(&tool_registry, &query.tool, &query.target) {
        Ok(payload) => payload,
        Err(err) => {
            info!("Rejected stream request for tool '{}': {}", query.tool, err);
            return err.into_response();
        }
    };

    info!(
        "Relaying tool '{}' to {} for target '{}'",
        query.tool,
        payload.endpoint(),
        query.target
    );

    let body = Body::from_stream(relay(execution_service, payload));
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        body,
    )
        .into_response()
}

pub fn make_app(
    config: ServerConfig,
    tool_registry: Arc<ToolRegistry>,
    execution_service: Arc<dyn ExecutionService>,
) -> Router {
    let state = ServerState {
        config,
        start_time: Instant::now(),
        tool_registry,
        execution_service,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(home))
        .route("/tools", get(get_tools))
        .route("/stream", get(stream_tool))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(
    config: ServerConfig,
    tool_registry: Arc<ToolRegistry>,
    execution_service: Arc<dyn ExecutionService>,
) -> Result<()> {
    let address = format!("{}:{}", config.host, config.port);
    let app = make_app(config, tool_registry, execution_service);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Ready to serve at {}!", address);

    Ok(axum::serve(listener, app).await?)
}
