use axum::extract::FromRef;

use crate::registry::ToolRegistry;
use crate::relay::ExecutionService;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedToolRegistry = Arc<ToolRegistry>;
pub type GuardedExecutionService = Arc<dyn ExecutionService>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub tool_registry: GuardedToolRegistry,
    pub execution_service: GuardedExecutionService,
}

impl FromRef<ServerState> for GuardedToolRegistry {
    fn from_ref(input: &ServerState) -> Self {
        input.tool_registry.clone()
    }
}

impl FromRef<ServerState> for GuardedExecutionService {
    fn from_ref(input: &ServerState) -> Self {
        input.execution_service.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
