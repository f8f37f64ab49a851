//! Translation of an inbound (tool, target) request into the downstream invocation.

use crate::registry::{ToolDefinition, ToolKind, ToolRegistry, TARGET_PLACEHOLDER};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Longest target accepted from a caller, in bytes.
pub const MAX_TARGET_LENGTH: usize = 1024;

pub const RUN_WASM_PATH: &str = "/run-wasm";
pub const RUN_SYSTEM_PATH: &str = "/run-system";

/// Client errors, reported before any downstream call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unknown tool")]
    UnknownTool(String),

    #[error("Unsupported tool type")]
    UnsupportedToolType(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(&'static str),
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

/// Body of the downstream call.
///
/// Serializes to exactly `{"module":..,"target":..}` or `{"cmd":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InvocationPayload {
    Wasm { module: String, target: String },
    System { cmd: String },
}

impl InvocationPayload {
    pub fn resolve(definition: &ToolDefinition, target: &str) -> Result<Self, ResolveError> {
        validate_target(target)?;
        match (&definition.kind, &definition.module, &definition.cmd) {
            (ToolKind::Wasm, Some(module), _) => Ok(InvocationPayload::Wasm {
                module: module.clone(),
                target: target.to_string(),
            }),
            (ToolKind::System, _, Some(template)) => Ok(InvocationPayload::System {
                cmd: render_command(template, target)?,
            }),
            _ => Err(ResolveError::UnsupportedToolType(definition.kind.to_string())),
        }
    }

    /// Path on the downstream service handling this kind of invocation.
    pub fn endpoint(&self) -> &'static str {
        match self {
            InvocationPayload::Wasm { .. } => RUN_WASM_PATH,
            InvocationPayload::System { .. } => RUN_SYSTEM_PATH,
        }
    }

    pub fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Looks up `tool_id` and builds its invocation for `target`.
pub fn resolve_invocation(
    registry: &ToolRegistry,
    tool_id: &str,
    target: &str,
) -> Result<InvocationPayload, ResolveError> {
    let definition = registry
        .find(tool_id)
        .ok_or_else(|| ResolveError::UnknownTool(tool_id.to_string()))?;
    InvocationPayload::resolve(definition, target)
}

fn validate_target(target: &str) -> Result<(), ResolveError> {
    if target.len() > MAX_TARGET_LENGTH {
        return Err(ResolveError::InvalidTarget("too long"));
    }
    if target.chars().any(char::is_control) {
        return Err(ResolveError::InvalidTarget("control characters are not allowed"));
    }
    Ok(())
}

/// The downstream runs `cmd` through a shell, so the target is substituted
/// as a single quoted word.
fn render_command(template: &str, target: &str) -> Result<String, ResolveError> {
    let quoted = shlex::try_quote(target)
        .map_err(|_| ResolveError::InvalidTarget("cannot be quoted for a shell"))?;
    Ok(template.replace(TARGET_PLACEHOLDER, &quoted))
}
