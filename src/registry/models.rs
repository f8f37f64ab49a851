//! Tool definition models as they appear in the definitions file.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder substituted with the caller's target in `system` command templates.
pub const TARGET_PLACEHOLDER: &str = "{TARGET}";

/// How a tool is executed by the downstream service.
///
/// Kinds the relay does not know about are kept verbatim so that the request
/// path can report them as unsupported instead of refusing the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ToolKind {
    Wasm,
    System,
    Unsupported(String),
}

impl From<String> for ToolKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "wasm" => ToolKind::Wasm,
            "system" => ToolKind::System,
            _ => ToolKind::Unsupported(value),
        }
    }
}

impl From<ToolKind> for String {
    fn from(kind: ToolKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolKind::Wasm => write!(f, "wasm"),
            ToolKind::System => write!(f, "system"),
            ToolKind::Unsupported(name) => write!(f, "{}", name),
        }
    }
}

/// A statically configured tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Identifier, unique across all categories.
    pub id: String,

    #[serde(rename = "type")]
    pub kind: ToolKind,

    /// Display name shown by clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Module reference, required for `wasm` tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    /// Command template containing [`TARGET_PLACEHOLDER`], required for `system` tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,

    /// Any other field of the definitions file, returned as-is by `/tools`.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ToolDefinition {
    pub fn wasm(id: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ToolKind::Wasm,
            name: None,
            description: None,
            module: Some(module.into()),
            cmd: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn system(id: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ToolKind::System,
            name: None,
            description: None,
            module: None,
            cmd: Some(cmd.into()),
            extra: serde_json::Map::new(),
        }
    }
}
