//! Static tool definitions, loaded once at startup.

mod models;
mod tool_registry;

pub use models::{ToolDefinition, ToolKind, TARGET_PLACEHOLDER};
pub use tool_registry::{RegistryError, ToolRegistry};
