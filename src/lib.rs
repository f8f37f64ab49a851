//! Tool relay
//!
//! Resolves `(tool, target)` requests against a static tool registry and
//! relays the execution service's streamed output to the caller as
//! server-sent events.

pub mod config;
pub mod registry;
pub mod relay;
pub mod server;

// Re-export commonly used types for convenience
pub use registry::{ToolDefinition, ToolKind, ToolRegistry};
pub use relay::{ExecutionService, HttpExecutionService};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
