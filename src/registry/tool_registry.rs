use super::models::{ToolDefinition, ToolKind};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors that prevent the tool definitions from being loaded.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read tool definitions from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse tool definitions: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate tool id '{id}' (categories '{first}' and '{second}')")]
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },

    #[error("Tool '{0}' is of type wasm but has no module")]
    MissingModule(String),

    #[error("Tool '{0}' is of type system but has no cmd template")]
    MissingCommand(String),
}

/// Immutable snapshot of all tool definitions, grouped by category.
///
/// Categories keep the order of the definitions file. Serializes back to the
/// same `category -> [definition]` shape.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ToolRegistry {
    categories: IndexMap<String, Vec<ToolDefinition>>,
}

impl ToolRegistry {
    /// Reads and validates the definitions file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_json(&content)?;
        info!(
            "Loaded {} tools in {} categories from {:?}",
            registry.len(),
            registry.categories.len(),
            path
        );
        Ok(registry)
    }

    pub fn from_json(content: &str) -> Result<Self, RegistryError> {
        let categories: IndexMap<String, Vec<ToolDefinition>> = serde_json::from_str(content)?;
        Self::from_categories(categories)
    }

    pub fn from_categories(
        categories: IndexMap<String, Vec<ToolDefinition>>,
    ) -> Result<Self, RegistryError> {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for (category, tools) in categories.iter() {
            for tool in tools {
                if let Some(first) = seen.insert(tool.id.as_str(), category.as_str()) {
                    return Err(RegistryError::DuplicateId {
                        id: tool.id.clone(),
                        first: first.to_string(),
                        second: category.clone(),
                    });
                }
                match tool.kind {
                    ToolKind::Wasm if tool.module.is_none() => {
                        return Err(RegistryError::MissingModule(tool.id.clone()))
                    }
                    ToolKind::System if tool.cmd.is_none() => {
                        return Err(RegistryError::MissingCommand(tool.id.clone()))
                    }
                    _ => {}
                }
            }
        }
        Ok(Self { categories })
    }

    pub fn find(&self, id: &str) -> Option<&ToolDefinition> {
        self.categories
            .values()
            .flat_map(|tools| tools.iter())
            .find(|tool| tool.id == id)
    }

    pub fn categories(&self) -> &IndexMap<String, Vec<ToolDefinition>> {
        &self.categories
    }

    /// Total number of tools across all categories.
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
