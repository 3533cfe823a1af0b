//! Tool Catalog Adapter.
//!
//! Lists the backend's tools once per run and converts them to the shape the
//! model request expects. The conversion keeps every tool, keeps its name,
//! defaults a missing description to `""` and passes the schema through.

use std::collections::HashSet;

use formscout_core::error::BackendError;
use formscout_core::provider::ToolDefinition;
use formscout_core::tool::{ToolBackend, ToolDescriptor};
use tracing::{info, warn};

/// The immutable tool catalog for one run.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    descriptors: Vec<ToolDescriptor>,
    definitions: Vec<ToolDefinition>,
}

impl ToolCatalog {
    /// Query the backend. Any failure, or a listing with duplicate names,
    /// is reported as [`BackendError::Unavailable`].
    pub async fn fetch(backend: &dyn ToolBackend) -> Result<Self, BackendError> {
        let descriptors = backend.list_tools().await.map_err(|e| match e {
            BackendError::Unavailable(msg) => BackendError::Unavailable(msg),
            other => BackendError::Unavailable(other.to_string()),
        })?;

        let mut seen = HashSet::new();
        for d in &descriptors {
            if !seen.insert(d.name.as_str()) {
                return Err(BackendError::Unavailable(format!(
                    "malformed tool listing: duplicate tool name '{}'",
                    d.name
                )));
            }
        }

        if descriptors.is_empty() {
            warn!(backend = %backend.name(), "Backend advertised no tools");
        }

        let catalog = Self::from_descriptors(descriptors);
        info!(
            backend = %backend.name(),
            count = catalog.len(),
            tools = %catalog.names().join(", "),
            "Fetched tool catalog"
        );
        Ok(catalog)
    }

    pub fn from_descriptors(descriptors: Vec<ToolDescriptor>) -> Self {
        let definitions = to_definitions(&descriptors);
        Self {
            descriptors,
            definitions,
        }
    }

    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    /// The catalog in model request form.
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

pub fn to_definition(descriptor: &ToolDescriptor) -> ToolDefinition {
    ToolDefinition {
        name: descriptor.name.clone(),
        description: descriptor.description.clone().unwrap_or_default(),
        input_schema: descriptor.input_schema.clone(),
    }
}

pub fn to_definitions(descriptors: &[ToolDescriptor]) -> Vec<ToolDefinition> {
    descriptors.iter().map(to_definition).collect()
}
