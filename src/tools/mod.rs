//! Tools the agent can call, plus the registry and executor that dispatch them.

mod executor;
mod marine;
mod registry;

pub use executor::{ToolCallRecord, ToolCallStatus, ToolExecutor};
pub use marine::{parse_feed, FeedReading, MarineForecast, MarineForecastTool, MissingDataPolicy};
pub use registry::ToolRegistry;

use crate::config::ForecastSettings;
use crate::error::{Result, ToolExecutionError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What a tool tells the model about itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// Unique name within a registry.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// JSON schema for the arguments object.
    pub parameters: serde_json::Value,
}

/// An invocable capability.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Declaration exposed to the model.
    fn declaration(&self) -> &ToolDeclaration;

    /// Run the tool with the model-supplied arguments.
    async fn execute(
        &self,
        arguments: &serde_json::Value,
    ) -> std::result::Result<String, ToolExecutionError>;

    /// Registry key.
    fn name(&self) -> &str {
        &self.declaration().name
    }
}

/// Registry holding the built-in tools.
pub fn default_registry(forecast: &ForecastSettings) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(MarineForecastTool::from_settings(forecast)?))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_declares_marine_tool() {
        let registry = default_registry(&ForecastSettings::default()).unwrap();

        let declarations: Vec<_> = registry.declarations().collect();
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].name, "get_marine_forecast");
        assert_eq!(declarations[0].parameters["required"], serde_json::json!(["buoy_id"]));
    }
}
