//! Resolves tool-call requests through the registry and runs them.

use super::ToolRegistry;
use crate::conversation::ToolCallRequest;
use crate::error::{Result, SwellError};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

/// How a single tool call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCallStatus {
    Succeeded,
    UnknownTool,
    Failed,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Correlation id of the request.
    pub id: String,
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: serde_json::Value,
    /// Observation returned to the model (tool output or error text).
    pub output: String,
    pub status: ToolCallStatus,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

/// Runs tool-call requests against a shared registry.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    parallel: bool,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            parallel: false,
        }
    }

    /// Run the calls of one batch concurrently instead of one after another.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Look up and run a single request.
    pub async fn execute(&self, request: &ToolCallRequest) -> Result<String> {
        let tool = self.registry.lookup(&request.name)?;
        Ok(tool.execute(&request.arguments).await?)
    }

    /// Run a batch of requests and return one record per request, in request order.
    ///
    /// Failures are captured in the records; one bad request never prevents
    /// the rest of the batch from being answered.
    pub async fn execute_batch(&self, requests: &[ToolCallRequest]) -> Vec<ToolCallRecord> {
        if self.parallel && requests.len() > 1 {
            join_all(requests.iter().map(|request| self.execute_call(request))).await
        } else {
            let mut records = Vec::with_capacity(requests.len());
            for request in requests {
                records.push(self.execute_call(request).await);
            }
            records
        }
    }

    async fn execute_call(&self, request: &ToolCallRequest) -> ToolCallRecord {
        info!("Agent calling tool: {} with args: {}", request.name, request.arguments);

        let (output, status) = match self.execute(request).await {
            Ok(output) => (output, ToolCallStatus::Succeeded),
            Err(e @ SwellError::UnknownTool(_)) => {
                warn!(id = %request.id, "{}", e);
                (format!("Error: {}", e), ToolCallStatus::UnknownTool)
            }
            Err(e) => {
                warn!(id = %request.id, tool = %request.name, "{}", e);
                (format!("Error: {}", e), ToolCallStatus::Failed)
            }
        };

        ToolCallRecord {
            id: request.id.clone(),
            name: request.name.clone(),
            arguments: request.arguments.clone(),
            output,
            status,
        }
    }
}
