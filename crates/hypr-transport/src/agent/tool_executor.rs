//! Tool executor: look up → execute → record.

use std::time::Instant;

use metrics::{counter, histogram};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::errors::ToolError;
use crate::tools::{ToolContext, ToolRegistry};

/// A tool call issued by the model during a step.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCall {
    /// Call ID.
    pub tool_call_id: String,
    /// Tool name.
    pub tool_name: String,
    /// Arguments.
    pub input: Value,
}

/// Run one tool call.
///
/// Unknown tools and execution failures come back as `Err`; the caller
/// reports them to the model and the UI and keeps looping.
#[instrument(skip_all, fields(tool_name = %call.tool_name, tool_call_id = %call.tool_call_id))]
pub async fn execute_tool(
    call: &ToolCall,
    registry: &ToolRegistry,
    chat_id: &str,
    cancel: &CancellationToken,
) -> Result<Value, ToolError> {
    let start = Instant::now();

    let Some(tool) = registry.get(&call.tool_name) else {
        warn!("tool not found");
        counter!("chat_tool_calls_total", "tool" => call.tool_name.clone(), "status" => "not_found").increment(1);
        return Err(ToolError::NotFound(call.tool_name.clone()));
    };

    if cancel.is_cancelled() {
        return Err(ToolError::Cancelled);
    }

    let ctx = ToolContext {
        tool_call_id: call.tool_call_id.clone(),
        chat_id: chat_id.to_owned(),
        cancellation: cancel.clone(),
    };
    let result = tool.execute(call.input.clone(), &ctx).await;

    let status = if result.is_ok() { "ok" } else { "error" };
    counter!("chat_tool_calls_total", "tool" => call.tool_name.clone(), "status" => status).increment(1);
    histogram!("chat_tool_duration_seconds", "tool" => call.tool_name.clone())
        .record(start.elapsed().as_secs_f64());

    match &result {
        Ok(_) => debug!(elapsed_ms = start.elapsed().as_millis() as u64, "tool completed"),
        Err(e) => warn!(error = %e, "tool failed"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::model::ToolDefinition;
    use crate::tools::Tool;

    struct Failing;

    #[async_trait]
    impl Tool for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "failing".into(),
                description: String::new(),
                parameters: json!({}),
            }
        }

        async fn execute(&self, _input: Value, _ctx: &ToolContext) -> Result<Value, ToolError> {
            Err(ToolError::Execution("index unavailable".into()))
        }
    }

    fn call(name: &str) -> ToolCall {
        ToolCall {
            tool_call_id: "call-1".into(),
            tool_name: name.into(),
            input: json!({}),
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let result = execute_tool(&call("missing"), &ToolRegistry::new(), "chat", &CancellationToken::new()).await;
        assert_matches!(result, Err(ToolError::NotFound(name)) if name == "missing");
    }

    #[tokio::test]
    async fn execution_error_is_returned() {
        let registry = ToolRegistry::new().with(Arc::new(Failing));
        let result = execute_tool(&call("failing"), &registry, "chat", &CancellationToken::new()).await;
        assert_eq!(result.unwrap_err().to_string(), "index unavailable");
    }

    #[tokio::test]
    async fn cancelled_before_execution() {
        let registry = ToolRegistry::new().with(Arc::new(Failing));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = execute_tool(&call("failing"), &registry, "chat", &cancel).await;
        assert_matches!(result, Err(ToolError::Cancelled));
    }
}
