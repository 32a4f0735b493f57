// Public API DTOs
//
// Field names follow what automation builders (Sim, Flowise) send and expect,
// hence the camelCase request body.

use crewbridge_core::{FlowName, NormalizedOutput};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Request to execute a Google Workspace tool
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolExecuteRequest {
    /// Tool identifier (e.g. "google_calendar_create").
    #[schema(example = "gmail_read")]
    pub tool_id: String,
    /// Tool parameters. Shape depends on the tool.
    #[serde(default)]
    #[schema(value_type = Object, example = json!({"hours": 24, "unread_only": true}))]
    pub params: Map<String, Value>,
    /// Natural-language query. Generated from params when absent or empty.
    #[serde(default)]
    pub user_query: Option<String>,
}

/// Result of a tool execution.
/// `success=false` responses still use HTTP 200 and carry the reason in `error`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToolExecuteResponse {
    pub success: bool,
    /// Normalized flow result (`{data, status, message}` or a pass-through object).
    #[schema(value_type = Option<Object>)]
    pub output: Option<NormalizedOutput>,
    pub error: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

impl ToolExecuteResponse {
    pub fn success(output: NormalizedOutput, metadata: Value) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
            metadata: Some(metadata),
        }
    }

    pub fn failure(error: impl Into<String>, metadata: Option<Value>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
            metadata,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub service: String,
    /// UTC timestamp, RFC 3339.
    pub timestamp: String,
    pub version: String,
}

/// Registered tools and the flow each one is routed to
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToolListResponse {
    /// Tool identifiers in registry order.
    pub tools: Vec<String>,
    pub mappings: BTreeMap<String, FlowName>,
    pub total: usize,
}

/// Error body for transport-level failures
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_camel_case_and_defaults() {
        let req: ToolExecuteRequest =
            serde_json::from_value(json!({"toolId": "gmail_read"})).unwrap();
        assert_eq!(req.tool_id, "gmail_read");
        assert!(req.params.is_empty());
        assert_eq!(req.user_query, None);

        let req: ToolExecuteRequest = serde_json::from_value(json!({
            "toolId": "gmail_search",
            "params": {"query": "from:boss"},
            "userQuery": "Find mail from my boss"
        }))
        .unwrap();
        assert_eq!(req.params["query"], "from:boss");
        assert_eq!(req.user_query.as_deref(), Some("Find mail from my boss"));
    }

    #[test]
    fn test_failure_keeps_all_fields() {
        let body = serde_json::to_value(ToolExecuteResponse::failure("nope", None)).unwrap();
        assert_eq!(
            body,
            json!({"success": false, "output": null, "error": "nope", "metadata": null})
        );
    }
}
