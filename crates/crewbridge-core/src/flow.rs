// Flow contract
//
// Design Decision: The agent flow is an external collaborator. The core only
// depends on these two traits so the API layer and tests can plug in any backend.
// Both calls are blocking; async callers must run them on the blocking pool.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::registry::FlowName;
use crate::result::FlowOutput;

/// Display name handed to flow backends
pub const FLOW_DISPLAY_NAME: &str = "Google Suite Flow";

/// Argument bundle passed to every flow kickoff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowInputs {
    pub user_query: String,
    pub crew_name: FlowName,
    pub flow_name: FlowName,
}

impl FlowInputs {
    /// Inputs for a tool call; crew and flow name are the same mapped flow
    pub fn for_tool(user_query: impl Into<String>, flow: FlowName) -> Self {
        Self {
            user_query: user_query.into(),
            crew_name: flow,
            flow_name: flow,
        }
    }
}

/// Handle to an external orchestration flow
pub trait Flow: Send + Sync {
    /// Run the flow to completion. Blocking.
    fn kickoff(&self, inputs: &FlowInputs) -> Result<FlowOutput>;
}

/// Constructs flow handles. Construction may be slow (seconds).
pub trait FlowBuilder: Send + Sync {
    /// Build a flow using the given API key. Blocking.
    fn build(&self, api_key: &str) -> Result<Arc<dyn Flow>>;
}
