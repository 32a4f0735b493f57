// Tool-call bridging core
//
// Turns structured Google Workspace tool calls into natural-language queries for an
// external agent flow and normalizes whatever the flow returns.
//
// Key design decisions:
// - Tool identifiers are a closed enum (registry); parameters are parsed into a
//   typed record per tool (query) so query templates are checked at compile time
// - Flow results are an explicit sum type (result) instead of runtime shape probing
// - The flow itself is behind the Flow/FlowBuilder traits; RemoteFlow is the HTTP backend
// - FlowCache builds the flow once per process, synchronized across concurrent callers

pub mod cache;
pub mod error;
pub mod flow;
pub mod query;
pub mod registry;
pub mod remote;
pub mod result;

// Re-exports for convenience
pub use cache::{ApiKeySource, FlowCache, API_KEY_ENV};
pub use error::{FlowError, Result};
pub use flow::{Flow, FlowBuilder, FlowInputs, FLOW_DISPLAY_NAME};
pub use query::{synthesize_query, ToolParams};
pub use registry::{FlowName, ToolId};
pub use remote::{RemoteFlow, RemoteFlowBuilder, DEFAULT_KICKOFF_URL};
pub use result::{normalize, FlowOutput, NormalizedOutput, ResultEnvelope};
