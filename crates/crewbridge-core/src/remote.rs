// Remote flow client
//
// Talks to an agent flow served over HTTP. The flow contract is blocking, so the
// handle captures the runtime it was built on and drives the async client from
// the blocking pool with `Handle::block_on`.

use reqwest::{Client, Url};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

use crate::error::{FlowError, Result};
use crate::flow::{Flow, FlowBuilder, FlowInputs, FLOW_DISPLAY_NAME};
use crate::result::FlowOutput;

pub const DEFAULT_KICKOFF_URL: &str = "http://127.0.0.1:8000/kickoff";

/// Builds `RemoteFlow` handles for a kickoff endpoint
#[derive(Debug, Clone)]
pub struct RemoteFlowBuilder {
    kickoff_url: String,
    timeout: Option<Duration>,
}

impl RemoteFlowBuilder {
    pub fn new(kickoff_url: impl Into<String>) -> Self {
        Self {
            kickoff_url: kickoff_url.into(),
            timeout: None,
        }
    }

    /// Per-request timeout. Unset means wait for the flow indefinitely.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn kickoff_url(&self) -> &str {
        &self.kickoff_url
    }
}

impl Default for RemoteFlowBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_KICKOFF_URL)
    }
}

impl FlowBuilder for RemoteFlowBuilder {
    fn build(&self, api_key: &str) -> Result<Arc<dyn Flow>> {
        let url = Url::parse(&self.kickoff_url).map_err(|e| {
            FlowError::init(format!("invalid kickoff URL {}: {}", self.kickoff_url, e))
        })?;

        let handle = Handle::try_current()
            .map_err(|e| FlowError::init(format!("no async runtime available: {}", e)))?;

        let mut client = Client::builder();
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }
        let client = client
            .build()
            .map_err(|e| FlowError::init(format!("failed to build HTTP client: {}", e)))?;

        Ok(Arc::new(RemoteFlow {
            client,
            handle,
            url,
            api_key: api_key.to_string(),
        }))
    }
}

/// Flow handle backed by an HTTP kickoff endpoint
pub struct RemoteFlow {
    client: Client,
    handle: Handle,
    url: Url,
    api_key: String,
}

impl RemoteFlow {
    async fn send(&self, inputs: &FlowInputs) -> Result<FlowOutput> {
        debug!(url = %self.url, flow = %inputs.flow_name, "Sending flow kickoff");

        let response = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.api_key)
            .json(&json!({
                "name": FLOW_DISPLAY_NAME,
                "inputs": inputs,
            }))
            .send()
            .await
            .map_err(|e| FlowError::invocation(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FlowError::InvalidResponse(format!("unreadable body: {}", e)))?;

        if !status.is_success() {
            return Err(FlowError::invocation(format!(
                "flow returned {}: {}",
                status, body
            )));
        }

        Ok(match serde_json::from_str::<Value>(&body) {
            Ok(value) => FlowOutput::from_json(value),
            Err(_) => FlowOutput::Text(body),
        })
    }
}

impl Flow for RemoteFlow {
    fn kickoff(&self, inputs: &FlowInputs) -> Result<FlowOutput> {
        self.handle.block_on(self.send(inputs))
    }
}
