// Tool service - business logic for tool listing and execution

use chrono::{SecondsFormat, Utc};
use crewbridge_core::{
    normalize, registry, synthesize_query, FlowCache, FlowError, FlowInputs, NormalizedOutput,
    ToolId,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info};
use uuid::Uuid;

use crate::common::{ToolExecuteRequest, ToolExecuteResponse, ToolListResponse};

/// Characters of the flow's message echoed into the request log
const LOG_PREVIEW_CHARS: usize = 200;

/// Why an execution failed
enum ExecutionFailure {
    /// Flow handle could not be obtained
    Configuration(FlowError),
    /// Flow was obtained but the invocation failed
    Execution(FlowError),
}

pub struct ToolService {
    flows: Arc<FlowCache>,
    /// Bounds concurrent flow invocations when set
    permits: Option<Arc<Semaphore>>,
}

impl ToolService {
    pub fn new(flows: Arc<FlowCache>, max_concurrent_flows: Option<usize>) -> Self {
        Self {
            flows,
            permits: max_concurrent_flows.map(|limit| Arc::new(Semaphore::new(limit))),
        }
    }

    /// Registered tools and their flows
    pub fn list(&self) -> ToolListResponse {
        let tools: Vec<String> = registry::tool_names()
            .into_iter()
            .map(String::from)
            .collect();
        let mappings = ToolId::ALL
            .iter()
            .map(|tool| (tool.as_str().to_string(), tool.flow()))
            .collect();
        ToolListResponse {
            total: tools.len(),
            tools,
            mappings,
        }
    }

    /// Execute a tool call through the flow.
    ///
    /// Never fails: every outcome is reported in the response envelope.
    pub async fn execute(&self, req: ToolExecuteRequest) -> ToolExecuteResponse {
        let started = Instant::now();
        let execution_id = Uuid::now_v7();

        info!(
            %execution_id,
            tool_id = %req.tool_id,
            params = %serde_json::Value::Object(req.params.clone()),
            "Tool execution request"
        );

        let Some(tool) = ToolId::parse(&req.tool_id) else {
            let available = registry::tool_names();
            let message = format!(
                "Unknown tool ID: {}. Available tools: [{}]",
                req.tool_id,
                available
                    .iter()
                    .map(|name| format!("'{}'", name))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            error!(%execution_id, "{}", message);
            return ToolExecuteResponse::failure(
                message,
                Some(json!({ "available_tools": available })),
            );
        };

        let user_query = match req.user_query {
            Some(query) if !query.is_empty() => query,
            _ => synthesize_query(tool.as_str(), &req.params),
        };
        let flow_name = tool.flow();
        info!(%execution_id, %user_query, crew_name = %flow_name, "Routing to flow");

        match self.run(FlowInputs::for_tool(user_query, flow_name)).await {
            Ok(output) => {
                let elapsed = started.elapsed().as_secs_f64();
                let preview: String = output
                    .message()
                    .unwrap_or("N/A")
                    .chars()
                    .take(LOG_PREVIEW_CHARS)
                    .collect();
                info!(%execution_id, elapsed_secs = elapsed, response = %preview, "Execution completed");

                ToolExecuteResponse::success(
                    output,
                    json!({
                        "tool_id": tool.as_str(),
                        "crew_name": flow_name,
                        "flow_name": flow_name,
                        "execution_id": execution_id,
                        "execution_time_seconds": elapsed,
                        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
                    }),
                )
            }
            Err(ExecutionFailure::Configuration(e)) => {
                let message = format!("Configuration error: {}", e);
                error!(%execution_id, "{}", message);
                ToolExecuteResponse::failure(message, None)
            }
            Err(ExecutionFailure::Execution(e)) => {
                let message = format!("Error executing tool {}: {}", req.tool_id, e);
                error!(%execution_id, error = ?e, "Tool execution failed");
                let traceback = format!("{:?}", anyhow::Error::new(e));
                ToolExecuteResponse::failure(message, Some(json!({ "traceback": traceback })))
            }
        }
    }

    /// Obtain the flow and run it on the blocking pool
    async fn run(&self, inputs: FlowInputs) -> Result<NormalizedOutput, ExecutionFailure> {
        let flow = self
            .flows
            .get_or_init()
            .await
            .map_err(ExecutionFailure::Configuration)?;

        // The permit moves into the blocking task so it is held for the whole
        // invocation, even if this future is dropped first
        let permit = match &self.permits {
            Some(permits) => Some(permits.clone().acquire_owned().await.map_err(|e| {
                ExecutionFailure::Execution(FlowError::invocation(format!(
                    "invocation limiter closed: {}",
                    e
                )))
            })?),
            None => None,
        };

        let output = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            flow.kickoff(&inputs)
        })
        .await
        .map_err(|e| ExecutionFailure::Execution(FlowError::from_join(e)))?
        .map_err(ExecutionFailure::Execution)?;

        Ok(normalize(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewbridge_core::{ApiKeySource, Flow, FlowBuilder, FlowOutput, Result as FlowResult};
    use serde_json::{Map, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records inputs and answers with a canned output
    #[derive(Default)]
    struct RecordingFlow {
        seen: Mutex<Vec<FlowInputs>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Duration,
    }

    impl Flow for RecordingFlow {
        fn kickoff(&self, inputs: &FlowInputs) -> FlowResult<FlowOutput> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.seen.lock().unwrap().push(inputs.clone());
            match inputs.user_query.as_str() {
                "explode" => panic!("crew crashed"),
                "fail" => Err(FlowError::invocation("calendar API quota exceeded")),
                _ => Ok(FlowOutput::Text(format!("done: {}", inputs.user_query))),
            }
        }
    }

    struct Fixed(Arc<RecordingFlow>);

    impl FlowBuilder for Fixed {
        fn build(&self, _api_key: &str) -> FlowResult<Arc<dyn Flow>> {
            Ok(self.0.clone())
        }
    }

    fn service_with(
        flow: Arc<RecordingFlow>,
        key: Option<&str>,
        limit: Option<usize>,
    ) -> ToolService {
        let cache = FlowCache::with_api_key_source(
            Arc::new(Fixed(flow)),
            ApiKeySource::Static(key.map(String::from)),
        );
        ToolService::new(Arc::new(cache), limit)
    }

    fn request(tool_id: &str, params: Value, user_query: Option<&str>) -> ToolExecuteRequest {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        ToolExecuteRequest {
            tool_id: tool_id.to_string(),
            params,
            user_query: user_query.map(String::from),
        }
    }

    #[test]
    fn test_list() {
        let service = service_with(Arc::default(), Some("sk-test"), None);
        let list = service.list();
        assert_eq!(list.total, ToolId::ALL.len());
        assert_eq!(list.tools.len(), list.total);
        assert_eq!(list.mappings.len(), list.total);
        assert_eq!(list.tools[0], "google_calendar_create");
    }

    #[tokio::test]
    async fn test_execute_synthesizes_query_and_passes_flow_names() {
        let flow = Arc::new(RecordingFlow::default());
        let service = service_with(flow.clone(), Some("sk-test"), None);

        let resp = service
            .execute(request(
                "google_calendar_create",
                json!({
                    "summary": "Standup",
                    "start": {"dateTime": "2024-01-01T09:00:00"},
                    "end": {"dateTime": "2024-01-01T09:30:00"}
                }),
                None,
            ))
            .await;

        assert!(resp.success, "{:?}", resp.error);
        let seen = flow.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].user_query.contains("Create calendar event: Standup"));
        assert!(seen[0].user_query.contains("from 2024-01-01T09:00:00"));
        assert!(seen[0].user_query.contains("to 2024-01-01T09:30:00"));
        assert_eq!(seen[0].crew_name, seen[0].flow_name);
        assert_eq!(seen[0].flow_name.as_str(), "EVENT_MANAGEMENT_FLOW");

        let metadata = resp.metadata.unwrap();
        assert_eq!(metadata["tool_id"], "google_calendar_create");
        assert_eq!(metadata["crew_name"], "EVENT_MANAGEMENT_FLOW");
        assert!(metadata["execution_time_seconds"].is_f64());
        assert!(metadata["timestamp"].is_string());

        let output = serde_json::to_value(resp.output.unwrap()).unwrap();
        assert_eq!(output["status"], "success");
        assert!(output["message"]
            .as_str()
            .unwrap()
            .starts_with("done: Create calendar event: Standup"));
    }

    #[tokio::test]
    async fn test_execute_prefers_user_query() {
        let flow = Arc::new(RecordingFlow::default());
        let service = service_with(flow.clone(), Some("sk-test"), None);

        service
            .execute(request("gmail_read", json!({}), Some("What's new in my inbox?")))
            .await;
        service.execute(request("gmail_read", json!({}), Some(""))).await;

        let seen = flow.seen.lock().unwrap();
        assert_eq!(seen[0].user_query, "What's new in my inbox?");
        assert_eq!(
            seen[1].user_query,
            "Read unread emails from the last 24 hours, maximum 10 results"
        );
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let flow = Arc::new(RecordingFlow::default());
        let service = service_with(flow.clone(), Some("sk-test"), None);

        let resp = service
            .execute(request("not_a_real_tool", json!({}), None))
            .await;

        assert!(!resp.success);
        let error = resp.error.unwrap();
        assert!(error.contains("Unknown tool ID: not_a_real_tool"));
        assert!(error.contains("'gmail_send'"));
        assert_eq!(
            resp.metadata.unwrap()["available_tools"]
                .as_array()
                .unwrap()
                .len(),
            ToolId::ALL.len()
        );
        assert!(flow.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let service = service_with(Arc::default(), None, None);
        let resp = service.execute(request("gmail_read", json!({}), None)).await;

        assert!(!resp.success);
        assert_eq!(
            resp.error.as_deref(),
            Some("Configuration error: OPENAI_API_KEY not set in environment variables")
        );
        assert!(resp.metadata.is_none());
    }

    #[tokio::test]
    async fn test_flow_error_carries_traceback() {
        let service = service_with(Arc::default(), Some("sk-test"), None);
        let resp = service
            .execute(request("gmail_search", json!({}), Some("fail")))
            .await;

        assert!(!resp.success);
        let error = resp.error.unwrap();
        assert!(error.starts_with("Error executing tool gmail_search: "));
        assert!(error.contains("calendar API quota exceeded"));
        let traceback = resp.metadata.unwrap()["traceback"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(traceback.contains("calendar API quota exceeded"));
    }

    #[tokio::test]
    async fn test_flow_panic_is_contained() {
        let service = service_with(Arc::default(), Some("sk-test"), None);
        let resp = service
            .execute(request("gmail_search", json!({}), Some("explode")))
            .await;

        assert!(!resp.success);
        assert!(resp.error.unwrap().contains("crew crashed"));
        assert!(resp.metadata.unwrap()["traceback"]
            .as_str()
            .unwrap()
            .contains("crew crashed"));

        // The service keeps working after a panic
        let resp = service.execute(request("gmail_read", json!({}), None)).await;
        assert!(resp.success);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_limit_is_enforced() {
        let flow = Arc::new(RecordingFlow {
            delay: Duration::from_millis(30),
            ..Default::default()
        });
        let service = Arc::new(service_with(flow.clone(), Some("sk-test"), Some(2)));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .execute(request("google_drive_list", json!({}), None))
                        .await
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().success);
        }

        assert_eq!(flow.seen.lock().unwrap().len(), 6);
        assert!(flow.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_limit_holds_for_cancelled_callers() {
        let flow = Arc::new(RecordingFlow {
            delay: Duration::from_millis(200),
            ..Default::default()
        });
        let service = Arc::new(service_with(flow.clone(), Some("sk-test"), Some(1)));

        let spawn_execute = |service: Arc<ToolService>| {
            tokio::spawn(async move {
                service
                    .execute(request("google_drive_list", json!({}), None))
                    .await
            })
        };

        // Client goes away while its invocation is still running
        let abandoned = spawn_execute(service.clone());
        tokio::time::sleep(Duration::from_millis(30)).await;
        abandoned.abort();
        assert!(abandoned.await.unwrap_err().is_cancelled());

        let follow_ups: Vec<_> = (0..2).map(|_| spawn_execute(service.clone())).collect();
        for handle in follow_ups {
            assert!(handle.await.unwrap().success);
        }

        assert_eq!(flow.seen.lock().unwrap().len(), 3);
        assert_eq!(flow.max_in_flight.load(Ordering::SeqCst), 1);
    }
}
