// Google Suite tool HTTP routes
//
// Design Decision: Semantic failures (unknown tool, configuration, flow errors) are
// reported with HTTP 200 and success=false so automation builders always get an
// envelope they can branch on. Only malformed requests use non-2xx statuses.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::common::{ErrorResponse, ToolExecuteRequest, ToolExecuteResponse, ToolListResponse};
use crate::error::ApiError;
use crate::services::ToolService;

/// App state for tool routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ToolService>,
}

impl AppState {
    pub fn new(service: Arc<ToolService>) -> Self {
        Self { service }
    }
}

/// Create tool routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/tools/google-suite/list", get(list_tools))
        .route("/api/tools/google-suite/execute", post(execute_tool))
        .with_state(state)
}

/// GET /api/tools/google-suite/list - List available Google Suite tools
#[utoipa::path(
    get,
    path = "/api/tools/google-suite/list",
    responses(
        (status = 200, description = "Registered tools and their flows", body = ToolListResponse),
    ),
    tag = "tools"
)]
pub async fn list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    Json(state.service.list())
}

/// POST /api/tools/google-suite/execute - Execute a Google Suite tool via the agent flow
#[utoipa::path(
    post,
    path = "/api/tools/google-suite/execute",
    request_body = ToolExecuteRequest,
    responses(
        (status = 200, description = "Execution result (check `success`)", body = ToolExecuteResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 422, description = "Request body does not match the schema", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "tools"
)]
pub async fn execute_tool(
    State(state): State<AppState>,
    payload: Result<Json<ToolExecuteRequest>, JsonRejection>,
) -> Result<Json<ToolExecuteResponse>, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::warn!("Rejected tool execution request: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;

    Ok(Json(state.service.execute(req).await))
}
