// Crewbridge API server
// Decision: Bridges automation-builder tool calls (Sim, Flowise) to an agent flow
// Decision: The flow is built lazily on the first execution request, not at startup

mod common;
mod config;
mod error;
mod services;
mod tools;

use anyhow::{Context, Result};
use axum::{routing::get, Json, Router};
use chrono::{SecondsFormat, Utc};
use crewbridge_core::{registry, FlowCache, FlowName, RemoteFlowBuilder, ToolId};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::common::{
    ErrorResponse, HealthResponse, ToolExecuteRequest, ToolExecuteResponse, ToolListResponse,
};
use crate::config::ServerConfig;
use crate::services::ToolService;

pub const SERVICE_NAME: &str = "CrewAI Tool Wrapper API";

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    ),
    tag = "health"
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        tools::list_tools,
        tools::execute_tool,
    ),
    components(
        schemas(
            HealthResponse,
            ToolExecuteRequest,
            ToolExecuteResponse,
            ToolListResponse,
            ErrorResponse,
            FlowName,
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "tools", description = "Google Suite tool listing and execution")
    ),
    info(
        title = "CrewAI Tool Wrapper API",
        version = "1.0.0",
        description = "REST API for integrating CrewAI flows with Sim/Flowise blocks",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

/// Assemble the full application router (extracted for testing)
fn build_app(service: Arc<ToolService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(tools::routes(tools::AppState::new(service)))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(error::not_found)
        .layer(CatchPanicLayer::custom(error::panic_response))
        // Builders call from arbitrary origins
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
}

fn log_startup(config: &ServerConfig) {
    let status = |set: bool| if set { "[OK] Set" } else { "[ERROR] Missing" };
    tracing::info!("crewbridge-api starting...");
    tracing::info!(environment = %config.environment, "Environment");
    tracing::info!("OpenAI API Key: {}", status(config.api_key_set));
    tracing::info!("Gmail SMTP Email: {}", status(config.smtp_email_set));
    tracing::info!(tools = ToolId::ALL.len(), "Available tools");
    tracing::info!(
        kickoff_url = %config.flow_kickoff_url,
        timeout = ?config.flow_timeout,
        max_concurrent = ?config.max_concurrent_flows,
        "Flow will be initialized on first request (lazy loading)"
    );
    if !config.api_key_set {
        tracing::warn!("OPENAI_API_KEY is not set; tool execution will fail until it is");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env().context("Invalid server configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.default_log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    log_startup(&config);

    let mut builder = RemoteFlowBuilder::new(config.flow_kickoff_url.clone());
    if let Some(timeout) = config.flow_timeout {
        builder = builder.with_timeout(timeout);
    }
    let flows = Arc::new(FlowCache::new(Arc::new(builder)));
    let service = Arc::new(ToolService::new(flows, config.max_concurrent_flows));

    let app = build_app(service);

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("Listening on {}", addr);
    tracing::info!("API documentation: http://{}/docs", addr);
    tracing::info!(
        tools = registry::tool_names().len(),
        "List tools: http://{}/api/tools/google-suite/list",
        addr
    );

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
