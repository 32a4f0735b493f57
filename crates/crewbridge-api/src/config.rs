// Server configuration
//
// All settings come from environment variables (optionally loaded from .env).
// Decision: The API key is only checked for presence here; the flow cache reads it
// again on first use so a missing key fails requests, not startup.

use anyhow::{Context, Result};
use crewbridge_core::{API_KEY_ENV, DEFAULT_KICKOFF_URL};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8002;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host (CREWAI_API_HOST)
    pub host: String,
    /// Bind port (CREWAI_API_PORT)
    pub port: u16,
    /// Deployment environment name (ENVIRONMENT)
    pub environment: String,
    /// Whether OPENAI_API_KEY is set (startup diagnostics)
    pub api_key_set: bool,
    /// Whether GMAIL_SMTP_EMAIL is set (startup diagnostics only)
    pub smtp_email_set: bool,
    /// Kickoff endpoint of the agent flow (FLOW_KICKOFF_URL)
    pub flow_kickoff_url: String,
    /// Per-invocation timeout (FLOW_TIMEOUT_SECS); unset waits indefinitely
    pub flow_timeout: Option<Duration>,
    /// Cap on concurrent flow invocations (FLOW_MAX_CONCURRENCY); unset is unbounded
    pub max_concurrent_flows: Option<usize>,
}

impl ServerConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("CREWAI_API_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("CREWAI_API_PORT must be a port number, got {:?}", raw))?,
            None => DEFAULT_PORT,
        };

        let flow_timeout = match var("FLOW_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.trim().parse().with_context(|| {
                format!("FLOW_TIMEOUT_SECS must be a whole number of seconds, got {:?}", raw)
            })?)),
            None => None,
        };

        let max_concurrent_flows = match var("FLOW_MAX_CONCURRENCY") {
            Some(raw) => {
                let limit: usize = raw.trim().parse().with_context(|| {
                    format!("FLOW_MAX_CONCURRENCY must be a positive integer, got {:?}", raw)
                })?;
                anyhow::ensure!(limit > 0, "FLOW_MAX_CONCURRENCY must be greater than zero");
                Some(limit)
            }
            None => None,
        };

        Ok(Self {
            host: var("CREWAI_API_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            environment: var("ENVIRONMENT").unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            api_key_set: var(API_KEY_ENV).is_some(),
            smtp_email_set: var("GMAIL_SMTP_EMAIL").is_some(),
            flow_kickoff_url: var("FLOW_KICKOFF_URL")
                .unwrap_or_else(|| DEFAULT_KICKOFF_URL.to_string()),
            flow_timeout,
            max_concurrent_flows,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == DEFAULT_ENVIRONMENT
    }

    /// Address to bind the listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Default tracing filter when RUST_LOG is unset
    pub fn default_log_filter(&self) -> &'static str {
        if self.is_development() {
            "crewbridge_api=debug,crewbridge_core=debug,tower_http=debug"
        } else {
            "crewbridge_api=info,crewbridge_core=info,tower_http=info"
        }
    }
}
