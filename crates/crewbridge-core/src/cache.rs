// Flow singleton cache
//
// Design Decision: One flow handle per process, built lazily on first use because
// construction is slow. Initialization goes through an async once-cell so
// concurrent first requests wait for a single construction instead of racing.
// Construction runs in a detached task, so a caller that goes away mid-build
// does not reset the cell. There is no teardown or refresh; a failed
// construction leaves the cache empty so a later request can try again.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::error::{FlowError, Result};
use crate::flow::{Flow, FlowBuilder};

/// Environment variable holding the API key the flow needs
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Where the flow's API key comes from
#[derive(Debug, Clone)]
pub enum ApiKeySource {
    /// Read from the named environment variable at first access
    Env(String),
    /// Fixed value (None behaves like an unset variable)
    Static(Option<String>),
}

impl Default for ApiKeySource {
    fn default() -> Self {
        ApiKeySource::Env(API_KEY_ENV.to_string())
    }
}

impl ApiKeySource {
    fn resolve(&self) -> Result<String> {
        let (name, value) = match self {
            ApiKeySource::Env(name) => (name.as_str(), std::env::var(name).ok()),
            ApiKeySource::Static(value) => (API_KEY_ENV, value.clone()),
        };
        value
            .filter(|key| !key.is_empty())
            .ok_or_else(|| FlowError::MissingCredential(name.to_string()))
    }
}

/// Process-wide, lazily-built flow handle
pub struct FlowCache {
    flow: Arc<OnceCell<Arc<dyn Flow>>>,
    builder: Arc<dyn FlowBuilder>,
    api_key: ApiKeySource,
}

impl FlowCache {
    /// Cache that reads the API key from `OPENAI_API_KEY`
    pub fn new(builder: Arc<dyn FlowBuilder>) -> Self {
        Self::with_api_key_source(builder, ApiKeySource::default())
    }

    pub fn with_api_key_source(builder: Arc<dyn FlowBuilder>, api_key: ApiKeySource) -> Self {
        Self {
            flow: Arc::new(OnceCell::new()),
            builder,
            api_key,
        }
    }

    /// True once the flow has been built
    pub fn is_ready(&self) -> bool {
        self.flow.initialized()
    }

    /// Get the flow, building it on first access.
    ///
    /// Errors from this call are always configuration errors
    /// (`FlowError::is_configuration`). Dropping the returned future does not
    /// cancel a construction already under way.
    pub async fn get_or_init(&self) -> Result<Arc<dyn Flow>> {
        if let Some(flow) = self.flow.get() {
            return Ok(flow.clone());
        }

        let cell = self.flow.clone();
        let builder = self.builder.clone();
        let api_key = self.api_key.clone();
        tokio::spawn(async move {
            cell.get_or_try_init(|| initialize(builder, api_key))
                .await
                .cloned()
        })
        .await
        .map_err(|e| FlowError::init(FlowError::from_join(e).to_string()))?
    }
}

async fn initialize(
    builder: Arc<dyn FlowBuilder>,
    api_key: ApiKeySource,
) -> Result<Arc<dyn Flow>> {
    let api_key = api_key.resolve()?;

    info!("Initializing flow (this may take 10-30 seconds)");
    let started = Instant::now();

    let built = tokio::task::spawn_blocking(move || builder.build(&api_key))
        .await
        .map_err(FlowError::from_join)
        .and_then(|result| result);

    match built {
        Ok(flow) => {
            info!(
                elapsed_secs = started.elapsed().as_secs_f64(),
                "Flow initialized"
            );
            Ok(flow)
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize flow");
            Err(match e {
                FlowError::MissingCredential(_) | FlowError::Initialization(_) => e,
                other => FlowError::init(other.to_string()),
            })
        }
    }
}
