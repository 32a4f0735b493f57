// Error types for flow construction and invocation

use thiserror::Error;

/// Result type alias for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors that can occur while building or invoking the external flow
#[derive(Debug, Error)]
pub enum FlowError {
    /// Required credential missing from the environment
    #[error("{0} not set in environment variables")]
    MissingCredential(String),

    /// Flow handle could not be constructed
    #[error("Flow initialization failed: {0}")]
    Initialization(String),

    /// Flow was reached but the invocation failed
    #[error("Flow invocation failed: {0}")]
    Invocation(String),

    /// Flow answered with something that could not be read
    #[error("Invalid flow response: {0}")]
    InvalidResponse(String),

    /// Flow panicked while running on the blocking pool
    #[error("Flow panicked: {0}")]
    Panicked(String),
}

impl FlowError {
    /// Create an initialization error
    pub fn init(msg: impl Into<String>) -> Self {
        FlowError::Initialization(msg.into())
    }

    /// Create an invocation error
    pub fn invocation(msg: impl Into<String>) -> Self {
        FlowError::Invocation(msg.into())
    }

    /// True for errors raised while obtaining the flow handle.
    ///
    /// These are reported to callers as configuration errors rather than
    /// execution errors.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FlowError::MissingCredential(_) | FlowError::Initialization(_)
        )
    }

    /// Build an error from a failed blocking task
    pub fn from_join(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            let payload = err.into_panic();
            FlowError::Panicked(panic_message(payload.as_ref()))
        } else {
            FlowError::invocation(format!("blocking task cancelled: {}", err))
        }
    }
}

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(FlowError::MissingCredential("OPENAI_API_KEY".into()).is_configuration());
        assert!(FlowError::init("boom").is_configuration());
        assert!(!FlowError::invocation("boom").is_configuration());
        assert!(!FlowError::Panicked("boom".into()).is_configuration());
    }

    #[test]
    fn test_missing_credential_message() {
        let err = FlowError::MissingCredential("OPENAI_API_KEY".into());
        assert_eq!(
            err.to_string(),
            "OPENAI_API_KEY not set in environment variables"
        );
    }

    #[tokio::test]
    async fn test_from_join_captures_panic_message() {
        let err = tokio::task::spawn_blocking::<_, ()>(|| panic!("flow exploded"))
            .await
            .unwrap_err();
        let err = FlowError::from_join(err);
        assert!(matches!(err, FlowError::Panicked(ref m) if m == "flow exploded"));
    }
}
