//! Error types for subctl

use thiserror::Error;

/// Main error type for subctl
#[derive(Debug, Error)]
pub enum SubctlError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("No context specified and no current context in kubeconfig")]
    NoContext,

    #[error("Context not found: {0}")]
    ContextNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Timeout waiting for {0}")]
    Timeout(String),

    #[error("Pod {pod} is in unexpected phase {phase:?}")]
    UnexpectedPodPhase { pod: String, phase: String },
}

impl SubctlError {
    /// True if the error is an HTTP 404 from the API server
    pub fn is_not_found(&self) -> bool {
        matches!(self, SubctlError::Kube(kube::Error::Api(resp)) if resp.code == 404)
    }
}

impl From<toml::de::Error> for SubctlError {
    fn from(e: toml::de::Error) -> Self {
        SubctlError::Config(e.to_string())
    }
}

/// Result type alias for subctl
pub type Result<T> = std::result::Result<T, SubctlError>;
