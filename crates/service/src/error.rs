//! Error types for the service layer

use pipeline::PipelineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// No credential was presented
    #[error("missing API key")]
    Unauthenticated,

    /// The presented credential is not accepted
    #[error("invalid API key")]
    PermissionDenied,

    /// Rejected by the rate limiter before reaching the pipeline
    #[error("rate limit exceeded, retry later")]
    ResourceExhausted,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Configuration could not be read or is invalid
    #[error("configuration error: {0}")]
    Config(String),
}

impl ServiceError {
    /// Stable outcome code, shared with the pipeline's codes
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Unauthenticated => "unauthenticated",
            ServiceError::PermissionDenied => "permission_denied",
            ServiceError::ResourceExhausted => "resource_exhausted",
            ServiceError::Pipeline(e) => e.code(),
            ServiceError::Config(_) => "invalid_argument",
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
