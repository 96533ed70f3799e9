//! Service - the document generation operations as exposed to callers
//!
//! Wraps the [`pipeline`] with the collaborators every call passes
//! through: an authentication gate over an injected credential store,
//! structured call logging, a metrics sink and a token-bucket rate
//! limiter. Transport is left to the embedding binary.

mod auth;
mod config;
mod error;
mod metrics;
mod rate_limit;
mod service;

pub use auth::{AuthGate, Caller, CredentialStore, RequestMetadata, StaticCredentials};
pub use config::{
    AuthConfig, PlaceholderConfig, PoolConfig, RateLimitConfig, RendererConfig, ServiceConfig,
    WorkspaceConfig, ENV_API_KEYS, ENV_POOL_CAPACITY,
};
pub use error::{ServiceError, ServiceResult};
pub use metrics::{CallMetrics, MetricsSink, MetricsSnapshot, NoopMetrics, OperationSnapshot};
pub use rate_limit::RateLimiter;
pub use service::{operation, DocService};

pub use job_pool::JobContext;
pub use pipeline::{GenerationRequest, GenerationResult};
