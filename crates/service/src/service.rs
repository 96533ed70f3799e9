//! The externally visible operations with their interceptors
//!
//! Each call passes, in order: authentication, call logging, metrics,
//! rate limiting, then the pipeline. Logging and metrics see every
//! outcome, including calls rejected by the gate or the limiter.

use crate::auth::{AuthGate, Caller, CredentialStore, RequestMetadata, StaticCredentials};
use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::metrics::{MetricsSink, NoopMetrics};
use crate::rate_limit::RateLimiter;
use converter::{RendererLocator, SofficeConverter};
use job_pool::{JobContext, JobPool};
use pipeline::{GenerationPipeline, GenerationRequest, GenerationResult, PipelineError};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use store::Workspace;
use uuid::Uuid;

/// Operation names as they appear in logs and metrics
pub mod operation {
    pub const LIST_PLACEHOLDERS: &str = "ListPlaceholders";
    pub const GENERATE_DOCUMENT: &str = "GenerateDocument";
    pub const GENERATE_RENDERED: &str = "GenerateRendered";
}

pub struct DocService {
    pipeline: GenerationPipeline,
    auth: AuthGate,
    limiter: Option<RateLimiter>,
    metrics: Arc<dyn MetricsSink>,
    request_timeout: Option<Duration>,
}

impl std::fmt::Debug for DocService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocService")
            .field("pipeline", &self.pipeline)
            .field("limiter", &self.limiter)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl DocService {
    /// Service with no rate limit, no metrics and no default timeout
    pub fn new(pipeline: GenerationPipeline, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            pipeline,
            auth: AuthGate::new(credentials),
            limiter: None,
            metrics: Arc::new(NoopMetrics),
            request_timeout: None,
        }
    }

    /// Build the whole stack from configuration
    pub fn from_config(config: &ServiceConfig) -> ServiceResult<Self> {
        config.validate()?;

        let workspace = match &config.workspace.root {
            Some(root) => Workspace::in_dir(root),
            None => Workspace::new(),
        };
        let mut locator = RendererLocator::new();
        if let Some(candidates) = &config.renderer.candidates {
            locator = locator.with_candidates(candidates.iter().cloned());
        }
        let converter = SofficeConverter::new(locator, workspace.clone())
            .with_isolated_profile(config.renderer.isolated_profile);

        let pipeline = GenerationPipeline::new(
            Arc::new(JobPool::new(config.pool.capacity)),
            workspace,
            config.placeholder.grammar,
            Arc::new(converter),
        );
        let credentials = StaticCredentials::new(config.auth.api_keys.iter().cloned());

        tracing::info!(
            pool_capacity = config.pool.capacity,
            grammar = %config.placeholder.grammar,
            api_keys = credentials.len(),
            rate_limited = config.rate_limit.enabled,
            "document service configured"
        );

        Ok(Self::new(pipeline, Arc::new(credentials))
            .with_rate_limiter(RateLimiter::from_config(&config.rate_limit))
            .with_request_timeout(config.request_timeout_secs.map(Duration::from_secs)))
    }

    pub fn with_rate_limiter(mut self, limiter: Option<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Deadline for calls whose context carries none
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn pipeline(&self) -> &GenerationPipeline {
        &self.pipeline
    }

    /// Distinct placeholder names in the template
    pub async fn get_placeholders(
        &self,
        metadata: &RequestMetadata,
        template: Vec<u8>,
    ) -> ServiceResult<Vec<String>> {
        self.intercept(operation::LIST_PLACEHOLDERS, metadata, move || async move {
            let pipeline = self.pipeline.clone();
            tokio::task::spawn_blocking(move || pipeline.list_placeholders(&template))
                .await
                .map_err(|e| {
                    tracing::warn!(error = %e, "placeholder listing task failed");
                    PipelineError::Internal
                })?
        })
        .await
    }

    /// Fill the template and return a DOCX document
    pub async fn generate_docx(
        &self,
        metadata: &RequestMetadata,
        ctx: JobContext,
        request: GenerationRequest,
    ) -> ServiceResult<GenerationResult> {
        let ctx = self.apply_timeout(ctx);
        self.intercept(operation::GENERATE_DOCUMENT, metadata, move || async move {
            self.log_admission();
            self.pipeline.generate_document(&ctx, request).await
        })
        .await
    }

    /// Fill the template and return it rendered as PDF
    pub async fn generate_pdf(
        &self,
        metadata: &RequestMetadata,
        ctx: JobContext,
        request: GenerationRequest,
    ) -> ServiceResult<GenerationResult> {
        let ctx = self.apply_timeout(ctx);
        self.intercept(operation::GENERATE_RENDERED, metadata, move || async move {
            self.log_admission();
            self.pipeline.generate_rendered(&ctx, request).await
        })
        .await
    }

    /// Path of the renderer the next conversion would use
    pub fn check_renderer(&self) -> ServiceResult<PathBuf> {
        self.pipeline
            .converter()
            .locate()
            .map_err(|e| ServiceError::Pipeline(e.into()))
    }

    fn apply_timeout(&self, ctx: JobContext) -> JobContext {
        match (ctx.deadline(), self.request_timeout) {
            (None, Some(timeout)) => ctx.with_timeout(timeout),
            _ => ctx,
        }
    }

    fn log_admission(&self) {
        let pool = self.pipeline.pool();
        tracing::debug!(
            capacity = pool.capacity(),
            in_flight = pool.in_flight(),
            waiting = pool.waiting(),
            "submitting to job pool"
        );
    }

    async fn intercept<T, F, Fut>(
        &self,
        operation: &'static str,
        metadata: &RequestMetadata,
        call: F,
    ) -> ServiceResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        let started = Instant::now();
        let request_id = Uuid::new_v4();

        let (caller, result) = match self.auth.authenticate(metadata) {
            Ok(caller) => {
                let result = self.admit_and_run(call).await;
                (Some(caller), result)
            }
            Err(e) => (None, Err(e)),
        };

        let code = match &result {
            Ok(_) => "ok",
            Err(e) => e.code(),
        };
        let duration = started.elapsed();
        let caller = caller_label(caller.as_ref(), metadata);
        let duration_ms = duration.as_millis() as u64;

        match &result {
            Ok(_) => tracing::info!(
                operation,
                caller = %caller,
                request_id = %request_id,
                code,
                duration_ms,
                "call finished"
            ),
            Err(e) => tracing::warn!(
                operation,
                caller = %caller,
                request_id = %request_id,
                code,
                duration_ms,
                error = %e,
                "call failed"
            ),
        }
        self.metrics.record_call(operation, code, duration);

        result
    }

    async fn admit_and_run<T, F, Fut>(&self, call: F) -> ServiceResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        if let Some(limiter) = &self.limiter {
            if !limiter.try_acquire() {
                return Err(ServiceError::ResourceExhausted);
            }
        }
        Ok(call().await?)
    }
}

fn caller_label(caller: Option<&Caller>, metadata: &RequestMetadata) -> String {
    match caller {
        Some(caller) => caller.to_string(),
        None => metadata
            .peer
            .clone()
            .unwrap_or_else(|| "anonymous".to_string()),
    }
}
