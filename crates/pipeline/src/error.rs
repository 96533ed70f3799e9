//! Pipeline error taxonomy
//!
//! Internal failures are translated here, at the pipeline boundary. The
//! `From` impls log the full cause and keep only a caller-safe summary.

use converter::ConvertError;
use job_pool::PoolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use store::{DocxError, StoreError};
use thiserror::Error;

/// Category of a pipeline failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Io,
    RendererNotFound,
    ConversionFailed,
    Cancelled,
    Internal,
}

impl ErrorKind {
    /// Stable outcome code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "invalid_argument",
            ErrorKind::Io => "io_error",
            ErrorKind::RendererNotFound => "renderer_not_found",
            ErrorKind::ConversionFailed => "conversion_failed",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad input; never worth retrying
    #[error("{0}")]
    Validation(String),

    #[error("workspace I/O failed")]
    Io,

    #[error("no document renderer is installed")]
    RendererNotFound,

    /// The renderer ran and failed; `diagnostics` is its stderr
    #[error("document conversion failed{}", diagnostics_suffix(.diagnostics))]
    ConversionFailed { diagnostics: String },

    #[error("request cancelled")]
    Cancelled,

    #[error("internal error")]
    Internal,
}

fn diagnostics_suffix(diagnostics: &str) -> String {
    if diagnostics.is_empty() {
        String::new()
    } else {
        format!(": {diagnostics}")
    }
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Validation(_) => ErrorKind::Validation,
            PipelineError::Io => ErrorKind::Io,
            PipelineError::RendererNotFound => ErrorKind::RendererNotFound,
            PipelineError::ConversionFailed { .. } => ErrorKind::ConversionFailed,
            PipelineError::Cancelled => ErrorKind::Cancelled,
            PipelineError::Internal => ErrorKind::Internal,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    pub(crate) fn empty_template() -> Self {
        PipelineError::Validation("template is empty".to_string())
    }
}

impl From<DocxError> for PipelineError {
    fn from(err: DocxError) -> Self {
        if err.is_malformed_input() {
            tracing::debug!(error = %err, "template rejected");
            PipelineError::Validation("template is not a valid DOCX document".to_string())
        } else {
            tracing::warn!(error = %err, "document I/O failed");
            PipelineError::Io
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Docx(e) => e.into(),
            StoreError::Io(e) => {
                tracing::warn!(error = %e, "workspace I/O failed");
                PipelineError::Io
            }
        }
    }
}

impl From<ConvertError> for PipelineError {
    fn from(err: ConvertError) -> Self {
        tracing::warn!(error = %err, "conversion failed");
        match err {
            ConvertError::RendererNotFound { .. } => PipelineError::RendererNotFound,
            ConvertError::Failed { stderr, .. } => PipelineError::ConversionFailed {
                diagnostics: stderr,
            },
            ConvertError::Spawn { .. } => PipelineError::ConversionFailed {
                diagnostics: "renderer could not be started".to_string(),
            },
            ConvertError::MissingOutput(_) => PipelineError::ConversionFailed {
                diagnostics: "renderer produced no output".to_string(),
            },
            ConvertError::Workspace(e) => e.into(),
            ConvertError::Io(_) => PipelineError::Io,
        }
    }
}

impl From<PoolError<PipelineError>> for PipelineError {
    fn from(err: PoolError<PipelineError>) -> Self {
        match err {
            PoolError::Job(e) => e,
            PoolError::Cancelled { started } => {
                tracing::debug!(started, "generation cancelled");
                PipelineError::Cancelled
            }
            PoolError::Closed => {
                tracing::warn!("job pool is closed");
                PipelineError::Internal
            }
            PoolError::Panicked(msg) => {
                tracing::warn!(panic = %msg, "generation job panicked");
                PipelineError::Internal
            }
        }
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
