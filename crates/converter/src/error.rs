//! Error types for conversion

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// No renderer binary in any configured location or on PATH
    #[error("renderer not found (searched {} locations)", .searched.len())]
    RendererNotFound { searched: Vec<PathBuf> },

    /// The renderer could not be started
    #[error("failed to start renderer {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The renderer exited unsuccessfully; `stderr` is its diagnostic output
    #[error("renderer exited with {}: {stderr}", exit_label(.status))]
    Failed { status: Option<i32>, stderr: String },

    /// The renderer reported success but produced no output file
    #[error("renderer produced no output at {0}")]
    MissingOutput(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("workspace error: {0}")]
    Workspace(#[from] store::StoreError),
}

fn exit_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}

impl ConvertError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConvertError::RendererNotFound { .. })
    }
}

pub type ConvertResult<T> = std::result::Result<T, ConvertError>;
