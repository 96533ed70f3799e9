//! Error types for storage operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DOCX error: {0}")]
    Docx(#[from] crate::docx::DocxError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
