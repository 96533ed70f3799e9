//! Converter - drives an external office suite to render documents
//!
//! The renderer is a separate binary (LibreOffice's `soffice`). It is
//! located afresh on every conversion, run headless against a filled
//! document, and its single output file is read back into memory.
//!
//! A running conversion cannot be interrupted: once the subprocess has
//! been spawned the call blocks until it exits.

mod error;
mod locate;
mod soffice;

pub use error::{ConvertError, ConvertResult};
pub use locate::RendererLocator;
pub use soffice::SofficeConverter;

use std::path::{Path, PathBuf};

/// File extension of rendered output, without the dot
pub const PDF_EXTENSION: &str = "pdf";

/// Content type of rendered output
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Renders a document on disk into PDF bytes.
///
/// Implementations block the calling thread for the whole conversion.
pub trait Converter: Send + Sync {
    /// Path of the renderer that would be used right now
    fn locate(&self) -> ConvertResult<PathBuf>;

    /// Render `input` and return the output bytes
    fn convert(&self, input: &Path) -> ConvertResult<Vec<u8>>;
}
