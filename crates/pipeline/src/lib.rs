//! Pipeline - the three document generation operations
//!
//! - [`GenerationPipeline::list_placeholders`] scans a template inline.
//! - [`GenerationPipeline::generate_document`] fills a template on the
//!   job pool and returns DOCX bytes.
//! - [`GenerationPipeline::generate_rendered`] additionally renders the
//!   filled document to PDF inside the same job.
//!
//! Every failure leaves the pipeline as a [`PipelineError`] whose message
//! is safe to show to callers; underlying causes are logged.

mod error;
mod format;
mod pipeline;
mod request;

pub use error::{ErrorKind, PipelineError, PipelineResult};
pub use format::{derive_filename, OutputFormat};
pub use pipeline::GenerationPipeline;
pub use request::{GenerationRequest, GenerationResult};
