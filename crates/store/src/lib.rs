//! Store - DOCX container I/O and ephemeral workspace artifacts
//!
//! This crate handles the on-disk and in-archive side of document
//! generation: reading a DOCX template's parts, rewriting the text-bearing
//! parts, serializing the result, and owning the temporary files and
//! directories that the conversion step needs.

mod error;
pub mod docx;
pub mod workspace;

pub use error::*;

pub use docx::{DocxError, DocxPackage, DocxResult, DOCX_CONTENT_TYPE, DOCX_EXTENSION};
pub use workspace::{Artifact, ArtifactKind, Workspace};
