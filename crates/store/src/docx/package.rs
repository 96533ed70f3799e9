//! An opened DOCX container held in memory

use crate::docx::error::{DocxError, DocxResult};
use crate::docx::reader::DocxReader;
use crate::docx::text::{extract_text, substitute_part};
use crate::docx::writer::DocxWriter;
use crate::docx::{is_text_part, DOCUMENT_PART};
use placeholder::{Grammar, SubstitutionMap};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

/// All archive entries of a DOCX file, in archive order.
///
/// Parts are kept as raw bytes; only text parts are ever decoded, and only
/// when they are scanned or rewritten.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    parts: Vec<(String, Vec<u8>)>,
}

impl DocxPackage {
    /// Parse a DOCX container from bytes
    pub fn from_bytes(bytes: &[u8]) -> DocxResult<Self> {
        let mut reader = DocxReader::new(Cursor::new(bytes))?;
        Self::from_parts(reader.read_all()?)
    }

    /// Open a DOCX file from disk
    pub fn open(path: impl AsRef<Path>) -> DocxResult<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = DocxReader::new(BufReader::new(file))?;
        Self::from_parts(reader.read_all()?)
    }

    /// Build a package from raw entries, validating the primary part exists
    pub fn from_parts(parts: Vec<(String, Vec<u8>)>) -> DocxResult<Self> {
        if !parts.iter().any(|(name, _)| name == DOCUMENT_PART) {
            return Err(DocxError::MissingPart(DOCUMENT_PART.to_string()));
        }
        Ok(Self { parts })
    }

    /// Raw bytes of a part, if present
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Names of all parts, in archive order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    /// Concatenated text of the main document part
    pub fn primary_text(&self) -> DocxResult<String> {
        let data = self
            .part(DOCUMENT_PART)
            .ok_or_else(|| DocxError::MissingPart(DOCUMENT_PART.to_string()))?;
        extract_text(std::str::from_utf8(data).map_err(|e| {
            DocxError::InvalidStructure(format!("{DOCUMENT_PART} is not UTF-8: {e}"))
        })?)
    }

    /// Distinct placeholder names in the main document part
    pub fn placeholders(&self, grammar: Grammar) -> DocxResult<Vec<String>> {
        Ok(grammar.scan(&self.primary_text()?))
    }

    /// Substitute placeholders in the document body, headers and footers.
    ///
    /// Returns the number of paragraphs rewritten across all parts.
    pub fn replace_all(&mut self, values: &SubstitutionMap, grammar: Grammar) -> DocxResult<usize> {
        if values.is_empty() {
            return Ok(0);
        }

        let mut total = 0;
        for (name, data) in self.parts.iter_mut() {
            if !is_text_part(name) {
                continue;
            }
            let xml = std::str::from_utf8(data).map_err(|e| {
                DocxError::InvalidStructure(format!("{name} is not UTF-8: {e}"))
            })?;
            if let Some((rewritten, count)) = substitute_part(xml, values, grammar)? {
                tracing::trace!(
                    target: "store::docx",
                    part = %name,
                    paragraphs = count,
                    "rewrote part"
                );
                *data = rewritten.into_bytes();
                total += count;
            }
        }
        Ok(total)
    }

    /// Serialize the package to DOCX bytes
    pub fn to_bytes(&self) -> DocxResult<Vec<u8>> {
        let parts = self.parts.iter().map(|(n, d)| (n.as_str(), d.as_slice()));
        let cursor = DocxWriter::new(Cursor::new(Vec::new())).write_parts(parts)?;
        Ok(cursor.into_inner())
    }
}
