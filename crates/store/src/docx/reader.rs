//! Archive entry reading and XML reader setup

use crate::docx::error::DocxResult;
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// A wrapper around a ZIP archive for reading DOCX files
pub struct DocxReader<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> DocxReader<R> {
    /// Create a new DOCX reader from a source that implements Read + Seek
    pub fn new(reader: R) -> DocxResult<Self> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive })
    }

    /// Read every entry in archive order.
    ///
    /// Directory entries are kept so the rewritten archive mirrors the input.
    pub fn read_all(&mut self) -> DocxResult<Vec<(String, Vec<u8>)>> {
        let mut parts = Vec::with_capacity(self.archive.len());
        for index in 0..self.archive.len() {
            let mut file = self.archive.by_index(index)?;
            let name = file.name().to_string();
            let mut contents = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut contents)?;
            parts.push((name, contents));
        }
        Ok(parts)
    }
}

/// XML reader utilities for parsing DOCX XML content
pub struct XmlParser;

impl XmlParser {
    /// Create a new XML reader from a string.
    ///
    /// Text is never trimmed: whitespace inside `w:t` is document content.
    pub fn from_string(content: &str) -> Reader<&[u8]> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(false);
        reader
    }

    /// Check if an element is the WordprocessingML element `local`.
    ///
    /// Accepts the conventional `w:` prefix or no prefix at all, so `m:t`
    /// (math text) is not mistaken for `w:t`.
    pub fn is_w_element(name: &[u8], local: &str) -> bool {
        match name.strip_prefix(b"w:") {
            Some(rest) => rest == local.as_bytes(),
            None => name == local.as_bytes(),
        }
    }
}
