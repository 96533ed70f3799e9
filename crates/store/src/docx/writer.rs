//! Archive serialization for rewritten templates
//!
//! Entries are written back in the order they were read.

use crate::docx::error::DocxResult;
use std::io::{Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Writes parts into a fresh DOCX archive
pub struct DocxWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
}

impl<W: Write + Seek> DocxWriter<W> {
    /// Create a new DOCX writer
    pub fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
        }
    }

    /// Write every part, in order, and finish the archive
    pub fn write_parts<'a, I>(mut self, parts: I) -> DocxResult<W>
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        for (name, data) in parts {
            if name.ends_with('/') {
                self.zip.add_directory(name, SimpleFileOptions::default())?;
                continue;
            }
            // Media entries are already compressed
            let method = if is_xml(name) {
                CompressionMethod::Deflated
            } else {
                CompressionMethod::Stored
            };
            self.write_entry(name, data, method)?;
        }
        Ok(self.zip.finish()?)
    }

    fn write_entry(
        &mut self,
        path: &str,
        data: &[u8],
        method: CompressionMethod,
    ) -> DocxResult<()> {
        let options = SimpleFileOptions::default().compression_method(method);
        self.zip.start_file(path, options)?;
        self.zip.write_all(data)?;
        Ok(())
    }
}

fn is_xml(name: &str) -> bool {
    name.ends_with(".xml") || name.ends_with(".rels")
}
