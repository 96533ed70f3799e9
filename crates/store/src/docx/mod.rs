//! DOCX Template Module
//!
//! A DOCX file is a ZIP archive of XML parts. Template filling only touches
//! the text-bearing parts; every other entry is carried through untouched.
//!
//! ## Parts of interest
//!
//! - `word/document.xml` - Main document content (the primary text part)
//! - `word/header*.xml` - Page headers
//! - `word/footer*.xml` - Page footers
//!
//! Within a part, visible text lives in `w:t` elements inside runs (`w:r`)
//! inside paragraphs (`w:p`). Word freely splits one visible word across
//! several runs, which is why text is always reassembled per paragraph
//! before placeholders are looked for.

mod error;
mod package;
mod reader;
mod text;
mod writer;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{DocxError, DocxResult};
pub use package::DocxPackage;
pub use reader::{DocxReader, XmlParser};
pub use text::{extract_text, substitute_part};
pub use writer::DocxWriter;

/// Path of the main document part
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Content type of a WordprocessingML document
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// File extension of a WordprocessingML document, without the dot
pub const DOCX_EXTENSION: &str = "docx";

/// Whether a part carries text that template filling should rewrite
pub fn is_text_part(name: &str) -> bool {
    if name == DOCUMENT_PART {
        return true;
    }
    let Some(file) = name.strip_prefix("word/") else {
        return false;
    };
    !file.contains('/')
        && file.ends_with(".xml")
        && (file.starts_with("header") || file.starts_with("footer"))
}
