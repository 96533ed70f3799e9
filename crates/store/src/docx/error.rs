//! DOCX container errors

use thiserror::Error;

/// Failure while opening, rewriting or serializing a template container
#[derive(Debug, Error)]
pub enum DocxError {
    /// Reading or writing the underlying file failed
    #[error("template I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes are not a readable zip archive
    #[error("template is not a valid archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("malformed XML in template: {0}")]
    XmlParse(String),

    /// The archive opened but a part has unusable content
    #[error("template structure is invalid: {0}")]
    InvalidStructure(String),

    /// A part the template must carry is absent
    #[error("template has no {0} part")]
    MissingPart(String),

    #[error("template part is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<quick_xml::Error> for DocxError {
    fn from(err: quick_xml::Error) -> Self {
        DocxError::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for DocxError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        DocxError::XmlParse(format!("bad attribute: {err}"))
    }
}

impl DocxError {
    /// True when the template bytes are at fault rather than the environment
    pub fn is_malformed_input(&self) -> bool {
        !matches!(self, DocxError::Io(_))
    }
}

pub type DocxResult<T> = std::result::Result<T, DocxError>;
