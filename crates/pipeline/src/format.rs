//! Output formats and filename derivation

use serde::{Deserialize, Serialize};

/// Format of a generation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Docx,
    Pdf,
}

impl OutputFormat {
    /// Extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Docx => store::DOCX_EXTENSION,
            OutputFormat::Pdf => converter::PDF_EXTENSION,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Docx => store::DOCX_CONTENT_TYPE,
            OutputFormat::Pdf => converter::PDF_CONTENT_TYPE,
        }
    }

    /// Filename used when the caller gives no hint
    pub fn default_filename(&self) -> &'static str {
        match self {
            OutputFormat::Docx => "result.docx",
            OutputFormat::Pdf => "result.pdf",
        }
    }
}

/// Final filename for a result.
///
/// An empty or absent hint yields the format's default. Otherwise the
/// extension is appended unless the hint already ends with it, compared
/// case-insensitively. A different existing extension is kept, so
/// `"a.txt"` becomes `"a.txt.pdf"`.
pub fn derive_filename(hint: Option<&str>, format: OutputFormat) -> String {
    let hint = hint.unwrap_or_default();
    if hint.is_empty() {
        return format.default_filename().to_string();
    }

    let suffix = format!(".{}", format.extension());
    if hint.to_lowercase().ends_with(&suffix) {
        hint.to_string()
    } else {
        format!("{hint}{suffix}")
    }
}
