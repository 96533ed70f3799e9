//! Request and response shapes

use placeholder::SubstitutionMap;
use serde::{Deserialize, Serialize};

/// Input to a generate operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Raw DOCX template bytes, never modified
    pub template: Vec<u8>,
    #[serde(default)]
    pub substitutions: SubstitutionMap,
    #[serde(default)]
    pub filename_hint: Option<String>,
}

impl GenerationRequest {
    pub fn new(template: Vec<u8>) -> Self {
        Self {
            template,
            ..Default::default()
        }
    }

    pub fn with_substitutions(mut self, substitutions: SubstitutionMap) -> Self {
        self.substitutions = substitutions;
        self
    }

    /// Add one substitution
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.substitutions.insert(name.into(), value.into());
        self
    }

    pub fn with_filename_hint(mut self, hint: impl Into<String>) -> Self {
        self.filename_hint = Some(hint.into());
        self
    }
}

/// Output of a generate operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub content: Vec<u8>,
    pub content_type: String,
    /// Always ends with the extension matching `content_type`
    pub filename: String,
}
