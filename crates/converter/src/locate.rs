//! Finding the renderer binary

use crate::error::{ConvertError, ConvertResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Bare executable names looked up on the search path
const PATH_NAMES: &[&str] = &["soffice", "libreoffice"];

/// Searches well-known install locations, then the executable search path.
#[derive(Debug, Clone)]
pub struct RendererLocator {
    candidates: Vec<PathBuf>,
    /// `None` reads `PATH` at lookup time
    search_path: Option<OsString>,
}

impl Default for RendererLocator {
    fn default() -> Self {
        Self {
            candidates: Self::platform_candidates(),
            search_path: None,
        }
    }
}

impl RendererLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the platform defaults with an explicit candidate list
    pub fn with_candidates<I, P>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    /// Search this value instead of the process `PATH`
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Well-known install locations for this platform, in priority order
    pub fn platform_candidates() -> Vec<PathBuf> {
        #[cfg(target_os = "linux")]
        let paths: &[&str] = &[
            "/usr/bin/soffice",
            "/usr/local/bin/soffice",
            "/snap/bin/libreoffice",
        ];

        #[cfg(target_os = "macos")]
        let paths: &[&str] = &[
            "/Applications/LibreOffice.app/Contents/MacOS/soffice",
            "/opt/homebrew/bin/soffice",
            "/usr/local/bin/soffice",
        ];

        #[cfg(target_os = "windows")]
        let paths: &[&str] = &[
            r"C:\Program Files\LibreOffice\program\soffice.exe",
            r"C:\Program Files (x86)\LibreOffice\program\soffice.exe",
        ];

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        let paths: &[&str] = &[];

        paths.iter().map(PathBuf::from).collect()
    }

    /// Resolve the renderer, failing with `RendererNotFound`
    pub fn locate(&self) -> ConvertResult<PathBuf> {
        let mut searched = Vec::new();

        for candidate in &self.candidates {
            if is_executable(candidate) {
                return Ok(candidate.clone());
            }
            searched.push(candidate.clone());
        }

        let search_path = self
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"))
            .unwrap_or_default();

        for name in PATH_NAMES {
            for dir in std::env::split_paths(&search_path) {
                if dir.as_os_str().is_empty() {
                    continue;
                }
                let candidate = dir.join(executable_name(name));
                if is_executable(&candidate) {
                    return Ok(candidate);
                }
                searched.push(candidate);
            }
        }

        tracing::debug!(searched = searched.len(), "no renderer found");
        Err(ConvertError::RendererNotFound { searched })
    }
}

fn executable_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
