//! Ephemeral workspace artifacts
//!
//! Every temporary file or directory the pipeline touches is an
//! [`Artifact`] with exactly one owner. Release happens either explicitly
//! through [`Artifact::release`] or implicitly when the owner drops it, so
//! early returns, errors and cancelled futures all clean up the same way.

use crate::error::StoreResult;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir, TempPath};

/// Factory for artifacts rooted in one directory
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    root: Option<PathBuf>,
}

impl Workspace {
    /// Artifacts in the OS temp directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Artifacts under `root`, which must already exist
    pub fn in_dir(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Directory artifacts are created in
    pub fn root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Create a uniquely named file seeded with `bytes`.
    ///
    /// The name is `<prefix>-<random><suffix>`. On failure nothing is left
    /// on disk.
    pub fn acquire(&self, prefix: &str, suffix: &str, bytes: &[u8]) -> StoreResult<Artifact> {
        let mut file = Builder::new()
            .prefix(&format!("{prefix}-"))
            .suffix(suffix)
            .tempfile_in(self.root())?;
        // A write failure drops `file`, which unlinks it
        file.write_all(bytes)?;
        file.flush()?;

        let path = file.into_temp_path();
        tracing::trace!(target: "store::workspace", path = %path.display(), "acquired file");
        Ok(Artifact {
            path: path.to_path_buf(),
            kind: ArtifactKind::File,
            held: Some(Held::File(path)),
        })
    }

    /// Create a uniquely named empty directory
    pub fn acquire_dir(&self, prefix: &str) -> StoreResult<Artifact> {
        let dir = Builder::new()
            .prefix(&format!("{prefix}-"))
            .tempdir_in(self.root())?;

        tracing::trace!(target: "store::workspace", path = %dir.path().display(), "acquired dir");
        Ok(Artifact {
            path: dir.path().to_path_buf(),
            kind: ArtifactKind::Dir,
            held: Some(Held::Dir(dir)),
        })
    }
}

/// What an artifact is on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    File,
    Dir,
}

#[derive(Debug)]
enum Held {
    File(TempPath),
    Dir(TempDir),
}

/// A temporary file or directory with a single release point
#[derive(Debug)]
pub struct Artifact {
    path: PathBuf,
    kind: ArtifactKind,
    held: Option<Held>,
}

impl Artifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Whether the artifact has already been removed
    pub fn is_released(&self) -> bool {
        self.held.is_none()
    }

    /// Remove the artifact from disk.
    ///
    /// Idempotent: only the first call does any work. If removal fails the
    /// artifact still counts as released; the error is returned once.
    pub fn release(&mut self) -> io::Result<()> {
        match self.held.take() {
            Some(Held::File(path)) => path.close(),
            Some(Held::Dir(dir)) => dir.close(),
            None => Ok(()),
        }
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release artifact");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_acquire_seeds_file() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::in_dir(root.path());
        let artifact = ws.acquire("template", ".docx", b"hello").unwrap();

        assert_eq!(artifact.kind(), ArtifactKind::File);
        assert_eq!(std::fs::read(artifact.path()).unwrap(), b"hello");
        let name = artifact.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("template-"));
        assert!(name.ends_with(".docx"));
    }

    #[test]
    fn test_names_are_unique() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::in_dir(root.path());
        let a = ws.acquire("t", ".docx", b"").unwrap();
        let b = ws.acquire("t", ".docx", b"").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_release_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::in_dir(root.path());
        let mut artifact = ws.acquire("t", ".bin", b"x").unwrap();
        let path = artifact.path().to_path_buf();

        artifact.release().unwrap();
        assert!(!path.exists());
        assert!(artifact.is_released());
        artifact.release().unwrap();
        artifact.release().unwrap();
    }

    #[test]
    fn test_drop_releases() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::in_dir(root.path());
        {
            let _file = ws.acquire("t", ".docx", b"x").unwrap();
            let dir = ws.acquire_dir("out").unwrap();
            std::fs::write(dir.path().join("result.pdf"), b"%PDF").unwrap();
            assert_eq!(entries(root.path()), 2);
        }
        assert_eq!(entries(root.path()), 0);
    }

    #[test]
    fn test_dir_release_removes_contents() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::in_dir(root.path());
        let mut dir = ws.acquire_dir("out").unwrap();
        assert_eq!(dir.kind(), ArtifactKind::Dir);
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/a.txt"), b"a").unwrap();

        dir.release().unwrap();
        assert_eq!(entries(root.path()), 0);
    }

    #[test]
    fn test_acquire_failure_leaves_nothing() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("does-not-exist");
        let ws = Workspace::in_dir(&missing);
        assert!(ws.acquire("t", ".docx", b"x").is_err());
        assert!(ws.acquire_dir("t").is_err());
        assert_eq!(entries(root.path()), 0);
    }
}
