//! LibreOffice headless conversion

use crate::error::{ConvertError, ConvertResult};
use crate::locate::RendererLocator;
use crate::{Converter, PDF_EXTENSION};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;
use store::{Artifact, Workspace};

/// Converts documents by running `soffice --headless --convert-to pdf`.
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    locator: RendererLocator,
    workspace: Workspace,
    isolated_profile: bool,
}

impl SofficeConverter {
    pub fn new(locator: RendererLocator, workspace: Workspace) -> Self {
        Self {
            locator,
            workspace,
            isolated_profile: true,
        }
    }

    /// Give every conversion its own user profile directory.
    ///
    /// LibreOffice locks its profile, so two conversions sharing one fail
    /// or serialize.
    pub fn with_isolated_profile(mut self, isolated: bool) -> Self {
        self.isolated_profile = isolated;
        self
    }

    fn command(
        &self,
        program: &Path,
        input: &Path,
        outdir: &Path,
        profile: Option<&Artifact>,
    ) -> ConvertResult<Command> {
        let mut cmd = Command::new(program);
        if let Some(profile) = profile {
            let url = url::Url::from_directory_path(profile.path()).map_err(|()| {
                ConvertError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "profile directory is not an absolute path",
                ))
            })?;
            cmd.arg(format!("-env:UserInstallation={url}"));
        }
        cmd.arg("--headless")
            .arg("--convert-to")
            .arg(PDF_EXTENSION)
            .arg("--outdir")
            .arg(outdir)
            .arg(input)
            .stdin(Stdio::null());
        Ok(cmd)
    }
}

impl Converter for SofficeConverter {
    fn locate(&self) -> ConvertResult<PathBuf> {
        self.locator.locate()
    }

    fn convert(&self, input: &Path) -> ConvertResult<Vec<u8>> {
        let program = self.locator.locate()?;

        let mut outdir = self.workspace.acquire_dir("render")?;
        let mut profile = if self.isolated_profile {
            Some(self.workspace.acquire_dir("profile")?)
        } else {
            None
        };

        let started = Instant::now();
        let output = self
            .command(&program, input, outdir.path(), profile.as_ref())?
            .output()
            .map_err(|source| ConvertError::Spawn {
                program: program.clone(),
                source,
            })?;

        tracing::debug!(
            program = %program.display(),
            status = ?output.status.code(),
            duration_ms = started.elapsed().as_millis() as u64,
            "renderer finished"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(status = ?output.status.code(), stderr = %stderr, "renderer failed");
            return Err(ConvertError::Failed {
                status: output.status.code(),
                stderr,
            });
        }

        let expected = outdir.path().join(output_name(input));
        let bytes = match std::fs::read(&expected) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConvertError::MissingOutput(expected));
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(profile) = profile.as_mut() {
            profile.release()?;
        }
        outdir.release()?;
        Ok(bytes)
    }
}

/// `<stem>.pdf` for an input path; dots inside the stem are kept
fn output_name(input: &Path) -> PathBuf {
    let mut name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
    name.push(".");
    name.push(PDF_EXTENSION);
    PathBuf::from(name)
}
