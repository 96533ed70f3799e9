//! Composition of workspace, template filling, conversion and the pool

use crate::error::{PipelineError, PipelineResult};
use crate::format::{derive_filename, OutputFormat};
use crate::request::{GenerationRequest, GenerationResult};
use converter::Converter;
use job_pool::{JobContext, JobPool};
use placeholder::{Grammar, SubstitutionMap};
use std::sync::Arc;
use std::time::Instant;
use store::{Artifact, DocxPackage, Workspace};

/// Entry point for the three document operations.
///
/// Cheap to clone; clones share the pool and the converter.
#[derive(Clone)]
pub struct GenerationPipeline {
    pool: Arc<JobPool>,
    workspace: Workspace,
    grammar: Grammar,
    converter: Arc<dyn Converter>,
}

impl std::fmt::Debug for GenerationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationPipeline")
            .field("pool", &self.pool)
            .field("workspace", &self.workspace)
            .field("grammar", &self.grammar)
            .finish_non_exhaustive()
    }
}

impl GenerationPipeline {
    pub fn new(
        pool: Arc<JobPool>,
        workspace: Workspace,
        grammar: Grammar,
        converter: Arc<dyn Converter>,
    ) -> Self {
        Self {
            pool,
            workspace,
            grammar,
            converter,
        }
    }

    pub fn pool(&self) -> &JobPool {
        &self.pool
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    pub fn converter(&self) -> &dyn Converter {
        self.converter.as_ref()
    }

    /// Distinct placeholder names in the template's main document part.
    ///
    /// Runs on the calling thread and is not pool-gated.
    pub fn list_placeholders(&self, template: &[u8]) -> PipelineResult<Vec<String>> {
        if template.is_empty() {
            return Err(PipelineError::empty_template());
        }

        let mut artifact = self.workspace.acquire("template", ".docx", template)?;
        let names = DocxPackage::open(artifact.path())?.placeholders(self.grammar)?;
        release(&mut artifact);

        tracing::debug!(count = names.len(), "listed placeholders");
        Ok(names)
    }

    /// Fill the template and return DOCX bytes
    pub async fn generate_document(
        &self,
        ctx: &JobContext,
        request: GenerationRequest,
    ) -> PipelineResult<GenerationResult> {
        self.generate(ctx, request, OutputFormat::Docx).await
    }

    /// Fill the template, render it, and return PDF bytes
    pub async fn generate_rendered(
        &self,
        ctx: &JobContext,
        request: GenerationRequest,
    ) -> PipelineResult<GenerationResult> {
        self.generate(ctx, request, OutputFormat::Pdf).await
    }

    async fn generate(
        &self,
        ctx: &JobContext,
        request: GenerationRequest,
        format: OutputFormat,
    ) -> PipelineResult<GenerationResult> {
        let GenerationRequest {
            template,
            substitutions,
            filename_hint,
        } = request;
        if template.is_empty() {
            return Err(PipelineError::empty_template());
        }

        // Owned by the job from here on; dropped, and so released, on
        // every path including a submission that never starts.
        let artifact = self.workspace.acquire("template", ".docx", &template)?;
        drop(template);

        let job = Job {
            template: artifact,
            substitutions,
            grammar: self.grammar,
            workspace: self.workspace.clone(),
            converter: Arc::clone(&self.converter),
            format,
        };
        let content = self.pool.submit(ctx, move || job.run()).await?;

        Ok(GenerationResult {
            content,
            content_type: format.content_type().to_string(),
            filename: derive_filename(filename_hint.as_deref(), format),
        })
    }
}

/// Everything one pool job needs, owned so it can outlive its caller
struct Job {
    template: Artifact,
    substitutions: SubstitutionMap,
    grammar: Grammar,
    workspace: Workspace,
    converter: Arc<dyn Converter>,
    format: OutputFormat,
}

impl Job {
    fn run(mut self) -> PipelineResult<Vec<u8>> {
        let started = Instant::now();

        let mut package = DocxPackage::open(self.template.path())?;
        release(&mut self.template);

        let rewritten = package.replace_all(&self.substitutions, self.grammar)?;
        let filled = package.to_bytes()?;
        tracing::debug!(paragraphs = rewritten, "template filled");

        let content = match self.format {
            OutputFormat::Docx => filled,
            OutputFormat::Pdf => {
                let mut input = self.workspace.acquire("filled", ".docx", &filled)?;
                let rendered = self.converter.convert(input.path());
                release(&mut input);
                rendered?
            }
        };

        tracing::debug!(
            format = ?self.format,
            bytes = content.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "generation job finished"
        );
        Ok(content)
    }
}

/// Release an artifact whose content is no longer needed.
///
/// A failed removal does not fail the request; it is logged.
fn release(artifact: &mut Artifact) {
    if let Err(e) = artifact.release() {
        tracing::warn!(path = %artifact.path().display(), error = %e, "failed to release artifact");
    }
}
