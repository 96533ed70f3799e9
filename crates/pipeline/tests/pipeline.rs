//! End-to-end behaviour of the generation pipeline with a stand-in renderer

use converter::{ConvertError, ConvertResult, Converter, RendererLocator, SofficeConverter};
use job_pool::{JobContext, JobPool, PoolError};
use pipeline::{ErrorKind, GenerationPipeline, GenerationRequest};
use placeholder::Grammar;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;
use store::docx::testing::DocxFixture;
use store::{DocxPackage, Workspace};
use tempfile::TempDir;

enum Behaviour {
    /// Return `%PDF` followed by the input's size
    Render,
    Fail(&'static str),
    /// Block until the sender is dropped or signals, then render
    Gated(Mutex<mpsc::Receiver<()>>),
}

struct FakeConverter {
    behaviour: Behaviour,
    inputs: Mutex<Vec<PathBuf>>,
}

impl FakeConverter {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            inputs: Mutex::new(Vec::new()),
        })
    }
}

impl Converter for FakeConverter {
    fn locate(&self) -> ConvertResult<PathBuf> {
        Ok(PathBuf::from("/fake/soffice"))
    }

    fn convert(&self, input: &Path) -> ConvertResult<Vec<u8>> {
        self.inputs.lock().unwrap().push(input.to_path_buf());
        let size = std::fs::metadata(input)?.len();
        match &self.behaviour {
            Behaviour::Render => Ok(format!("%PDF {size}").into_bytes()),
            Behaviour::Fail(stderr) => Err(ConvertError::Failed {
                status: Some(1),
                stderr: stderr.to_string(),
            }),
            Behaviour::Gated(gate) => {
                let _ = gate.lock().unwrap().recv();
                Ok(format!("%PDF {size}").into_bytes())
            }
        }
    }
}

struct Harness {
    root: TempDir,
    pipeline: GenerationPipeline,
}

impl Harness {
    fn new(capacity: usize, converter: Arc<dyn Converter>) -> Self {
        let root = tempfile::tempdir().unwrap();
        let pipeline = GenerationPipeline::new(
            Arc::new(JobPool::new(capacity)),
            Workspace::in_dir(root.path()),
            Grammar::SingleBrace,
            converter,
        );
        Self { root, pipeline }
    }

    fn artifacts(&self) -> usize {
        std::fs::read_dir(self.root.path()).unwrap().count()
    }
}

fn letter() -> Vec<u8> {
    DocxFixture::new()
        .paragraph(&["Kepada Yth. {na", "ma}"])
        .paragraph(&["di {kota}, {tanggal}"])
        .header(&["{instansi}"])
        .build()
}

async fn wait_for(mut cond: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[test]
fn list_placeholders_is_deduplicated() {
    let h = Harness::new(1, FakeConverter::new(Behaviour::Render));
    let template = DocxFixture::new().paragraph(&["{a}{b}{a}"]).build();

    let mut names = h.pipeline.list_placeholders(&template).unwrap();
    names.sort();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(h.artifacts(), 0);
}

#[test]
fn list_placeholders_recovers_from_unterminated() {
    let h = Harness::new(1, FakeConverter::new(Behaviour::Render));
    let template = DocxFixture::new().paragraph(&["{a{b}"]).build();
    assert_eq!(h.pipeline.list_placeholders(&template).unwrap(), vec!["b"]);
}

#[test]
fn list_placeholders_scans_body_only() {
    let h = Harness::new(1, FakeConverter::new(Behaviour::Render));
    let mut names = h.pipeline.list_placeholders(&letter()).unwrap();
    names.sort();
    assert_eq!(names, vec!["kota", "nama", "tanggal"]);
}

#[test]
fn list_placeholders_rejects_bad_templates() {
    let h = Harness::new(1, FakeConverter::new(Behaviour::Render));

    let err = h.pipeline.list_placeholders(&[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = h.pipeline.list_placeholders(b"plain text, not a zip").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(h.artifacts(), 0);
}

#[tokio::test]
async fn generate_document_fills_body_and_header() {
    let h = Harness::new(2, FakeConverter::new(Behaviour::Render));
    let request = GenerationRequest::new(letter())
        .set("nama", "Ibu Sari")
        .set("kota", "Yogyakarta")
        .set("instansi", "Dinas Pendidikan")
        .set("unused", "ignored")
        .with_filename_hint("surat");

    let result = h
        .pipeline
        .generate_document(&JobContext::new(), request)
        .await
        .unwrap();

    assert_eq!(result.filename, "surat.docx");
    assert_eq!(
        result.content_type,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );

    let filled = DocxPackage::from_bytes(&result.content).unwrap();
    assert_eq!(
        filled.primary_text().unwrap(),
        "Kepada Yth. Ibu Saridi Yogyakarta, {tanggal}"
    );
    assert_eq!(filled.placeholders(Grammar::SingleBrace).unwrap(), vec!["tanggal"]);
    let header = std::str::from_utf8(filled.part("word/header1.xml").unwrap()).unwrap();
    assert!(header.contains("Dinas Pendidikan"));
    assert_eq!(h.artifacts(), 0);
}

#[tokio::test]
async fn generate_document_with_empty_map_is_unchanged() {
    let h = Harness::new(1, FakeConverter::new(Behaviour::Render));
    let template = letter();

    let result = h
        .pipeline
        .generate_document(&JobContext::new(), GenerationRequest::new(template.clone()))
        .await
        .unwrap();

    let before = DocxPackage::from_bytes(&template).unwrap();
    let after = DocxPackage::from_bytes(&result.content).unwrap();
    assert_eq!(
        after.part_names().collect::<Vec<_>>(),
        before.part_names().collect::<Vec<_>>()
    );
    for name in before.part_names() {
        assert_eq!(after.part(name), before.part(name), "{name}");
    }
    assert_eq!(result.filename, "result.docx");
}

#[tokio::test]
async fn generate_document_keeps_existing_extension() {
    let h = Harness::new(1, FakeConverter::new(Behaviour::Render));
    let request = GenerationRequest::new(letter()).with_filename_hint("surat.DOCX");
    let result = h
        .pipeline
        .generate_document(&JobContext::new(), request)
        .await
        .unwrap();
    assert_eq!(result.filename, "surat.DOCX");
}

#[tokio::test]
async fn empty_template_is_rejected_before_the_pool() {
    let h = Harness::new(1, FakeConverter::new(Behaviour::Render));
    let err = h
        .pipeline
        .generate_rendered(&JobContext::new(), GenerationRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_argument");
    assert_eq!(h.artifacts(), 0);
}

#[tokio::test]
async fn malformed_template_is_a_validation_error() {
    let h = Harness::new(1, FakeConverter::new(Behaviour::Render));
    let err = h
        .pipeline
        .generate_document(&JobContext::new(), GenerationRequest::new(b"PK but no".to_vec()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(h.artifacts(), 0);
}

#[tokio::test]
async fn generate_rendered_returns_pdf_and_cleans_up() {
    let fake = FakeConverter::new(Behaviour::Render);
    let h = Harness::new(1, fake.clone());
    let request = GenerationRequest::new(letter()).set("nama", "Budi");

    let result = h
        .pipeline
        .generate_rendered(&JobContext::new(), request)
        .await
        .unwrap();

    assert!(result.content.starts_with(b"%PDF"));
    assert_eq!(result.content_type, "application/pdf");
    assert_eq!(result.filename, "result.pdf");

    let inputs = fake.inputs.lock().unwrap();
    assert_eq!(inputs.len(), 1);
    assert!(inputs[0].starts_with(h.root.path()));
    assert!(!inputs[0].exists());
    assert_eq!(h.artifacts(), 0);
}

#[tokio::test]
async fn conversion_failure_carries_diagnostics() {
    let converter = FakeConverter::new(Behaviour::Fail("Error: source file could not be loaded"));
    let h = Harness::new(1, converter);
    let err = h
        .pipeline
        .generate_rendered(&JobContext::new(), GenerationRequest::new(letter()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConversionFailed);
    assert!(err.to_string().contains("source file could not be loaded"));
    assert_eq!(h.artifacts(), 0);
}

#[tokio::test]
async fn renderer_not_found_leaves_no_artifacts() {
    let root = tempfile::tempdir().unwrap();
    let workspace = Workspace::in_dir(root.path());
    let converter = SofficeConverter::new(
        RendererLocator::new()
            .with_candidates([root.path().join("no-such-soffice")])
            .with_search_path(""),
        workspace.clone(),
    );
    let pipeline = GenerationPipeline::new(
        Arc::new(JobPool::new(1)),
        workspace,
        Grammar::SingleBrace,
        Arc::new(converter),
    );

    let err = pipeline
        .generate_rendered(&JobContext::new(), GenerationRequest::new(letter()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RendererNotFound);
    assert_eq!(err.code(), "renderer_not_found");
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn expired_context_on_busy_pool_releases_template() {
    let h = Harness::new(1, FakeConverter::new(Behaviour::Render));
    let (tx, rx) = mpsc::channel::<()>();

    let pool_user = {
        let pipeline = h.pipeline.clone();
        tokio::spawn(async move {
            let _: Result<(), PoolError<()>> = pipeline
                .pool()
                .submit(&JobContext::new(), move || {
                    let _ = rx.recv();
                    Ok(())
                })
                .await;
        })
    };
    wait_for(|| h.pipeline.pool().in_flight() == 1).await;

    let ctx = JobContext::new().with_timeout(Duration::from_millis(20));
    let err = h
        .pipeline
        .generate_document(&ctx, GenerationRequest::new(letter()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(h.artifacts(), 0);

    drop(tx);
    pool_user.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_caller_does_not_stop_running_job() {
    let (tx, rx) = mpsc::channel::<()>();
    let fake = FakeConverter::new(Behaviour::Gated(Mutex::new(rx)));
    let h = Harness::new(1, fake.clone());

    let ctx = JobContext::new();
    let call = {
        let pipeline = h.pipeline.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            pipeline
                .generate_rendered(&ctx, GenerationRequest::new(letter()))
                .await
        })
    };

    wait_for(|| fake.inputs.lock().unwrap().len() == 1).await;
    ctx.cancel();
    let err = call.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);

    // The job still holds its slot and its filled document
    assert_eq!(h.pipeline.pool().in_flight(), 1);
    assert_eq!(h.artifacts(), 1);

    tx.send(()).unwrap();
    wait_for(|| h.pipeline.pool().in_flight() == 0).await;
    assert_eq!(h.artifacts(), 0);
}
