//! Interceptor chain and operations of the document service

use converter::{ConvertError, ConvertResult, Converter};
use job_pool::{JobContext, JobPool};
use pipeline::{GenerationPipeline, GenerationRequest};
use placeholder::Grammar;
use service::{
    operation, CallMetrics, DocService, RateLimiter, RequestMetadata, ServiceConfig,
    ServiceError, StaticCredentials,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use store::docx::testing::DocxFixture;
use store::Workspace;
use tempfile::TempDir;

const KEY: &str = "test-key-123";

struct EchoRenderer;

impl Converter for EchoRenderer {
    fn locate(&self) -> ConvertResult<PathBuf> {
        Ok(PathBuf::from("/opt/office/soffice"))
    }

    fn convert(&self, input: &Path) -> ConvertResult<Vec<u8>> {
        let size = std::fs::metadata(input)?.len();
        Ok(format!("%PDF-1.7 {size}").into_bytes())
    }
}

struct MissingRenderer;

impl Converter for MissingRenderer {
    fn locate(&self) -> ConvertResult<PathBuf> {
        Err(ConvertError::RendererNotFound { searched: vec![PathBuf::from("/usr/bin/soffice")] })
    }

    fn convert(&self, _input: &Path) -> ConvertResult<Vec<u8>> {
        Err(ConvertError::RendererNotFound { searched: Vec::new() })
    }
}

struct Fixture {
    _root: TempDir,
    service: DocService,
    metrics: Arc<CallMetrics>,
}

fn fixture_with(converter: Arc<dyn Converter>, limiter: Option<RateLimiter>) -> Fixture {
    let root = tempfile::tempdir().unwrap();
    let pipeline = GenerationPipeline::new(
        Arc::new(JobPool::new(2)),
        Workspace::in_dir(root.path()),
        Grammar::SingleBrace,
        converter,
    );
    let metrics = Arc::new(CallMetrics::new());
    let service = DocService::new(pipeline, Arc::new(StaticCredentials::new([KEY])))
        .with_rate_limiter(limiter)
        .with_metrics(metrics.clone());
    Fixture {
        _root: root,
        service,
        metrics,
    }
}

fn fixture() -> Fixture {
    fixture_with(Arc::new(EchoRenderer), None)
}

fn authed() -> RequestMetadata {
    RequestMetadata::new().with_api_key(KEY).with_peer("127.0.0.1:40000")
}

fn template() -> Vec<u8> {
    DocxFixture::new()
        .paragraph(&["Nomor: {nomor}"])
        .paragraph(&["Perihal: {perihal}"])
        .build()
}

#[tokio::test]
async fn get_placeholders_with_valid_key() {
    let f = fixture();
    let mut names = f.service.get_placeholders(&authed(), template()).await.unwrap();
    names.sort();
    assert_eq!(names, vec!["nomor", "perihal"]);
    assert_eq!(f.metrics.snapshot().count(operation::LIST_PLACEHOLDERS, "ok"), 1);
}

#[tokio::test]
async fn bearer_token_is_accepted() {
    let f = fixture();
    let meta = RequestMetadata::new().with_authorization(format!("Bearer {KEY}"));
    assert!(f.service.get_placeholders(&meta, template()).await.is_ok());
}

#[tokio::test]
async fn rejections_are_counted() {
    let f = fixture();

    let err = f
        .service
        .get_placeholders(&RequestMetadata::new(), template())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "unauthenticated");

    let err = f
        .service
        .generate_docx(
            &RequestMetadata::new().with_api_key("wrong"),
            JobContext::new(),
            GenerationRequest::new(template()),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "permission_denied");

    let snapshot = f.metrics.snapshot();
    assert_eq!(snapshot.count(operation::LIST_PLACEHOLDERS, "unauthenticated"), 1);
    assert_eq!(snapshot.count(operation::GENERATE_DOCUMENT, "permission_denied"), 1);
}

#[tokio::test]
async fn generate_docx_and_pdf() {
    let f = fixture();
    let request = GenerationRequest::new(template())
        .set("nomor", "001/2024")
        .with_filename_hint("undangan");

    let docx = f
        .service
        .generate_docx(&authed(), JobContext::new(), request.clone())
        .await
        .unwrap();
    assert_eq!(docx.filename, "undangan.docx");
    let filled = store::DocxPackage::from_bytes(&docx.content).unwrap();
    assert_eq!(filled.placeholders(Grammar::SingleBrace).unwrap(), vec!["perihal"]);

    let pdf = f
        .service
        .generate_pdf(&authed(), JobContext::new(), request)
        .await
        .unwrap();
    assert_eq!(pdf.filename, "undangan.pdf");
    assert_eq!(pdf.content_type, "application/pdf");
    assert!(pdf.content.starts_with(b"%PDF"));

    let snapshot = f.metrics.snapshot();
    assert_eq!(snapshot.count(operation::GENERATE_DOCUMENT, "ok"), 1);
    assert_eq!(snapshot.count(operation::GENERATE_RENDERED, "ok"), 1);
}

#[tokio::test]
async fn empty_template_is_invalid_argument() {
    let f = fixture();
    let err = f.service.get_placeholders(&authed(), Vec::new()).await.unwrap_err();
    assert_eq!(err.code(), "invalid_argument");
}

#[tokio::test(start_paused = true)]
async fn rate_limit_rejects_after_burst() {
    let f = fixture_with(Arc::new(EchoRenderer), Some(RateLimiter::new(2.0, 3)));

    for _ in 0..3 {
        f.service.get_placeholders(&authed(), template()).await.unwrap();
    }
    let err = f.service.get_placeholders(&authed(), template()).await.unwrap_err();
    assert!(matches!(err, ServiceError::ResourceExhausted));

    // Rejected callers never consume tokens
    let err = f
        .service
        .get_placeholders(&RequestMetadata::new(), template())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "unauthenticated");

    let snapshot = f.metrics.snapshot();
    assert_eq!(snapshot.count(operation::LIST_PLACEHOLDERS, "ok"), 3);
    assert_eq!(snapshot.count(operation::LIST_PLACEHOLDERS, "resource_exhausted"), 1);
}

#[tokio::test]
async fn renderer_not_found_surfaces_distinct_code() {
    let f = fixture_with(Arc::new(MissingRenderer), None);
    let err = f
        .service
        .generate_pdf(&authed(), JobContext::new(), GenerationRequest::new(template()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "renderer_not_found");
    assert!(!err.to_string().contains("/usr/bin"));

    assert_eq!(f.service.check_renderer().unwrap_err().code(), "renderer_not_found");
}

#[test]
fn check_renderer_reports_path() {
    let f = fixture();
    assert_eq!(f.service.check_renderer().unwrap(), PathBuf::from("/opt/office/soffice"));
}

#[tokio::test]
async fn expired_caller_context_is_cancelled() {
    let f = fixture();
    let ctx = JobContext::new();
    ctx.cancel();
    let err = f
        .service
        .generate_docx(&authed(), ctx, GenerationRequest::new(template()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "cancelled");
    assert_eq!(f.metrics.snapshot().count(operation::GENERATE_DOCUMENT, "cancelled"), 1);
}

#[test]
fn from_config_builds_service() {
    let root = tempfile::tempdir().unwrap();
    let mut config = ServiceConfig::default();
    config.pool.capacity = 3;
    config.auth.api_keys = vec![KEY.to_string()];
    config.workspace.root = Some(root.path().to_path_buf());
    config.renderer.candidates = Some(vec![root.path().join("missing-soffice")]);
    config.request_timeout_secs = Some(60);

    let service = DocService::from_config(&config).unwrap();
    assert_eq!(service.pipeline().pool().capacity(), 3);

    config.pool.capacity = 0;
    assert!(matches!(DocService::from_config(&config), Err(ServiceError::Config(_))));
}
