//! Subcommand implementations

use anyhow::{bail, Context, Result};
use clap::Args;
use service::{
    CallMetrics, DocService, GenerationRequest, JobContext, RequestMetadata, ServiceConfig,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// A configured service plus the credential this process presents
pub struct Session {
    service: DocService,
    metadata: RequestMetadata,
    metrics: Arc<CallMetrics>,
}

impl Session {
    pub fn open(config_path: Option<&Path>, api_key: Option<String>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => ServiceConfig::load(path),
            None => ServiceConfig::from_env(),
        }
        .context("failed to load configuration")?;

        let api_key = match api_key {
            Some(key) => key,
            None if config.auth.api_keys.is_empty() => {
                // Nothing to authenticate against: the caller is this process
                let key = uuid::Uuid::new_v4().to_string();
                tracing::debug!("no API keys configured, using a process-local key");
                config.auth.api_keys.push(key.clone());
                key
            }
            None => bail!("an API key is required (--api-key or DOCGEN_API_KEY)"),
        };

        let metrics = Arc::new(CallMetrics::new());
        let service = DocService::from_config(&config)
            .context("failed to start service")?
            .with_metrics(metrics.clone());
        Ok(Self {
            service,
            metadata: RequestMetadata::new().with_api_key(api_key).with_peer("cli"),
            metrics,
        })
    }

    /// Log per-operation call counts and timings gathered so far
    pub fn log_metrics(&self) {
        match serde_json::to_string(&self.metrics.snapshot()) {
            Ok(json) => tracing::debug!(metrics = %json, "call metrics"),
            Err(e) => tracing::debug!(error = %e, "call metrics unavailable"),
        }
    }
}

#[derive(Args)]
pub struct PlaceholdersArgs {
    /// DOCX template
    template: PathBuf,
}

impl PlaceholdersArgs {
    pub async fn execute(self, session: &Session) -> Result<()> {
        let template = read_template(&self.template)?;
        let names = session
            .service
            .get_placeholders(&session.metadata, template)
            .await?;
        for name in names {
            println!("{name}");
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct GenerateArgs {
    /// DOCX template
    template: PathBuf,

    /// Substitution as key=value; repeatable, wins over --data
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_pair)]
    set: Vec<(String, String)>,

    /// JSON object of substitutions
    #[arg(long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Output filename; the extension is added when missing
    #[arg(long, value_name = "HINT")]
    name: Option<String>,

    /// Render to PDF instead of writing DOCX
    #[arg(long)]
    pdf: bool,

    /// Output directory
    #[arg(long, value_name = "DIR", default_value = ".")]
    out: PathBuf,

    /// Stop waiting after this many seconds; a job that already started still finishes
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

impl GenerateArgs {
    pub async fn execute(self, session: &Session) -> Result<()> {
        let template = read_template(&self.template)?;

        let mut substitutions = match &self.data {
            Some(path) => read_data(path)?,
            None => HashMap::new(),
        };
        substitutions.extend(self.set);

        let mut request = GenerationRequest::new(template).with_substitutions(substitutions);
        if let Some(name) = self.name {
            request = request.with_filename_hint(name);
        }

        let mut ctx = JobContext::new();
        if let Some(secs) = self.timeout {
            ctx = ctx.with_timeout(Duration::from_secs(secs));
        }

        // Ctrl-C stops waiting for a slot; a job already running still finishes
        let interrupt = {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("interrupted, cancelling");
                    ctx.cancel();
                }
            })
        };

        let result = if self.pdf {
            session.service.generate_pdf(&session.metadata, ctx, request).await
        } else {
            session.service.generate_docx(&session.metadata, ctx, request).await
        };
        interrupt.abort();
        let result = result?;

        let path = self.out.join(safe_file_name(&result.filename));
        std::fs::write(&path, &result.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("{}", path.display());
        Ok(())
    }
}

pub fn check_renderer(session: &Session) -> Result<()> {
    let path = session.service.check_renderer()?;
    println!("{}", path.display());
    Ok(())
}

fn read_template(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read template {}", path.display()))
}

/// Substitutions from a JSON object; non-string values use their JSON text
fn read_data(path: &Path) -> Result<HashMap<String, String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let serde_json::Value::Object(map) = value else {
        bail!("{} must contain a JSON object", path.display());
    };

    Ok(map
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}

fn parse_pair(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Keep only the final path component of a caller-supplied filename
fn safe_file_name(filename: &str) -> PathBuf {
    Path::new(filename)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("result"))
}
