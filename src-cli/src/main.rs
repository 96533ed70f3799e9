//! docgen - fill DOCX templates and render them to PDF
//!
//! Provides commands for:
//! - `placeholders`: list the placeholders in a template
//! - `generate`: fill a template, optionally rendering it to PDF
//! - `check-renderer`: show which office binary would render PDFs

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::{GenerateArgs, PlaceholdersArgs};

/// Fill DOCX templates and render them to PDF.
#[derive(Parser)]
#[command(name = "docgen", version, about)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API key presented to the service
    #[arg(long, global = true, env = "DOCGEN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print each placeholder in a template, one per line.
    Placeholders(PlaceholdersArgs),
    /// Fill a template and write the result.
    Generate(GenerateArgs),
    /// Print the path of the renderer used for PDF output.
    CheckRenderer,
}

fn main() {
    // Logs go to stderr; stdout carries command output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();

    let result = tokio::runtime::Runtime::new()
        .map_err(anyhow::Error::from)
        .and_then(|rt| rt.block_on(run(cli)));

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let session = commands::Session::open(cli.config.as_deref(), cli.api_key)?;
    let outcome = match cli.command {
        Commands::Placeholders(args) => args.execute(&session).await,
        Commands::Generate(args) => args.execute(&session).await,
        Commands::CheckRenderer => commands::check_renderer(&session),
    };
    session.log_metrics();
    outcome
}
