mod classify;
mod config;
mod http;
mod pipeline;
mod search;
mod table;

pub const USER_AGENT: &str = concat!("client-classify/", env!("CARGO_PKG_VERSION"));

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use classify::{Backend, Classifier};
use config::{BackendKind, Config, ConfigError};
use pipeline::{RunError, RunPaths, RunSummary};
use search::TavilyClient;
use table::OutputLayout;

/// Enrich client companies with web search results and classify them into industries.
#[derive(Parser, Debug)]
#[command(name = "client-classify", version)]
struct Cli {
    /// Clients CSV with `id` and `name` columns [default: <DATA_DIR>/clients.csv]
    clients: Option<PathBuf>,

    /// Directory holding the input tables and the output table
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Industries CSV with `id` and `name` columns [default: <DATA_DIR>/industries.csv]
    #[arg(long)]
    industries: Option<PathBuf>,

    /// Output CSV, always overwritten [default: <DATA_DIR>/classified_clients.csv]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Language-model backend used for classification
    #[arg(long, value_enum, default_value_t = BackendKind::Openai)]
    backend: BackendKind,

    /// Number of clients processed at once (output order is unaffected)
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Omit the industry_id column from the output
    #[arg(long)]
    no_industry_id: bool,
}

impl Cli {
    fn paths(&self) -> RunPaths {
        RunPaths {
            clients: self
                .clients
                .clone()
                .unwrap_or_else(|| self.data_dir.join("clients.csv")),
            industries: self
                .industries
                .clone()
                .unwrap_or_else(|| self.data_dir.join("industries.csv")),
            output: self
                .output
                .clone()
                .unwrap_or_else(|| self.data_dir.join("classified_clients.csv")),
        }
    }

    fn layout(&self) -> OutputLayout {
        if self.no_industry_id {
            OutputLayout::Plain
        } else {
            OutputLayout::WithIndustryId
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Run(#[from] RunError),
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("client_classify=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match run(&cli, |name| std::env::var(name).ok()).await {
        Ok(summary) => {
            info!(
                written = summary.written,
                skipped = summary.skipped,
                degraded = summary.degraded,
                "run complete"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(
    cli: &Cli,
    env: impl Fn(&str) -> Option<String>,
) -> Result<RunSummary, AppError> {
    let config = Config::from_lookup(cli.backend, env)?;
    let http = http::build_client()?;

    let search = TavilyClient::new(http.clone(), &config.tavily);
    let classifier = Backend::new(http, &config.classifier);
    info!(backend = %classifier.describe(), "starting client classification");

    let summary = pipeline::run(
        &cli.paths(),
        cli.layout(),
        &search,
        &classifier,
        cli.concurrency,
    )
    .await?;
    Ok(summary)
}
