mod config;
mod metrics;

use anyhow::{Context, Result};
use cascade::{AnalysisError, Analyzer};
use clap::Parser;
use config::{AppConfig, OperationMode};
use extract::{CoverageSummary, OllamaClient};
use ingest::{FileReader, Tokenizer, WordTokenizer};
use metrics::{Metrics, TimedOperation};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Analyze a long insurance-policy document: extract coverage per chunk,
/// merge, then generate a comparison summary and FAQ answers.
#[derive(Debug, Parser)]
#[command(name = "analyzer", version)]
struct Cli {
    /// Document to analyze (.txt or .md); reads stdin when omitted or "-"
    document: Option<PathBuf>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Preset used when no config file is given
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    base_url: Option<String>,

    /// Token budget per chunk
    #[arg(long)]
    max_tokens: Option<usize>,

    /// tokenizer.json of the model (requires the hf-tokenizer feature)
    #[arg(long)]
    tokenizer: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Pretty-print the result
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ModeArg {
    Fast,
    Balanced,
    Accurate,
}

impl From<ModeArg> for OperationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Fast => OperationMode::Fast,
            ModeArg::Balanced => OperationMode::Balanced,
            ModeArg::Accurate => OperationMode::Accurate,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    detail: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Analyzer failed");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::for_mode(cli.mode.map(Into::into).unwrap_or(OperationMode::Balanced)),
    };

    if let Some(model) = &cli.model {
        config.generation.model = model.clone();
    }
    if let Some(base_url) = &cli.base_url {
        config.generation.base_url = base_url.clone();
    }
    if let Some(max_tokens) = cli.max_tokens {
        config.chunking.max_tokens = max_tokens;
    }
    if let Some(path) = &cli.tokenizer {
        config.generation.tokenizer_path = Some(path.clone());
    }

    Ok(config)
}

fn build_tokenizer(path: Option<&Path>) -> Result<Arc<dyn Tokenizer>> {
    match path {
        None => Ok(Arc::new(WordTokenizer)),
        #[cfg(feature = "hf-tokenizer")]
        Some(path) => Ok(Arc::new(ingest::HfTokenizer::from_file(path)?)),
        #[cfg(not(feature = "hf-tokenizer"))]
        Some(path) => anyhow::bail!(
            "Tokenizer {:?} requires building with the hf-tokenizer feature",
            path
        ),
    }
}

async fn read_document(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => FileReader::read_file(path).await,
        _ => FileReader::read_stdin().await,
    }
}

fn exit_code_for(error: &AnalysisError) -> ExitCode {
    if error.is_input_error() {
        ExitCode::from(2)
    } else {
        ExitCode::from(3)
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;
    tracing::info!(
        mode = ?config.mode,
        model = %config.generation.model,
        max_tokens = config.chunking.max_tokens,
        "Starting analyzer"
    );

    let tokenizer = build_tokenizer(config.generation.tokenizer_path.as_deref())?;
    let generator = Arc::new(OllamaClient::new(
        config.generation.base_url.clone(),
        config.generation.model.clone(),
    ));
    let analyzer = Analyzer::new(generator, tokenizer, config.analyzer_config())
        .context("Failed to build analyzer")?;

    let document = read_document(cli.document.as_deref()).await?;
    let metrics = Metrics::new();
    let timer = TimedOperation::start();

    let outcome = analyzer.analyze_with_report(&document).await;

    let code = match outcome {
        Ok(report) => {
            metrics.record_success(&report);

            let coverage = CoverageSummary::from_record(&report.result.extract);
            tracing::info!(
                insurer = coverage.insurer.as_deref().unwrap_or("unknown"),
                covered = coverage.covered.len(),
                not_covered = coverage.not_covered.len(),
                not_mentioned = coverage.not_mentioned.len(),
                unknown_flags = ?coverage.unknown_flags,
                "Coverage summary"
            );

            print_json(&report.result, cli.pretty)?;
            ExitCode::SUCCESS
        }
        Err(e) => {
            metrics.record_failure(&e);
            tracing::warn!(kind = e.kind(), error = %e, "Analysis rejected");

            print_json(
                &ErrorResponse {
                    error: e.kind(),
                    detail: e.to_string(),
                },
                cli.pretty,
            )?;
            exit_code_for(&e)
        }
    };

    tracing::debug!(
        elapsed_ms = timer.elapsed().as_millis() as u64,
        metrics = %serde_json::to_string(&metrics.snapshot())?,
        "Run finished"
    );

    Ok(code)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}
