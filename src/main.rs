mod cli;
mod config;

use cli::Args;
use owo_colors::OwoColorize;
use p2_sbom::adapters::outbound::console::StderrProgressReporter;
use p2_sbom::adapters::outbound::filesystem::SnapshotRepository;
use p2_sbom::adapters::outbound::network::{ContentCache, ReqwestTransport};
use p2_sbom::application::dto::{SbomRequest, SbomResponse};
use p2_sbom::application::factories::{FormatterFactory, PresenterFactory};
use p2_sbom::application::use_cases::GenerateSbomUseCase;
use p2_sbom::shared::error::{ExitCode, SbomError};
use p2_sbom::shared::Result;
use std::path::Path;
use std::process;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();
    init_tracing(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("\n{}\n", "❌ An error occurred:".red().bold());
        eprintln!("{}", e);

        // Display error chain
        for cause in e.chain().skip(1) {
            eprintln!("\n{} {}", "Caused by:".yellow(), cause);
        }

        eprintln!();
        process::exit(ExitCode::for_error(&e).as_i32());
    }
}

/// Diagnostics go to stderr; `RUST_LOG` wins over the default level.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("p2_sbom={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<()> {
    let quiet = args.quiet;
    let config = load_config(&args)?;
    let request = args.into_request(config)?;

    // Load the repository snapshot (fails before any network access)
    let repository = Arc::new(SnapshotRepository::load(&request.snapshot_path)?);

    // Create adapters (Dependency Injection)
    let transport = ReqwestTransport::new()?;
    let content = Arc::new(match &request.cache_dir {
        Some(dir) => ContentCache::new(transport, dir.clone()),
        None => ContentCache::in_temp_dir(transport)?,
    });
    let progress_reporter = if quiet {
        StderrProgressReporter::quiet()
    } else {
        StderrProgressReporter::new()
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; canceling outstanding work");
            on_interrupt.cancel();
        }
    });

    // Create and execute the use case
    let use_case = GenerateSbomUseCase::new(repository, content, progress_reporter);
    let response = use_case.execute(request.clone(), &cancel).await?;

    write_outputs(&request, &response, quiet)
}

fn load_config(args: &Args) -> Result<config::ConfigFile> {
    let loaded = match &args.config {
        Some(path) => config::load_config_from_path(path).map(Some),
        None => config::discover_config(args.input.parent().unwrap_or(Path::new("."))),
    };
    match loaded {
        Ok(config) => Ok(config.unwrap_or_default()),
        Err(e) => Err(SbomError::InvalidConfig {
            message: format!("{:#}", e),
        }
        .into()),
    }
}

fn write_outputs(request: &SbomRequest, response: &SbomResponse, quiet: bool) -> Result<()> {
    let model = response.read_model()?;
    for target in request.output_targets() {
        if !quiet {
            eprintln!("{}", FormatterFactory::progress_message(target.format));
        }
        let formatted_output = FormatterFactory::create(target.format).format(&model)?;

        PresenterFactory::for_target(&target).present(&formatted_output)?;
    }
    Ok(())
}
