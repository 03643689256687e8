//! CLI entrypoint for llm-council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use council_application::{
    CircuitBreakerBank, EventPublisher, ModelBackend, ModelRegistry, ResultCache,
    RunPipelineUseCase,
};
use council_domain::{HealthStatus, PipelineResult, generate_correlation_id};
use council_infrastructure::{ConfigLoader, EventHub, FileConfig, Severity, build_backend};
use council_presentation::{
    Cli, ConsoleFormatter, OutputFormat, ProgressReporter, ProgressView, SimpleProgress, follow,
};
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber: stderr always, plus a daily-rolling file
/// when `--log-file` is given. The guard must live until exit.
fn init_logging(cli: &Cli) -> Option<WorkerGuard> {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match &cli.log_file {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "llm-council.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .init();

    guard
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?
    };

    let issues = config.validate();
    for issue in issues.iter().filter(|i| i.severity == Severity::Warning) {
        warn!("{}", issue.message);
    }
    let errors: Vec<String> = issues
        .iter()
        .filter(|i| i.is_error())
        .map(|i| i.message.clone())
        .collect();
    if !errors.is_empty() {
        bail!("Invalid configuration:\n  {}", errors.join("\n  "));
    }
    Ok(config)
}

fn exit_code(result: &PipelineResult) -> ExitCode {
    match &result.error {
        None => ExitCode::SUCCESS,
        Some(error) if error.code == "VALIDATION_ERROR" || error.code == "UNKNOWN_MODEL" => {
            ExitCode::from(2)
        }
        Some(_) => ExitCode::FAILURE,
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli);

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&cli)?;
    info!("Starting llm-council");

    // === Dependency Injection ===
    let backend: Arc<dyn ModelBackend> = Arc::new(build_backend(&config.providers)?);
    let registry = Arc::new(
        ModelRegistry::new(Arc::clone(&backend)).with_models(config.model_descriptors()),
    );

    if config.registry.probe_on_start {
        registry.refresh().await;
    } else {
        for model in registry.all() {
            registry.set_health(&model.id, HealthStatus::Ready);
        }
    }

    if cli.list_models {
        print!("{}", ConsoleFormatter::format_models(&registry.all()));
        return Ok(ExitCode::SUCCESS);
    }

    let Some(mut payload) = cli.payload() else {
        bail!("A prompt is required. Use --list-models to see the configured models.");
    };
    let prompt = payload.prompt.clone();
    // Fix the id up front so the progress display can subscribe to it.
    let correlation_id = payload
        .correlation_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(generate_correlation_id);
    payload.correlation_id = Some(correlation_id.clone());

    let shutdown = CancellationToken::new();
    if config.registry.refresh_interval_secs > 0 {
        Arc::clone(&registry).spawn_periodic_refresh(
            Duration::from_secs(config.registry.refresh_interval_secs),
            shutdown.clone(),
        );
    }

    let hub = Arc::new(EventHub::new(Duration::from_secs(
        config.pipeline.event_retention_secs,
    )));
    let use_case = Arc::new(RunPipelineUseCase::new(
        backend,
        registry,
        Arc::new(CircuitBreakerBank::new(config.breaker_policy())),
        Arc::new(ResultCache::new()),
        Arc::clone(&hub) as Arc<dyn EventPublisher>,
        config.pipeline_settings(),
    ));

    // Subscribe before submitting so no event is missed.
    let progress = if cli.quiet {
        None
    } else {
        let stream = hub.subscribe(&correlation_id);
        let view: Box<dyn ProgressView> = if std::io::stderr().is_terminal() {
            Box::new(ProgressReporter::new())
        } else {
            Box::new(SimpleProgress)
        };
        Some(tokio::spawn(async move { follow(stream, view.as_ref()).await }))
    };

    let interrupt = {
        let use_case = Arc::clone(&use_case);
        let correlation_id = correlation_id.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling run {}", correlation_id);
                use_case.cancel(&correlation_id);
            }
        })
    };

    let result = use_case.submit(payload).await;
    interrupt.abort();
    shutdown.cancel();

    if let Some(progress) = progress
        && let Err(e) = progress.await
    {
        warn!("Progress display failed: {}", e);
    }

    let output = match cli.output {
        OutputFormat::Full => ConsoleFormatter::format(&result, &prompt),
        OutputFormat::Synthesis => ConsoleFormatter::format_synthesis_only(&result, &prompt),
        OutputFormat::Json => ConsoleFormatter::format_json(&result),
    };
    println!("{}", output);

    Ok(exit_code(&result))
}
