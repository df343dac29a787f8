mod cli;
mod error;
mod events;
mod generator;
mod render;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc::unbounded_channel;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::events::AppEvent;
use crate::generator::backend::HttpBackend;
use crate::generator::backend::config::GenBackendConfig;
use crate::generator::{Generator, SubmitOutcome};
use crate::render::ProgressView;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = GenBackendConfig::load()?;
    if let Some(raw) = &cli.api_url {
        config.override_api_url(raw);
    }
    if let Some(secs) = cli.timeout_secs {
        config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    let environment = cli.environment();
    let base_url = config.resolver().resolve(environment.as_ref());
    let backend = Arc::new(HttpBackend::new(config.request_timeout)?);

    let (event_tx, mut event_rx) = unbounded_channel();
    let mut generator = Generator::new(backend, base_url, config.stage_interval, event_tx.clone());

    let Some((request, submit)) = cli.submission() else {
        return match generator.health().await {
            Ok(status) => {
                println!("{} is {status}", generator.base_url());
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => {
                eprintln!("Health check against {} failed: {err}", generator.base_url());
                Ok(ExitCode::FAILURE)
            }
        };
    };

    let view = tokio::spawn(async move {
        let view = ProgressView::new();
        while let Some(event) = event_rx.recv().await {
            view.handle(&event);
        }
    });

    info!(mode = request.mode.name(), "starting generation");
    let outcome = generator.submit(&request).await?;

    if let (SubmitOutcome::Completed(_), Some(path)) = (&outcome, &submit.output) {
        match generator.save_artifact(path).await {
            Ok(()) => {
                events::send(&event_tx, AppEvent::Status(format!("Saved to {}", path.display())));
            }
            Err(err) => {
                warn!("could not save video: {err}");
                events::send(&event_tx, AppEvent::Warning(err.user_message()));
            }
        }
    }

    drop(generator);
    drop(event_tx);
    view.await.context("progress view task failed")?;

    // After the view has drained, so the share line comes last.
    if let (SubmitOutcome::Completed(result), true) = (&outcome, submit.share) {
        if let Err(err) = render::share(result, io::stdout()) {
            warn!("share failed: {err}");
        }
    }

    Ok(match outcome {
        SubmitOutcome::Completed(_) => ExitCode::SUCCESS,
        SubmitOutcome::Skipped => {
            eprintln!("Nothing to generate: the text is empty");
            ExitCode::SUCCESS
        }
        SubmitOutcome::Busy | SubmitOutcome::Failed(_) => ExitCode::FAILURE,
    })
}
