//! Living Books storybook simulator entry point.

use std::error::Error;
use std::sync::Arc;

use livingbooks_cli::config::{Settings, StorybookManifest, apply_overrides};
use livingbooks_cli::host::LoggingContentHost;
use livingbooks_cli::observer::JsonEventPrinter;
use livingbooks_cli::simulate::{handle_input, pump_lines, settle_timers};
use livingbooks_coordinator::MarkerSessionCoordinator;
use livingbooks_core::clock::SystemClock;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber. Logs go to stderr; stdout carries events.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    tracing::info!("Starting Living Books storybook simulator");

    // Read configuration from environment and manifest.
    let settings = Settings::from_env()?;
    let manifest = StorybookManifest::load(&settings.manifest_path)?;
    let config = apply_overrides(manifest.coordinator.clone(), |key| std::env::var(key).ok())?;
    let templates = manifest.template_table();
    tracing::info!(markers = ?templates.markers(), "templates registered");

    // Build the coordinator.
    let mut coordinator = MarkerSessionCoordinator::with_collaborators(
        config,
        Arc::new(SystemClock),
        Arc::new(LoggingContentHost::new()),
        Arc::new(templates),
    )?;
    coordinator.subscribe(Arc::new(JsonEventPrinter::new(std::io::stdout())));

    // Sightings and commands share one channel so input order is kept.
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    let reader = tokio::spawn(pump_lines(BufReader::new(tokio::io::stdin()), input_tx));

    let mut ticker = tokio::time::interval(settings.tick);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                coordinator.run_pass();
            }
            input = input_rx.recv() => {
                let Some(input) = input else { break };
                if let Err(err) = handle_input(&mut coordinator, input) {
                    tracing::warn!(%err, "command rejected");
                }
            }
        }
    }

    // Let pending completions and teardowns play out before exiting.
    let passes = settle_timers(&mut coordinator, &SystemClock).await;
    let lines = reader.await??;
    tracing::info!(lines, passes, "input closed, shutting down");

    Ok(())
}
