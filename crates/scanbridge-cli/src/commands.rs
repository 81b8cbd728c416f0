//! Subcommand handlers.

use crate::cli::{ClassifyArgs, Command, RunArgs, SettingsArgs};
use anyhow::{Context, Result};
use scanbridge_bridge::{Bridge, BridgeReport};
use scanbridge_core::Error as CoreError;
use scanbridge_hardware::{AnyScanner, ReplayScanner, ScannerDevice, SerialScanner};
use scanbridge_network::{HttpForwarder, Routes};
use scanbridge_protocol::classify;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn execute(command: Command) -> Result<()> {
    match command {
        Command::Run(args) => run(args).await.map(|_| ()),
        Command::Classify(args) => classify_lines(&args),
        Command::Config(settings) => print_config(&settings),
    }
}

async fn run(args: RunArgs) -> Result<BridgeReport> {
    let config = args.settings.load()?;

    let scanner: AnyScanner = match &args.replay {
        Some(path) => ReplayScanner::new(path)
            .with_line_delay(Duration::from_millis(args.replay_delay_ms))
            .into(),
        None => SerialScanner::from_config(&config).into(),
    };
    let forwarder = HttpForwarder::from_config(&config).map_err(CoreError::from)?;

    info!(
        device = %scanner.info(),
        numeric = %config.numeric_endpoint,
        diagnostics = %config.diagnostics_endpoint,
        "Starting scanner bridge"
    );

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let mut bridge = Bridge::new(scanner, forwarder, &config);
    let report = bridge.run(cancel).await.map_err(CoreError::from)?;

    info!(exit = %report.exit, stats = %report.stats, "Scanner bridge stopped");
    Ok(report)
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, shutting down");
                cancel.cancel();
            }
            Err(error) => warn!(%error, "Unable to listen for the interrupt signal"),
        }
    });
}

fn classify_lines(args: &ClassifyArgs) -> Result<()> {
    let config = args.settings.load()?;
    let routes = Routes::from_config(&config).map_err(CoreError::from)?;

    for line in &args.lines {
        let event = classify(line);
        let request = routes.route(&event).map(|request| {
            json!({
                "endpoint": request.endpoint.as_str(),
                "body": request.payload,
            })
        });
        let output = json!({ "line": line, "event": event, "request": request });
        println!("{}", serde_json::to_string(&output).context("rendering classification")?);
    }
    Ok(())
}

fn print_config(settings: &SettingsArgs) -> Result<()> {
    let config = settings.load()?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}
