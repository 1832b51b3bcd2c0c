//! sshdesk backend service
//!
//! Usage: sshdesk-service [--listen ADDR] [--config FILE] [--max-connections N]
//!
//! Serves the line-delimited JSON protocol until interrupted.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use sshdesk_service::telemetry::init_tracing;
use sshdesk_service::{Router, Server, ServiceConfig};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "sshdesk-service")]
#[command(about = "sshdesk backend service", version)]
struct Cli {
    /// Address to listen on (default: 0.0.0.0:8089)
    #[arg(long, short = 'l')]
    listen: Option<String>,

    /// Path to a TOML config file with a [service] table
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Maximum simultaneous connections (0 = unlimited)
    #[arg(long)]
    max_connections: Option<usize>,

    /// Maximum request line length in bytes
    #[arg(long)]
    max_frame_bytes: Option<usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing("info");

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::from(2);
        }
    };

    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "server start error");
            return ExitCode::FAILURE;
        }
    };

    let handle = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("interrupt received, shutting down");
        handle.shutdown();
    }) {
        warn!(error = %e, "failed to install interrupt handler");
    }

    match server.serve(Arc::new(Router::with_defaults())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server error");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<ServiceConfig, sshdesk_service::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };

    if let Some(listen) = &cli.listen {
        config.listen_addr = listen.clone();
    }
    if let Some(max) = cli.max_connections {
        config.max_connections = max;
    }
    if let Some(max) = cli.max_frame_bytes {
        config.max_frame_bytes = max;
    }

    config.validate()?;
    Ok(config)
}
