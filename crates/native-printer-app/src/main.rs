// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native Printer: WebSocket print service.
//
// Entry point. Loads settings, initialises logging, wires the platform
// printer backend into the job pipeline and serves until Ctrl-C.

mod logging;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use native_printer_core::config::{AppConfig, DEFAULT_CONFIG_FILE};
use native_printer_core::error::Result;
use native_printer_core::version;
use native_printer_print::{
    HttpFetcher, JobHandler, OriginPolicy, PrintServer, PrinterFactory, SessionContext,
};

/// Print remote PDFs on this machine's printers over a WebSocket.
#[derive(Debug, Parser)]
#[command(name = "native-printer", version, about)]
struct Cli {
    /// YAML settings file; defaults apply when it does not exist.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Listen on this port instead of `websocket.port`.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (mut config, config_error) = match AppConfig::load(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    if let Some(port) = cli.port {
        config.websocket.port = port;
    }

    let _log_guard = logging::init(&config.log);
    info!("{} starting{}", version::app_name(), version::version_info());
    if let Some(e) = config_error {
        warn!(path = %cli.config.display(), error = %e, "falling back to default settings");
    }

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "print server failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    let printers: PrinterFactory = Arc::new(native_printer_bridge::system_printer);
    let fetcher = HttpFetcher::new(Duration::from_secs(config.print.connect_timeout_secs))?;
    let handler = JobHandler::new(
        config.print.temp_dir.clone(),
        Arc::new(fetcher),
        Arc::clone(&printers),
    );
    let context = Arc::new(SessionContext::new(handler, printers));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.websocket.port));
    let policy = OriginPolicy::from_config(&config.websocket);
    let server = PrintServer::bind(addr, policy, context).await?;

    server.run_until(shutdown_signal()).await;
    info!("print server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
}
