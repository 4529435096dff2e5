// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Log output to stdout and to a daily-rotated file in the configured folder.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use native_printer_core::config::LogConfig;
use native_printer_core::error::{NativePrinterError, Result};

/// Base name of the log files (`app.YYYY-MM-DD.log`).
const LOG_FILE_PREFIX: &str = "app";

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the configured level.  If the log folder cannot be
/// used, logging continues on stdout only and the reason is reported once
/// logging is up.  The returned guard flushes the file writer on drop and
/// must be held for the life of the process.
pub fn init(config: &LogConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true);

    match file_appender(config) {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .init();
            tracing::warn!(error = %e, "file logging disabled");
            None
        }
    }
}

fn file_appender(config: &LogConfig) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(&config.folder).map_err(|e| {
        NativePrinterError::Config(format!(
            "create log folder {}: {e}",
            config.folder.display()
        ))
    })?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(config.max_files.max(1))
        .build(&config.folder)
        .map_err(|e| {
            NativePrinterError::Config(format!(
                "open log file in {}: {e}",
                config.folder.display()
            ))
        })
}
