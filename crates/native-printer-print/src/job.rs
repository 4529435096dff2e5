// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print job pipeline: validate -> download -> print -> clean up.
//
// Every step aborts the rest on failure.  Operational failures are wrapped
// with the name of the step that produced them so the client sees e.g.
// "download: HTTP request returned status 404".

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use native_printer_bridge::Printer;
use native_printer_core::error::{NativePrinterError, Result};
use native_printer_core::types::{Action, JobRequest};

use crate::fetcher::DocumentFetcher;

/// Name of the downloaded document inside the scratch directory.
///
/// The name is fixed per process, so two sessions printing at the same
/// moment share this path.
pub const SCRATCH_FILE_NAME: &str = "temp.pdf";

/// Creates a fresh, unopened printer for each job.
pub type PrinterFactory = Arc<dyn Fn() -> Box<dyn Printer> + Send + Sync>;

/// Runs print jobs.  Holds no per-job state, so one handler serves every
/// session.
pub struct JobHandler {
    scratch_dir: PathBuf,
    fetcher: Arc<dyn DocumentFetcher>,
    printers: PrinterFactory,
}

impl JobHandler {
    pub fn new(
        scratch_dir: impl Into<PathBuf>,
        fetcher: Arc<dyn DocumentFetcher>,
        printers: PrinterFactory,
    ) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            fetcher,
            printers,
        }
    }

    /// Where the document is downloaded to.
    pub fn scratch_path(&self) -> PathBuf {
        self.scratch_dir.join(SCRATCH_FILE_NAME)
    }

    /// Run one job to completion.
    ///
    /// Validation failures return before any network or filesystem access.
    /// Once the download step has started, the scratch file is removed
    /// before this returns, whatever the outcome.
    pub async fn handle(&self, request: &JobRequest) -> Result<()> {
        let url = validate(request)?;

        tokio::fs::create_dir_all(&self.scratch_dir)
            .await
            .map_err(|e| NativePrinterError::Io(e).at_step("scratch-dir"))?;

        let scratch = ScratchFile::new(self.scratch_path());
        self.fetcher
            .fetch(&url, scratch.path())
            .await
            .map_err(|e| e.at_step("download"))?;

        let printers = Arc::clone(&self.printers);
        let printer_name = request.printer.clone();
        let path = scratch.path().to_path_buf();
        tokio::task::spawn_blocking(move || print_document(&printers, &printer_name, &path))
            .await
            .map_err(|e| {
                NativePrinterError::PrintFailed(format!("print task aborted: {e}")).at_step("print")
            })??;

        info!(printer = %request.printer, url = %url, "document printed");
        Ok(())
    }
}

/// Check a request without touching the network or the filesystem.
pub fn validate(request: &JobRequest) -> Result<Url> {
    if request.action != Action::PrintPdf {
        return Err(NativePrinterError::UnsupportedAction(
            request.action.as_str().to_owned(),
        ));
    }
    if request.file_url.is_empty() {
        return Err(NativePrinterError::MissingFileUrl);
    }
    Url::parse(&request.file_url)
        .map_err(|e| NativePrinterError::InvalidFileUrl(format!("{}: {e}", request.file_url)))
}

/// Open the requested printer (or leave the default), print, then close.
/// Runs on the blocking pool.
fn print_document(printers: &PrinterFactory, printer_name: &str, path: &Path) -> Result<()> {
    let mut printer = printers();
    let result = submit(printer.as_mut(), printer_name, path);
    if let Err(e) = printer.close() {
        warn!(printer = printer_name, error = %e, "failed to release printer");
    }
    result
}

fn submit(printer: &mut dyn Printer, printer_name: &str, path: &Path) -> Result<()> {
    if !printer_name.is_empty() {
        printer.open(printer_name).map_err(|e| e.at_step("open"))?;
    }
    printer.print(path).map_err(|e| e.at_step("print"))
}

/// A downloaded document that is deleted when dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "scratch file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove scratch file"
            ),
        }
    }
}
