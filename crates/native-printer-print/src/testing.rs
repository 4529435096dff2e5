// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test doubles shared by the unit tests of this crate.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use native_printer_bridge::Printer;
use native_printer_core::error::{NativePrinterError, Result};

use crate::fetcher::DocumentFetcher;
use crate::job::PrinterFactory;

pub const SAMPLE_PDF: &[u8] = b"%PDF-1.4 sample";

/// What a [`FakePrinter`] should do.
#[derive(Debug, Clone, Default)]
pub struct PrinterScript {
    pub names: Vec<String>,
    pub fail_list: bool,
    pub fail_open: bool,
    pub fail_print: bool,
}

/// Records every call into a shared log, e.g. `open:Office`,
/// `print:Office:%PDF-1.4 sample`, `close`.
pub struct FakePrinter {
    script: PrinterScript,
    calls: Arc<Mutex<Vec<String>>>,
    target: String,
}

impl Printer for FakePrinter {
    fn list_printers(&self) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push("list".into());
        if self.script.fail_list {
            return Err(NativePrinterError::EnumerationFailed("lpstat exploded".into()));
        }
        Ok(self.script.names.clone())
    }

    fn open(&mut self, name: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("open:{name}"));
        if self.script.fail_open {
            return Err(NativePrinterError::OpenFailed {
                printer: name.into(),
                detail: "no such printer".into(),
            });
        }
        self.target = name.into();
        Ok(())
    }

    fn print(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read(path).unwrap_or_default();
        self.calls.lock().unwrap().push(format!(
            "print:{}:{}",
            self.target,
            String::from_utf8_lossy(&content)
        ));
        if self.script.fail_print {
            return Err(NativePrinterError::PrintFailed("paper jam".into()));
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.calls.lock().unwrap().push("close".into());
        Ok(())
    }
}

/// Factory producing [`FakePrinter`]s that all log into `calls`.
pub fn fake_printers(script: PrinterScript, calls: Arc<Mutex<Vec<String>>>) -> PrinterFactory {
    Arc::new(move || {
        calls.lock().unwrap().push("create".into());
        Box::new(FakePrinter {
            script: script.clone(),
            calls: Arc::clone(&calls),
            target: String::new(),
        }) as Box<dyn Printer>
    })
}

/// One scripted download outcome.
#[derive(Debug, Clone)]
pub enum Fetch {
    Write(Vec<u8>),
    Status(u16),
    /// Leave a partial file behind, then fail.
    PartialThenFail(Vec<u8>),
}

/// Fetcher that plays back scripted outcomes; once the script is exhausted
/// every fetch writes [`SAMPLE_PDF`].
#[derive(Default)]
pub struct FakeFetcher {
    script: Mutex<VecDeque<Fetch>>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn new(script: impl IntoIterator<Item = Fetch>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentFetcher for FakeFetcher {
    async fn fetch(&self, _url: &Url, destination: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Fetch::Write(SAMPLE_PDF.to_vec()));
        match next {
            Fetch::Write(body) => {
                std::fs::write(destination, body)?;
                Ok(())
            }
            Fetch::Status(code) => Err(NativePrinterError::BadStatus(code)),
            Fetch::PartialThenFail(body) => {
                std::fs::write(destination, body)?;
                Err(NativePrinterError::WriteFailed("connection reset".into()))
            }
        }
    }
}
