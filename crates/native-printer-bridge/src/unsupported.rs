// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Backend for targets with neither CUPS nor a Win32 spooler.

use std::path::Path;

use native_printer_core::error::{NativePrinterError, Result};

use crate::traits::Printer;

/// Printer returned on platforms without a print backend.
pub struct UnsupportedPrinter;

impl Printer for UnsupportedPrinter {
    fn list_printers(&self) -> Result<Vec<String>> {
        tracing::warn!("Printer::list_printers called on unsupported platform");
        Err(NativePrinterError::PlatformUnavailable)
    }

    fn open(&mut self, _name: &str) -> Result<()> {
        Err(NativePrinterError::PlatformUnavailable)
    }

    fn print(&mut self, _path: &Path) -> Result<()> {
        tracing::warn!("Printer::print called on unsupported platform");
        Err(NativePrinterError::PlatformUnavailable)
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
