// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic printer capability.

use std::path::Path;

use native_printer_core::error::Result;

/// A locally attached printer target.
///
/// All methods block on the operating system's print subsystem; from async
/// code call them inside `tokio::task::spawn_blocking`.
pub trait Printer: Send {
    /// Names of the printers installed on this host.  An empty list is a
    /// valid answer, not an error.
    ///
    /// Fails with `EnumerationFailed`.
    fn list_printers(&self) -> Result<Vec<String>>;

    /// Select the printer that subsequent [`print`](Printer::print) calls
    /// address.  Replaces any previously opened target.
    ///
    /// Fails with `OpenFailed`.
    fn open(&mut self, name: &str) -> Result<()>;

    /// Submit the file at `path` to the selected printer.
    ///
    /// Fails with `NotInitialized` when the backend needs an explicit target
    /// and none was opened, or `PrintFailed`.
    fn print(&mut self, path: &Path) -> Result<()>;

    /// Release the platform handle.  Safe to call when nothing was opened
    /// and safe to call more than once.
    ///
    /// Fails with `CloseFailed`.
    fn close(&mut self) -> Result<()>;
}
