// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Native Printer: OS printer backends.
//!
//! Defines the [`Printer`](traits::Printer) capability and exactly one
//! implementation per host platform, selected at compile time:
//!
//! - Unix-family hosts shell out to the CUPS command-line tools
//!   (`lpstat`, `lp`).
//! - Windows hosts call the Win32 print spooler directly.
//!
//! Any other target gets a backend whose every call fails with
//! `PlatformUnavailable`.

pub mod traits;

#[cfg(unix)]
pub mod unix;

#[cfg(windows)]
pub mod windows;

#[cfg(not(any(unix, windows)))]
pub mod unsupported;

pub use traits::Printer;

/// Create a fresh printer instance for the host operating system.
///
/// The instance starts with no target selected; call
/// [`Printer::open`] to address a specific printer.
pub fn system_printer() -> Box<dyn Printer> {
    #[cfg(unix)]
    {
        Box::new(unix::UnixPrinter::new())
    }
    #[cfg(windows)]
    {
        Box::new(windows::WindowsPrinter::new())
    }
    #[cfg(not(any(unix, windows)))]
    {
        Box::new(unsupported::UnsupportedPrinter)
    }
}
