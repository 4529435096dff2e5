// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CUPS command-line backend for Linux and macOS.
//
// There is no OS-level "open" for a CUPS destination: `open` only records
// the name, and `print` hands the file to `lp`.  Printer enumeration parses
// the text output of `lpstat -p`, one line per destination:
//
//   printer Office_Laser is idle.  enabled since Tue 01 Oct 2026 09:12:01
//   printer Label_Writer disabled since Mon 30 Sep 2026 17:40:22 -
//           Paused

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tracing::{debug, info, warn};

use native_printer_core::error::{NativePrinterError, Result};

use crate::traits::Printer;

/// Marker that starts every destination line in `lpstat -p` output.
const LPSTAT_PRINTER_MARKER: &str = "printer";

/// What `lpstat` prints (on stderr, with a non-zero exit) when CUPS has no
/// destinations configured.
const LPSTAT_NO_DESTINATIONS: &str = "No destinations added";

/// Printer backed by the CUPS `lpstat` and `lp` utilities.
#[derive(Debug, Clone)]
pub struct UnixPrinter {
    /// Destination passed to `lp -d`; empty selects the CUPS default.
    printer_name: String,
    lpstat_bin: OsString,
    lp_bin: OsString,
}

impl UnixPrinter {
    pub fn new() -> Self {
        Self::with_commands("lpstat", "lp")
    }

    /// Use alternative executables for enumeration and submission, e.g.
    /// absolute paths on hosts where CUPS is not on `PATH`.
    pub fn with_commands(lpstat: impl Into<OsString>, lp: impl Into<OsString>) -> Self {
        Self {
            printer_name: String::new(),
            lpstat_bin: lpstat.into(),
            lp_bin: lp.into(),
        }
    }

    /// Currently selected destination (empty for the CUPS default).
    pub fn printer_name(&self) -> &str {
        &self.printer_name
    }
}

impl Default for UnixPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer for UnixPrinter {
    fn list_printers(&self) -> Result<Vec<String>> {
        let output = Command::new(&self.lpstat_bin)
            .arg("-p")
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                NativePrinterError::EnumerationFailed(format!(
                    "run {}: {e}",
                    self.lpstat_bin.to_string_lossy()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains(LPSTAT_NO_DESTINATIONS) {
                debug!("lpstat reports no destinations");
                return Ok(Vec::new());
            }
            return Err(NativePrinterError::EnumerationFailed(describe_failure(
                &self.lpstat_bin,
                &output,
            )));
        }

        let printers = parse_lpstat(&String::from_utf8_lossy(&output.stdout));
        debug!(count = printers.len(), "enumerated CUPS printers");
        Ok(printers)
    }

    fn open(&mut self, name: &str) -> Result<()> {
        self.printer_name = name.to_owned();
        Ok(())
    }

    fn print(&mut self, path: &Path) -> Result<()> {
        let args = lp_args(&self.printer_name, path);
        info!(
            printer = %self.printer_name,
            path = %path.display(),
            "submitting document to lp"
        );

        let output = Command::new(&self.lp_bin)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                let hint = if e.kind() == ErrorKind::NotFound {
                    " (is CUPS installed?)"
                } else {
                    ""
                };
                NativePrinterError::PrintFailed(format!(
                    "run {}: {e}{hint}",
                    self.lp_bin.to_string_lossy()
                ))
            })?;

        if !output.status.success() {
            let detail = describe_failure(&self.lp_bin, &output);
            warn!(printer = %self.printer_name, error = %detail, "lp rejected the job");
            return Err(NativePrinterError::PrintFailed(detail));
        }

        debug!(stdout = %String::from_utf8_lossy(&output.stdout).trim(), "lp accepted the job");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Extract destination names from `lpstat -p` output.
///
/// Keeps the second whitespace-separated field of every line that starts
/// with `printer`; continuation lines (indented alert text) are skipped.
pub fn parse_lpstat(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.starts_with(LPSTAT_PRINTER_MARKER))
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(str::to_owned)
        .collect()
}

/// Arguments for `lp`.  Without a destination `-d` is left out so CUPS
/// falls back to the user's or system default printer.
fn lp_args(printer_name: &str, path: &Path) -> Vec<OsString> {
    let mut args = Vec::with_capacity(3);
    if !printer_name.is_empty() {
        args.push(OsString::from("-d"));
        args.push(OsString::from(printer_name));
    }
    args.push(path.as_os_str().to_owned());
    args
}

fn describe_failure(program: &OsString, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    match output.status.code() {
        Some(code) => format!(
            "{} exited with status {code}: {}",
            program.to_string_lossy(),
            stderr.trim()
        ),
        None => format!(
            "{} terminated by signal: {}",
            program.to_string_lossy(),
            stderr.trim()
        ),
    }
}
