// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Win32 print spooler backend.
//
// Documents are sent as a RAW spool job: the file bytes go to the printer
// driver untouched, so the printer must understand PDF natively.
//
// Spooler call sequence for one job:
//   OpenPrinterW -> StartDocPrinterW -> StartPagePrinter -> WritePrinter
//   -> EndPagePrinter -> EndDocPrinter -> ClosePrinter

use std::ffi::c_void;
use std::path::Path;
use std::ptr;

use tracing::{debug, info, warn};
use windows_sys::Win32::Foundation::{BOOL, ERROR_INSUFFICIENT_BUFFER, GetLastError, WIN32_ERROR};
use windows_sys::Win32::Graphics::Printing::{
    ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, EnumPrintersW, OpenPrinterW,
    PRINTER_ENUM_CONNECTIONS, PRINTER_ENUM_LOCAL, PRINTER_HANDLE, PRINTER_INFO_4W,
    StartDocPrinterW, StartPagePrinter, WritePrinter,
};

use native_printer_core::error::{NativePrinterError, Result};

use crate::traits::Printer;

/// Document name shown in the Windows print queue.
const DOCUMENT_NAME: &str = "Native Printer";

/// Spooler datatype for pass-through jobs.
const RAW_DATATYPE: &str = "RAW";

/// An open spooler handle.
struct SpoolerHandle {
    raw: PRINTER_HANDLE,
    name: String,
}

// SAFETY: a spooler handle is an opaque kernel-side token, not tied to the
// thread that opened it; the owning `WindowsPrinter` is never shared.
unsafe impl Send for SpoolerHandle {}

/// Printer backed by the Win32 spooler (`winspool.drv`).
pub struct WindowsPrinter {
    handle: Option<SpoolerHandle>,
}

impl WindowsPrinter {
    pub fn new() -> Self {
        Self { handle: None }
    }

    fn release(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        // SAFETY: `raw` came from a successful OpenPrinterW and is closed
        // exactly once because it was taken out of `self.handle`.
        if unsafe { ClosePrinter(handle.raw) } == 0 {
            return Err(NativePrinterError::CloseFailed(format!(
                "ClosePrinter({}): {}",
                handle.name,
                last_error()
            )));
        }
        debug!(printer = %handle.name, "spooler handle closed");
        Ok(())
    }
}

impl Default for WindowsPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WindowsPrinter {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "failed to release spooler handle on drop");
        }
    }
}

impl Printer for WindowsPrinter {
    fn list_printers(&self) -> Result<Vec<String>> {
        let flags = PRINTER_ENUM_LOCAL | PRINTER_ENUM_CONNECTIONS;
        let mut needed: u32 = 0;
        let mut returned: u32 = 0;

        // First call only reports the buffer size.
        // SAFETY: a null buffer with size 0 is the documented way to ask for the size.
        let sized = unsafe {
            EnumPrintersW(
                flags,
                ptr::null(),
                4,
                ptr::null_mut(),
                0,
                &mut needed,
                &mut returned,
            )
        };
        // SAFETY: reads the calling thread's last-error slot.
        let code = if sized == 0 { unsafe { GetLastError() } } else { 0 };
        let Some(needed_bytes) = required_buffer(sized, code, needed)? else {
            return Ok(Vec::new());
        };
        needed = needed_bytes;

        // PRINTER_INFO_4W contains pointers, so keep the buffer aligned.
        let entry_size = std::mem::size_of::<PRINTER_INFO_4W>();
        let mut buf: Vec<PRINTER_INFO_4W> =
            Vec::with_capacity((needed as usize).div_ceil(entry_size));
        // SAFETY: `buf` has at least `needed` bytes of capacity.
        let ok = unsafe {
            EnumPrintersW(
                flags,
                ptr::null(),
                4,
                buf.as_mut_ptr().cast::<u8>(),
                needed,
                &mut needed,
                &mut returned,
            )
        };
        if ok == 0 {
            return Err(NativePrinterError::EnumerationFailed(format!(
                "EnumPrintersW: {}",
                last_error()
            )));
        }

        // SAFETY: the spooler filled `returned` entries at the front of `buf`.
        let entries = unsafe { std::slice::from_raw_parts(buf.as_ptr(), returned as usize) };
        let printers: Vec<String> = entries
            .iter()
            .filter(|info| !info.pPrinterName.is_null())
            // SAFETY: names are NUL-terminated strings inside `buf`.
            .map(|info| unsafe { from_wide_ptr(info.pPrinterName) })
            .collect();
        debug!(count = printers.len(), "enumerated spooler printers");
        Ok(printers)
    }

    fn open(&mut self, name: &str) -> Result<()> {
        self.release()?;

        let wide_name = to_wide(name);
        let mut raw: PRINTER_HANDLE = ptr::null_mut();
        // SAFETY: `wide_name` is NUL-terminated and outlives the call.
        let ok = unsafe { OpenPrinterW(wide_name.as_ptr(), &mut raw, ptr::null()) };
        if ok == 0 {
            return Err(NativePrinterError::OpenFailed {
                printer: name.to_owned(),
                detail: format!("OpenPrinterW: {}", last_error()),
            });
        }

        info!(printer = name, "spooler handle opened");
        self.handle = Some(SpoolerHandle {
            raw,
            name: name.to_owned(),
        });
        Ok(())
    }

    fn print(&mut self, path: &Path) -> Result<()> {
        let Some(handle) = self.handle.as_ref() else {
            return Err(NativePrinterError::NotInitialized);
        };
        let raw = handle.raw;

        let document = std::fs::read(path).map_err(|e| {
            NativePrinterError::PrintFailed(format!("read {}: {e}", path.display()))
        })?;
        let length = u32::try_from(document.len()).map_err(|_| {
            NativePrinterError::PrintFailed(format!(
                "document too large for a single spooler write ({} bytes)",
                document.len()
            ))
        })?;

        let mut doc_name = to_wide(DOCUMENT_NAME);
        let mut datatype = to_wide(RAW_DATATYPE);
        let doc_info = DOC_INFO_1W {
            pDocName: doc_name.as_mut_ptr(),
            pOutputFile: ptr::null_mut(),
            pDatatype: datatype.as_mut_ptr(),
        };

        // SAFETY: `doc_info` points at buffers that live until the end of
        // this function; `raw` is an open handle owned by `self`.
        let job_id = unsafe { StartDocPrinterW(raw, 1, &doc_info) };
        if job_id == 0 {
            return Err(spool_step_failed("StartDocPrinter"));
        }
        debug!(printer = %handle.name, job_id, bytes = length, "spool job started");

        // SAFETY: a document is open on `raw`.
        if unsafe { StartPagePrinter(raw) } == 0 {
            let err = spool_step_failed("StartPagePrinter");
            // SAFETY: closes the document opened above.
            unsafe { EndDocPrinter(raw) };
            return Err(err);
        }

        let mut written: u32 = 0;
        // SAFETY: `document` holds `length` readable bytes.
        let ok = unsafe {
            WritePrinter(
                raw,
                document.as_ptr().cast::<c_void>(),
                length,
                &mut written,
            )
        };
        if ok == 0 || written != length {
            let err = if ok == 0 {
                spool_step_failed("WritePrinter")
            } else {
                NativePrinterError::PrintFailed(format!(
                    "WritePrinter: wrote {written} of {length} bytes"
                ))
            };
            // SAFETY: unwinds the page and document started above.
            unsafe {
                EndPagePrinter(raw);
                EndDocPrinter(raw);
            }
            return Err(err);
        }

        // SAFETY: a page is open on `raw`.
        if unsafe { EndPagePrinter(raw) } == 0 {
            let err = spool_step_failed("EndPagePrinter");
            // SAFETY: closes the document opened above.
            unsafe { EndDocPrinter(raw) };
            return Err(err);
        }
        // SAFETY: a document is open on `raw`.
        if unsafe { EndDocPrinter(raw) } == 0 {
            return Err(spool_step_failed("EndDocPrinter"));
        }

        info!(printer = %handle.name, job_id, bytes = length, "spool job submitted");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.release()
    }
}

fn spool_step_failed(step: &str) -> NativePrinterError {
    NativePrinterError::PrintFailed(format!("{step}: {}", last_error()))
}

/// Interpret the sizing call of `EnumPrintersW`.  Returns the buffer size to
/// allocate, or `None` when the spooler has no printers.  A failed call only
/// counts as a size report when the error is `ERROR_INSUFFICIENT_BUFFER`.
fn required_buffer(ok: BOOL, code: WIN32_ERROR, needed: u32) -> Result<Option<u32>> {
    if ok == 0 && code != ERROR_INSUFFICIENT_BUFFER {
        return Err(NativePrinterError::EnumerationFailed(format!(
            "EnumPrintersW: {}",
            std::io::Error::from_raw_os_error(code as i32)
        )));
    }
    Ok((needed > 0).then_some(needed))
}

fn last_error() -> String {
    // SAFETY: reads the calling thread's last-error slot.
    let code = unsafe { GetLastError() };
    std::io::Error::from_raw_os_error(code as i32).to_string()
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// # Safety
///
/// `ptr` must point at a NUL-terminated UTF-16 string.
unsafe fn from_wide_ptr(ptr: *const u16) -> String {
    let mut len = 0;
    // SAFETY: guaranteed by the caller.
    unsafe {
        while *ptr.add(len) != 0 {
            len += 1;
        }
        String::from_utf16_lossy(std::slice::from_raw_parts(ptr, len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_without_open_is_not_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("doc.pdf");
        std::fs::write(&doc, b"%PDF-1.4").unwrap();

        let mut printer = WindowsPrinter::new();
        assert!(matches!(
            printer.print(&doc),
            Err(NativePrinterError::NotInitialized)
        ));
    }

    #[test]
    fn close_without_open_succeeds_twice() {
        let mut printer = WindowsPrinter::new();
        printer.close().unwrap();
        printer.close().unwrap();
    }

    #[test]
    fn opening_unknown_printer_fails() {
        let mut printer = WindowsPrinter::new();
        let err = printer
            .open("native-printer test queue that does not exist")
            .unwrap_err();
        assert!(matches!(err, NativePrinterError::OpenFailed { .. }));
    }

    #[test]
    fn required_buffer_reports_buffer_size() {
        assert_eq!(required_buffer(0, ERROR_INSUFFICIENT_BUFFER, 512).unwrap(), Some(512));
    }

    #[test]
    fn required_buffer_with_no_printers_is_empty() {
        assert_eq!(required_buffer(1, 0, 0).unwrap(), None);
    }

    #[test]
    fn required_buffer_failure_is_enumeration_error() {
        // RPC_S_SERVER_UNAVAILABLE: spooler service stopped.
        let err = required_buffer(0, 1722, 0).unwrap_err();
        assert!(matches!(err, NativePrinterError::EnumerationFailed(_)));
    }

    #[test]
    fn wide_round_trip() {
        let wide = to_wide("Office Laser");
        assert_eq!(wide.last(), Some(&0));
        assert_eq!(unsafe { from_wide_ptr(wide.as_ptr()) }, "Office Laser");
    }
}
