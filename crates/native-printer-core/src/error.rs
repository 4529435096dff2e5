// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Native Printer.

use thiserror::Error;

/// Top-level error type for all Native Printer operations.
#[derive(Debug, Error)]
pub enum NativePrinterError {
    // -- Client input --
    #[error("unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("file URL must not be empty")]
    MissingFileUrl,

    #[error("invalid file URL: {0}")]
    InvalidFileUrl(String),

    // -- Printer backend --
    #[error("printer enumeration failed: {0}")]
    EnumerationFailed(String),

    #[error("failed to open printer '{printer}': {detail}")]
    OpenFailed { printer: String, detail: String },

    #[error("printer not initialized")]
    NotInitialized,

    #[error("print failed: {0}")]
    PrintFailed(String),

    #[error("failed to close printer: {0}")]
    CloseFailed(String),

    // -- Document download --
    #[error("HTTP request failed: {0}")]
    TransportFailed(String),

    #[error("HTTP request returned status {0}")]
    BadStatus(u16),

    #[error("document is not a PDF: content type '{0}'")]
    BadContentType(String),

    #[error("failed to save document: {0}")]
    WriteFailed(String),

    // -- Job pipeline --
    /// A job step failed; `step` names where in the pipeline it happened.
    #[error("{step}: {source}")]
    Job {
        step: &'static str,
        #[source]
        source: Box<NativePrinterError>,
    },

    // -- Infrastructure --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("printing is not available on this platform")]
    PlatformUnavailable,
}

impl NativePrinterError {
    /// Wrap `self` with the name of the job step that produced it.
    pub fn at_step(self, step: &'static str) -> Self {
        Self::Job {
            step,
            source: Box::new(self),
        }
    }

    /// Whether the error was caused by what the client sent rather than by
    /// anything that went wrong on this host.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::UnsupportedAction(_)
            | Self::MissingFileUrl
            | Self::InvalidFileUrl(_)
            | Self::Serialization(_) => true,
            Self::Job { source, .. } => source.is_client_error(),
            _ => false,
        }
    }

    /// Response code reported to the client for this error.
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() { 400 } else { 500 }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NativePrinterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_client_errors() {
        assert_eq!(NativePrinterError::MissingFileUrl.status_code(), 400);
        assert_eq!(
            NativePrinterError::UnsupportedAction("scan".into()).status_code(),
            400
        );
    }

    #[test]
    fn operational_errors_map_to_500() {
        let err = NativePrinterError::BadStatus(404).at_step("download");
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_string(), "download: HTTP request returned status 404");
    }

    #[test]
    fn step_context_keeps_source() {
        let err = NativePrinterError::NotInitialized.at_step("print");
        match err {
            NativePrinterError::Job { step, source } => {
                assert_eq!(step, "print");
                assert!(matches!(*source, NativePrinterError::NotInitialized));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
