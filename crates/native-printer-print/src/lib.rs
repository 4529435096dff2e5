// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native Printer Print: document download, the print job pipeline, and the
// WebSocket server that drives it.  This crate connects the wire types in
// `native-printer-core` to the OS printer backends in
// `native-printer-bridge`.

pub mod fetcher;
pub mod job;
pub mod server;
pub mod session;

#[cfg(test)]
mod testing;

pub use fetcher::{DocumentFetcher, HttpFetcher};
pub use job::{JobHandler, PrinterFactory};
pub use server::{OriginPolicy, PrintServer};
pub use session::SessionContext;
