// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP download of the document to print.
//
// One GET, no retry.  The response must be `200 OK` and declare a content
// type mentioning "pdf"; only then is the destination file created and the
// body streamed into it chunk by chunk.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};
use url::Url;

use native_printer_core::error::{NativePrinterError, Result};

/// Source of documents for the job pipeline.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Download `url` into `destination`, replacing any existing file.
    ///
    /// On `WriteFailed` a partial file may be left behind; removing it is
    /// the caller's job.
    async fn fetch(&self, url: &Url, destination: &Path) -> Result<()>;
}

/// [`DocumentFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher whose connections give up after `connect_timeout`.
    /// The transfer itself is not time-limited.
    pub fn new(connect_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| NativePrinterError::TransportFailed(format!("build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap a preconfigured client (proxy, TLS roots, user agent).
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    #[instrument(skip_all, fields(url = %url, destination = %destination.display()))]
    async fn fetch(&self, url: &Url, destination: &Path) -> Result<()> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| NativePrinterError::TransportFailed(error_chain(&e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(NativePrinterError::BadStatus(status.as_u16()));
        }

        let content_type = content_type(response.headers());
        if !is_pdf_content_type(&content_type) {
            return Err(NativePrinterError::BadContentType(content_type));
        }

        let mut file = tokio::fs::File::create(destination).await.map_err(|e| {
            NativePrinterError::WriteFailed(format!("create {}: {e}", destination.display()))
        })?;

        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| NativePrinterError::WriteFailed(format!("read body: {}", error_chain(&e))))?
        {
            file.write_all(&chunk).await.map_err(|e| {
                NativePrinterError::WriteFailed(format!("write {}: {e}", destination.display()))
            })?;
            written += chunk.len() as u64;
            debug!(written, "download progress");
        }
        file.flush()
            .await
            .map_err(|e| NativePrinterError::WriteFailed(format!("flush: {e}")))?;

        info!(bytes = written, content_type = %content_type, "document downloaded");
        Ok(())
    }
}

/// The declared content type, or empty when absent.  Non-ASCII bytes are
/// replaced rather than discarding the whole value.
fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_TYPE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_default()
}

/// Lenient content type check: anything mentioning "pdf" in any case.
pub fn is_pdf_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("pdf")
}

/// `reqwest` errors keep the useful part (DNS failure, refused connection)
/// in their source chain; flatten it into one line.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
