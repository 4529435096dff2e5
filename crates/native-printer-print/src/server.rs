// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// WebSocket print server.
//
// Accepts TCP connections, upgrades those that ask for `/ws` from an
// admitted origin, and runs one independent session task per connection.
// Sessions share nothing but the read-only `SessionContext`.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::http::header::ORIGIN;
use tracing::{debug, error, info, warn};

use native_printer_core::config::WebSocketConfig;
use native_printer_core::error::{NativePrinterError, Result};

use crate::session::{SessionContext, run_session};

/// The only path that is upgraded to a WebSocket.
pub const WS_PATH: &str = "/ws";

/// Which browser origins may open a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    /// Any origin, including none.
    AllowAny,
    /// Only these exact `Origin` header values.
    AllowList(Vec<String>),
}

impl OriginPolicy {
    /// Derive the policy from the listener settings: either anything goes,
    /// or only pages served by this host on the configured port.
    pub fn from_config(config: &WebSocketConfig) -> Self {
        if config.enable_cors {
            Self::AllowAny
        } else {
            Self::loopback(config.port)
        }
    }

    /// Both loopback spellings on `port`.
    pub fn loopback(port: u16) -> Self {
        Self::AllowList(vec![
            format!("http://localhost:{port}"),
            format!("http://127.0.0.1:{port}"),
        ])
    }

    pub fn admits(&self, origin: Option<&str>) -> bool {
        match self {
            Self::AllowAny => true,
            Self::AllowList(allowed) => {
                origin.is_some_and(|origin| allowed.iter().any(|a| a == origin))
            }
        }
    }
}

/// Listening print server.
pub struct PrintServer {
    listener: TcpListener,
    policy: Arc<OriginPolicy>,
    context: Arc<SessionContext>,
}

impl PrintServer {
    /// Bind the listener.  Failing to bind is the one startup error the
    /// process cannot recover from.
    pub async fn bind(
        addr: SocketAddr,
        policy: OriginPolicy,
        context: Arc<SessionContext>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| NativePrinterError::Server(format!("bind {addr}: {e}")))?;
        info!(addr = %addr, path = WS_PATH, policy = ?policy, "print server listening");
        Ok(Self {
            listener,
            policy: Arc::new(policy),
            context,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever.
    pub async fn run(self) {
        self.run_until(std::future::pending()).await;
    }

    /// Accept connections until `shutdown` completes.  Sessions already
    /// running are left to finish on their own tasks.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("print server shutting down");
                    break;
                }

                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            debug!(peer = %peer, "incoming connection");
                            let policy = Arc::clone(&self.policy);
                            let context = Arc::clone(&self.context);
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, peer, policy, context).await {
                                    warn!(peer = %peer, error = %e, "session ended with error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    policy: Arc<OriginPolicy>,
    context: Arc<SessionContext>,
) -> Result<()> {
    let ws = accept_hdr_async(stream, |request: &Request, response: Response| {
        admit(request, response, &policy, peer)
    })
    .await
    .map_err(|e| NativePrinterError::Server(format!("WebSocket upgrade failed: {e}")))?;

    info!(peer = %peer, "WebSocket connection upgraded");
    run_session(ws, peer, context).await
}

/// Handshake check: right path, admitted origin.
fn admit(
    request: &Request,
    response: Response,
    policy: &OriginPolicy,
    peer: SocketAddr,
) -> std::result::Result<Response, ErrorResponse> {
    let path = request.uri().path();
    if path != WS_PATH {
        warn!(peer = %peer, path, "upgrade requested on unknown path");
        return Err(reject(StatusCode::NOT_FOUND, "not found"));
    }

    let origin = request
        .headers()
        .get(ORIGIN)
        .and_then(|value| value.to_str().ok());
    if !policy.admits(origin) {
        warn!(peer = %peer, origin = ?origin, "origin not allowed");
        return Err(reject(StatusCode::FORBIDDEN, "origin not allowed"));
    }

    Ok(response)
}

fn reject(status: StatusCode, reason: &str) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(reason.to_owned()));
    *response.status_mut() = status;
    response
}
