// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One client session over an upgraded WebSocket connection.
//
// On connect the session enumerates printers and sends the list.  After
// that it handles one request at a time: read a frame, decode it, run the
// job, send exactly one response, and only then read the next frame.  A
// read error or Close frame ends the session; bad input never does.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{Instrument, debug, info, info_span, warn};

use native_printer_bridge::Printer;
use native_printer_core::error::{NativePrinterError, Result};
use native_printer_core::types::{JobId, JobRequest, JobResponse};

use crate::job::{JobHandler, PrinterFactory};

/// Everything a session needs, shared read-only by all sessions.
pub struct SessionContext {
    pub handler: JobHandler,
    pub printers: PrinterFactory,
}

impl SessionContext {
    pub fn new(handler: JobHandler, printers: PrinterFactory) -> Self {
        Self { handler, printers }
    }
}

/// Drive one session until the client goes away.
///
/// Returns `Err` only for connection-level failures (enumeration task
/// panicked, a response could not be written); client mistakes and job
/// failures are answered on the socket instead.
pub async fn run_session<S>(
    mut ws: WebSocketStream<S>,
    peer: SocketAddr,
    context: Arc<SessionContext>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let factory = Arc::clone(&context.printers);
    let enumerated = tokio::task::spawn_blocking(move || {
        let printer = factory();
        let listing = printer.list_printers();
        (printer, listing)
    })
    .await;
    let (mut printer, listing) = match enumerated {
        Ok((printer, listing)) => (Some(printer), listing),
        Err(e) => (
            None,
            Err(NativePrinterError::Server(format!(
                "printer enumeration task: {e}"
            ))),
        ),
    };

    let result = match listing {
        Ok(names) => {
            info!(peer = %peer, printers = ?names, "session ready");
            match send_response(&mut ws, &JobResponse::printers(names)).await {
                Ok(()) => receive_loop(&mut ws, peer, &context.handler).await,
                Err(e) => Err(e),
            }
        }
        Err(e) => {
            warn!(peer = %peer, error = %e, "printer enumeration failed");
            let response = JobResponse::error(JobResponse::INTERNAL_ERROR, e.to_string());
            let sent = send_response(&mut ws, &response).await;
            // No printer means the enumeration task itself died.
            if printer.is_none() { Err(e) } else { sent }
        }
    };

    if let Some(printer) = printer.as_deref_mut() {
        release(printer, peer);
    }
    if let Err(e) = ws.close(None).await {
        debug!(peer = %peer, error = %e, "close handshake not completed");
    }
    info!(peer = %peer, "session closed");
    result
}

async fn receive_loop<S>(
    ws: &mut WebSocketStream<S>,
    peer: SocketAddr,
    handler: &JobHandler,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(frame) = ws.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                warn!(peer = %peer, error = %e, "read failed; ending session");
                return Ok(());
            }
        };

        let payload: &[u8] = match &frame {
            Message::Text(text) => text.as_bytes(),
            Message::Binary(data) => &data[..],
            Message::Close(_) => {
                debug!(peer = %peer, "client closed the connection");
                return Ok(());
            }
            // Ping/Pong are answered by tungstenite itself.
            _ => continue,
        };
        debug!(peer = %peer, message = %String::from_utf8_lossy(payload), "message received");

        let response = match JobRequest::from_slice(payload) {
            Ok(request) => respond(handler, &request).await,
            Err(e) => {
                warn!(peer = %peer, error = %e, "malformed message");
                JobResponse::error(JobResponse::BAD_REQUEST, format!("malformed message: {e}"))
            }
        };
        send_response(ws, &response).await?;
    }
    Ok(())
}

/// Run a decoded request and turn the outcome into its response.
async fn respond(handler: &JobHandler, request: &JobRequest) -> JobResponse {
    let span = info_span!("job", id = %JobId::new(), printer = %request.printer);
    match handler.handle(request).instrument(span.clone()).await {
        Ok(()) => JobResponse::printed(),
        Err(e) => {
            let code = e.status_code();
            span.in_scope(|| warn!(code, error = %e, "print job failed"));
            let message = if e.is_client_error() {
                format!("invalid request: {e}")
            } else {
                format!("print failed: {e}")
            };
            JobResponse::error(code, message)
        }
    }
}

async fn send_response<S>(ws: &mut WebSocketStream<S>, response: &JobResponse) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let json = response.to_json()?;
    ws.send(Message::text(json))
        .await
        .map_err(|e| NativePrinterError::Server(format!("send response: {e}")))
}

fn release(printer: &mut dyn Printer, peer: SocketAddr) {
    if let Err(e) = printer.close() {
        warn!(peer = %peer, error = %e, "failed to release session printer");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::io::DuplexStream;
    use tokio_tungstenite::tungstenite::protocol::Role;

    use super::*;
    use crate::testing::{Fetch, FakeFetcher, PrinterScript, fake_printers};

    const PEER: &str = "127.0.0.1:50000";
    const PRINT_REQUEST: &str =
        r#"{"action":"printPDF","printer":"Office","fileUrl":"https://example.com/a.pdf"}"#;

    struct Client {
        ws: WebSocketStream<DuplexStream>,
        calls: Arc<Mutex<Vec<String>>>,
        session: tokio::task::JoinHandle<Result<()>>,
        _dir: tempfile::TempDir,
    }

    impl Client {
        async fn recv(&mut self) -> JobResponse {
            loop {
                match self.ws.next().await.expect("session ended").unwrap() {
                    Message::Text(text) => return serde_json::from_str(&text).unwrap(),
                    _ => continue,
                }
            }
        }

        async fn send(&mut self, text: &str) {
            self.ws.send(Message::text(text)).await.unwrap();
        }
    }

    async fn connect(fetches: Vec<Fetch>, script: PrinterScript) -> Client {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let printers = fake_printers(script, Arc::clone(&calls));
        connect_with(fetches, printers, calls).await
    }

    async fn connect_with(
        fetches: Vec<Fetch>,
        printers: PrinterFactory,
        calls: Arc<Mutex<Vec<String>>>,
    ) -> Client {
        let dir = tempfile::tempdir().unwrap();
        let handler = JobHandler::new(
            dir.path().join("temp"),
            Arc::new(FakeFetcher::new(fetches)),
            Arc::clone(&printers),
        );
        let context = Arc::new(SessionContext::new(handler, printers));

        let (server_io, client_io) = tokio::io::duplex(64 * 1024);
        let server_ws = WebSocketStream::from_raw_socket(server_io, Role::Server, None).await;
        let client_ws = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;
        let session = tokio::spawn(run_session(server_ws, PEER.parse().unwrap(), context));

        Client {
            ws: client_ws,
            calls,
            session,
            _dir: dir,
        }
    }

    fn office() -> PrinterScript {
        PrinterScript {
            names: vec!["Office".into(), "Label".into()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn first_message_lists_printers() {
        let mut client = connect(vec![], office()).await;
        let hello = client.recv().await;
        assert_eq!(hello, JobResponse::printers(vec!["Office".into(), "Label".into()]));
    }

    #[tokio::test]
    async fn no_printers_is_still_success() {
        let mut client = connect(vec![], PrinterScript::default()).await;
        let hello = client.recv().await;
        assert_eq!(hello.code, 200);
        assert_eq!(hello.data, Some(Vec::new()));
    }

    #[tokio::test]
    async fn enumeration_failure_reports_500_and_ends_session() {
        let mut client = connect(
            vec![],
            PrinterScript {
                fail_list: true,
                ..Default::default()
            },
        )
        .await;
        let hello = client.recv().await;
        assert_eq!(hello.code, 500);
        assert!(hello.data.is_none());
        client.session.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn crashed_enumeration_reports_500_and_closes_socket() {
        let printers: PrinterFactory =
            Arc::new(|| -> Box<dyn Printer> { panic!("printer driver crashed") });
        let mut client = connect_with(vec![], printers, Arc::new(Mutex::new(Vec::new()))).await;

        let hello = client.recv().await;
        assert_eq!(hello.code, 500);
        assert!(hello.message.contains("printer enumeration task"));

        let err = client.session.await.unwrap().unwrap_err();
        assert!(matches!(err, NativePrinterError::Server(_)));
        assert!(matches!(client.ws.next().await, Some(Ok(Message::Close(_)))));
    }

    #[tokio::test]
    async fn malformed_message_gets_400_and_session_survives() {
        let mut client = connect(vec![], office()).await;
        client.recv().await;

        client.send("this is not json").await;
        let bad = client.recv().await;
        assert_eq!(bad.code, 400);
        assert!(bad.message.starts_with("malformed message"));

        client.send(PRINT_REQUEST).await;
        assert_eq!(client.recv().await, JobResponse::printed());
    }

    #[tokio::test]
    async fn unsupported_action_gets_400() {
        let mut client = connect(vec![], office()).await;
        client.recv().await;

        client
            .send(r#"{"action":"scan","fileUrl":"https://example.com/a.pdf"}"#)
            .await;
        let response = client.recv().await;
        assert_eq!(response.code, 400);
        assert!(response.message.contains("unsupported action: scan"));
    }

    #[tokio::test]
    async fn sequential_requests_get_ordered_independent_responses() {
        let mut client = connect(vec![Fetch::Status(404)], office()).await;
        client.recv().await;

        client.send(PRINT_REQUEST).await;
        client.send(PRINT_REQUEST).await;

        let first = client.recv().await;
        let second = client.recv().await;
        assert_eq!(first.code, 500);
        assert_eq!(first.message, "print failed: download: HTTP request returned status 404");
        assert_eq!(second, JobResponse::printed());
    }

    #[tokio::test]
    async fn close_frame_ends_session_and_releases_printer() {
        let mut client = connect(vec![], office()).await;
        client.recv().await;

        client.ws.close(None).await.unwrap();
        client.session.await.unwrap().unwrap();

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.first().map(String::as_str), Some("create"));
        assert_eq!(calls.last().map(String::as_str), Some("close"));
    }
}
