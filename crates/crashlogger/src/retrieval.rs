//! Read-only HTTP retrieval of the crash log.
//!
//! The server never runs on its own task. The polling loop hands it one
//! accepted connection at a time and waits for that connection to finish,
//! bounded by the configured request wait. Every request, whatever its path,
//! gets the HTML report rendered when the connection was accepted.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    http::{header, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Upper bound on the buffered request head. Also hyper's minimum.
pub const MAX_REQUEST_HEAD: usize = 8 * 1024;

/// How a connection was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceOutcome {
    /// The report was sent.
    Served {
        /// Requested path.
        path: String,
    },
    /// The connection was closed without the report.
    Abandoned,
}

/// Listener for retrieval requests.
#[derive(Debug)]
pub struct RetrievalServer {
    listener: TcpListener,
    request_wait: Duration,
}

impl RetrievalServer {
    /// Bind to `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServerBind`] if the address cannot be bound.
    pub async fn bind(addr: &str, request_wait: Duration) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::ServerBind {
                addr: addr.to_string(),
                source,
            })?;
        Ok(Self {
            listener,
            request_wait,
        })
    }

    /// The address actually bound.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Wait for the next connection. Accept failures are logged and yield `None`.
    pub async fn accept(&self) -> Option<(TcpStream, SocketAddr)> {
        match self.listener.accept().await {
            Ok(accepted) => Some(accepted),
            Err(err) => {
                warn!(%err, "failed to accept retrieval connection");
                None
            }
        }
    }

    /// Answer one connection with the document produced by `render`.
    ///
    /// The connection is closed after one response. Heads that are malformed
    /// or larger than [`MAX_REQUEST_HEAD`] are rejected by hyper, and a client
    /// that is still connected after the request wait is dropped.
    pub async fn serve<F>(&self, stream: TcpStream, peer: SocketAddr, render: F) -> ServiceOutcome
    where
        F: FnOnce() -> String,
    {
        let served = Arc::new(Mutex::new(None));
        let app = report_router(render(), Arc::clone(&served));

        let connection = http1::Builder::new()
            .timer(TokioTimer::new())
            .header_read_timeout(self.request_wait)
            .keep_alive(false)
            .max_buf_size(MAX_REQUEST_HEAD)
            .serve_connection(TokioIo::new(stream), TowerToHyperService::new(app));

        match tokio::time::timeout(self.request_wait, connection).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => debug!(%peer, %err, "retrieval connection failed"),
            Err(_) => debug!(
                %peer,
                wait_ms = self.request_wait.as_millis(),
                "connection still open after wait, closing"
            ),
        }

        let path = served.lock().ok().and_then(|mut slot| slot.take());
        match path {
            Some(path) => {
                info!(%peer, %path, "served crash log");
                ServiceOutcome::Served { path }
            }
            None => {
                debug!(%peer, "closed without serving the crash log");
                ServiceOutcome::Abandoned
            }
        }
    }
}

/// Router that answers every path with `body`, noting the path in `served`.
fn report_router(body: String, served: Arc<Mutex<Option<String>>>) -> Router {
    Router::new().fallback(move |uri: Uri| async move {
        if let Ok(mut slot) = served.lock() {
            *slot = Some(uri.path().to_string());
        }
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                (header::CONNECTION, "close"),
            ],
            body,
        )
            .into_response()
    })
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    async fn server(wait_ms: u64) -> RetrievalServer {
        RetrievalServer::bind("127.0.0.1:0", Duration::from_millis(wait_ms))
            .await
            .unwrap()
    }

    async fn exchange(server: &RetrievalServer, request: &[u8], body: &str) -> (ServiceOutcome, String) {
        let mut client = TcpStream::connect(server.local_addr().unwrap()).await.unwrap();
        client.write_all(request).await.unwrap();

        let (stream, peer) = server.accept().await.unwrap();
        let body = body.to_string();
        let outcome = server.serve(stream, peer, move || body).await;

        let mut response = Vec::new();
        // The server may reset a connection it rejected.
        let _ = client.read_to_end(&mut response).await;
        (outcome, String::from_utf8_lossy(&response).into_owned())
    }

    #[tokio::test]
    async fn test_serves_report_for_any_path() {
        let server = server(500).await;
        let (outcome, response) = exchange(
            &server,
            b"GET /anything HTTP/1.1\r\nHost: test\r\n\r\n",
            "<html>log</html>",
        )
        .await;

        assert_eq!(
            outcome,
            ServiceOutcome::Served {
                path: "/anything".to_string()
            }
        );
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        let lower = response.to_ascii_lowercase();
        assert!(lower.contains("content-type: text/html; charset=utf-8"));
        assert!(lower.contains("content-length: 16"));
        assert!(lower.contains("connection: close"));
        assert!(response.ends_with("<html>log</html>"));
    }

    #[tokio::test]
    async fn test_silent_client_is_abandoned() {
        let server = server(50).await;
        let (outcome, response) = exchange(&server, b"", "<html>log</html>").await;

        assert_eq!(outcome, ServiceOutcome::Abandoned);
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_request_is_abandoned() {
        let server = server(500).await;
        let (outcome, response) = exchange(&server, b"hello there\r\n\r\n", "<html>log</html>").await;

        assert_eq!(outcome, ServiceOutcome::Abandoned);
        assert!(!response.contains("<html>log</html>"));
    }

    #[tokio::test]
    async fn test_oversized_request_head_is_abandoned() {
        let server = server(500).await;
        let mut request = b"GET /".to_vec();
        request.resize(request.len() + 4 * MAX_REQUEST_HEAD, b'a');
        request.extend_from_slice(b" HTTP/1.1\r\n\r\n");

        let (outcome, response) = exchange(&server, &request, "<html>log</html>").await;

        assert_eq!(outcome, ServiceOutcome::Abandoned);
        assert!(!response.contains("<html>log</html>"));
    }

    #[tokio::test]
    async fn test_bind_failure_reports_address() {
        let first = server(50).await;
        let addr = first.local_addr().unwrap().to_string();

        let err = RetrievalServer::bind(&addr, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ServerBind { .. }));
        assert!(err.to_string().contains(&addr));
    }
}
