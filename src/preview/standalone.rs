//! Standalone preview server using tiny_http.
//!
//! A lightweight, zero-framework preview server for development.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mailproof::{MemoryOrderStore, PreviewHandler, Principal};
//! use mailproof::preview::serve;
//!
//! let handler = PreviewHandler::builder("secret", MemoryOrderStore::shared()).build();
//!
//! // Blocking - runs until error or shutdown
//! serve("127.0.0.1:3025", Arc::new(handler), Principal::store_manager("admin"))?;
//! ```

use std::io;
use std::sync::Arc;
use std::thread;

use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::admin::RequestUrl;
use crate::auth::Principal;
use crate::handler::{PreviewHandler, PreviewResponse};

use super::core;

// ============================================================================
// Public API
// ============================================================================

/// Start a blocking preview server at the given address.
pub fn serve(addr: &str, handler: Arc<PreviewHandler>, principal: Principal) -> io::Result<()> {
    PreviewServer::new(addr, handler, principal)?.run()
}

/// A standalone preview server with lifecycle control.
///
/// Every request is handled as `principal`; put the server behind the
/// store's own authentication if it is reachable by anyone else.
pub struct PreviewServer {
    server: Server,
    handler: Arc<PreviewHandler>,
    principal: Principal,
}

impl PreviewServer {
    /// Create a new preview server bound to the given address.
    pub fn new(addr: &str, handler: Arc<PreviewHandler>, principal: Principal) -> io::Result<Self> {
        let server = Server::http(addr).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        Ok(Self {
            server,
            handler,
            principal,
        })
    }

    /// The bound address (useful when binding to port 0).
    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Run the server, blocking the current thread.
    pub fn run(self) -> io::Result<()> {
        run_server(&self.server, &self.handler, &self.principal)
    }

    /// Spawn the server in a background thread.
    ///
    /// Fire-and-forget: the server runs until the process exits.
    pub fn spawn(self) {
        thread::spawn(move || {
            if let Err(e) = run_server(&self.server, &self.handler, &self.principal) {
                tracing::error!(error = %e, "Preview server stopped");
            }
        });
    }
}

// ============================================================================
// Server Implementation
// ============================================================================

fn run_server(server: &Server, handler: &PreviewHandler, principal: &Principal) -> io::Result<()> {
    loop {
        let request = match server.recv() {
            Ok(req) => req,
            Err(e) => return Err(io::Error::new(io::ErrorKind::Other, e)),
        };

        handle_request(request, handler, principal);
    }
}

fn handle_request(request: Request, handler: &PreviewHandler, principal: &Principal) {
    let method = request.method().clone();
    let url = request.url().to_string();
    let (path, query) = parse_path_and_query(&url);

    let response = match (&method, path) {
        (Method::Get, "/") => {
            let host = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Host"))
                .map(|h| h.value.as_str().to_string())
                .unwrap_or_else(|| "localhost".to_string());
            let current = RequestUrl::new(false, host, url.as_str());
            to_tiny(core::index(handler, principal, query, &current))
        }
        (Method::Get, "/json") => json_response(&core::list_email_types(handler)),
        _ => not_found(),
    };

    let _ = request.respond(response);
}

// ============================================================================
// Response Helpers
// ============================================================================

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

fn to_tiny(response: PreviewResponse) -> Response<io::Cursor<Vec<u8>>> {
    let mut out = Response::from_data(response.body.into_bytes())
        .with_status_code(StatusCode(response.status));
    if let Some(h) = header("Content-Type", response.content_type) {
        out.add_header(h);
    }
    out
}

fn json_response<T: serde::Serialize>(data: &T) -> Response<io::Cursor<Vec<u8>>> {
    let body = serde_json::to_vec(data).unwrap_or_default();
    let mut out = Response::from_data(body);
    if let Some(h) = header("Content-Type", "application/json") {
        out.add_header(h);
    }
    out
}

fn not_found() -> Response<io::Cursor<Vec<u8>>> {
    Response::from_data(Vec::new()).with_status_code(StatusCode(404))
}

// ============================================================================
// Utilities
// ============================================================================

/// Split a request URL into path and raw query string.
fn parse_path_and_query(url: &str) -> (&str, &str) {
    url.split_once('?').unwrap_or((url, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_and_query() {
        assert_eq!(parse_path_and_query("/"), ("/", ""));
        assert_eq!(
            parse_path_and_query("/?action=preview_email&type=new_order"),
            ("/", "action=preview_email&type=new_order")
        );
        assert_eq!(parse_path_and_query("/json"), ("/json", ""));
    }
}
