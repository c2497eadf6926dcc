use crate::router::{self, ApiResponse};
use crate::state::ApiState;
use codebud_core::{CodebudError, Result};
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use tiny_http::{Header, Request, Response, Server};

const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

/// Handle to the running API listener.
pub struct ApiServer {
    server: Arc<Server>,
    handle: Option<thread::JoinHandle<()>>,
    pub listen: SocketAddr,
}

impl ApiServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.listen
    }

    /// Unblocks the accept loop and waits for it to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Binds `addr` and serves the local API on a dedicated thread. Port 0 picks
/// a free port; the bound address is in [`ApiServer::listen`].
pub fn start_api_server(addr: &str, state: Arc<ApiState>) -> Result<ApiServer> {
    let server = Server::http(addr).map_err(|e| {
        CodebudError::Config(format!("Failed to bind API server on {addr}: {e}"))
    })?;
    let listen = server
        .server_addr()
        .to_ip()
        .ok_or_else(|| CodebudError::Config(format!("API server on {addr} is not an IP socket")))?;
    let server = Arc::new(server);

    let accept = Arc::clone(&server);
    let handle = thread::spawn(move || {
        for request in accept.incoming_requests() {
            serve(&state, request);
        }
        tracing::debug!("API server loop finished");
    });

    tracing::info!(%listen, "CodeBud API server running");
    Ok(ApiServer {
        server,
        handle: Some(handle),
        listen,
    })
}

fn serve(state: &ApiState, mut request: Request) {
    let method = request.method().clone();
    let url = request.url().to_string();

    let mut body = String::new();
    let response = if request.as_reader().read_to_string(&mut body).is_err() {
        ApiResponse {
            status: 400,
            body: Some(serde_json::json!({ "error": "invalid body" })),
        }
    } else {
        router::handle(state, &method, &url, &body)
    };

    if response.status >= 500 {
        tracing::error!(%method, url, status = response.status, "API request failed");
    }
    if let Err(e) = request.respond(to_http(response)) {
        tracing::warn!(error = %e, "Failed to send API response");
    }
}

fn to_http(response: ApiResponse) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut http = match response.body {
        Some(body) => {
            let mut http = Response::from_string(body.to_string());
            if let Some(content_type) = header("Content-Type", "application/json") {
                http.add_header(content_type);
            }
            http
        }
        None => Response::from_string(String::new()),
    }
    .with_status_code(response.status);

    for (name, value) in CORS_HEADERS {
        if let Some(cors) = header(name, value) {
            http.add_header(cors);
        }
    }
    http
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}
