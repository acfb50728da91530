//! Axum-based WebSocket and status server.
//!
//! Routes:
//! - GET `/ws` - WebSocket carrying the binary protocol; text `ping` is
//!   answered with `pong`
//! - GET `/api/status` - Last published status frame as JSON

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::{Any, CorsLayer};

use crate::config::WebConfig;

use super::api::{ApiResponse, StatusResponse};
use super::shared::{addressed_to, WebTransport};

// ============================================================================
// WebSocket
// ============================================================================

/// Handle one inbound WebSocket message from session `id`.
///
/// Returns the reply to send back, if any.
pub fn handle_ws_message(transport: &WebTransport, id: u32, msg: &Message) -> Option<Message> {
    match msg {
        Message::Text(text) if text.trim() == "ping" => Some(Message::Text("pong".into())),
        Message::Binary(data) => {
            transport.receive_frame(id, data);
            None
        }
        _ => None,
    }
}

/// GET /ws - Upgrade to a WebSocket session
async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(transport): State<Arc<WebTransport>>,
) -> Response {
    ws.on_upgrade(move |socket| ws_session(socket, transport))
}

async fn ws_session(mut socket: WebSocket, transport: Arc<WebTransport>) {
    let id = transport.connect();
    let mut outbound = transport.subscribe();

    loop {
        tokio::select! {
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(msg)) => {
                    if let Some(reply) = handle_ws_message(&transport, id, &msg) {
                        if socket.send(reply).await.is_err() {
                            break;
                        }
                    }
                }
            },
            frame = outbound.recv() => match frame {
                Ok((to, bytes)) if addressed_to(to, id) => {
                    if socket.send(Message::Binary(bytes)).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => log::debug!("ws client {} skipped {} frames", id, n),
                Err(RecvError::Closed) => break,
            },
        }
    }

    transport.disconnect(id);
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /api/status - Returns the last published status
async fn get_status(State(transport): State<Arc<WebTransport>>) -> Response {
    match transport.latest_status() {
        Some(frame) => Json(ApiResponse::ok(StatusResponse::new(
            &frame,
            transport.client_count(),
        )))
        .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<StatusResponse>::err("No status published yet")),
        )
            .into_response(),
    }
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err("Not found")),
    )
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_permissive: true,
        }
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Create from shared WebConfig
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            addr: ([0, 0, 0, 0], config.port).into(),
            cors_permissive: config.cors_permissive,
        }
    }
}

/// Build the Axum router with all routes
pub fn build_router(transport: Arc<WebTransport>, config: &WebServerConfig) -> Router {
    let mut router = Router::new()
        .route("/ws", get(ws_upgrade))
        .route("/api/status", get(get_status))
        .fallback(not_found)
        .with_state(transport);

    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

/// Start the web server
///
/// This function blocks until the server is shut down.
pub async fn run_server(
    transport: Arc<WebTransport>,
    config: WebServerConfig,
) -> Result<(), std::io::Error> {
    let router = build_router(transport, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    println!("Web server listening on http://{}", config.addr);

    axum::serve(listener, router).await
}
