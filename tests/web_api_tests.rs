//! Integration tests for the desktop web services.
//!
//! These tests verify the status endpoint and the WebSocket message handling.

#![cfg(feature = "web")]

use std::sync::Arc;

use axum::body::Body;
use axum::extract::ws::Message;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use rs_rmpp::codec::{OutputFlags, StatusFlags};
use rs_rmpp::services::{
    build_router, handle_ws_message, ApiResponse, StatusResponse, WebServerConfig, WebTransport,
};
use rs_rmpp::{
    event_queue, ClientId, ControlEvent, Direction, EventReceiver, FrameSink, OutputMode,
    StatusFrame,
};

fn create_test_app() -> (axum::Router, Arc<WebTransport>, EventReceiver) {
    let (tx, rx) = event_queue(16);
    let transport = Arc::new(WebTransport::new(tx));
    let config = WebServerConfig::default();
    let router = build_router(Arc::clone(&transport), &config);
    (router, transport, rx)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ============================================================================
// Status Endpoint
// ============================================================================

#[tokio::test]
async fn test_status_before_first_frame() {
    let (app, _transport, _rx) = create_test_app();

    let response = app.oneshot(get("/api/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: ApiResponse<StatusResponse> = serde_json::from_slice(&body).unwrap();
    assert!(!json.success);
    assert!(json.data.is_none());
}

#[tokio::test]
async fn test_status_after_publish() {
    let (app, transport, _rx) = create_test_app();

    let frame = StatusFrame {
        output: OutputFlags {
            mode: OutputMode::On,
            direction: Direction::Forward,
        },
        status: StatusFlags {
            external_control: true,
            over_current: false,
            system_fail: false,
        },
        voltage_dv: 121,
        temperature_c: 45,
    };
    let mut sink = transport.sink();
    sink.send_binary_frame(&frame.encode(), ClientId::Broadcast)
        .unwrap();

    let response = app.oneshot(get("/api/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: ApiResponse<StatusResponse> = serde_json::from_slice(&body).unwrap();
    assert!(json.success);

    let data = json.data.unwrap();
    assert_eq!(data.mode, OutputMode::On);
    assert_eq!(data.direction, Direction::Forward);
    assert!(data.external_control);
    assert!(!data.over_current);
    assert!((data.input_voltage - 12.1).abs() < 0.001);
    assert_eq!(data.cpu_temperature, 45);
    assert_eq!(data.clients, 0);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _transport, _rx) = create_test_app();

    let response = app.oneshot(get("/api/state")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: ApiResponse<()> = serde_json::from_slice(&body).unwrap();
    assert_eq!(json.error.as_deref(), Some("Not found"));
}

#[tokio::test]
async fn test_ws_route_requires_upgrade() {
    let (app, _transport, _rx) = create_test_app();

    let response = app.oneshot(get("/ws")).await.unwrap();
    assert!(response.status().is_client_error());
}

// ============================================================================
// WebSocket Messages
// ============================================================================

#[test]
fn test_ping_gets_pong() {
    let (_app, transport, rx) = create_test_app();

    let reply = handle_ws_message(&transport, 1, &Message::Text("ping".into()));
    assert_eq!(reply, Some(Message::Text("pong".into())));
    assert_eq!(rx.try_next(), None);
}

#[test]
fn test_binary_frame_is_posted() {
    let (_app, transport, rx) = create_test_app();

    let reply = handle_ws_message(&transport, 7, &Message::Binary(vec![0x12, 0x00, 0x48]));
    assert_eq!(reply, None);
    assert_eq!(
        rx.try_next(),
        ControlEvent::frame(&[0x12, 0x00, 0x48], ClientId::Client(7))
    );
}

#[test]
fn test_oversized_binary_frame_is_dropped() {
    let (_app, transport, rx) = create_test_app();

    handle_ws_message(&transport, 7, &Message::Binary(vec![0u8; 100]));
    assert_eq!(rx.try_next(), None);
}

#[test]
fn test_other_text_is_ignored() {
    let (_app, transport, rx) = create_test_app();

    assert_eq!(
        handle_ws_message(&transport, 1, &Message::Text("hello".into())),
        None
    );
    assert_eq!(rx.try_next(), None);
}
