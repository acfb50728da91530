//! Desktop network services.
//!
//! The `web` feature provides an axum server exposing the same WebSocket
//! protocol as the board, plus a JSON status endpoint. The server and the
//! control task meet in a [`WebTransport`]:
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_rmpp::events::event_queue;
//! use rs_rmpp::services::{build_router, WebServerConfig, WebTransport};
//!
//! let (tx, rx) = event_queue(32);
//! let transport = Arc::new(WebTransport::new(tx));
//! let sink = transport.sink();          // handed to the control task
//! let router = build_router(transport, &WebServerConfig::default());
//! ```

pub mod api;
pub mod shared;
pub mod web;

pub use api::*;
pub use shared::*;
pub use web::*;
