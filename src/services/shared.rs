//! Desktop WebSocket transport shared between the axum handlers and the
//! control task.
//!
//! The control task owns a [`WebSink`] and writes outbound frames into a tokio
//! broadcast channel; each WebSocket session subscribes to it. Inbound frames
//! and client-count changes are posted to the control queue.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_rmpp::events::event_queue;
//! use rs_rmpp::services::WebTransport;
//!
//! let (tx, rx) = event_queue(32);
//! let transport = Arc::new(WebTransport::new(tx));
//!
//! // Control task writes through the sink
//! let sink = transport.sink();
//!
//! // Web server reads through the router
//! let router = build_router(Arc::clone(&transport), &web_config);
//! ```

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::codec::{decode, Command, StatusFrame};
use crate::events::{ControlEvent, EventSender};
use crate::traits::{ClientId, FrameSink};

/// Outbound frames buffered per session before it starts lagging.
pub const OUTBOUND_CAPACITY: usize = 16;

/// One outbound frame and its addressee.
pub type Outbound = (ClientId, Vec<u8>);

/// State shared by every WebSocket session and the control task's sink.
pub struct WebTransport {
    outbound: broadcast::Sender<Outbound>,
    latest_status: Mutex<Option<StatusFrame>>,
    clients: AtomicUsize,
    next_id: AtomicU32,
    events: EventSender,
}

impl WebTransport {
    /// Transport posting inbound traffic to `events`.
    pub fn new(events: EventSender) -> Self {
        let (outbound, _) = broadcast::channel(OUTBOUND_CAPACITY);
        Self {
            outbound,
            latest_status: Mutex::new(None),
            clients: AtomicUsize::new(0),
            next_id: AtomicU32::new(1),
            events,
        }
    }

    /// Sink for the control task.
    pub fn sink(self: &Arc<Self>) -> WebSink {
        WebSink {
            transport: Arc::clone(self),
        }
    }

    /// Register a new session and report the client count.
    pub fn connect(&self) -> u32 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let count = self.clients.fetch_add(1, Ordering::SeqCst) + 1;
        log::info!("ws client {} connected", id);
        self.events.post(ControlEvent::ClientCount(count));
        id
    }

    /// Drop a session and report the client count.
    pub fn disconnect(&self, id: u32) {
        let count = self.clients.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        log::info!("ws client {} disconnected", id);
        self.events.post(ControlEvent::ClientCount(count));
    }

    /// Connected sessions.
    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::SeqCst)
    }

    /// Subscribe to outbound frames.
    pub fn subscribe(&self) -> broadcast::Receiver<Outbound> {
        self.outbound.subscribe()
    }

    /// Forward a binary frame from session `id` to the control task.
    pub fn receive_frame(&self, id: u32, data: &[u8]) {
        match ControlEvent::frame(data, ClientId::Client(id)) {
            Some(event) => {
                self.events.post(event);
            }
            None => log::debug!("ws frame of {} bytes from {} dropped", data.len(), id),
        }
    }

    /// Most recent status frame sent.
    pub fn latest_status(&self) -> Option<StatusFrame> {
        match self.latest_status.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn publish(&self, frame: &[u8], client: ClientId) {
        if let Ok(Command::Status(status)) = decode(frame) {
            match self.latest_status.lock() {
                Ok(mut guard) => *guard = Some(status),
                Err(poisoned) => *poisoned.into_inner() = Some(status),
            }
        }
        // No subscribers is not an error: the frame is simply not delivered.
        let _ = self.outbound.send((client, frame.to_vec()));
    }
}

/// [`FrameSink`] half of a [`WebTransport`].
#[derive(Clone)]
pub struct WebSink {
    transport: Arc<WebTransport>,
}

impl FrameSink for WebSink {
    type Error = core::convert::Infallible;

    fn send_binary_frame(&mut self, frame: &[u8], client: ClientId) -> Result<(), Self::Error> {
        self.transport.publish(frame, client);
        Ok(())
    }
}

/// True when a frame for `to` should go to session `id`.
pub fn addressed_to(to: ClientId, id: u32) -> bool {
    match to {
        ClientId::Broadcast => true,
        ClientId::Client(c) => c == id,
    }
}
