//! WebSocket endpoint on the ESP-IDF HTTP server.
//!
//! `/ws` carries the binary protocol. Inbound binary frames are posted to the
//! control task; text `ping` is answered with `pong`.
//!
//! Outbound status frames are queued by the control task ([`FrameQueue`]) and
//! written by a dedicated sender thread through [`Esp32WsSink`]. The client
//! list lock is only held to copy the senders out, never across a send, so the
//! HTTP handler can always register or drop a session.

use crate::config::WebConfig;
use crate::events::{frame_queue, ControlEvent, EventSender, FrameQueue, OUTBOUND_QUEUE_DEPTH};
use crate::traits::{ClientId, FrameSink};
use esp_idf_hal::sys::EspError;
use esp_idf_svc::http::server::ws::EspHttpWsDetachedSender;
use esp_idf_svc::http::server::{Configuration, EspHttpServer};
use esp_idf_svc::ws::FrameType;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

/// Sender thread stack size.
const SENDER_STACK_SIZE: usize = 4096;

type SessionSender = Arc<Mutex<EspHttpWsDetachedSender>>;
type ClientList = Arc<Mutex<Vec<(i32, SessionSender)>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding the lock leaves the data itself intact.
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// HTTP server with the `/ws` endpoint.
pub struct Esp32WsServer {
    _server: EspHttpServer<'static>,
    clients: ClientList,
}

impl Esp32WsServer {
    /// Start the server and register the WebSocket handler.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP server fails to start.
    pub fn new(config: &WebConfig, events: EventSender) -> anyhow::Result<Self> {
        let server_config = Configuration {
            http_port: config.port,
            ..Default::default()
        };
        let mut server = EspHttpServer::new(&server_config)?;
        let clients: ClientList = Arc::new(Mutex::new(Vec::new()));

        let handler_clients = clients.clone();
        server.ws_handler("/ws", move |ws| -> Result<(), EspError> {
            let session = ws.session();

            if ws.is_new() {
                let sender = ws.create_detached_sender()?;
                let count = {
                    let mut list = lock(&handler_clients);
                    list.push((session, Arc::new(Mutex::new(sender))));
                    list.len()
                };
                log::info!("ws client {} connected", session);
                events.post(ControlEvent::ClientCount(count));
                return Ok(());
            }
            if ws.is_closed() {
                let count = {
                    let mut list = lock(&handler_clients);
                    list.retain(|(id, _)| *id != session);
                    list.len()
                };
                log::info!("ws client {} disconnected", session);
                events.post(ControlEvent::ClientCount(count));
                return Ok(());
            }

            let (frame_type, len) = ws.recv(&mut [])?;
            let mut buf = [0u8; 128];
            if len > buf.len() {
                log::debug!("ws frame of {} bytes dropped", len);
                return Ok(());
            }
            ws.recv(&mut buf[..len])?;

            match frame_type {
                FrameType::Binary(_) => {
                    if let Some(event) =
                        ControlEvent::frame(&buf[..len], ClientId::Client(session as u32))
                    {
                        events.post(event);
                    }
                }
                FrameType::Text(_) => {
                    let text = core::str::from_utf8(&buf[..len]).unwrap_or("");
                    if text.trim_end_matches('\0') == "ping" {
                        ws.send(FrameType::Text(false), b"pong")?;
                    }
                }
                _ => {}
            }
            Ok(())
        })?;

        println!("[WS] Server started on port {}", config.port);

        Ok(Self {
            _server: server,
            clients,
        })
    }

    /// Start the sender thread and return the queue feeding it.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn sink(&self) -> anyhow::Result<FrameQueue> {
        let (queue, drain) = frame_queue(OUTBOUND_QUEUE_DEPTH);
        let mut sink = Esp32WsSink {
            clients: self.clients.clone(),
        };
        thread::Builder::new()
            .name("ws-send".into())
            .stack_size(SENDER_STACK_SIZE)
            .spawn(move || drain.forward_to(&mut sink))?;
        Ok(queue)
    }
}

/// [`FrameSink`] writing to the connected WebSocket clients.
///
/// Sends block on the socket, so this runs on the sender thread only.
pub struct Esp32WsSink {
    clients: ClientList,
}

impl FrameSink for Esp32WsSink {
    type Error = EspError;

    fn send_binary_frame(&mut self, frame: &[u8], client: ClientId) -> Result<(), EspError> {
        let targets: Vec<(i32, SessionSender)> = lock(&self.clients)
            .iter()
            .filter(|(id, _)| match client {
                ClientId::Broadcast => true,
                ClientId::Client(c) => c == *id as u32,
            })
            .map(|(id, sender)| (*id, sender.clone()))
            .collect();

        let mut result = Ok(());
        for (id, sender) in targets {
            if let Err(e) = lock(&sender).send(FrameType::Binary(false), frame) {
                log::debug!("ws client {} send failed: {:?}", id, e);
                result = Err(e);
            }
        }
        result
    }
}
