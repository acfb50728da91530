//! Control events delivered to the control task.
//!
//! Transport callbacks, the button thread and the console reader never touch
//! the controller. They post a [`ControlEvent`] into a bounded queue and the
//! control task applies it on its own thread. Posting never blocks: when the
//! queue is full the event is dropped and a warning is logged.
//!
//! Status frames travel the other way through a second bounded queue
//! ([`frame_queue`]). The control task only enqueues; a sender thread drains
//! the queue into the real transport, so a slow client never stalls the
//! control loop.
//!
//! ```rust
//! use rs_rmpp::events::{event_queue, ControlEvent};
//! use rs_rmpp::traits::ButtonEvent;
//!
//! let (tx, rx) = event_queue(4);
//! assert!(tx.post(ControlEvent::Button(ButtonEvent::Click)));
//! assert_eq!(rx.try_next(), Some(ControlEvent::Button(ButtonEvent::Click)));
//! assert_eq!(rx.try_next(), None);
//! ```

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};

use heapless::{String as HString, Vec as HVec};
use thiserror::Error;

use crate::traits::{ButtonEvent, ButtonInput, ClientId, FrameSink, NetworkEvent};

/// Largest inbound frame kept in an event.
pub const MAX_FRAME_LEN: usize = 64;
/// Longest console line kept in an event.
pub const MAX_LINE_LEN: usize = 128;
/// Queue depth used by the binaries.
pub const DEFAULT_QUEUE_DEPTH: usize = 32;
/// Outbound frames buffered ahead of the WebSocket sender.
pub const OUTBOUND_QUEUE_DEPTH: usize = 10;

/// Something the control task must act on.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// Binary frame from a client.
    Frame {
        /// Frame bytes as received.
        data: HVec<u8, MAX_FRAME_LEN>,
        /// Sender.
        client: ClientId,
    },
    /// Number of connected clients changed.
    ClientCount(usize),
    /// Local button gesture.
    Button(ButtonEvent),
    /// Wi-Fi state change.
    Network(NetworkEvent),
    /// Configuration was saved.
    ConfigChanged,
    /// Console input line.
    Console(HString<MAX_LINE_LEN>),
}

impl ControlEvent {
    /// Frame event, or `None` if `data` is larger than any valid frame buffer.
    pub fn frame(data: &[u8], client: ClientId) -> Option<Self> {
        HVec::from_slice(data)
            .ok()
            .map(|data| ControlEvent::Frame { data, client })
    }

    /// Console event, truncated to [`MAX_LINE_LEN`].
    pub fn console(line: &str) -> Self {
        let mut s = HString::new();
        for c in line.trim_end().chars() {
            if s.push(c).is_err() {
                break;
            }
        }
        ControlEvent::Console(s)
    }
}

/// Producer side of the control queue. Cheap to clone.
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: SyncSender<ControlEvent>,
}

impl EventSender {
    /// Post without blocking. Returns false if the event was dropped.
    pub fn post(&self, event: ControlEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                log::warn!("control queue full, dropping {:?}", event);
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("control task gone, event dropped");
                false
            }
        }
    }

    /// Sample `button` and post the gesture it reports, if any.
    pub fn poll_button<B: ButtonInput>(
        &self,
        button: &mut B,
        now_ms: u64,
    ) -> Option<ButtonEvent> {
        let event = button.poll_event(now_ms)?;
        log::debug!("button {:?}", event);
        self.post(ControlEvent::Button(event));
        Some(event)
    }
}

/// Consumer side of the control queue, owned by the control task.
#[derive(Debug)]
pub struct EventReceiver {
    rx: Receiver<ControlEvent>,
}

impl EventReceiver {
    /// Next pending event, if any.
    pub fn try_next(&self) -> Option<ControlEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

/// Create a bounded control queue.
pub fn event_queue(depth: usize) -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::sync_channel(depth);
    (EventSender { tx }, EventReceiver { rx })
}

// ============================================================================
// Outbound frames
// ============================================================================

/// Frame waiting for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundFrame {
    /// Encoded frame.
    pub data: HVec<u8, MAX_FRAME_LEN>,
    /// Recipient.
    pub client: ClientId,
}

/// Why a frame was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Sender thread is behind; the frame was dropped.
    #[error("outbound queue full")]
    Full,
    /// Frame does not fit an [`OutboundFrame`].
    #[error("frame larger than {max} bytes", max = MAX_FRAME_LEN)]
    TooLarge,
    /// Sender thread has exited.
    #[error("frame sender gone")]
    Closed,
}

/// Non-blocking [`FrameSink`] feeding the outbound queue.
#[derive(Clone, Debug)]
pub struct FrameQueue {
    tx: SyncSender<OutboundFrame>,
}

impl FrameSink for FrameQueue {
    type Error = QueueError;

    fn send_binary_frame(&mut self, frame: &[u8], client: ClientId) -> Result<(), QueueError> {
        let data = HVec::from_slice(frame).map_err(|_| QueueError::TooLarge)?;
        match self.tx.try_send(OutboundFrame { data, client }) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                log::warn!("outbound queue full, frame for {:?} dropped", client);
                Err(QueueError::Full)
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("frame sender gone, frame dropped");
                Err(QueueError::Closed)
            }
        }
    }
}

/// Consumer side of the outbound queue, owned by the sender thread.
#[derive(Debug)]
pub struct FrameDrain {
    rx: Receiver<OutboundFrame>,
}

impl FrameDrain {
    /// Next queued frame, if any.
    pub fn try_next(&self) -> Option<OutboundFrame> {
        self.rx.try_recv().ok()
    }

    /// Deliver frames to `sink` in order until every [`FrameQueue`] is dropped.
    ///
    /// Blocks between frames. Delivery errors are logged and the frame is lost.
    pub fn forward_to<K: FrameSink>(self, sink: &mut K) {
        for frame in self.rx.iter() {
            if let Err(e) = sink.send_binary_frame(&frame.data, frame.client) {
                log::debug!("frame to {:?} not delivered: {:?}", frame.client, e);
            }
        }
    }
}

/// Create a bounded outbound frame queue.
pub fn frame_queue(depth: usize) -> (FrameQueue, FrameDrain) {
    let (tx, rx) = mpsc::sync_channel(depth);
    (FrameQueue { tx }, FrameDrain { rx })
}
