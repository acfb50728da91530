//! Network-facing traits and event types.
//!
//! The transport (WebSocket server, desktop or ESP32) is a collaborator of the
//! output controller. Outbound frames go through [`FrameSink`]; inbound frames
//! and client-count changes arrive as control events.

/// Addressee of an outbound frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ClientId {
    /// Every connected client.
    #[default]
    Broadcast,
    /// A single client, by transport-assigned id.
    Client(u32),
}

/// Outbound binary frame path.
///
/// Implementations must not block: when the transport cannot take the frame
/// right now it returns an error and the frame is dropped by the caller.
pub trait FrameSink {
    /// Error type for send failures.
    type Error: core::fmt::Debug;

    /// Queue a binary frame for delivery.
    fn send_binary_frame(&mut self, frame: &[u8], client: ClientId) -> Result<(), Self::Error>;
}

/// Wi-Fi state changes the controller reflects on the status LED.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkEvent {
    /// Wi-Fi driver ready.
    Ready,
    /// Station interface stopped.
    StaStopped,
    /// Associated with the access point.
    StaConnected,
    /// Lost association.
    StaDisconnected,
    /// Station got an address.
    GotIp,
    /// Soft-AP started.
    ApStarted,
    /// Soft-AP stopped.
    ApStopped,
}
