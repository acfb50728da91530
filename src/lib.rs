//! # rs-rmpp
//!
//! Firmware core for a Wi-Fi model railway power pack (RMPP): an H-bridge PWM
//! output driven by a browser client over a binary WebSocket protocol.
//!
//! ## Features
//!
//! - **Output state machine**: OFF / ON / INHIBIT / FAULT / FAIL with a single owner
//! - **Alive watchdog**: output stops when the client goes quiet for 3 s
//! - **Fault latch**: motor driver protection forces a stop until cleared
//! - **Restart inhibit**: a local stop blocks restarts for 1 s
//! - **Telemetry**: status frame with voltage and temperature every 200 ms
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware, indicator and network abstractions
//! - `codec` - Binary wire format
//! - `controller` - Output state machine that ties everything together
//! - `timer`, `fault`, `telemetry`, `input` - Components the controller polls
//! - `task` - Control loop and event queue (`std`)
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_rmpp::{
//!     OutputController, OutputMode,
//!     hal::{MockFault, MockIndicator, MockPwm},
//! };
//!
//! let mut controller = OutputController::new(MockPwm::new(), MockFault::new(), MockIndicator::new());
//! controller.begin();
//!
//! // Forward at half duty, as sent by the browser
//! controller.process_wire_command(&[0x12, 0x00, 0x48], 0).unwrap();
//! assert_eq!(controller.mode(), OutputMode::On);
//!
//! // Stop command
//! controller.process_wire_command(&[0x12, 0x00, 0x00], 100).unwrap();
//! assert_eq!(controller.mode(), OutputMode::Off);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Serial console command table.
pub mod cli;
/// Binary wire format shared with the browser client.
pub mod codec;
/// Output state machine.
pub mod controller;
/// Over-current fault line monitoring.
pub mod fault;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Push-button debouncing.
pub mod input;
/// Output state and mode.
pub mod state;
/// Periodic status sampling.
pub mod telemetry;
/// Deadline timers polled by the controller loop.
pub mod timer;
/// Core traits for hardware, indicator and network abstraction.
pub mod traits;

/// Shared configuration system for desktop and ESP32.
pub mod config;

/// Control events and the bounded queue carrying them.
#[cfg(feature = "std")]
pub mod events;
/// Control task owning the controller.
#[cfg(feature = "std")]
pub mod task;

/// Desktop WebSocket and JSON services (feature-gated).
#[cfg(feature = "web")]
pub mod services;

// Re-exports for convenience
pub use codec::{Command, FrameError, OutputCommand, StatusFrame};
pub use controller::{IgnoreReason, Outcome, OutputController};
pub use state::{OutputMode, OutputState};
pub use traits::{
    // Hardware
    ButtonEvent,
    ButtonInput,
    // Network
    ClientId,
    Clock,
    Direction,
    FaultDetector,
    FrameSink,
    // Indicator
    Indicator,
    LedColor,
    LedPattern,
    NetworkEvent,
    PwmChannel,
    PwmOutput,
    Sensors,
};

// Config re-exports
pub use config::{Config, DeviceConfig, NetworkConfig, NetworkMode, OutputConfig, WebConfig};

#[cfg(feature = "std")]
pub use events::{event_queue, frame_queue, ControlEvent, EventReceiver, EventSender, FrameQueue};
#[cfg(feature = "std")]
pub use task::ControlTask;
