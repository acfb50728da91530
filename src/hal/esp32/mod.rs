//! M5Stack ATOM Lite hardware abstraction layer for the power pack.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-PICO-D4 (ATOM Lite)
//! - **Output stage**: H-bridge motor driver with two PWM inputs and an
//!   active-low fault output
//! - **Inputs**: divided track supply on an ADC pin, front push button
//! - **LED**: one SK6812 RGB LED
//!
//! # Pin Assignments
//!
//! See the [`pins`] module.

mod button;
mod fault;
mod pwm;
mod sensors;

pub use button::Esp32Button;
pub use fault::Esp32Fault;
pub use pwm::Esp32Pwm;
pub use sensors::Esp32Sensors;

#[cfg(feature = "wifi")]
mod nvs;
#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use nvs::Esp32ModeStore;
#[cfg(feature = "wifi")]
pub use wifi::Esp32Wifi;

#[cfg(feature = "esp32-ws")]
mod ws;
#[cfg(feature = "esp32-ws")]
pub use ws::{Esp32WsServer, Esp32WsSink};

/// Pin assignments for the ATOM Lite.
pub mod pins {
    // =========================================================================
    // Output stage
    // =========================================================================

    /// PWM1, reverse leg
    pub const PWM1: i32 = 19;

    /// PWM2, forward leg
    pub const PWM2: i32 = 23;

    /// Driver fault output (active low)
    pub const FAULT: i32 = 22;

    // =========================================================================
    // Inputs
    // =========================================================================

    /// Divided input voltage (ADC1)
    pub const VIN: i32 = 33;

    /// Front button (active low, input only)
    pub const BUTTON: i32 = 39;

    // =========================================================================
    // Indicator
    // =========================================================================

    /// SK6812 data line
    pub const LED: i32 = 27;
}
