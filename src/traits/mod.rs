//! Trait definitions for hardware abstraction, the status LED and networking.
//!
//! # Submodules
//!
//! - `hardware`: PWM output, fault line, sensors, button, clock
//! - `indicator`: status LED requests
//! - `network`: outbound frame sink and Wi-Fi events
//!
//! The key hardware traits are:
//!
//! - [`PwmOutput`]: active-low two-channel H-bridge PWM
//! - [`FaultDetector`]: motor driver protection line
//! - [`Sensors`]: input voltage and CPU temperature
//! - [`Clock`]: time source for `no_std` environments

pub mod hardware;
pub mod indicator;
pub mod network;

pub use hardware::*;
pub use indicator::*;
pub use network::*;
