//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - [`StdClock`], [`LogIndicator`]: `std` implementations shared by the
//!   desktop demo and the ESP32 binary
//! - `esp32`: M5Stack ATOM Lite with an H-bridge motor driver (requires `esp32` feature)

pub mod mock;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use mock::*;

#[cfg(feature = "esp32")]
pub use esp32::*;

#[cfg(feature = "std")]
pub use self::host::{LogIndicator, StdClock};

#[cfg(feature = "std")]
mod host {
    use std::time::Instant;

    use crate::traits::{Clock, Indicator, LedColor, LedPattern};

    /// Milliseconds since construction, from [`Instant`].
    #[derive(Debug, Clone, Copy)]
    pub struct StdClock {
        start: Instant,
    }

    impl StdClock {
        /// Clock starting at 0 now.
        pub fn new() -> Self {
            Self {
                start: Instant::now(),
            }
        }
    }

    impl Default for StdClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for StdClock {
        fn now_ms(&self) -> u64 {
            self.start.elapsed().as_millis() as u64
        }
    }

    /// Status LED that only logs requests.
    ///
    /// Used where no LED renderer is attached; the last requested color and
    /// pattern are kept so they can be reported.
    #[derive(Debug, Default)]
    pub struct LogIndicator {
        color: LedColor,
        pattern: LedPattern,
        standby: LedColor,
    }

    impl LogIndicator {
        /// Indicator in the power-up state.
        pub fn new() -> Self {
            Self::default()
        }

        /// Color currently shown; `Standby` resolved to the configured color.
        pub fn color(&self) -> LedColor {
            match self.color {
                LedColor::Standby => self.standby,
                c => c,
            }
        }

        /// Steady pattern currently shown.
        pub fn pattern(&self) -> LedPattern {
            self.pattern
        }
    }

    impl Indicator for LogIndicator {
        fn set_color(&mut self, color: LedColor) {
            self.color = color;
            log::debug!("led color {:?}", self.color());
        }

        fn set_pattern(&mut self, pattern: LedPattern) {
            self.pattern = pattern;
            log::debug!("led pattern {:?}", pattern);
        }

        fn set_pattern_once(&mut self, pattern: LedPattern, cycles: u8) {
            log::debug!("led pattern {:?} x{}", pattern, cycles);
        }

        fn set_standby_color(&mut self, color: LedColor) {
            self.standby = color;
        }
    }

}
