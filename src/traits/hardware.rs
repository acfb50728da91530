//! Hardware abstraction traits for the power pack output stage and its inputs.
//!
//! This module defines the hardware interfaces that allow rs-rmpp to run the
//! same output state machine on the ESP32 and on desktop mocks.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`PwmOutput`] | Two-channel active-low H-bridge PWM |
//! | [`FaultDetector`] | Motor driver protection (fault) line |
//! | [`Sensors`] | Input voltage ADC and CPU temperature |
//! | [`ButtonInput`] | Debounced local push button |
//! | [`Clock`] | Monotonic millisecond time source |
//!
//! # Example
//!
//! ```rust
//! use rs_rmpp::traits::{PwmChannel, PwmOutput};
//! use rs_rmpp::hal::MockPwm;
//!
//! let mut pwm = MockPwm::new();
//! pwm.write_raw(PwmChannel::Two, 2047).unwrap();
//! assert_eq!(pwm.raw(PwmChannel::Two), 2047);
//! ```

/// Direction of the track output.
///
/// `None` means no polarity is selected; the H-bridge is not driving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// No direction selected.
    #[default]
    None,
    /// Forward polarity (driven on PWM channel 2).
    Forward,
    /// Reverse polarity (driven on PWM channel 1).
    Reverse,
}

impl Direction {
    /// Returns the direction as a lowercase string.
    ///
    /// ```
    /// use rs_rmpp::Direction;
    ///
    /// assert_eq!(Direction::Forward.as_str(), "forward");
    /// assert_eq!(Direction::Reverse.as_str(), "reverse");
    /// assert_eq!(Direction::None.as_str(), "none");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::None => "none",
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
        }
    }

    /// Returns true for `Forward` or `Reverse`.
    #[inline]
    pub const fn is_set(&self) -> bool {
        !matches!(self, Direction::None)
    }

    /// The PWM channel that carries the duty for this direction.
    ///
    /// Forward drives channel 2, reverse drives channel 1.
    pub const fn drive_channel(&self) -> Option<PwmChannel> {
        match self {
            Direction::None => None,
            Direction::Forward => Some(PwmChannel::Two),
            Direction::Reverse => Some(PwmChannel::One),
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two H-bridge PWM inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PwmChannel {
    /// PWM1, the reverse leg.
    One,
    /// PWM2, the forward leg.
    Two,
}

/// Two-channel PWM output feeding the motor driver.
///
/// Raw values are compare values at the configured resolution. The signal is
/// active-low: a smaller raw value means more throttle. Writing `0` to both
/// channels turns the bridge off.
///
/// # Implementation Notes
///
/// - `write_raw` must not block
/// - `release` puts both pins into input / high-impedance and is only used at
///   startup before the controller runs
pub trait PwmOutput {
    /// Error type for PWM operations.
    type Error;

    /// Write a raw compare value to one channel.
    fn write_raw(&mut self, channel: PwmChannel, raw: u16) -> Result<(), Self::Error>;

    /// Float both pins (input / high-impedance).
    fn release(&mut self) -> Result<(), Self::Error>;

    /// Write the same raw value to both channels.
    fn write_both(&mut self, raw: u16) -> Result<(), Self::Error> {
        self.write_raw(PwmChannel::One, raw)?;
        self.write_raw(PwmChannel::Two, raw)
    }
}

/// Motor driver protection line.
///
/// Level-sensitive: reports the line as it is right now. Implementations
/// translate the electrical polarity (the driver fault pin is active-low).
pub trait FaultDetector {
    /// Returns true while the driver reports a protection condition.
    fn is_asserted(&mut self) -> bool;
}

/// Analog inputs sampled for telemetry.
pub trait Sensors {
    /// Raw 12-bit sample (0..=4095) of the divided track supply voltage.
    ///
    /// Full scale corresponds to 36.0 V.
    fn input_voltage_raw(&mut self) -> u16;

    /// Die temperature of the MCU in degrees Celsius.
    fn cpu_temperature_c(&mut self) -> f32;
}

/// Gesture reported by a debounced push button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonEvent {
    /// Short press and release.
    Click,
    /// Press held past the hold threshold.
    Hold,
}

/// Local push button with debouncing done by the implementation.
pub trait ButtonInput {
    /// Sample the button and return a completed gesture, if any.
    fn poll_event(&mut self, now_ms: u64) -> Option<ButtonEvent>;
}

/// Time source trait for `no_std` compatibility.
///
/// # Example
///
/// ```rust
/// use rs_rmpp::traits::Clock;
/// use rs_rmpp::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}
