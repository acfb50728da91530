//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware and network traits,
//! enabling development and testing on desktop without the ATOM Lite board.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockPwm`] | [`PwmOutput`] | Records compare values per channel |
//! | [`MockFault`] | [`FaultDetector`] | Settable fault line |
//! | [`MockSensors`] | [`Sensors`] | Fixed voltage and temperature readings |
//! | [`MockButton`] | [`ButtonInput`] | Queued button gestures |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//! | [`MockIndicator`] | [`Indicator`] | Tracks LED requests |
//! | [`MockSink`] | [`FrameSink`] | Captures outbound frames |
//! | [`MockModeStore`] | [`ModeStore`] | Saved network mode with failure injection |
//!
//! # Example
//!
//! ```rust
//! use rs_rmpp::{Direction, OutputController};
//! use rs_rmpp::hal::{MockFault, MockIndicator, MockPwm};
//! use rs_rmpp::traits::{LedColor, PwmChannel};
//!
//! let mut controller = OutputController::new(MockPwm::new(), MockFault::new(), MockIndicator::new());
//! controller.begin();
//! controller.process_wire_command(&[0x12, 0x00, 0x48], 0).unwrap();
//!
//! assert_eq!(controller.pwm().raw(PwmChannel::Two), 2047);
//! assert_eq!(controller.indicator().color, LedColor::Green);
//! ```
//!
//! [`PwmOutput`]: crate::traits::PwmOutput
//! [`FaultDetector`]: crate::traits::FaultDetector
//! [`Sensors`]: crate::traits::Sensors
//! [`ButtonInput`]: crate::traits::ButtonInput
//! [`Clock`]: crate::traits::Clock
//! [`Indicator`]: crate::traits::Indicator
//! [`FrameSink`]: crate::traits::FrameSink
//! [`ModeStore`]: crate::config::ModeStore

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::config::{ModeStore, NetworkMode};
use crate::traits::{
    ButtonEvent, ButtonInput, ClientId, Clock, FaultDetector, FrameSink, Indicator, LedColor,
    LedPattern, PwmChannel, PwmOutput, Sensors,
};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock two-channel PWM stage.
///
/// Keeps the last compare value of each channel and a log of every write.
/// Set `fail_writes` to make every call return an error.
///
/// # Example
///
/// ```rust
/// use rs_rmpp::hal::MockPwm;
/// use rs_rmpp::traits::{PwmChannel, PwmOutput};
///
/// let mut pwm = MockPwm::new();
/// pwm.write_both(4096).unwrap();
/// pwm.write_raw(PwmChannel::One, 100).unwrap();
///
/// assert_eq!(pwm.raw(PwmChannel::One), 100);
/// assert_eq!(pwm.raw(PwmChannel::Two), 4096);
/// assert_eq!(pwm.writes.len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct MockPwm {
    /// Last value written to PWM1.
    pub channel_one: u16,
    /// Last value written to PWM2.
    pub channel_two: u16,
    /// True after `release` until the next write.
    pub released: bool,
    /// Every write in order.
    pub writes: Vec<(PwmChannel, u16)>,
    /// When set, every operation fails.
    pub fail_writes: bool,
}

impl MockPwm {
    /// Creates a new mock with both channels at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value written to `channel`.
    pub fn raw(&self, channel: PwmChannel) -> u16 {
        match channel {
            PwmChannel::One => self.channel_one,
            PwmChannel::Two => self.channel_two,
        }
    }
}

impl PwmOutput for MockPwm {
    type Error = ();

    fn write_raw(&mut self, channel: PwmChannel, raw: u16) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        match channel {
            PwmChannel::One => self.channel_one = raw,
            PwmChannel::Two => self.channel_two = raw,
        }
        self.released = false;
        self.writes.push((channel, raw));
        Ok(())
    }

    fn release(&mut self) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        self.released = true;
        Ok(())
    }
}

/// Mock motor driver fault line.
///
/// # Example
///
/// ```rust
/// use rs_rmpp::hal::MockFault;
/// use rs_rmpp::traits::FaultDetector;
///
/// let mut fault = MockFault::new();
/// assert!(!fault.is_asserted());
///
/// fault.assert_fault();
/// assert!(fault.is_asserted());
///
/// fault.clear_fault();
/// assert!(!fault.is_asserted());
/// ```
#[derive(Debug, Default)]
pub struct MockFault {
    /// Current line level (true = protection active).
    pub asserted: bool,
}

impl MockFault {
    /// Creates a fault line that is not asserted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drives the line into the fault state.
    pub fn assert_fault(&mut self) {
        self.asserted = true;
    }

    /// Releases the line.
    pub fn clear_fault(&mut self) {
        self.asserted = false;
    }
}

impl FaultDetector for MockFault {
    fn is_asserted(&mut self) -> bool {
        self.asserted
    }
}

/// Mock analog inputs returning fixed readings.
#[derive(Debug, Clone, Copy)]
pub struct MockSensors {
    /// Raw ADC sample of the input voltage.
    pub voltage_raw: u16,
    /// CPU temperature in degrees Celsius.
    pub temperature_c: f32,
}

impl MockSensors {
    /// 12 V input and 40 degrees.
    pub fn new() -> Self {
        Self {
            voltage_raw: 1365,
            temperature_c: 40.0,
        }
    }

    /// Sets the raw voltage sample.
    pub fn with_voltage_raw(mut self, raw: u16) -> Self {
        self.voltage_raw = raw;
        self
    }

    /// Sets the temperature reading.
    pub fn with_temperature(mut self, celsius: f32) -> Self {
        self.temperature_c = celsius;
        self
    }
}

impl Default for MockSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl Sensors for MockSensors {
    fn input_voltage_raw(&mut self) -> u16 {
        self.voltage_raw
    }

    fn cpu_temperature_c(&mut self) -> f32 {
        self.temperature_c
    }
}

/// Mock push button that replays queued gestures, oldest first.
#[derive(Debug, Default)]
pub struct MockButton {
    events: VecDeque<ButtonEvent>,
}

impl MockButton {
    /// Creates a button with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a gesture for the next poll.
    pub fn queue(&mut self, event: ButtonEvent) {
        self.events.push_back(event);
    }
}

impl ButtonInput for MockButton {
    fn poll_event(&mut self, _now_ms: u64) -> Option<ButtonEvent> {
        self.events.pop_front()
    }
}

/// Mock clock for testing.
///
/// Provides a controllable time source for testing time-dependent behavior.
///
/// # Example
///
/// ```rust
/// use rs_rmpp::hal::MockClock;
/// use rs_rmpp::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

// ============================================================================
// Indicator and Network Mocks
// ============================================================================

/// Mock status LED.
///
/// Holds the latest request of each kind plus the history of pattern changes.
#[derive(Debug, Default)]
pub struct MockIndicator {
    /// Current color.
    pub color: LedColor,
    /// Current steady pattern.
    pub pattern: LedPattern,
    /// Color that `Standby` maps to.
    pub standby: LedColor,
    /// Last one-shot pattern request.
    pub once: Option<(LedPattern, u8)>,
    /// Every steady pattern requested, in order.
    pub history: Vec<LedPattern>,
}

impl MockIndicator {
    /// Creates an indicator showing `Standby` / `Off`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Indicator for MockIndicator {
    fn set_color(&mut self, color: LedColor) {
        self.color = color;
    }

    fn set_pattern(&mut self, pattern: LedPattern) {
        self.pattern = pattern;
        self.history.push(pattern);
    }

    fn set_pattern_once(&mut self, pattern: LedPattern, cycles: u8) {
        self.once = Some((pattern, cycles));
    }

    fn set_standby_color(&mut self, color: LedColor) {
        self.standby = color;
    }
}

/// Mock outbound frame path.
///
/// Captures frames with their addressee. Clear `available` to simulate a
/// transport that cannot take frames.
///
/// # Example
///
/// ```rust
/// use rs_rmpp::hal::MockSink;
/// use rs_rmpp::traits::{ClientId, FrameSink};
///
/// let mut sink = MockSink::new();
/// sink.send_binary_frame(&[0x04, 0x01, 0x00, 0x78, 0xA8], ClientId::Broadcast).unwrap();
/// assert_eq!(sink.frames.len(), 1);
///
/// sink.available = false;
/// assert!(sink.send_binary_frame(&[0x04], ClientId::Broadcast).is_err());
/// ```
#[derive(Debug)]
pub struct MockSink {
    /// Frames accepted so far.
    pub frames: Vec<(Vec<u8>, ClientId)>,
    /// When false, sends fail.
    pub available: bool,
}

impl MockSink {
    /// Creates a sink that accepts frames.
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            available: true,
        }
    }

    /// Last accepted frame, if any.
    pub fn last(&self) -> Option<&[u8]> {
        self.frames.last().map(|(f, _)| f.as_slice())
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for MockSink {
    type Error = ();

    fn send_binary_frame(&mut self, frame: &[u8], client: ClientId) -> Result<(), ()> {
        if !self.available {
            return Err(());
        }
        self.frames.push((frame.to_vec(), client));
        Ok(())
    }
}

/// Mock network mode store.
#[derive(Debug, Default)]
pub struct MockModeStore {
    /// Mode currently stored.
    pub saved: Option<NetworkMode>,
    /// Number of successful saves.
    pub saves: usize,
    /// When true, loads fail.
    pub fail_reads: bool,
    /// When true, saves fail and leave `saved` untouched.
    pub fail_writes: bool,
}

impl MockModeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModeStore for MockModeStore {
    type Error = ();

    fn load_mode(&mut self) -> Result<Option<NetworkMode>, ()> {
        if self.fail_reads {
            return Err(());
        }
        Ok(self.saved)
    }

    fn save_mode(&mut self, mode: NetworkMode) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        self.saved = Some(mode);
        self.saves += 1;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
