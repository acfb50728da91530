//! Output controller: the state machine that owns the track output.
//!
//! The controller is the only writer of the PWM channels and of
//! [`OutputState`]. Every trigger reaches it through a method call from the
//! owner's loop:
//!
//! | Trigger | Entry point |
//! |---------|-------------|
//! | Client output-write frame | [`process_wire_command`](OutputController::process_wire_command) |
//! | Local button click | [`stop_output`](OutputController::stop_output) with `inhibit = true` |
//! | Fault line, alive watchdog, inhibit timer | [`poll`](OutputController::poll) |
//!
//! # Modes
//!
//! ```text
//!   INIT --begin--> OFF --start--> ON --stop(inhibit)--> INHIBIT --1000 ms--> OFF
//!                    ^              |--stop / alive timeout-----------------> OFF
//!                    |              |
//!                    +--clear-- FAULT <--fault line (from any mode but FAIL)
//! ```
//!
//! A PWM write error moves the controller to `FAIL`, where it stays.
//!
//! # Example
//!
//! ```rust
//! use rs_rmpp::{Direction, OutputController, OutputMode};
//! use rs_rmpp::hal::{MockFault, MockIndicator, MockPwm};
//! use rs_rmpp::traits::PwmChannel;
//!
//! let mut controller = OutputController::new(MockPwm::new(), MockFault::new(), MockIndicator::new());
//! controller.begin();
//!
//! controller.start_output(Direction::Forward, 0).unwrap();
//! controller.set_output_duty(2048).unwrap();
//! assert_eq!(controller.pwm().raw(PwmChannel::Two), 2047);
//!
//! // No command for more than 3 s: the alive watchdog stops the output.
//! controller.poll(3500).unwrap();
//! assert_eq!(controller.mode(), OutputMode::Off);
//! ```

use crate::codec::{self, Command, FrameError, OutputCommand};
use crate::config::OutputConfig;
use crate::fault::FaultMonitor;
use crate::state::{OutputMode, OutputState};
use crate::timer::{DeadlineTimer, ALIVE_TIMEOUT_MS, INHIBIT_MS};
use crate::traits::{
    Direction, FaultDetector, Indicator, LedColor, LedPattern, NetworkEvent, PwmOutput,
};

/// PWM resolution in bits.
pub const PWM_RESOLUTION_BITS: u8 = 12;
/// PWM carrier frequency.
pub const PWM_FREQUENCY_HZ: u32 = 19_000;
/// Compare value for 100 % (brake).
pub const PWM_DUTY_FULL: u16 = 1 << PWM_RESOLUTION_BITS;
/// Largest duty value.
pub const PWM_DUTY_MAX: u16 = PWM_DUTY_FULL - 1;
/// Compare value that turns a channel off.
pub const PWM_OFF: u16 = 0;
/// Cycles of the fast blink acknowledging a configuration change.
pub const CONFIG_ACK_CYCLES: u8 = 4;

/// Map a commanded duty to the active-low compare value.
///
/// The duty is clamped to `1..=4095` before inversion, so the result is
/// `0..=4094`: full throttle reaches 0, zero throttle stops one short of 4095.
///
/// ```
/// use rs_rmpp::controller::duty_to_raw;
///
/// assert_eq!(duty_to_raw(0), 4094);
/// assert_eq!(duty_to_raw(2048), 2047);
/// assert_eq!(duty_to_raw(4095), 0);
/// assert_eq!(duty_to_raw(9000), 0);
/// ```
pub const fn duty_to_raw(duty: u16) -> u16 {
    let clamped = if duty < 1 {
        1
    } else if duty > PWM_DUTY_MAX {
        PWM_DUTY_MAX
    } else {
        duty
    };
    PWM_DUTY_MAX - clamped
}

/// Why a request was not acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Start requested without a direction.
    NoDirection,
    /// The request is not valid in the current mode.
    WrongMode(OutputMode),
    /// Clear requested while the fault line is still asserted.
    FaultStillAsserted,
    /// Fault already latched.
    AlreadyLatched,
    /// Frame failed structural checks.
    InvalidFrame(FrameError),
    /// Well-formed frame that is not a controller command.
    NotACommand,
}

/// Result of a controller request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// State changed (or hardware was written).
    Applied,
    /// Nothing happened.
    Ignored(IgnoreReason),
}

impl Outcome {
    /// True for [`Outcome::Applied`].
    #[inline]
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

/// The output state machine.
///
/// Generic over the PWM stage, the fault line and the status LED so it runs
/// unchanged against mocks and hardware.
pub struct OutputController<P: PwmOutput, F: FaultDetector, I: Indicator> {
    pwm: P,
    fault: FaultMonitor<F>,
    indicator: I,
    state: OutputState,
    alive: DeadlineTimer,
    inhibit: DeadlineTimer,
    clients: usize,
}

impl<P: PwmOutput, F: FaultDetector, I: Indicator> OutputController<P, F, I> {
    /// Create a controller in `INIT` with the default timing.
    pub fn new(pwm: P, fault_line: F, indicator: I) -> Self {
        Self {
            pwm,
            fault: FaultMonitor::new(fault_line),
            indicator,
            state: OutputState::new(),
            alive: DeadlineTimer::watchdog(ALIVE_TIMEOUT_MS),
            inhibit: DeadlineTimer::one_shot(INHIBIT_MS),
            clients: 0,
        }
    }

    /// Apply timing from configuration. Call before [`begin`](Self::begin).
    pub fn with_config(mut self, config: &OutputConfig) -> Self {
        self.alive = DeadlineTimer::watchdog(config.alive_timeout_ms);
        self.inhibit = DeadlineTimer::one_shot(config.inhibit_ms);
        self
    }

    /// Leave `INIT`. Called once when the control task starts.
    pub fn begin(&mut self) {
        if self.state.mode == OutputMode::Init {
            self.state.mode = OutputMode::Off;
            log::info!("output controller ready");
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Copy of the output state.
    #[inline]
    pub fn state(&self) -> OutputState {
        self.state
    }

    /// Current mode.
    #[inline]
    pub fn mode(&self) -> OutputMode {
        self.state.mode
    }

    /// The PWM stage.
    pub fn pwm(&self) -> &P {
        &self.pwm
    }

    /// The status LED.
    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// Mutable access to the status LED.
    pub fn indicator_mut(&mut self) -> &mut I {
        &mut self.indicator
    }

    /// Mutable access to the fault line.
    pub fn fault_line_mut(&mut self) -> &mut F {
        self.fault.line_mut()
    }

    /// Connected client count last reported by the transport.
    pub fn clients(&self) -> usize {
        self.clients
    }

    /// Milliseconds until the alive watchdog fires, if armed.
    pub fn alive_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.alive.remaining_ms(now_ms)
    }

    /// Milliseconds until the inhibit period ends, if running.
    pub fn inhibit_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.inhibit.remaining_ms(now_ms)
    }

    // ========================================================================
    // Output operations
    // ========================================================================

    /// Float both PWM pins. Boot-time only; does not touch the mode.
    pub fn reset_output(&mut self) -> Result<(), P::Error> {
        let result = self.pwm.release();
        self.guard(result)
    }

    /// Start driving in `direction`.
    ///
    /// Only valid from `OFF`. Both channels go to full duty until the first
    /// duty write. A direction that is already latched is kept even if the
    /// request names the other one.
    pub fn start_output(&mut self, direction: Direction, now_ms: u64) -> Result<Outcome, P::Error> {
        if !direction.is_set() {
            return Ok(Outcome::Ignored(IgnoreReason::NoDirection));
        }
        if self.state.mode != OutputMode::Off {
            return Ok(Outcome::Ignored(IgnoreReason::WrongMode(self.state.mode)));
        }

        self.alive.start(now_ms);
        self.state.mode = OutputMode::On;
        self.state.external_control = true;
        if !self.state.direction.is_set() {
            self.state.direction = direction;
        }

        self.indicator.set_color(LedColor::Green);
        self.indicator.set_pattern(self.running_pattern());

        let result = self.pwm.write_both(PWM_DUTY_FULL);
        self.guard(result)?;

        log::info!("output on ({})", self.state.direction);
        Ok(Outcome::Applied)
    }

    /// Set the duty on the channel of the latched direction.
    ///
    /// Outside `ON` the duty is recorded as 0 and nothing is written.
    pub fn set_output_duty(&mut self, duty: u16) -> Result<Outcome, P::Error> {
        if self.state.mode != OutputMode::On {
            self.state.commanded_duty = 0;
            return Ok(Outcome::Ignored(IgnoreReason::WrongMode(self.state.mode)));
        }
        let Some(channel) = self.state.direction.drive_channel() else {
            return Ok(Outcome::Ignored(IgnoreReason::NoDirection));
        };

        self.state.commanded_duty = duty.min(PWM_DUTY_MAX);
        let result = self.pwm.write_raw(channel, duty_to_raw(duty));
        self.guard(result)?;
        Ok(Outcome::Applied)
    }

    /// Stop the output, or try to clear a latched fault.
    ///
    /// From `ON` the output turns off and the mode becomes `INHIBIT` (with the
    /// inhibit timer running) when `inhibit` is set, `OFF` otherwise. From
    /// `FAULT` the latch is cleared if the fault line allows it.
    pub fn stop_output(&mut self, inhibit: bool, now_ms: u64) -> Result<Outcome, P::Error> {
        match self.state.mode {
            OutputMode::On => {
                self.turn_output_off()?;
                self.indicator.set_color(LedColor::Standby);
                self.indicator.set_pattern(self.idle_pattern());
                if inhibit {
                    self.state.mode = OutputMode::Inhibit;
                    self.inhibit.start(now_ms);
                    log::info!("output off, restart inhibited for {} ms", self.inhibit.period_ms());
                } else {
                    self.state.mode = OutputMode::Off;
                    log::info!("output off");
                }
                Ok(Outcome::Applied)
            }
            OutputMode::Fault => Ok(self.clear_fault()),
            mode => Ok(Outcome::Ignored(IgnoreReason::WrongMode(mode))),
        }
    }

    // ========================================================================
    // Triggers
    // ========================================================================

    /// Latch a fault and force the output off.
    pub fn on_fault_asserted(&mut self) -> Result<Outcome, P::Error> {
        if self.state.over_current {
            return Ok(Outcome::Ignored(IgnoreReason::AlreadyLatched));
        }
        if self.state.mode == OutputMode::Fail {
            return Ok(Outcome::Ignored(IgnoreReason::WrongMode(OutputMode::Fail)));
        }

        self.inhibit.stop();
        self.turn_output_off()?;
        self.state.mode = OutputMode::Fault;
        self.state.over_current = true;
        self.indicator.set_color(LedColor::Red);
        self.indicator.set_pattern(LedPattern::BlinkFast);
        log::warn!("motor driver has entered protection mode");
        Ok(Outcome::Applied)
    }

    /// Alive watchdog expiry: stop without inhibit.
    pub fn on_alive_timeout(&mut self, now_ms: u64) -> Result<Outcome, P::Error> {
        if self.state.mode != OutputMode::On {
            return Ok(Outcome::Ignored(IgnoreReason::WrongMode(self.state.mode)));
        }
        log::info!("alive monitoring timeout");
        self.stop_output(false, now_ms)
    }

    /// Inhibit timer expiry.
    pub fn on_inhibit_expired(&mut self) -> Outcome {
        if self.state.mode != OutputMode::Inhibit {
            return Outcome::Ignored(IgnoreReason::WrongMode(self.state.mode));
        }
        self.state.mode = OutputMode::Off;
        log::debug!("inhibit period over");
        Outcome::Applied
    }

    /// Decode and apply a client frame.
    ///
    /// Malformed frames and non-command frames are dropped without effect.
    pub fn process_wire_command(&mut self, frame: &[u8], now_ms: u64) -> Result<Outcome, P::Error> {
        match codec::decode(frame) {
            Ok(Command::OutputWrite(cmd)) => self.apply_output_command(cmd, now_ms),
            Ok(Command::Status(_)) => Ok(Outcome::Ignored(IgnoreReason::NotACommand)),
            Err(e) => {
                log::debug!("dropping frame: {e}");
                Ok(Outcome::Ignored(IgnoreReason::InvalidFrame(e)))
            }
        }
    }

    /// Apply a decoded output-write command.
    ///
    /// The alive watchdog is fed first. A command with a direction starts the
    /// output when `OFF` and then sets the duty when `ON`, so the first
    /// command of a run does both. A stop command stops without inhibit.
    pub fn apply_output_command(
        &mut self,
        cmd: OutputCommand,
        now_ms: u64,
    ) -> Result<Outcome, P::Error> {
        self.alive.reset(now_ms);

        if cmd.direction.is_set() {
            let mut outcome = Outcome::Ignored(IgnoreReason::WrongMode(self.state.mode));
            if self.state.mode == OutputMode::Off {
                outcome = self.start_output(cmd.direction, now_ms)?;
            }
            if self.state.mode == OutputMode::On {
                outcome = self.set_output_duty(cmd.duty)?;
            }
            Ok(outcome)
        } else if self.state.mode != OutputMode::Off {
            self.stop_output(false, now_ms)
        } else {
            Ok(Outcome::Ignored(IgnoreReason::WrongMode(OutputMode::Off)))
        }
    }

    /// One iteration of the controller loop.
    ///
    /// Order: fault line, alive watchdog, inhibit timer.
    pub fn poll(&mut self, now_ms: u64) -> Result<(), P::Error> {
        if self.state.mode == OutputMode::Fail {
            return Ok(());
        }
        if self.fault.should_trip(self.state.over_current) {
            self.on_fault_asserted()?;
        }
        if self.alive.poll(now_ms) {
            self.on_alive_timeout(now_ms)?;
        }
        if self.inhibit.poll(now_ms) {
            self.on_inhibit_expired();
        }
        Ok(())
    }

    // ========================================================================
    // Indicator feedback
    // ========================================================================

    /// Transport reported a new client count.
    pub fn on_client_count_changed(&mut self, count: usize) {
        self.clients = count;
        self.indicator.set_pattern(self.idle_pattern());
    }

    /// Reflect a Wi-Fi event on the LED.
    pub fn on_network_event(&mut self, event: NetworkEvent) {
        let pattern = match event {
            NetworkEvent::Ready => LedPattern::BlinkSlow,
            NetworkEvent::StaStopped => LedPattern::On,
            NetworkEvent::StaConnected => LedPattern::BlinkFast,
            NetworkEvent::StaDisconnected => LedPattern::BlinkSlow,
            NetworkEvent::GotIp => LedPattern::BlinkOn10,
            NetworkEvent::ApStarted => LedPattern::BlinkOn10,
            NetworkEvent::ApStopped => LedPattern::On,
        };
        self.indicator.set_pattern(pattern);
    }

    /// Acknowledge a successful configuration change.
    pub fn on_config_changed(&mut self) {
        self.indicator
            .set_pattern_once(LedPattern::BlinkFast, CONFIG_ACK_CYCLES);
    }

    /// Choose the color shown while idle.
    pub fn set_standby_color(&mut self, color: LedColor) {
        self.indicator.set_standby_color(color);
        self.indicator.set_color(LedColor::Standby);
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn running_pattern(&self) -> LedPattern {
        if self.clients > 0 {
            LedPattern::BlinkOn90
        } else {
            LedPattern::On
        }
    }

    fn idle_pattern(&self) -> LedPattern {
        if self.clients > 0 {
            LedPattern::BlinkOn90
        } else {
            LedPattern::BlinkOn10
        }
    }

    fn turn_output_off(&mut self) -> Result<(), P::Error> {
        self.alive.stop();
        self.state.direction = Direction::None;
        self.state.external_control = false;
        self.state.commanded_duty = 0;
        let result = self.pwm.write_both(PWM_OFF);
        self.guard(result)
    }

    fn clear_fault(&mut self) -> Outcome {
        if !self.fault.line_cleared() {
            log::warn!("motor driver is in protection mode");
            return Outcome::Ignored(IgnoreReason::FaultStillAsserted);
        }
        self.state.mode = OutputMode::Off;
        self.state.over_current = false;
        self.indicator.set_color(LedColor::Standby);
        self.indicator.set_pattern(self.idle_pattern());
        log::info!("motor driver protection cleared");
        Outcome::Applied
    }

    fn guard<T>(&mut self, result: Result<T, P::Error>) -> Result<T, P::Error> {
        if result.is_err() {
            self.state.mode = OutputMode::Fail;
            self.state.external_control = false;
            self.alive.stop();
            self.inhibit.stop();
            log::error!("PWM write failed, output halted");
        }
        result
    }
}
