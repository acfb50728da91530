//! Periodic status sampling.
//!
//! Every [`STATUS_INTERVAL_MS`] the sampler reads the input voltage and CPU
//! temperature and builds a [`StatusFrame`] from them and the current
//! [`OutputState`]. The same readings feed the human-readable
//! [`StatusReport`] printed by the `RMPP` console command.

use core::fmt;

use crate::codec::StatusFrame;
use crate::state::OutputState;
use crate::timer::Interval;
use crate::traits::Sensors;

/// Status frame period.
pub const STATUS_INTERVAL_MS: u32 = 200;

/// Debug report period.
pub const DEBUG_INTERVAL_MS: u32 = 10_000;

/// Full-scale ADC reading.
pub const ADC_MAX: u16 = 4095;

/// Input voltage at full scale, in 0.1 V units.
pub const VOLTAGE_FULL_SCALE_DV: u32 = 360;

/// Scale a raw ADC sample to 0.1 V units, saturating at 255.
///
/// ```
/// use rs_rmpp::telemetry::voltage_to_dv;
///
/// assert_eq!(voltage_to_dv(0), 0);
/// assert_eq!(voltage_to_dv(1365), 120);
/// assert_eq!(voltage_to_dv(4095), 255);
/// ```
pub fn voltage_to_dv(raw: u16) -> u8 {
    let dv = u32::from(raw) * VOLTAGE_FULL_SCALE_DV / u32::from(ADC_MAX);
    dv.min(u32::from(u8::MAX)) as u8
}

/// Scale a raw ADC sample to volts.
pub fn voltage_to_volts(raw: u16) -> f32 {
    f32::from(raw) * (VOLTAGE_FULL_SCALE_DV as f32 / 10.0) / f32::from(ADC_MAX)
}

/// Truncate a temperature reading to whole degrees (saturating).
pub fn temperature_to_whole(celsius: f32) -> i8 {
    celsius as i8
}

/// Human-readable status dump.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusReport {
    /// Input voltage in volts.
    pub input_voltage_v: f32,
    /// Last commanded duty.
    pub duty: u16,
    /// CPU temperature in degrees Celsius.
    pub cpu_temperature_c: f32,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Input Voltage   : {:.2} V", self.input_voltage_v)?;
        writeln!(f, "Output Duty     : {}", self.duty)?;
        writeln!(f, "CPU Temperature : {:.2} deg", self.cpu_temperature_c)
    }
}

/// Builds status frames on a fixed schedule.
pub struct TelemetrySampler<S: Sensors> {
    sensors: S,
    interval: Interval,
}

impl<S: Sensors> TelemetrySampler<S> {
    /// Sampler with the default 200 ms period, starting at `now_ms`.
    pub fn new(sensors: S, now_ms: u64) -> Self {
        Self::with_interval(sensors, STATUS_INTERVAL_MS, now_ms)
    }

    /// Sampler with a custom period.
    pub fn with_interval(sensors: S, interval_ms: u32, now_ms: u64) -> Self {
        Self {
            sensors,
            interval: Interval::new(interval_ms, now_ms),
        }
    }

    /// Returns a fresh frame when the period has elapsed.
    pub fn poll(&mut self, now_ms: u64, state: &OutputState) -> Option<StatusFrame> {
        if self.interval.tick(now_ms) {
            Some(self.sample(state))
        } else {
            None
        }
    }

    /// Read the sensors and build a frame now.
    pub fn sample(&mut self, state: &OutputState) -> StatusFrame {
        StatusFrame {
            output: state.output_flags(),
            status: state.status_flags(),
            voltage_dv: voltage_to_dv(self.sensors.input_voltage_raw()),
            temperature_c: temperature_to_whole(self.sensors.cpu_temperature_c()),
        }
    }

    /// Read the sensors and build a console report.
    pub fn report(&mut self, state: &OutputState) -> StatusReport {
        StatusReport {
            input_voltage_v: voltage_to_volts(self.sensors.input_voltage_raw()),
            duty: state.commanded_duty(),
            cpu_temperature_c: self.sensors.cpu_temperature_c(),
        }
    }

    /// Mutable access to the sensors.
    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }
}
