//! H-bridge PWM output using the ESP32 LEDC peripheral.
//!
//! The motor driver takes two PWM inputs:
//! - PWM1 (GPIO19): reverse leg
//! - PWM2 (GPIO23): forward leg
//!
//! Both inputs are active-low with respect to throttle. The controller keeps
//! the idle leg at full duty (brake level) and lowers the compare value of the
//! driving leg as the duty rises.

use crate::controller::PWM_RESOLUTION_BITS;
use crate::traits::{PwmChannel, PwmOutput};
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;
use esp_idf_hal::sys::EspError;

/// Two-channel LEDC PWM stage for the motor driver.
///
/// Runs at 19 kHz with 12-bit resolution. A compare value of 4096 (full
/// brake) is clamped to the largest duty the channel accepts.
///
/// # Example
///
/// ```ignore
/// use rs_rmpp::hal::esp32::Esp32Pwm;
/// use rs_rmpp::traits::{PwmChannel, PwmOutput};
///
/// let peripherals = Peripherals::take()?;
/// let mut pwm = Esp32Pwm::new(
///     peripherals.pins.gpio19,
///     peripherals.pins.gpio23,
///     peripherals.ledc.timer0,
///     peripherals.ledc.channel0,
///     peripherals.ledc.channel1,
///     19_000,
/// )?;
///
/// pwm.release()?;
/// ```
pub struct Esp32Pwm<'d> {
    pwm1: LedcDriver<'d>,
    pwm2: LedcDriver<'d>,
    max_duty: u32,
    enabled: bool,
}

impl<'d> Esp32Pwm<'d> {
    /// PWM resolution matching [`PWM_RESOLUTION_BITS`].
    const RESOLUTION: Resolution = Resolution::Bits12;

    /// Creates the PWM stage at `frequency_hz` with both channels at 0.
    ///
    /// # Errors
    ///
    /// Returns an error if LEDC initialization fails.
    pub fn new<T, TI, C1, C1I, C2, C2I, P1, P1I, P2, P2I>(
        pwm1_pin: P1,
        pwm2_pin: P2,
        timer: T,
        channel1: C1,
        channel2: C2,
        frequency_hz: u32,
    ) -> Result<Self, EspError>
    where
        TI: esp_idf_hal::ledc::LedcTimer + 'd,
        T: Peripheral<P = TI> + 'd,
        C1I: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        C1: Peripheral<P = C1I> + 'd,
        C2I: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        C2: Peripheral<P = C2I> + 'd,
        P1I: esp_idf_hal::gpio::OutputPin + 'd,
        P1: Peripheral<P = P1I> + 'd,
        P2I: esp_idf_hal::gpio::OutputPin + 'd,
        P2: Peripheral<P = P2I> + 'd,
    {
        debug_assert_eq!(PWM_RESOLUTION_BITS, 12);
        let timer_config = TimerConfig::default()
            .frequency(frequency_hz.Hz())
            .resolution(Self::RESOLUTION);
        let timer_driver = LedcTimerDriver::new(timer, &timer_config)?;

        let mut pwm1 = LedcDriver::new(channel1, &timer_driver, pwm1_pin)?;
        let mut pwm2 = LedcDriver::new(channel2, &timer_driver, pwm2_pin)?;
        pwm1.set_duty(0)?;
        pwm2.set_duty(0)?;
        let max_duty = pwm1.get_max_duty();

        Ok(Self {
            pwm1,
            pwm2,
            max_duty,
            enabled: true,
        })
    }

    fn channel(&mut self, channel: PwmChannel) -> &mut LedcDriver<'d> {
        match channel {
            PwmChannel::One => &mut self.pwm1,
            PwmChannel::Two => &mut self.pwm2,
        }
    }
}

impl PwmOutput for Esp32Pwm<'_> {
    type Error = EspError;

    fn write_raw(&mut self, channel: PwmChannel, raw: u16) -> Result<(), EspError> {
        if !self.enabled {
            self.pwm1.enable()?;
            self.pwm2.enable()?;
            self.enabled = true;
        }
        let duty = u32::from(raw).min(self.max_duty);
        self.channel(channel).set_duty(duty)
    }

    fn release(&mut self) -> Result<(), EspError> {
        self.pwm1.disable()?;
        self.pwm2.disable()?;
        self.enabled = false;
        Ok(())
    }
}
