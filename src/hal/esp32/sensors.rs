//! Input voltage and CPU temperature readings.
//!
//! The track supply is divided down onto GPIO33 (ADC1) so that 36 V reads as
//! full scale. The die temperature comes from the ROM sensor routine, which
//! reports Fahrenheit.

use crate::traits::Sensors;
use esp_idf_hal::adc::attenuation::DB_11;
use esp_idf_hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_hal::adc::ADC1;
use esp_idf_hal::gpio::Gpio33;
use esp_idf_hal::peripheral::Peripheral;

extern "C" {
    // Name as exported by the ESP32 ROM.
    fn temprature_sens_read() -> u8;
}

/// ADC and temperature sensor pair.
///
/// # Example
///
/// ```ignore
/// use rs_rmpp::hal::esp32::Esp32Sensors;
/// use rs_rmpp::traits::Sensors;
///
/// let peripherals = Peripherals::take()?;
/// let adc = AdcDriver::new(peripherals.adc1)?;
/// let mut sensors = Esp32Sensors::new(&adc, peripherals.pins.gpio33)?;
/// println!("raw vin: {}", sensors.input_voltage_raw());
/// ```
pub struct Esp32Sensors<'d> {
    vin: AdcChannelDriver<'d, Gpio33, &'d AdcDriver<'d, ADC1>>,
    last_raw: u16,
}

impl<'d> Esp32Sensors<'d> {
    /// Creates the sensor reader.
    ///
    /// # Arguments
    ///
    /// * `adc` - Reference to ADC1 driver (must outlive this struct)
    /// * `vin_pin` - GPIO33 for the divided supply voltage
    ///
    /// # Errors
    ///
    /// Returns an error if ADC channel initialization fails.
    pub fn new(
        adc: &'d AdcDriver<'d, ADC1>,
        vin_pin: impl Peripheral<P = Gpio33> + 'd,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        let config = AdcChannelConfig {
            attenuation: DB_11,
            ..Default::default()
        };
        let vin = AdcChannelDriver::new(adc, vin_pin, &config)?;
        Ok(Self { vin, last_raw: 0 })
    }
}

impl Sensors for Esp32Sensors<'_> {
    fn input_voltage_raw(&mut self) -> u16 {
        // Keep the previous sample if a conversion fails.
        if let Ok(raw) = self.vin.read_raw() {
            self.last_raw = raw;
        }
        self.last_raw
    }

    fn cpu_temperature_c(&mut self) -> f32 {
        // Safe: reads a ROM-provided sensor register, no side effects.
        let fahrenheit = unsafe { temprature_sens_read() };
        (f32::from(fahrenheit) - 32.0) / 1.8
    }
}
