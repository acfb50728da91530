//! Motor driver fault line on a GPIO input.
//!
//! The driver pulls its nFAULT output low while over-current or thermal
//! protection is active. The pin has an external pull-up.

use crate::traits::FaultDetector;
use esp_idf_hal::gpio::{Input, InputPin, PinDriver};
use esp_idf_hal::peripheral::Peripheral;

/// Active-low fault input (GPIO22 on the ATOM Lite).
///
/// # Example
///
/// ```ignore
/// use rs_rmpp::hal::esp32::Esp32Fault;
/// use rs_rmpp::traits::FaultDetector;
///
/// let peripherals = Peripherals::take()?;
/// let mut fault = Esp32Fault::new(peripherals.pins.gpio22)?;
/// if fault.is_asserted() {
///     println!("driver in protection");
/// }
/// ```
pub struct Esp32Fault<'d, P>
where
    P: InputPin,
{
    pin: PinDriver<'d, P, Input>,
}

impl<'d, P> Esp32Fault<'d, P>
where
    P: InputPin,
{
    /// Configures the pin as a floating input.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO initialization fails.
    pub fn new(pin: impl Peripheral<P = P> + 'd) -> Result<Self, esp_idf_hal::sys::EspError> {
        let pin = PinDriver::input(pin)?;
        Ok(Self { pin })
    }
}

impl<P> FaultDetector for Esp32Fault<'_, P>
where
    P: InputPin,
{
    fn is_asserted(&mut self) -> bool {
        self.pin.is_low()
    }
}
