//! ATOM Lite front button (GPIO39, active low, external pull-up).

use crate::input::{Debouncer, SAMPLE_PERIOD_MS};
use crate::traits::{ButtonEvent, ButtonInput};
use esp_idf_hal::gpio::{Input, InputPin, PinDriver};
use esp_idf_hal::peripheral::Peripheral;

/// Debounced push button.
///
/// Samples at most once per [`SAMPLE_PERIOD_MS`]; call
/// [`poll_event`](ButtonInput::poll_event) at least that often.
///
/// # Example
///
/// ```ignore
/// use rs_rmpp::hal::esp32::Esp32Button;
/// use rs_rmpp::traits::{ButtonInput, Clock};
///
/// let mut button = Esp32Button::new(peripherals.pins.gpio39)?;
/// loop {
///     if let Some(event) = button.poll_event(clock.now_ms()) {
///         println!("{:?}", event);
///     }
///     FreeRtos::delay_ms(25);
/// }
/// ```
pub struct Esp32Button<'d, P>
where
    P: InputPin,
{
    pin: PinDriver<'d, P, Input>,
    debouncer: Debouncer,
    last_sample_ms: Option<u64>,
}

impl<'d, P> Esp32Button<'d, P>
where
    P: InputPin,
{
    /// Configures the pin as an input. GPIO39 is input-only and has no
    /// internal pull-up; the board provides one.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO initialization fails.
    pub fn new(pin: impl Peripheral<P = P> + 'd) -> Result<Self, esp_idf_hal::sys::EspError> {
        let pin = PinDriver::input(pin)?;
        Ok(Self {
            pin,
            debouncer: Debouncer::new(),
            last_sample_ms: None,
        })
    }
}

impl<P> ButtonInput for Esp32Button<'_, P>
where
    P: InputPin,
{
    fn poll_event(&mut self, now_ms: u64) -> Option<ButtonEvent> {
        if let Some(last) = self.last_sample_ms {
            if now_ms.saturating_sub(last) < u64::from(SAMPLE_PERIOD_MS) {
                return None;
            }
        }
        self.last_sample_ms = Some(now_ms);
        self.debouncer.sample(self.pin.is_low())
    }
}
