//! Direction toggle on two GPIO inputs.
//!
//! A center-off SPDT toggle switches either line to ground. Both lines use
//! the internal pull-ups.

use esp_idf_hal::gpio::{Input, InputPin, OutputPin, PinDriver, Pull};
use esp_idf_hal::peripheral::Peripheral;

use crate::traits::ToggleInput;

/// Toggle lines for [`DigitalModeSwitch`](crate::input::DigitalModeSwitch).
pub struct Esp32Toggle<'d, L, R>
where
    L: InputPin + OutputPin,
    R: InputPin + OutputPin,
{
    left: PinDriver<'d, L, Input>,
    right: PinDriver<'d, R, Input>,
}

impl<'d, L, R> Esp32Toggle<'d, L, R>
where
    L: InputPin + OutputPin,
    R: InputPin + OutputPin,
{
    /// Configure both lines as pulled-up inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO initialization fails.
    pub fn new(
        left_pin: impl Peripheral<P = L> + 'd,
        right_pin: impl Peripheral<P = R> + 'd,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        let mut left = PinDriver::input(left_pin)?;
        let mut right = PinDriver::input(right_pin)?;
        left.set_pull(Pull::Up)?;
        right.set_pull(Pull::Up)?;
        Ok(Self { left, right })
    }
}

impl<L, R> ToggleInput for Esp32Toggle<'_, L, R>
where
    L: InputPin + OutputPin,
    R: InputPin + OutputPin,
{
    fn left_level(&mut self) -> bool {
        self.left.is_high()
    }

    fn right_level(&mut self) -> bool {
        self.right.is_high()
    }
}
