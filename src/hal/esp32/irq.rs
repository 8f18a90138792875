//! GPIO interrupt lines feeding an [`InterruptFlag`].
//!
//! The SX1509 `INT` output pulls its line low when an input changed; the
//! LIS3DH `INT1` output goes high on motion. The ISR only raises the flag;
//! the hardware facade picks it up on its next `check()`.

use esp_idf_hal::gpio::{Input, InputPin, InterruptType, OutputPin, PinDriver, Pull};
use esp_idf_hal::peripheral::Peripheral;
use log::warn;

use crate::interrupt::InterruptFlag;

/// Edge-triggered interrupt input.
///
/// ESP-IDF disarms a GPIO interrupt after it fires; call
/// [`rearm`](Self::rearm) once per main-loop pass.
///
/// ```ignore
/// static BUTTONS: InterruptFlag = InterruptFlag::new();
///
/// let mut line = InterruptLine::falling(peripherals.pins.gpio5, &BUTTONS)?;
/// loop {
///     runtime.tick(clock.now_ms());
///     line.rearm();
/// }
/// ```
pub struct InterruptLine<'d, P: InputPin + OutputPin> {
    pin: PinDriver<'d, P, Input>,
}

impl<'d, P: InputPin + OutputPin> InterruptLine<'d, P> {
    /// Pulled-up input raising `flag` on a falling edge (open-drain, active low).
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO or ISR setup fails.
    pub fn falling(
        pin: impl Peripheral<P = P> + 'd,
        flag: &'static InterruptFlag,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        Self::new(pin, flag, Pull::Up, InterruptType::NegEdge)
    }

    /// Pulled-down input raising `flag` on a rising edge (push-pull, active high).
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO or ISR setup fails.
    pub fn rising(
        pin: impl Peripheral<P = P> + 'd,
        flag: &'static InterruptFlag,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        Self::new(pin, flag, Pull::Down, InterruptType::PosEdge)
    }

    fn new(
        pin: impl Peripheral<P = P> + 'd,
        flag: &'static InterruptFlag,
        pull: Pull,
        edge: InterruptType,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        let mut pin = PinDriver::input(pin)?;
        pin.set_pull(pull)?;
        pin.set_interrupt_type(edge)?;
        // the callback only touches atomics
        unsafe {
            pin.subscribe(move || flag.raise(0))?;
        }
        pin.enable_interrupt()?;
        Ok(Self { pin })
    }

    /// Re-enable the interrupt after it fired.
    pub fn rearm(&mut self) {
        if let Err(e) = self.pin.enable_interrupt() {
            warn!("interrupt re-enable failed: {:?}", e);
        }
    }
}
