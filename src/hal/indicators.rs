//! Indicator outputs driven through the GPIO expander.
//!
//! The status LED and the function lights share the expander with the
//! buttons; wrap it in `Rc<RefCell<_>>` to hand one device to all of them.
//! [`HardwareFacade::begin`](crate::hardware::HardwareFacade::begin)
//! configures the light and LED pins.

use log::{debug, warn};

use crate::traits::{GpioExpander, IndicatorPanel, Rgb, StatusIndicator};

/// RGB status LED on three PWM-capable expander pins.
///
/// ```rust
/// use knobby_throttle::hal::{MockExpander, RgbStatusLed};
/// use knobby_throttle::traits::{Rgb, StatusIndicator};
///
/// let mut led = RgbStatusLed::new(MockExpander::new(), [15, 14, 13], true);
/// led.set_color(Rgb::new(255, 0, 64));
///
/// let ex = led.release();
/// // common anode: channels are inverted
/// assert_eq!((ex.pwm(15), ex.pwm(14), ex.pwm(13)), (0, 255, 191));
/// ```
pub struct RgbStatusLed<E> {
    expander: E,
    pins: [u8; 3],
    common_anode: bool,
}

impl<E: GpioExpander> RgbStatusLed<E> {
    /// LED on red, green, blue `pins`.
    pub fn new(expander: E, pins: [u8; 3], common_anode: bool) -> Self {
        Self {
            expander,
            pins,
            common_anode,
        }
    }

    /// Give the expander back.
    pub fn release(self) -> E {
        self.expander
    }
}

impl<E: GpioExpander> StatusIndicator for RgbStatusLed<E> {
    fn set_color(&mut self, color: Rgb) {
        for (pin, level) in self.pins.into_iter().zip([color.red, color.green, color.blue]) {
            let level = if self.common_anode { 255 - level } else { level };
            if let Err(e) = self.expander.analog_write(pin, level) {
                warn!("status LED write failed: {e:?}");
            }
        }
    }
}

/// Function lights and clock colon on expander outputs.
///
/// The lights are wired active-low. There is no segment display on this
/// board revision; clock values are only logged, the colon blinks on its
/// own pin when one is configured.
pub struct ExpanderPanel<E> {
    expander: E,
    colon_pin: Option<u8>,
}

impl<E: GpioExpander> ExpanderPanel<E> {
    /// Panel without a colon output.
    pub fn new(expander: E) -> Self {
        Self {
            expander,
            colon_pin: None,
        }
    }

    /// Blink `pin` as the clock colon.
    pub fn with_colon_pin(mut self, pin: u8) -> Self {
        self.colon_pin = Some(pin);
        self
    }

    /// Configure the colon pin as an output and switch it off.
    pub fn begin(&mut self) {
        if let Some(pin) = self.colon_pin {
            let res = self
                .expander
                .setup_output(pin)
                .and_then(|_| self.expander.digital_write(pin, true));
            if let Err(e) = res {
                warn!("colon pin {pin} setup failed: {e:?}");
            }
        }
    }

    /// Give the expander back.
    pub fn release(self) -> E {
        self.expander
    }

    fn drive(&mut self, pin: u8, on: bool) {
        if let Err(e) = self.expander.digital_write(pin, !on) {
            warn!("indicator pin {pin} write failed: {e:?}");
        }
    }
}

impl<E: GpioExpander> IndicatorPanel for ExpanderPanel<E> {
    fn set_function_light(&mut self, pin: u8, on: bool) {
        self.drive(pin, on);
    }

    fn show_clock(&mut self, value: u16, colon: bool) {
        debug!("clock {:02}:{:02}", value / 100, value % 100);
        if let Some(pin) = self.colon_pin {
            self.drive(pin, colon);
        }
    }
}
