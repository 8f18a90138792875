//! Hardware abstraction traits for the throttle's physical control panel.
//!
//! This module defines the device-level interfaces the input filters and the
//! [`HardwareFacade`](crate::hardware::HardwareFacade) consume. Everything
//! here is a point-to-point primitive: the algorithms live elsewhere.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`AnalogInput`] | Raw speed dial reading (0..=[`MAX_ADC`]) |
//! | [`ToggleInput`] | Two direction-toggle lines, raw levels |
//! | [`GpioExpander`] | Buttons, indicator LEDs, interrupt status |
//! | [`Accelerometer`] | 3-axis motion sensor |
//! | [`BatteryMonitor`] | Battery voltage in millivolts |
//! | [`StatusIndicator`] | Connection status LED |
//! | [`Clock`] | Millisecond time source |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. Portable I2C drivers live in
//! [`crate::hal::sx1509`] and [`crate::hal::lis3dh`]; ESP32 adapters are in
//! `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use knobby_throttle::traits::GpioExpander;
//! use knobby_throttle::hal::MockExpander;
//!
//! let mut expander = MockExpander::new();
//! expander.begin().unwrap();
//! expander.setup_button(7).unwrap();
//!
//! // Button on pin 7 pulled low (pressed) with its interrupt bit set
//! expander.set_pin(7, false);
//! expander.queue_interrupt(1 << 7);
//!
//! assert_eq!(expander.interrupt_source().unwrap(), 1 << 7);
//! assert_eq!(expander.digital_read(7).unwrap(), false);
//! ```

extern crate alloc;

use alloc::rc::Rc;
use core::cell::RefCell;

/// Maximum raw value of the 12-bit speed dial ADC.
pub const MAX_ADC: u16 = 4095;

/// Direction of travel as understood by the protocol session.
///
/// The protocol only knows forward and reverse; the center-off toggle
/// position has no direction and is handled as "speed zero" instead.
///
/// # Default
///
/// Defaults to [`Forward`](Self::Forward), which is what a freshly opened
/// session assumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Moving forward.
    #[default]
    Forward,
    /// Moving in reverse.
    Reverse,
}

impl Direction {
    /// Returns the direction as shown to the companion app.
    ///
    /// # Examples
    ///
    /// ```
    /// use knobby_throttle::Direction;
    ///
    /// assert_eq!(Direction::Forward.as_str(), "Forward");
    /// assert_eq!(Direction::Reverse.as_str(), "Reverse");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "Forward",
            Direction::Reverse => "Reverse",
        }
    }
}

/// Speed dial ADC.
///
/// Returns one raw conversion per call. The filter maps the raw range
/// `0..=MAX_ADC` onto protocol speed steps; out-of-range values are clamped.
pub trait AnalogInput {
    /// Take one raw reading.
    fn read_raw(&mut self) -> u16;
}

/// The two digital lines of the direction toggle.
///
/// Both lines use pull-ups, so a line is *active* when it reads low.
/// Implementations report the raw electrical level.
pub trait ToggleInput {
    /// Raw level of the "left" line (`true` = high = inactive).
    fn left_level(&mut self) -> bool;

    /// Raw level of the "right" line (`true` = high = inactive).
    fn right_level(&mut self) -> bool;
}

/// Battery voltage sense.
pub trait BatteryMonitor {
    /// Current battery voltage in millivolts.
    fn read_millivolts(&mut self) -> u16;
}

/// I/O expander carrying the function buttons and indicator LEDs.
///
/// Pins are numbered 0..16. The expander latches which inputs changed since
/// the last [`interrupt_source`](Self::interrupt_source) call and raises an
/// interrupt line; reading the source clears the latch.
///
/// # Implementation Notes
///
/// - `begin` must fail if the device does not answer on the bus; this is
///   the only fatal bring-up error of the firmware
/// - Buttons are wired active-low with pull-ups
pub trait GpioExpander {
    /// Error type for bus operations.
    type Error: core::fmt::Debug;

    /// Check the chip ID and reset the device.
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Set the global input debounce time in milliseconds.
    fn set_debounce_time(&mut self, ms: u8) -> Result<(), Self::Error>;

    /// Configure a pulled-up, debounced input with an interrupt on both edges.
    fn setup_button(&mut self, pin: u8) -> Result<(), Self::Error>;

    /// Configure a push-pull output.
    fn setup_output(&mut self, pin: u8) -> Result<(), Self::Error>;

    /// Configure a PWM (LED driver) output.
    fn setup_pwm_output(&mut self, pin: u8) -> Result<(), Self::Error>;

    /// Read and clear the interrupt status bitmask (bit n = pin n changed).
    fn interrupt_source(&mut self) -> Result<u16, Self::Error>;

    /// Read the level of a pin (`true` = high).
    fn digital_read(&mut self, pin: u8) -> Result<bool, Self::Error>;

    /// Drive an output pin.
    fn digital_write(&mut self, pin: u8, high: bool) -> Result<(), Self::Error>;

    /// Set the PWM intensity of a pin configured with
    /// [`setup_pwm_output`](Self::setup_pwm_output).
    fn analog_write(&mut self, pin: u8, value: u8) -> Result<(), Self::Error>;
}

/// One expander shared between the button reader and the LED drivers.
///
/// The firmware runs a single cooperative loop, so a `RefCell` borrow never
/// overlaps another.
impl<E: GpioExpander> GpioExpander for Rc<RefCell<E>> {
    type Error = E::Error;

    fn begin(&mut self) -> Result<(), Self::Error> {
        self.borrow_mut().begin()
    }

    fn set_debounce_time(&mut self, ms: u8) -> Result<(), Self::Error> {
        self.borrow_mut().set_debounce_time(ms)
    }

    fn setup_button(&mut self, pin: u8) -> Result<(), Self::Error> {
        self.borrow_mut().setup_button(pin)
    }

    fn setup_output(&mut self, pin: u8) -> Result<(), Self::Error> {
        self.borrow_mut().setup_output(pin)
    }

    fn setup_pwm_output(&mut self, pin: u8) -> Result<(), Self::Error> {
        self.borrow_mut().setup_pwm_output(pin)
    }

    fn interrupt_source(&mut self) -> Result<u16, Self::Error> {
        self.borrow_mut().interrupt_source()
    }

    fn digital_read(&mut self, pin: u8) -> Result<bool, Self::Error> {
        self.borrow_mut().digital_read(pin)
    }

    fn digital_write(&mut self, pin: u8, high: bool) -> Result<(), Self::Error> {
        self.borrow_mut().digital_write(pin, high)
    }

    fn analog_write(&mut self, pin: u8, value: u8) -> Result<(), Self::Error> {
        self.borrow_mut().analog_write(pin, value)
    }
}

/// One 3-axis acceleration sample in milli-g.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Acceleration {
    /// X axis (mg).
    pub x: i16,
    /// Y axis (mg).
    pub y: i16,
    /// Z axis (mg).
    pub z: i16,
}

impl Acceleration {
    /// Create a sample from three axis values.
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Largest absolute per-axis difference to another sample.
    ///
    /// ```
    /// use knobby_throttle::traits::Acceleration;
    ///
    /// let a = Acceleration::new(0, 10, 1000);
    /// let b = Acceleration::new(5, -40, 990);
    /// assert_eq!(a.max_axis_delta(&b), 50);
    /// ```
    pub fn max_axis_delta(&self, other: &Acceleration) -> u16 {
        let dx = (self.x as i32 - other.x as i32).unsigned_abs();
        let dy = (self.y as i32 - other.y as i32).unsigned_abs();
        let dz = (self.z as i32 - other.z as i32).unsigned_abs();
        dx.max(dy).max(dz).min(u16::MAX as u32) as u16
    }
}

/// Full-scale range of the accelerometer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccelRange {
    /// ±2 g
    G2,
    /// ±4 g
    #[default]
    G4,
    /// ±8 g
    G8,
    /// ±16 g
    G16,
}

/// Motion sensor.
///
/// Bring-up failure is not fatal: the facade disables motion reporting.
pub trait Accelerometer {
    /// Error type for sensor operations.
    type Error: core::fmt::Debug;

    /// Check the device ID and start continuous conversion.
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Select the full-scale range.
    fn set_range(&mut self, range: AccelRange) -> Result<(), Self::Error>;

    /// Read the latest sample.
    fn read(&mut self) -> Result<Acceleration, Self::Error>;
}

/// An RGB colour for the status LED. 0 is off, 0xFF is full brightness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    /// Red intensity.
    pub red: u8,
    /// Green intensity.
    pub green: u8,
    /// Blue intensity.
    pub blue: u8,
}

impl Rgb {
    /// LED off.
    pub const OFF: Rgb = Rgb::new(0, 0, 0);

    /// Create a colour.
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// Connection status LED.
pub trait StatusIndicator {
    /// Show a colour.
    fn set_color(&mut self, color: Rgb);
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for the interval timers and
/// the connection timeouts. On desktop, this can wrap `std::time::Instant`.
/// On embedded, use a hardware timer.
///
/// # Example
///
/// ```rust
/// use knobby_throttle::traits::Clock;
/// use knobby_throttle::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}
