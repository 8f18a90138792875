//! ESP32 hardware abstraction layer for the handheld throttle.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 (RISC-V 160MHz, 4MB Flash)
//! - **I/O expander**: SX1509 (I2C 0x3E) with the function buttons, the
//!   function light and the RGB status LED
//! - **Accelerometer**: LIS3DH (I2C 0x18)
//! - **Speed dial**: 10k potentiometer on ADC1
//! - **Direction**: center-off SPDT toggle on two GPIOs
//!
//! The expander and accelerometer drivers are the portable ones in
//! [`crate::hal::sx1509`] and [`crate::hal::lis3dh`]; `esp_idf_hal`'s
//! `I2cDriver` implements the `embedded-hal` bus trait they need.
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments.

mod analog;
mod clock;
mod irq;
mod toggle;

pub use analog::{Esp32Battery, Esp32Knob};
pub use clock::Esp32Clock;
pub use irq::InterruptLine;
pub use toggle::Esp32Toggle;

#[cfg(feature = "wifi")]
mod store;
#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use store::NvsStore;
#[cfg(feature = "wifi")]
pub use wifi::Esp32Wifi;

/// Pin assignments.
pub mod pins {
    // =========================================================================
    // Analog
    // =========================================================================

    /// Speed potentiometer wiper (ADC1)
    pub const SPEED_ADC: i32 = 3;

    /// Battery sense through a 1:1 divider (ADC1)
    pub const BATTERY_ADC: i32 = 4;

    // =========================================================================
    // Direction Toggle
    // =========================================================================

    /// Toggle left line (active low)
    pub const TOGGLE_LEFT: i32 = 0;

    /// Toggle right line (active low)
    pub const TOGGLE_RIGHT: i32 = 1;

    // =========================================================================
    // I2C Bus (SX1509 + LIS3DH)
    // =========================================================================

    /// I2C data line
    pub const I2C_SDA: i32 = 8;

    /// I2C clock line
    pub const I2C_SCL: i32 = 9;

    /// SX1509 interrupt output (open drain, active low)
    pub const EXPANDER_INT: i32 = 5;

    /// LIS3DH INT1 output (active high)
    pub const MOTION_INT: i32 = 6;
}
