//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `bus`: one I2C bus shared by several drivers
//! - `sx1509`: SX1509 16-pin I/O expander over any `embedded-hal` I2C bus
//! - `lis3dh`: LIS3DH accelerometer over any `embedded-hal` I2C bus
//! - `indicators`: status LED and function lights on expander pins
//! - `esp32`: ESP32 ADC, GPIO, clock, Wi-Fi and NVS adapters (requires `esp32` feature)

pub mod bus;
pub mod indicators;
pub mod lis3dh;
pub mod mock;
pub mod sx1509;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use bus::SharedI2c;
pub use indicators::{ExpanderPanel, RgbStatusLed};
pub use lis3dh::{Lis3dh, Lis3dhError};
pub use mock::*;
pub use sx1509::{Sx1509, Sx1509Error};

#[cfg(feature = "esp32")]
pub use esp32::*;
