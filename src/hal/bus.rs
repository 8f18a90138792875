//! One I2C bus shared by several drivers.
//!
//! The expander and the accelerometer sit on the same two wires. Each driver
//! gets a [`SharedI2c`] handle borrowing the bus only for the duration of one
//! transaction; the cooperative main loop never nests them.
//!
//! ```rust
//! use core::cell::RefCell;
//! use knobby_throttle::hal::{lis3dh, sx1509, Lis3dh, MockI2c, SharedI2c, Sx1509};
//! use knobby_throttle::traits::{Accelerometer, GpioExpander};
//!
//! let bus = RefCell::new(
//!     MockI2c::new()
//!         .with_device(sx1509::DEFAULT_ADDRESS, &[(0x13, 0xFF)])
//!         .with_device(lis3dh::DEFAULT_ADDRESS, &[(0x0F, 0x33)]),
//! );
//! let mut expander = Sx1509::new(SharedI2c::new(&bus));
//! let mut accel = Lis3dh::new(SharedI2c::new(&bus));
//! assert!(expander.begin().is_ok());
//! assert!(accel.begin().is_ok());
//! ```

use embedded_hal_bus::i2c::RefCellDevice;

/// Borrowing handle to a shared bus.
pub type SharedI2c<'a, I2C> = RefCellDevice<'a, I2C>;
