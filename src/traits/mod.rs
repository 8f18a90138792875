//! Trait definitions for hardware, network, and panel collaborators.
//!
//! This module defines the abstractions that let the throttle core run on
//! the ESP32 board and on a desktop test harness alike.
//!
//! # Submodules
//!
//! - `hardware`: speed dial, toggle lines, I/O expander, accelerometer, battery, status LED, clock
//! - `network`: Wi-Fi link, protocol session, companion-app link
//! - `panel`: function lights and fast-clock readout
//!
//! # Hardware Abstraction
//!
//! The key hardware traits are:
//!
//! - [`GpioExpander`]: buttons, indicator LEDs and the change-interrupt bitmask
//! - [`AnalogInput`]: the speed dial
//! - [`ToggleInput`]: the direction toggle
//! - [`Clock`]: Time source for `no_std` environments
//!
//! # Session Abstraction
//!
//! [`ProtocolSession`] carries commands to the server and queues
//! [`SessionNotification`]s; a [`SessionDelegate`] consumes them.

pub mod hardware;
pub mod network;
pub mod panel;

pub use hardware::*;
pub use network::*;
pub use panel::*;
