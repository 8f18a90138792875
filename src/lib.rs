//! # knobby-throttle
//!
//! Firmware core for a handheld model railroad throttle: a speed dial, a
//! center-off direction toggle, function buttons and a motion sensor,
//! reconciled with a remote protocol session and a companion app.
//!
//! ## Features
//!
//! - **Input filtering**: oversampled speed dial with two-sample hysteresis,
//!   edge-detected toggle, interrupt-driven function buttons
//! - **Connection lifecycle**: Wi-Fi join, background scans, session open and
//!   handshake as a non-blocking state machine with retry intervals
//! - **Event routing**: direction lock, speed forwarding, locomotive address
//!   arbitration with bounded steals, function light feedback
//! - **Companion app values**: named read/write/notify values with UUIDs and a
//!   device information block
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware, network and panel abstractions
//! - `input` - Speed filter, toggle switch and button reader
//! - `hardware` - [`HardwareFacade`] polling every physical input
//! - `connection` - [`ConnectionStateMachine`]
//! - `throttle` - [`ThrottleController`], the event router
//! - `runtime` - [`ThrottleRuntime`] tying it all into one `tick()`
//! - `hal` - Concrete implementations (mocks, I2C drivers, esp32)
//!
//! ## Example
//!
//! ```rust
//! use knobby_throttle::hal::{MockAppLink, MockPanel, MockSession};
//! use knobby_throttle::hardware::HardwareObserver;
//! use knobby_throttle::{ThrottleConfig, ThrottleController, TogglePosition};
//!
//! let config = ThrottleConfig::default().with_default_address("S20");
//! let mut router = ThrottleController::new(
//!     MockSession::new(),
//!     MockAppLink::new(),
//!     MockPanel::new(),
//!     config,
//!     &[],
//! );
//!
//! // session handshake done: the default address is staged
//! router.session_activated("cab 1");
//! router.arbitrate();
//! assert_eq!(router.active_address(), Some("S20"));
//!
//! // controls flow to the session
//! router.toggle_position_changed(TogglePosition::Right);
//! router.speed_changed(40, TogglePosition::Right);
//! assert_eq!(router.session().speeds().last(), Some(&40));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Shared configuration and persisted settings.
pub mod config;
/// Network and session lifecycle state machine.
pub mod connection;
/// Error types.
pub mod error;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Physical control panel facade.
pub mod hardware;
/// Input filters for the dial, toggle and buttons.
pub mod input;
/// Interrupt-to-main-loop flags.
pub mod interrupt;
/// Boot and main-loop iteration.
pub mod runtime;
/// Event router between controls, session and companion app.
pub mod throttle;
/// Non-blocking interval timers.
pub mod timer;
/// Core traits for hardware, network and panel abstraction.
pub mod traits;
/// Companion-app value catalogue and write handling.
pub mod wireless;

// Re-exports for convenience
pub use config::{
    ButtonMapping, Config, ConfigKey, ConfigStore, ConnectionConfig, FunctionLight,
    HardwareConfig, NetworkSettings, ThrottleConfig,
};
pub use connection::{ConnectionEvent, ConnectionNotice, ConnectionState, ConnectionStateMachine};
pub use error::{HardwareError, ThrottleError};
pub use hardware::{
    ControlPanel, HardwareEvent, HardwareFacade, HardwareObserver, HardwareParts, PilotLight,
};
pub use input::{AnalogInputFilter, ButtonEvent, ButtonEventSource, DigitalModeSwitch, TogglePosition};
pub use interrupt::InterruptFlag;
pub use runtime::{RuntimeParts, ThrottleRuntime};
pub use throttle::{ControllerState, SessionInfo, ThrottleController};
pub use timer::IntervalTimer;
pub use traits::{
    // Hardware
    AccelRange,
    Acceleration,
    Accelerometer,
    AnalogInput,
    BatteryMonitor,
    Clock,
    Direction,
    GpioExpander,
    Rgb,
    StatusIndicator,
    ToggleInput,
    // Network
    Acquisition,
    ConfigLink,
    ConfigWrite,
    InterfaceInfo,
    NetworkInfo,
    NetworkLink,
    ProtocolSession,
    SessionDelegate,
    SessionNotification,
    StatusMirror,
    // Panel
    IndicatorPanel,
};
