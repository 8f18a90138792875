//! Physical input filtering: speed dial, direction toggle, function buttons.
//!
//! Each input turns raw, noisy device readings into semantic events:
//!
//! - [`AnalogInputFilter`]: oversampled, hysteresis-filtered speed
//! - [`DigitalModeSwitch`]: tri-state toggle position
//! - [`ButtonEventSource`]: press/release edges from the expander interrupt
//!
//! The [`HardwareFacade`](crate::hardware::HardwareFacade) owns all three and
//! decides when each runs.

pub mod buttons;
pub mod speed;
pub mod toggle;

pub use buttons::{ButtonEvent, ButtonEventSource, MAX_FUNCTIONS};
pub use speed::{map_raw, AnalogInputFilter, SpeedReport, MAX_SPEED};
pub use toggle::{DigitalModeSwitch, TogglePosition};
