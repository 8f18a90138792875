//! Local indicator panel: function lights and the fast-clock readout.

/// Physical indicators driven from session notifications.
pub trait IndicatorPanel {
    /// Switch a function indicator light. `pin` is the light's output pin.
    fn set_function_light(&mut self, pin: u8, on: bool);

    /// Show a clock value (`hhmm`, 12-hour) with the colon lit or dark.
    fn show_clock(&mut self, value: u16, colon: bool);
}
