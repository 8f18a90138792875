//! Speed dial oversampling and hysteresis.
//!
//! Raw ADC readings are mapped to protocol speed steps as they arrive and
//! summed. Each report cycle [`AnalogInputFilter::drain`] takes the integer
//! mean and decides whether it is a new value worth publishing.
//!
//! A value is published only when it differs from *both* of the last two
//! published values. A dial resting on the boundary between two steps
//! alternates between them; with the two-sample rule that produces at most
//! one publish instead of a continuous stream.
//!
//! # Example
//!
//! ```rust
//! use knobby_throttle::input::AnalogInputFilter;
//! use knobby_throttle::hal::MockKnob;
//! use knobby_throttle::TogglePosition;
//!
//! let mut filter = AnalogInputFilter::new(MockKnob::new().with_raw(2048));
//! for _ in 0..5 {
//!     filter.sample();
//! }
//!
//! let report = filter.drain(TogglePosition::Right).unwrap();
//! assert_eq!(report.speed, 63);
//! assert!(report.speed_changed);
//! ```

use crate::input::TogglePosition;
use crate::traits::{AnalogInput, MAX_ADC};

/// Highest protocol speed step.
pub const MAX_SPEED: u8 = 126;

/// Map a raw dial reading onto `0..=MAX_SPEED`, truncating.
///
/// Values above [`MAX_ADC`] are clamped.
pub fn map_raw(raw: u16) -> u8 {
    let raw = raw.min(MAX_ADC) as u32;
    (raw * MAX_SPEED as u32 / MAX_ADC as u32) as u8
}

/// Result of one report cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpeedReport {
    /// Filtered speed (0 while the toggle is centered).
    pub speed: u8,
    /// Toggle position the report was taken with.
    pub position: TogglePosition,
    /// Position differs from the previous report's.
    pub position_changed: bool,
    /// `speed` should be published.
    pub speed_changed: bool,
}

/// Oversampling speed filter with two-sample hysteresis.
pub struct AnalogInputFilter<A: AnalogInput> {
    input: A,
    accumulator: u32,
    count: u32,
    previous: Option<u8>,
    penultimate: Option<u8>,
    previous_position: TogglePosition,
}

impl<A: AnalogInput> AnalogInputFilter<A> {
    /// Create a filter with empty history; the first report always publishes.
    pub fn new(input: A) -> Self {
        Self {
            input,
            accumulator: 0,
            count: 0,
            previous: None,
            penultimate: None,
            previous_position: TogglePosition::Unknown,
        }
    }

    /// Read the dial once and accumulate the mapped value.
    pub fn sample(&mut self) {
        let raw = self.input.read_raw();
        self.accumulate(raw);
    }

    /// Accumulate a raw reading obtained elsewhere.
    pub fn accumulate(&mut self, raw: u16) {
        self.accumulator += map_raw(raw) as u32;
        self.count += 1;
    }

    /// Number of samples waiting for the next report.
    pub fn pending_samples(&self) -> u32 {
        self.count
    }

    /// Last published speed, if any.
    pub fn published(&self) -> Option<u8> {
        self.previous
    }

    /// Close the current report window.
    ///
    /// Returns `None` when no samples were taken. Centering the toggle
    /// forces the speed to 0 and, unless 0 was already published, resets
    /// both history slots so exactly one "stopped" report goes out.
    pub fn drain(&mut self, position: TogglePosition) -> Option<SpeedReport> {
        if self.count == 0 {
            return None;
        }
        let mean = (self.accumulator / self.count) as u8;
        self.accumulator = 0;
        self.count = 0;

        let position_changed = position != self.previous_position;
        self.previous_position = position;

        let (speed, speed_changed) = if position == TogglePosition::CenterOff {
            if self.previous != Some(0) {
                self.previous = Some(0);
                self.penultimate = Some(0);
                (0, true)
            } else {
                (0, false)
            }
        } else {
            let changed = self.previous != Some(mean) && self.penultimate != Some(mean);
            if changed {
                self.penultimate = self.previous;
                self.previous = Some(mean);
            }
            (mean, changed)
        };

        Some(SpeedReport {
            speed,
            position,
            position_changed,
            speed_changed,
        })
    }

    /// Forget published history so the next report republishes everything.
    pub fn reset(&mut self) {
        self.previous = None;
        self.penultimate = None;
        self.previous_position = TogglePosition::Unknown;
    }

    /// Access the underlying dial.
    pub fn input_mut(&mut self) -> &mut A {
        &mut self.input
    }
}
