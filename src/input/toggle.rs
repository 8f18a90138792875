//! Direction toggle decoding.

use crate::traits::{Direction, ToggleInput};

/// Position of the three-way direction toggle.
///
/// [`Unknown`](Self::Unknown) is only seen before the first read or when
/// both lines are active at once, which a center-off toggle cannot do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TogglePosition {
    /// Toggle thrown left.
    Left,
    /// Toggle thrown right.
    Right,
    /// Toggle in the middle.
    CenterOff,
    /// Not read yet, or an impossible line combination.
    #[default]
    Unknown,
}

impl TogglePosition {
    /// Decode the two raw line levels (`true` = high = inactive).
    ///
    /// ```
    /// use knobby_throttle::TogglePosition;
    ///
    /// assert_eq!(TogglePosition::from_levels(true, true), TogglePosition::CenterOff);
    /// assert_eq!(TogglePosition::from_levels(false, true), TogglePosition::Left);
    /// assert_eq!(TogglePosition::from_levels(true, false), TogglePosition::Right);
    /// assert_eq!(TogglePosition::from_levels(false, false), TogglePosition::Unknown);
    /// ```
    pub const fn from_levels(left_high: bool, right_high: bool) -> Self {
        match (left_high, right_high) {
            (true, true) => TogglePosition::CenterOff,
            (false, true) => TogglePosition::Left,
            (true, false) => TogglePosition::Right,
            (false, false) => TogglePosition::Unknown,
        }
    }

    /// Direction selected by this position. Only `Left` and `Right` select one.
    pub const fn direction(&self) -> Option<Direction> {
        match self {
            TogglePosition::Left => Some(Direction::Reverse),
            TogglePosition::Right => Some(Direction::Forward),
            _ => None,
        }
    }

    /// Name shown to the companion app.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TogglePosition::Left => "Left",
            TogglePosition::Right => "Right",
            TogglePosition::CenterOff => "Center",
            TogglePosition::Unknown => "Unknown",
        }
    }
}

/// Reads the toggle lines and remembers the last position seen.
///
/// The cached value is for callers doing their own change detection; the
/// switch itself never acts on it.
pub struct DigitalModeSwitch<T: ToggleInput> {
    input: T,
    last: TogglePosition,
}

impl<T: ToggleInput> DigitalModeSwitch<T> {
    /// Wrap a pair of toggle lines.
    pub fn new(input: T) -> Self {
        Self {
            input,
            last: TogglePosition::Unknown,
        }
    }

    /// Read the current position.
    pub fn read(&mut self) -> TogglePosition {
        let left = self.input.left_level();
        let right = self.input.right_level();
        self.last = TogglePosition::from_levels(left, right);
        self.last
    }

    /// Position returned by the most recent [`read`](Self::read).
    pub fn last(&self) -> TogglePosition {
        self.last
    }

    /// Forget the cached position.
    pub fn reset(&mut self) {
        self.last = TogglePosition::Unknown;
    }

    /// Access the underlying lines.
    pub fn input_mut(&mut self) -> &mut T {
        &mut self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockToggle;

    #[test]
    fn read_decodes_and_caches() {
        let mut switch = DigitalModeSwitch::new(MockToggle::new());
        assert_eq!(switch.last(), TogglePosition::Unknown);

        assert_eq!(switch.read(), TogglePosition::CenterOff);
        assert_eq!(switch.last(), TogglePosition::CenterOff);

        switch.input_mut().set(TogglePosition::Left);
        assert_eq!(switch.read(), TogglePosition::Left);

        switch.input_mut().set(TogglePosition::Right);
        assert_eq!(switch.read(), TogglePosition::Right);
    }

    #[test]
    fn both_lines_active_is_unknown() {
        let mut switch = DigitalModeSwitch::new(MockToggle::new().with_levels(false, false));
        assert_eq!(switch.read(), TogglePosition::Unknown);
    }

    #[test]
    fn reset_clears_cache() {
        let mut switch = DigitalModeSwitch::new(MockToggle::new());
        switch.read();
        switch.reset();
        assert_eq!(switch.last(), TogglePosition::Unknown);
    }

    #[test]
    fn directions() {
        assert_eq!(TogglePosition::Left.direction(), Some(Direction::Reverse));
        assert_eq!(TogglePosition::Right.direction(), Some(Direction::Forward));
        assert_eq!(TogglePosition::CenterOff.direction(), None);
        assert_eq!(TogglePosition::Unknown.direction(), None);
    }
}
