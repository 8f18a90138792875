//! Function buttons behind the I/O expander's change interrupt.
//!
//! The expander latches which pins changed and raises its interrupt line.
//! Servicing reads that bitmask once and visits only the mapped buttons whose
//! bit is set, so the cost follows the number of changed inputs.

use heapless::Vec;
use log::{debug, warn};

use crate::config::{ButtonMapping, MAX_BUTTONS};
use crate::traits::GpioExpander;

/// Number of protocol functions (F0..=F28).
pub const MAX_FUNCTIONS: usize = 29;

/// One button edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonEvent {
    /// Protocol function index.
    pub function: u8,
    /// `true` for a press, `false` for a release.
    pub pressed: bool,
}

/// Turns the interrupt bitmask into per-function press/release events.
pub struct ButtonEventSource {
    mappings: Vec<ButtonMapping, MAX_BUTTONS>,
    pressed: [bool; MAX_FUNCTIONS],
}

impl ButtonEventSource {
    /// Create a source for the given pin-to-function table.
    ///
    /// Entries beyond [`MAX_BUTTONS`] or with a function index outside
    /// `0..MAX_FUNCTIONS` are ignored.
    pub fn new(mappings: &[ButtonMapping]) -> Self {
        let mut table = Vec::new();
        for m in mappings {
            if (m.function as usize) < MAX_FUNCTIONS && m.pin < 16 {
                if table.push(m.clone()).is_err() {
                    warn!("button table full, ignoring {}", m.name);
                }
            } else {
                warn!("button {} has an invalid pin or function", m.name);
            }
        }
        Self {
            mappings: table,
            pressed: [false; MAX_FUNCTIONS],
        }
    }

    /// Registered mappings.
    pub fn mappings(&self) -> &[ButtonMapping] {
        &self.mappings
    }

    /// Last known state of a function's button.
    pub fn is_pressed(&self, function: u8) -> bool {
        self.pressed
            .get(function as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Read the interrupt status once and emit an event per changed button.
    ///
    /// A failed status read yields no events for this cycle.
    pub fn service<E: GpioExpander>(&mut self, expander: &mut E) -> Vec<ButtonEvent, MAX_BUTTONS> {
        let mut events = Vec::new();
        let status = match expander.interrupt_source() {
            Ok(status) => status,
            Err(e) => {
                warn!("button status read failed: {:?}", e);
                return events;
            }
        };

        for m in self.mappings.iter() {
            if status & (1 << m.pin) == 0 {
                continue;
            }
            match expander.digital_read(m.pin) {
                Ok(level) => {
                    let pressed = !level;
                    self.pressed[m.function as usize] = pressed;
                    debug!(
                        "{} {} (F{})",
                        m.name,
                        if pressed { "pressed" } else { "released" },
                        m.function
                    );
                    // capacity equals the table size
                    let _ = events.push(ButtonEvent {
                        function: m.function,
                        pressed,
                    });
                }
                Err(e) => warn!("reading {} failed: {:?}", m.name, e),
            }
        }
        events
    }

    /// Forget button states.
    pub fn reset(&mut self) {
        self.pressed = [false; MAX_FUNCTIONS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardwareConfig;
    use crate::hal::MockExpander;

    fn board() -> ButtonEventSource {
        ButtonEventSource::new(&HardwareConfig::default().buttons)
    }

    #[test]
    fn unset_bits_are_skipped() {
        let mut source = board();
        let mut expander = MockExpander::new();
        expander.set_pin(7, false);
        expander.queue_interrupt(0);
        assert!(source.service(&mut expander).is_empty());
        assert_eq!(expander.reads, 0);
    }

    #[test]
    fn set_bit_reads_level_active_low() {
        let mut source = board();
        let mut expander = MockExpander::new();

        // BUTTON1 is pin 7 -> F0
        expander.set_pin(7, false);
        expander.queue_interrupt(1 << 7);
        let events = source.service(&mut expander);
        assert_eq!(events.as_slice(), &[ButtonEvent { function: 0, pressed: true }]);
        assert!(source.is_pressed(0));

        expander.set_pin(7, true);
        expander.queue_interrupt(1 << 7);
        let events = source.service(&mut expander);
        assert_eq!(events.as_slice(), &[ButtonEvent { function: 0, pressed: false }]);
        assert!(!source.is_pressed(0));
    }

    #[test]
    fn brake_maps_to_f9() {
        let mut source = board();
        let mut expander = MockExpander::new();
        expander.set_pin(8, false);
        expander.queue_interrupt(1 << 8);
        let events = source.service(&mut expander);
        assert_eq!(events.as_slice(), &[ButtonEvent { function: 9, pressed: true }]);
    }

    #[test]
    fn unmapped_bits_never_emit() {
        let mut source = board();
        let mut expander = MockExpander::new();
        // pin 9 is an LED, pins 13..15 the status LED
        expander.queue_interrupt((1 << 9) | (1 << 13) | (1 << 15));
        assert!(source.service(&mut expander).is_empty());
    }

    #[test]
    fn several_bits_in_one_read() {
        let mut source = board();
        let mut expander = MockExpander::new();
        expander.set_pin(0, false); // BUTTON8 -> F7
        expander.set_pin(6, true); // BUTTON2 -> F1
        expander.queue_interrupt((1 << 0) | (1 << 6));
        let events = source.service(&mut expander);
        assert_eq!(events.len(), 2);
        assert!(events.contains(&ButtonEvent { function: 7, pressed: true }));
        assert!(events.contains(&ButtonEvent { function: 1, pressed: false }));
    }

    #[test]
    fn failed_status_read_emits_nothing() {
        let mut source = board();
        let mut expander = MockExpander::new();
        expander.fail_interrupt_read = true;
        expander.set_pin(7, false);
        assert!(source.service(&mut expander).is_empty());
    }

    #[test]
    fn invalid_mappings_are_dropped() {
        let mut mappings = HardwareConfig::default().buttons;
        mappings.clear();
        let _ = mappings.push(ButtonMapping::new(3, 40, "F40"));
        let _ = mappings.push(ButtonMapping::new(20, 1, "pin 20"));
        let _ = mappings.push(ButtonMapping::new(3, 2, "ok"));
        let source = ButtonEventSource::new(&mappings);
        assert_eq!(source.mappings().len(), 1);
    }
}
