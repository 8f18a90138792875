//! Interrupt hand-off between an ISR and the main loop.
//!
//! Handlers must return quickly, so they only record that something
//! happened together with one register value they already have. The main
//! loop takes the flag on its next pass and does the real work.
//!
//! `InterruptFlag` is `const`-constructible so it can live in a `static`
//! that an ESP-IDF ISR callback can reach without capturing anything.
//!
//! ```rust
//! use knobby_throttle::interrupt::InterruptFlag;
//!
//! static BUTTONS: InterruptFlag = InterruptFlag::new();
//!
//! // in the ISR
//! BUTTONS.raise(0);
//!
//! // in the main loop
//! assert_eq!(BUTTONS.take(), Some(0));
//! assert_eq!(BUTTONS.take(), None);
//! ```

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Single-producer/single-consumer pending flag with one captured scalar.
#[derive(Debug)]
pub struct InterruptFlag {
    pending: AtomicBool,
    value: AtomicU32,
}

impl InterruptFlag {
    /// A cleared flag.
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            value: AtomicU32::new(0),
        }
    }

    /// Mark pending and capture `value`. Safe to call from an ISR.
    pub fn raise(&self, value: u32) {
        self.value.store(value, Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
    }

    /// Clear the flag, returning the captured value if it was pending.
    pub fn take(&self) -> Option<u32> {
        if self.pending.swap(false, Ordering::Acquire) {
            Some(self.value.load(Ordering::Relaxed))
        } else {
            None
        }
    }

    /// Whether the flag is set, without clearing it.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

impl Default for InterruptFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_clears() {
        let flag = InterruptFlag::new();
        assert!(!flag.is_pending());
        flag.raise(7);
        assert!(flag.is_pending());
        assert_eq!(flag.take(), Some(7));
        assert!(!flag.is_pending());
        assert_eq!(flag.take(), None);
    }

    #[test]
    fn last_raise_wins() {
        let flag = InterruptFlag::new();
        flag.raise(1);
        flag.raise(2);
        assert_eq!(flag.take(), Some(2));
    }

    #[cfg(feature = "std")]
    #[test]
    fn raise_from_other_thread() {
        static FLAG: InterruptFlag = InterruptFlag::new();
        std::thread::spawn(|| FLAG.raise(42)).join().unwrap();
        assert_eq!(FLAG.take(), Some(42));
    }
}
