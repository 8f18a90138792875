//! Monotonic clock from the ESP-IDF high-resolution timer.

use crate::traits::Clock;

/// Milliseconds since boot.
///
/// ```ignore
/// use knobby_throttle::hal::esp32::Esp32Clock;
/// use knobby_throttle::traits::Clock;
///
/// let clock = Esp32Clock::new();
/// runtime.tick(clock.now_ms());
/// ```
pub struct Esp32Clock;

impl Esp32Clock {
    /// Creates a clock handle.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Default for Esp32Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_ms(&self) -> u64 {
        // microseconds since boot, never negative
        let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
        (micros / 1000) as u64
    }
}
