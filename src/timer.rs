//! Non-blocking interval timers for the cooperative main loop.

/// "Has at least N ms elapsed since the last restart?"
///
/// Several timers share one call stack without ever sleeping.
///
/// ```rust
/// use knobby_throttle::timer::IntervalTimer;
///
/// let mut t = IntervalTimer::new(66);
/// assert!(!t.poll(65));
/// assert!(t.poll(66));
/// assert!(!t.poll(100)); // restarted at 66
/// assert!(t.poll(132));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntervalTimer {
    interval_ms: u64,
    started_ms: u64,
}

impl IntervalTimer {
    /// Timer started at time 0.
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            started_ms: 0,
        }
    }

    /// Configured interval.
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Whether the interval has elapsed at `now_ms`.
    pub fn has_passed(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.started_ms) >= self.interval_ms
    }

    /// Start a new interval at `now_ms`.
    pub fn restart(&mut self, now_ms: u64) {
        self.started_ms = now_ms;
    }

    /// [`has_passed`](Self::has_passed) followed by a restart when it has.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.has_passed(now_ms) {
            self.restart(now_ms);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_going_backwards_does_not_fire() {
        let mut t = IntervalTimer::new(10);
        t.restart(100);
        assert!(!t.has_passed(50));
    }

    #[test]
    fn zero_interval_always_fires() {
        let mut t = IntervalTimer::new(0);
        assert!(t.poll(0));
        assert!(t.poll(0));
    }

    #[test]
    fn late_poll_restarts_from_now() {
        let mut t = IntervalTimer::new(10);
        assert!(t.poll(35));
        assert!(!t.poll(44));
        assert!(t.poll(45));
    }
}
