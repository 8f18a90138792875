//! Error types surfaced by the throttle core.
//!
//! Collaborator traits carry their own associated `Error`; the core maps
//! those into the variants below only where a failure has to leave the
//! main loop. Everything else is logged and degraded in place.

use core::fmt;

// ---------------------------------------------------------------------------
// Hardware errors
// ---------------------------------------------------------------------------

/// Hardware bring-up and bus failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareError {
    /// The I/O expander did not answer. All controls route through it.
    ExpanderInit,
    /// A bus transfer failed after the device was up.
    Bus,
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExpanderInit => write!(f, "I/O expander not responding"),
            Self::Bus => write!(f, "bus transfer failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HardwareError {}

// ---------------------------------------------------------------------------
// Runtime errors
// ---------------------------------------------------------------------------

/// Failures that stop the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleError {
    /// Bring-up failed.
    Hardware(HardwareError),
    /// The persisted settings could not be written.
    Storage,
}

impl fmt::Display for ThrottleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardware(e) => write!(f, "hardware: {e}"),
            Self::Storage => write!(f, "settings storage failed"),
        }
    }
}

impl From<HardwareError> for ThrottleError {
    fn from(e: HardwareError) -> Self {
        Self::Hardware(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ThrottleError {}
