//! Error handling for the clock configuration surface.
//!
//! The list operations themselves are total: nothing in the hot paths
//! allocates or performs I/O, so nothing there can fail, and contract
//! violations are caught by debug assertions rather than reported. What
//! remains fallible is setting the clock up.

use core::fmt;

/// Result type for scheduling-core operations.
pub type SchedResult<T> = Result<T, SchedError>;

/// Top-level error type for scheduling-core operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// Clock configuration errors
    Clock(ClockError),
}

/// Errors that can occur while configuring the kernel clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// Invalid tick frequency
    InvalidFrequency(u32),
    /// A kernel clock has already been registered
    AlreadyRegistered,
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedError::Clock(e) => write!(f, "Clock error: {}", e),
        }
    }
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockError::InvalidFrequency(freq) => {
                write!(f, "Invalid tick frequency: {} Hz", freq)
            }
            ClockError::AlreadyRegistered => {
                write!(f, "A kernel clock has already been registered")
            }
        }
    }
}

impl From<ClockError> for SchedError {
    fn from(error: ClockError) -> Self {
        SchedError::Clock(error)
    }
}
