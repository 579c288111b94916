//! Tick counting and the monotonic timestamp source.

use portable_atomic::{AtomicU64, Ordering};

/// Monotonic clock tick count; the unit in which timed events are due.
pub type Timestamp = u64;

/// Global tick counter for system uptime and scheduling.
///
/// Incremented on every timer interrupt; the resulting count is the
/// monotonic time base the clock queue orders by.
#[derive(Debug)]
pub struct TickCounter {
    /// Number of ticks since system start
    ticks: AtomicU64,
    /// Tick frequency in Hz
    frequency: u32,
    /// Nanoseconds per tick
    ns_per_tick: u64,
}

impl TickCounter {
    /// Create a new tick counter with the given frequency.
    ///
    /// # Arguments
    ///
    /// * `frequency` - Timer frequency in Hz
    pub const fn new(frequency: u32) -> Self {
        Self {
            ticks: AtomicU64::new(0),
            frequency,
            ns_per_tick: 1_000_000_000 / frequency as u64,
        }
    }

    /// Increment the tick counter (called from the timer interrupt).
    pub fn increment(&self) {
        self.ticks.fetch_add(1, Ordering::AcqRel);
    }

    /// Get the current tick count.
    pub fn ticks(&self) -> Timestamp {
        self.ticks.load(Ordering::Acquire)
    }

    /// Get the tick frequency in Hz.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Convert ticks to nanoseconds.
    pub fn ticks_to_nanos(&self, ticks: u64) -> u64 {
        ticks * self.ns_per_tick
    }

    /// Convert nanoseconds to ticks.
    pub fn nanos_to_ticks(&self, nanos: u64) -> u64 {
        nanos / self.ns_per_tick
    }
}

/// Default tick frequency in Hz.
pub const TICK_FREQUENCY_HZ: u32 = 1000; // 1 kHz = 1ms ticks
