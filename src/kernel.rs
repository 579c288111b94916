use crate::clock::{ClockNode, ClockQueue};
use crate::errors::{ClockError, SchedResult};
use crate::time::{TickCounter, Timestamp};

static GLOBAL_CLOCK: spin::Once<&'static KernelClock> = spin::Once::new();

/// The kernel's clock: the tick counter plus the queue of timed events the
/// tick drains.
///
/// A kernel owns exactly one and injects it into timer and timeout
/// constructors through [`KernelClock::deadlines`]; there is no hidden
/// process-wide clock state beyond the optional registration below.
#[derive(Debug)]
pub struct KernelClock {
    ticks: TickCounter,
    deadlines: ClockQueue,
}

impl KernelClock {
    /// Create a clock ticking at `frequency` Hz;
    /// [`TICK_FREQUENCY_HZ`](crate::time::TICK_FREQUENCY_HZ) is the usual
    /// rate.
    pub const fn new(frequency: u32) -> Self {
        Self {
            ticks: TickCounter::new(frequency),
            deadlines: ClockQueue::new(),
        }
    }

    /// Validating constructor for configuration paths that cannot prove the
    /// frequency at compile time.
    pub fn with_frequency(frequency: u32) -> SchedResult<Self> {
        if frequency == 0 {
            return Err(ClockError::InvalidFrequency(frequency).into());
        }
        Ok(Self::new(frequency))
    }

    /// Current monotonic tick count.
    pub fn now(&self) -> Timestamp {
        self.ticks.ticks()
    }

    /// The underlying tick counter.
    pub fn counter(&self) -> &TickCounter {
        &self.ticks
    }

    /// The timed-event queue, needed to construct [`ClockNode`]s.
    pub fn deadlines(&self) -> &ClockQueue {
        &self.deadlines
    }

    /// Advance the clock by one tick and fire everything that came due.
    ///
    /// Called once per timer interrupt, in interrupt context; interrupts
    /// are already masked there, which is what makes the drain atomic
    /// against threads scheduling new deadlines.
    pub fn tick(&self) {
        self.ticks.increment();
        self.deadlines.check_timestamp(self.ticks.ticks());
    }

    /// Queue `node` for its due instant.
    ///
    /// # Safety
    ///
    /// Same contract as [`ClockQueue::add`]: the node was constructed
    /// against this clock's queue, is unlinked, stays put while linked, and
    /// the caller masks interrupts when calling from thread context.
    pub unsafe fn schedule(&self, node: &ClockNode<'_>) {
        unsafe { self.deadlines.add(node) };
    }

    /// Cancel a pending node; a no-op if it already fired.
    ///
    /// # Safety
    ///
    /// Same contract as [`ClockQueue::remove`].
    pub unsafe fn cancel(&self, node: &ClockNode<'_>) {
        unsafe { self.deadlines.remove(node) };
    }
}

/// Register the clock driven by the platform tick interrupt.
///
/// At most one clock can be registered for the lifetime of the kernel;
/// later attempts report [`ClockError::AlreadyRegistered`].
pub fn register_global(clock: &'static KernelClock) -> SchedResult<()> {
    let mut registered = false;
    GLOBAL_CLOCK.call_once(|| {
        registered = true;
        clock
    });
    if registered {
        Ok(())
    } else {
        Err(ClockError::AlreadyRegistered.into())
    }
}

/// Get the registered kernel clock (for interrupt handlers).
///
/// Returns None if no clock has been registered.
pub fn global_clock() -> Option<&'static KernelClock> {
    GLOBAL_CLOCK.get().copied()
}
