//! Test doubles and utilities shared across the suite.

use crate::clock::{ClockNode, ClockQueue, KernelTimer};
use crate::thread::{Priority, SchedThread, ThreadState};
use core::cell::Cell;
use portable_atomic::{AtomicU8, AtomicUsize, Ordering};
use spin::Mutex;
use std::sync::Arc;
use std::vec::Vec;

/// Shared record of which threads were resumed, in order.
pub(crate) type WakeLog = Arc<Mutex<Vec<u64>>>;

pub(crate) fn wake_log() -> WakeLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Thread double with atomic state and a resume counter.
pub(crate) struct MockThread {
    id: u64,
    priority: AtomicU8,
    state: AtomicU8,
    resume_calls: AtomicUsize,
    wake_log: Option<WakeLog>,
}

impl MockThread {
    /// A suspended thread, the state a parked waiter is normally in.
    pub(crate) fn new(id: u64, priority: Priority) -> Self {
        Self {
            id,
            priority: AtomicU8::new(priority),
            state: AtomicU8::new(ThreadState::Suspended as u8),
            resume_calls: AtomicUsize::new(0),
            wake_log: None,
        }
    }

    /// A suspended thread that records its wakeups into `log`.
    pub(crate) fn with_log(id: u64, priority: Priority, log: &WakeLog) -> Self {
        let mut thread = Self::new(id, priority);
        thread.wake_log = Some(log.clone());
        thread
    }

    /// A thread already torn down; resuming it would be a bug.
    pub(crate) fn destroyed(id: u64, priority: Priority) -> Self {
        let thread = Self::new(id, priority);
        thread.state.store(ThreadState::Destroyed as u8, Ordering::Release);
        thread
    }

    pub(crate) fn set_state(&self, state: ThreadState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub(crate) fn resume_calls(&self) -> usize {
        self.resume_calls.load(Ordering::Acquire)
    }
}

impl SchedThread for MockThread {
    fn sched_priority(&self) -> Priority {
        self.priority.load(Ordering::Acquire)
    }

    fn sched_state(&self) -> ThreadState {
        match self.state.load(Ordering::Acquire) {
            0 => ThreadState::Ready,
            1 => ThreadState::Running,
            2 => ThreadState::Suspended,
            _ => ThreadState::Destroyed,
        }
    }

    fn resume(&self) {
        self.resume_calls.fetch_add(1, Ordering::AcqRel);
        if let Some(log) = &self.wake_log {
            log.lock().push(self.id);
        }
        self.state.store(ThreadState::Ready as u8, Ordering::Release);
    }
}

/// Timer double counting service-routine invocations.
pub(crate) struct MockTimer {
    fired: AtomicUsize,
}

impl MockTimer {
    pub(crate) fn new() -> Self {
        Self {
            fired: AtomicUsize::new(0),
        }
    }

    pub(crate) fn fired(&self) -> usize {
        self.fired.load(Ordering::Acquire)
    }
}

impl KernelTimer for MockTimer {
    fn interrupt_service_routine(&self) {
        self.fired.fetch_add(1, Ordering::AcqRel);
    }
}

/// Timer double whose service routine re-arms a pre-built node, the way a
/// periodic timer schedules its next period from inside the current one.
pub(crate) struct RearmTimer<'a> {
    fired: AtomicUsize,
    queue: &'a ClockQueue,
    next: Cell<Option<&'a ClockNode<'a>>>,
}

impl<'a> RearmTimer<'a> {
    pub(crate) fn new(queue: &'a ClockQueue) -> Self {
        Self {
            fired: AtomicUsize::new(0),
            queue,
            next: Cell::new(None),
        }
    }

    pub(crate) fn set_next(&self, node: &'a ClockNode<'a>) {
        self.next.set(Some(node));
    }

    pub(crate) fn fired(&self) -> usize {
        self.fired.load(Ordering::Acquire)
    }
}

impl KernelTimer for RearmTimer<'_> {
    fn interrupt_service_routine(&self) {
        self.fired.fetch_add(1, Ordering::AcqRel);
        if let Some(node) = self.next.take() {
            // Firing happens inside the drain; the re-armed node is due
            // strictly later, so the drain will not revisit it.
            unsafe { self.queue.add(node) };
        }
    }
}

/// Simple linear congruential generator for property testing.
pub(crate) struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub(crate) fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    pub(crate) fn gen_range(&mut self, min: u64, max: u64) -> u64 {
        min + (self.next_u64() % (max - min))
    }
}
