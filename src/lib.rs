#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![forbid(unreachable_pub)]

//! Intrusive scheduling lists for a small uniprocessor real-time kernel.
//!
//! This library provides the core scheduling data structures of an RTOS for
//! resource-constrained single-processor embedded targets: two ordered,
//! circular, intrusive doubly-linked lists and the nodes they link.
//!
//! - [`WaitQueue`] parks threads blocked on synchronization primitives
//!   (mutexes, condition variables, semaphores, message queues), ordered so
//!   the highest-priority waiter is woken first;
//! - [`ClockQueue`] orders timed events (sleep expirations, timeouts on
//!   blocking calls, software timers) by due tick and is drained once per
//!   clock tick by [`KernelClock::tick`].
//!
//! Nodes are caller-owned and embedded in the entity they represent, so the
//! hot paths never allocate. Atomicity comes from masking interrupts for a
//! lexical scope ([`CriticalSection`]); there are no locks and no cross-core
//! fences, because the target is a single CPU.
//!
//! # Features
//!
//! - `std-shim`: compatibility layer for running the suite on a host
//!
//! # Quick Start
//!
//! ```ignore
//! use sched_core::{ClockNode, CriticalSection, KernelClock, WaitNode, WaitQueue};
//! use sched_core::TICK_FREQUENCY_HZ;
//! use spin::Lazy;
//!
//! static CLOCK: Lazy<KernelClock> = Lazy::new(|| KernelClock::new(TICK_FREQUENCY_HZ));
//!
//! // Timer interrupt handler: advance time and fire what came due.
//! fn tick_handler() {
//!     CLOCK.tick();
//! }
//!
//! // Inside a blocking primitive: park the calling thread with a deadline.
//! fn timed_wait(queue: &WaitQueue, thread: &dyn sched_core::SchedThread, deadline: u64) {
//!     let waiter = WaitNode::new(thread);
//!     let timeout = ClockNode::wakeup(CLOCK.deadlines(), deadline, thread);
//!     {
//!         let _ics = CriticalSection::enter();
//!         unsafe {
//!             queue.add(&waiter);
//!             CLOCK.schedule(&timeout);
//!         }
//!     }
//!     // ... suspend, and on wakeup unlink both nodes; remove is
//!     // idempotent, so it does not matter which path won.
//!     {
//!         let _ics = CriticalSection::enter();
//!         unsafe {
//!             queue.remove(&waiter);
//!             CLOCK.cancel(&timeout);
//!         }
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! The library is organized around a handful of small abstractions:
//! - a link cell and generic circular list ([`ListLinks`], [`DoubleList`])
//! - the two ordered specializations ([`WaitQueue`], [`ClockQueue`])
//! - the consumed thread and timer contracts ([`SchedThread`], [`KernelTimer`])
//! - the scoped interrupt critical section ([`CriticalSection`])

// Core modules
pub mod clock;
pub mod errors;
pub mod irq;
pub mod kernel;
pub mod list;
pub mod thread;
pub mod time;
pub mod wait;

#[cfg(test)]
mod tests;

#[cfg(test)]
extern crate std;

// Panic handler for bare-metal
#[cfg(all(not(test), not(feature = "std-shim")))]
use core::panic::PanicInfo;

#[cfg(all(not(test), not(feature = "std-shim")))]
#[panic_handler]
fn panic(_info: &PanicInfo) -> ! {
    // On panic, disable interrupts and halt
    #[cfg(target_arch = "aarch64")]
    unsafe {
        core::arch::asm!("msr daifset, #0xf", options(nomem, nostack));
    }
    loop {
        #[cfg(target_arch = "aarch64")]
        unsafe {
            core::arch::asm!("wfe", options(nomem, nostack));
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

// Lists and nodes
pub use list::{DoubleList, ListLinks};
pub use wait::{WaitNode, WaitQueue};
pub use clock::{ClockEvent, ClockNode, ClockQueue, KernelTimer};

// Collaborator contracts
pub use thread::{Priority, SchedThread, ThreadState};

// Interrupt control
pub use irq::CriticalSection;

// Time and the kernel clock
pub use time::{TickCounter, Timestamp, TICK_FREQUENCY_HZ};
pub use kernel::{global_clock, register_global, KernelClock};

// Errors
pub use errors::{ClockError, SchedError, SchedResult};
