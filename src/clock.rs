//! Timestamp-ordered list of timed events, drained by the kernel clock tick.
//!
//! Thread sleep expirations, timeouts on blocking primitives and software
//! timers all funnel into one [`ClockQueue`], kept in ascending due-time
//! order so the tick handler only ever inspects the head. Each node carries
//! a [`ClockEvent`] describing what to do when its instant arrives; firing
//! always unlinks the node first, which is what allows a periodic timer to
//! re-arm itself from inside its own service routine.

use crate::list::{DoubleList, ListLinks};
use crate::thread::{SchedThread, ThreadState};
use crate::time::Timestamp;

/// Behavioral contract of the software timer object.
///
/// The timer itself lives in the wider kernel; a [`ClockNode`] borrows it
/// and calls this at the due instant, from the tick handler's context.
pub trait KernelTimer {
    /// Perform the timer's due-instant work.
    fn interrupt_service_routine(&self);
}

/// What a due [`ClockNode`] does once it has left the queue.
#[derive(Clone, Copy)]
pub enum ClockEvent<'a> {
    /// Make the thread runnable again: a sleep expired or a timed wait on a
    /// blocking primitive ran out. Threads already destroyed are skipped.
    ResumeThread(&'a dyn SchedThread),
    /// Run the software timer's service routine.
    FireTimer(&'a dyn KernelTimer),
}

/// A timed event scheduled on a [`ClockQueue`].
///
/// Lives either on the sleeping thread's stack frame (timeouts) or inside
/// the timer object (software timers); the queue never owns it. The due
/// timestamp and the owning queue are fixed at construction, which is what
/// lets the event unlink itself when it fires.
#[repr(C)]
pub struct ClockNode<'a> {
    links: ListLinks,
    timestamp: Timestamp,
    queue: *const ClockQueue,
    event: ClockEvent<'a>,
}

impl<'a> ClockNode<'a> {
    /// A node that resumes `thread` once `queue` is drained past
    /// `timestamp`.
    pub const fn wakeup(
        queue: &ClockQueue,
        timestamp: Timestamp,
        thread: &'a dyn SchedThread,
    ) -> Self {
        Self {
            links: ListLinks::new(),
            timestamp,
            queue,
            event: ClockEvent::ResumeThread(thread),
        }
    }

    /// A node that runs `timer`'s service routine once `queue` is drained
    /// past `timestamp`.
    pub const fn timer(
        queue: &ClockQueue,
        timestamp: Timestamp,
        timer: &'a dyn KernelTimer,
    ) -> Self {
        Self {
            links: ListLinks::new(),
            timestamp,
            queue,
            event: ClockEvent::FireTimer(timer),
        }
    }

    /// The tick count at which this node is due.
    #[inline]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Whether the node is currently scheduled.
    pub fn is_linked(&self) -> bool {
        self.links.is_linked()
    }

    /// Unlink from the owning queue, then perform the event.
    ///
    /// Called only while this node is the queue head. Removal comes first
    /// so the event may re-enter the queue, as a periodic timer re-arming
    /// itself does; the re-armed due time is in the future, so the drain
    /// loop does not revisit it.
    fn fire(&self) {
        // The queue pointer was taken from a live reference at construction
        // and the membership contract keeps the queue in place while any of
        // its nodes exist.
        unsafe { (*self.queue).remove(self) };

        match self.event {
            ClockEvent::ResumeThread(thread) => {
                if thread.sched_state() != ThreadState::Destroyed {
                    thread.resume();
                }
            }
            ClockEvent::FireTimer(timer) => timer.interrupt_service_routine(),
        }
    }

    #[cfg(test)]
    pub(crate) fn links(&self) -> &ListLinks {
        &self.links
    }
}

/// Recover a node from its embedded links.
///
/// # Safety
///
/// `links` must be the `links` field of a live `ClockNode`.
unsafe fn node_from_links<'a>(links: *const ListLinks) -> &'a ClockNode<'a> {
    // `links` is the first field of a #[repr(C)] ClockNode.
    unsafe { &*links.cast::<ClockNode<'a>>() }
}

/// Timed events in ascending due order; earliest at the head.
///
/// A kernel owns exactly one, inside its clock object, and drains it once
/// per tick. Arrivals with equal timestamps queue behind the existing
/// entries and therefore fire in arrival order.
#[derive(Debug)]
pub struct ClockQueue {
    list: DoubleList,
}

impl ClockQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            list: DoubleList::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// The earliest due instant, `None` when nothing is scheduled.
    pub fn next_due(&self) -> Option<Timestamp> {
        self.list
            .head()
            .map(|head| unsafe { node_from_links(head.as_ptr()) }.timestamp)
    }

    /// Schedule `node` at its due timestamp.
    ///
    /// The node lands at the end of the list, at the beginning, or in the
    /// middle after a partial backward traversal; equal timestamps insert
    /// behind the entries already present.
    ///
    /// # Safety
    ///
    /// `node` must have been constructed against this queue, must be
    /// unlinked, and must not move or be dropped while linked. When the
    /// queue is shared with interrupt context, the caller runs this inside
    /// a critical section.
    pub unsafe fn add(&self, node: &ClockNode<'_>) {
        debug_assert!(!node.is_linked());
        debug_assert!(core::ptr::eq(node.queue, self));

        let Some(head) = self.list.head() else {
            self.list.link_first(&node.links);
            return;
        };

        let timestamp = node.timestamp;

        let head = unsafe { node_from_links(head.as_ptr()) };
        // The current tail, a latest-due node.
        let mut after = unsafe { node_from_links(head.links.prev_ptr()) };

        if timestamp >= after.timestamp {
            // New tail. Ties land here, behind the entries already due then.
        } else if timestamp < head.timestamp {
            // New earliest node: splice before the old head and retarget.
            self.list.set_head(&node.links);
        } else {
            // Walk backward from the tail. Terminates: the head's timestamp
            // is already known to be <= this one.
            while timestamp < after.timestamp {
                after = unsafe { node_from_links(after.links.prev_ptr()) };
            }
        }

        unsafe { self.list.link_after(&node.links, &after.links) };
    }

    /// Unlink `node`; a no-op if it is not scheduled.
    ///
    /// This is the cancellation path for timeouts that were beaten by their
    /// event and for stopped timers; racing it against the node's own
    /// firing is safe in either order.
    ///
    /// # Safety
    ///
    /// If linked, `node` must be linked on this queue. Same atomicity rules
    /// as [`ClockQueue::add`].
    pub unsafe fn remove(&self, node: &ClockNode<'_>) {
        unsafe { self.list.remove(&node.links) };
    }

    /// Fire every node due at or before `now`, earliest first.
    ///
    /// Several nodes may share a due time, so the drain keeps going until
    /// the head is in the future or the queue is empty. Each fired node
    /// removes itself before acting, so the head advances between rounds
    /// even when an action schedules new nodes.
    pub fn check_timestamp(&self, now: Timestamp) {
        while let Some(head) = self.list.head() {
            let node = unsafe { node_from_links(head.as_ptr()) };
            if node.timestamp > now {
                break;
            }
            node.fire();
        }
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        self.list.assert_consistent();
    }

    /// Head-to-tail due times, for ordering assertions.
    #[cfg(test)]
    pub(crate) fn collect_timestamps(&self) -> std::vec::Vec<Timestamp> {
        let mut out = std::vec::Vec::new();
        let Some(head) = self.list.head() else {
            return out;
        };
        let mut cursor = head.as_ptr().cast_const();
        for _ in 0..self.list.len() {
            let node = unsafe { node_from_links(cursor) };
            out.push(node.timestamp);
            cursor = node.links.next_ptr();
        }
        out
    }
}

// Shared between thread and interrupt context on a single processor;
// exclusive access is established by masking interrupts, not by a lock.
unsafe impl Send for ClockQueue {}
unsafe impl Sync for ClockQueue {}
