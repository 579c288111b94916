//! Priority-ordered list of threads blocked on a synchronization primitive.
//!
//! There are two ways to organize a wait list: keep it ordered by priority
//! so the top waiter sits at the head, or preserve arrival order and scan
//! the whole list on every wakeup. Typical wait lists hold one entry, where
//! the strategies are indistinguishable; when a list does grow, keeping it
//! ordered makes the wakeup path a single head access, which is the path
//! whose latency matters. This list is kept ordered.

use crate::irq::CriticalSection;
use crate::list::{DoubleList, ListLinks};
use crate::thread::{SchedThread, ThreadState};

/// A blocked thread parked on a [`WaitQueue`].
///
/// Owned by whichever blocking primitive instantiates it, typically on the
/// blocked thread's own stack frame inside the wait call. Created on wait
/// entry, dropped on wait return; it must be off the queue by then, which
/// the idempotent [`WaitQueue::remove`] makes cheap to guarantee on both
/// the woken and the timed-out paths.
#[repr(C)]
pub struct WaitNode<'t> {
    links: ListLinks,
    thread: &'t dyn SchedThread,
}

impl<'t> WaitNode<'t> {
    /// Create an unlinked node referencing `thread`.
    pub const fn new(thread: &'t dyn SchedThread) -> Self {
        Self {
            links: ListLinks::new(),
            thread,
        }
    }

    /// The thread this node parks.
    pub fn thread(&self) -> &'t dyn SchedThread {
        self.thread
    }

    /// Whether the node is currently on a queue.
    pub fn is_linked(&self) -> bool {
        self.links.is_linked()
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
/// `links` must be the `links` field of a live `WaitNode`. The returned
/// lifetime is conjured; callers use the reference only while the queue's
/// membership contract keeps the node alive.
unsafe fn node_from_links<'a>(links: *const ListLinks) -> &'a WaitNode<'a> {
    // `links` is the first field of a #[repr(C)] WaitNode.
    unsafe { &*links.cast::<WaitNode<'a>>() }
}

/// Threads blocked awaiting a resource, highest priority first.
///
/// Head-to-tail traversal yields non-increasing priorities; arrivals of
/// equal priority keep their insertion order, queued behind the existing
/// band. Mutexes, condition variables, semaphores and message queues each
/// embed one of these and park waiters on it.
pub struct WaitQueue {
    list: DoubleList,
}

impl WaitQueue {
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

    /// Park `node` according to its thread's current priority.
    ///
    /// The node lands at the end of the list, at the beginning, or in the
    /// middle after a partial backward traversal. Equal priorities insert
    /// behind the existing band, so same-priority waiters are woken in
    /// arrival order.
    ///
    /// # Safety
    ///
    /// `node` must be unlinked, must not move or be dropped while linked,
    /// and its thread must outlive the membership. When the queue is shared
    /// with interrupt context, the caller runs this inside a critical
    /// section.
    pub unsafe fn add(&self, node: &WaitNode<'_>) {
        debug_assert!(!node.is_linked());

        let Some(head) = self.list.head() else {
            self.list.link_first(&node.links);
            return;
        };

        let prio = node.thread.sched_priority();

        let head = unsafe { node_from_links(head.as_ptr()) };
        // The current tail, a lowest-priority waiter.
        let mut after = unsafe { node_from_links(head.links.prev_ptr()) };

        if prio <= after.thread.sched_priority() {
            // New tail. Ties land here, behind their band.
        } else if prio > head.thread.sched_priority() {
            // New top waiter: the splice after the tail puts the node just
            // before the old head on the ring; it only remains to retarget
            // the head pointer.
            self.list.set_head(&node.links);
        } else {
            // Walk backward from the tail. Terminates: the head's priority
            // is already known to be >= prio.
            while prio > after.thread.sched_priority() {
                after = unsafe { node_from_links(after.links.prev_ptr()) };
            }
        }

        unsafe { self.list.link_after(&node.links, &after.links) };
    }

    /// Unlink `node`; a no-op if it is not parked here.
    ///
    /// Idempotence is what lets the "event woke me" and "I timed out" paths
    /// race without coordination: whichever runs second finds the links
    /// already nulled and backs off.
    ///
    /// # Safety
    ///
    /// If linked, `node` must be linked on this queue. Same atomicity rules
    /// as [`WaitQueue::add`].
    pub unsafe fn remove(&self, node: &WaitNode<'_>) {
        unsafe { self.list.remove(&node.links) };
    }

    /// Detach the highest-priority waiter and make it runnable.
    ///
    /// The detach runs with interrupts masked so a concurrent `add` or
    /// `remove` cannot observe a torn ring; the wake itself runs with
    /// interrupts restored. A thread found in the destroyed state is
    /// dropped silently: losing the race against thread teardown is
    /// tolerated, not reported.
    pub fn resume_one(&self) {
        let thread = {
            let _ics = CriticalSection::enter();

            let Some(head) = self.list.head() else {
                return;
            };
            let node = unsafe { node_from_links(head.as_ptr()) };
            let thread = node.thread;
            // Detach before waking, so a subsequent wakeup addresses the
            // next waiter rather than this one twice.
            unsafe { self.list.remove(&node.links) };
            thread
        };

        if thread.sched_state() != ThreadState::Destroyed {
            thread.resume();
        }
    }

    /// Wake every waiter, highest priority first.
    ///
    /// Each round re-enters the critical section, so adders may interleave;
    /// the loop ends when the queue is observed empty on entry.
    pub fn resume_all(&self) {
        while !self.is_empty() {
            self.resume_one();
        }
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        self.list.assert_consistent();
    }

    /// Head-to-tail priorities, for ordering assertions.
    #[cfg(test)]
    pub(crate) fn collect_priorities(&self) -> std::vec::Vec<crate::thread::Priority> {
        self.collect(|node| node.thread.sched_priority())
    }

    /// Head-to-tail thread identities, for tie-order assertions.
    #[cfg(test)]
    pub(crate) fn collect_thread_ptrs(&self) -> std::vec::Vec<*const ()> {
        self.collect(|node| node.thread as *const dyn SchedThread as *const ())
    }

    #[cfg(test)]
    fn collect<T>(&self, f: impl Fn(&WaitNode<'_>) -> T) -> std::vec::Vec<T> {
        let mut out = std::vec::Vec::new();
        let Some(head) = self.list.head() else {
            return out;
        };
        let mut cursor = head.as_ptr().cast_const();
        for _ in 0..self.list.len() {
            let node = unsafe { node_from_links(cursor) };
            out.push(f(node));
            cursor = node.links.next_ptr();
        }
        out
    }
}

// A queue is shared between thread and interrupt context on a single
// processor; exclusive access is established by masking interrupts, not by
// a lock, so the usual Send/Sync inference does not apply.
unsafe impl Send for WaitQueue {}
unsafe impl Sync for WaitQueue {}
