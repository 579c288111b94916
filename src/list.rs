//! Intrusive circular doubly-linked list primitives.
//!
//! Every node participating in a list embeds a [`ListLinks`] cell; the list
//! itself is only a head pointer and a node count. Nothing here allocates:
//! lists are non-owning indexes over caller-owned nodes, which is what keeps
//! insertion and removal off the allocator and bounds worst-case latency on
//! the scheduling hot paths.
//!
//! Mutators take `&self`. On the single-processor targets this crate serves,
//! exclusive access is established by the caller masking interrupts around
//! the call, not by a lock.

use core::cell::Cell;
use core::ptr::{self, NonNull};

/// Forward/backward link pair embedded in every list node.
///
/// While linked, both pointers are non-null and the neighbours point back at
/// this cell, closing a circular ring. While unlinked, both pointers are
/// null; [`DoubleList::remove`] inspects `next` to stay idempotent.
pub struct ListLinks {
    prev: Cell<*const ListLinks>,
    next: Cell<*const ListLinks>,
}

impl ListLinks {
    /// Create an unlinked cell.
    pub const fn new() -> Self {
        Self {
            prev: Cell::new(ptr::null()),
            next: Cell::new(ptr::null()),
        }
    }

    /// Whether this cell is currently a member of a list.
    #[inline]
    pub fn is_linked(&self) -> bool {
        !self.next.get().is_null()
    }

    /// Raw successor pointer; null when unlinked.
    #[inline]
    pub fn next_ptr(&self) -> *const ListLinks {
        self.next.get()
    }

    /// Raw predecessor pointer; null when unlinked.
    #[inline]
    pub fn prev_ptr(&self) -> *const ListLinks {
        self.prev.get()
    }

    fn unlink(&self) {
        self.prev.set(ptr::null());
        self.next.set(ptr::null());
    }
}

impl Default for ListLinks {
    fn default() -> Self {
        Self::new()
    }
}

/// Generic circular doubly-linked list: a head pointer and a node count.
///
/// Invariants: `count == 0` iff the head is null; with one node the node
/// points at itself in both directions; with more, following `next` from the
/// head `count` times returns to the head, and likewise for `prev`.
#[derive(Debug)]
pub struct DoubleList {
    head: Cell<*const ListLinks>,
    count: Cell<usize>,
}

impl DoubleList {
    /// Create an empty list.
    pub const fn new() -> Self {
        Self {
            head: Cell::new(ptr::null()),
            count: Cell::new(0),
        }
    }

    /// Reset to the empty state.
    ///
    /// Only meaningful at construction time or after the last node has been
    /// removed; clearing a list that still links nodes would leave their
    /// neighbour pointers dangling into each other.
    pub fn clear(&self) {
        self.head.set(ptr::null());
        self.count.set(0);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count.get() == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count.get()
    }

    /// First node of the list, `None` when empty.
    #[inline]
    pub fn head(&self) -> Option<NonNull<ListLinks>> {
        NonNull::new(self.head.get().cast_mut())
    }

    /// Unlink `node`; a no-op if it is not currently a member of any list.
    ///
    /// On every path that found the node linked, both of its link pointers
    /// are nulled before returning, so a second `remove` does nothing and a
    /// destroyed node's links can never be chased.
    ///
    /// # Safety
    ///
    /// If `node` is linked, it must be linked on this list, and every node
    /// on the ring must still be alive.
    pub unsafe fn remove(&self, node: &ListLinks) {
        // Null links mean the node was never added or was already removed.
        if !node.is_linked() {
            return;
        }

        if self.count.get() == 1 {
            debug_assert!(ptr::eq(self.head.get(), node));
            self.clear();
        } else {
            if ptr::eq(self.head.get(), node) {
                // The head vanishes; its successor takes over.
                self.head.set(node.next.get());
            }

            // Neighbours point to each other, skipping the node.
            unsafe {
                (*node.prev.get()).next.set(node.next.get());
                (*node.next.get()).prev.set(node.prev.get());
            }

            self.count.set(self.count.get() - 1);
        }

        node.unlink();
    }

    /// Link `node` as the sole element of an empty list.
    ///
    /// The node points at itself in both directions, satisfying the circular
    /// ring invariant with a single member.
    pub(crate) fn link_first(&self, node: &ListLinks) {
        debug_assert!(self.is_empty());

        let p: *const ListLinks = node;
        node.prev.set(p);
        node.next.set(p);

        self.head.set(p);
        self.count.set(1);
    }

    /// Splice `node` into the ring directly after `after`.
    ///
    /// The new node takes its neighbour pointers first and only then is
    /// adopted by the neighbours, so the ring is never observed half-spliced.
    ///
    /// # Safety
    ///
    /// `after` must be linked on this list and `node` must be unlinked.
    pub(crate) unsafe fn link_after(&self, node: &ListLinks, after: &ListLinks) {
        debug_assert!(!node.is_linked());
        debug_assert!(after.is_linked());

        node.prev.set(after);
        node.next.set(after.next.get());

        unsafe {
            (*after.next.get()).prev.set(node);
        }
        after.next.set(node);

        self.count.set(self.count.get() + 1);
    }

    /// Retarget the head pointer; used when an insert lands in front of
    /// the current head.
    pub(crate) fn set_head(&self, node: &ListLinks) {
        self.head.set(node);
    }

    /// Walk the ring in both directions and check every linkage invariant.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let head = self.head.get();
        if head.is_null() {
            assert_eq!(self.count.get(), 0, "empty list with non-zero count");
            return;
        }
        assert!(self.count.get() > 0, "non-empty list with zero count");

        unsafe {
            // Forward walk returns to the head in exactly `count` steps and
            // every node agrees with its neighbours.
            let mut cursor = head;
            for _ in 0..self.count.get() {
                let next = (*cursor).next.get();
                let prev = (*cursor).prev.get();
                assert!(!next.is_null() && !prev.is_null());
                assert!(ptr::eq((*next).prev.get(), cursor));
                assert!(ptr::eq((*prev).next.get(), cursor));
                cursor = next;
            }
            assert!(ptr::eq(cursor, head), "forward walk did not close the ring");

            let mut cursor = head;
            for _ in 0..self.count.get() {
                cursor = (*cursor).prev.get();
            }
            assert!(ptr::eq(cursor, head), "backward walk did not close the ring");
        }
    }
}

impl Drop for DoubleList {
    fn drop(&mut self) {
        // Tearing down a list that still indexes live nodes is a bug in the
        // owner: the nodes would keep pointers into freed neighbours.
        debug_assert!(self.head.get().is_null());
        debug_assert_eq!(self.count.get(), 0);
    }
}
