//! Interrupt masking and the scoped critical section.
//!
//! Masking interrupts is the only synchronization mechanism the scheduling
//! lists rely on: the target is a single processor, so a masked section is
//! exclusive against both threads and interrupt handlers. Sections nest; the
//! prior mask state is captured on entry and restored on every exit path.
//!
//! On aarch64 this drives the DAIF IRQ mask directly. On every other target
//! a mock keeps the mask depth and a running count of entered sections, so
//! hosted tests can check that the hot paths really ran masked.

use core::marker::PhantomData;

#[cfg(target_arch = "aarch64")]
mod backend {
    use core::arch::asm;

    pub(super) fn acquire() -> bool {
        let daif: u64;
        unsafe {
            asm!(
                "mrs {daif}, daif",
                daif = out(reg) daif,
                options(nostack, readonly)
            );
        }
        // IRQ bit (bit 7) is clear when interrupts are enabled.
        let was_enabled = (daif & 0x80) == 0;
        unsafe {
            asm!(
                "msr daifset, #2", // Set IRQ mask (bit 1 of DAIF)
                options(nomem, nostack)
            );
        }
        was_enabled
    }

    pub(super) fn release(was_enabled: bool) {
        if was_enabled {
            unsafe {
                asm!(
                    "msr daifclr, #2", // Clear IRQ mask (bit 1 of DAIF)
                    options(nomem, nostack)
                );
            }
        }
    }

    pub(super) fn is_enabled() -> bool {
        let daif: u64;
        unsafe {
            asm!(
                "mrs {daif}, daif",
                daif = out(reg) daif,
                options(nostack, readonly)
            );
        }
        (daif & 0x80) == 0
    }
}

#[cfg(not(target_arch = "aarch64"))]
mod backend {
    use portable_atomic::{AtomicU32, AtomicU64, Ordering};

    static MASK_DEPTH: AtomicU32 = AtomicU32::new(0);
    static SECTIONS_ENTERED: AtomicU64 = AtomicU64::new(0);

    pub(super) fn acquire() -> bool {
        let depth = MASK_DEPTH.fetch_add(1, Ordering::AcqRel);
        SECTIONS_ENTERED.fetch_add(1, Ordering::AcqRel);
        depth == 0
    }

    pub(super) fn release(was_enabled: bool) {
        let prev = MASK_DEPTH.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "unbalanced critical section release");
        let _ = was_enabled;
    }

    pub(super) fn is_enabled() -> bool {
        MASK_DEPTH.load(Ordering::Acquire) == 0
    }

    pub(super) fn sections_entered() -> u64 {
        SECTIONS_ENTERED.load(Ordering::Acquire)
    }
}

/// Whether interrupts are currently deliverable.
pub fn interrupts_enabled() -> bool {
    backend::is_enabled()
}

/// Total critical sections entered so far.
///
/// Host-mock bookkeeping used by the test suite to check that detach paths
/// entered a section; not available on hardware targets.
#[cfg(not(target_arch = "aarch64"))]
pub fn sections_entered() -> u64 {
    backend::sections_entered()
}

/// Masks interrupts for the enclosing lexical scope.
///
/// The prior mask state is captured by [`CriticalSection::enter`] and
/// restored when the value is dropped, including on early returns, so
/// sections nest and unwind correctly.
pub struct CriticalSection {
    was_enabled: bool,
    // The mask state belongs to the CPU the section was entered on.
    _not_send: PhantomData<*const ()>,
}

impl CriticalSection {
    /// Mask interrupts, remembering whether they were enabled before.
    pub fn enter() -> Self {
        Self {
            was_enabled: backend::acquire(),
            _not_send: PhantomData,
        }
    }
}

impl Drop for CriticalSection {
    fn drop(&mut self) {
        backend::release(self.was_enabled);
    }
}
