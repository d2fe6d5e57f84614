use core::cell::UnsafeCell;

/// Slot for a peripheral that main hands over to an interrupt handler.
///
/// Main fills it once, before the interrupt using it gets enabled. From then on only that
/// interrupt touches it, and interrupts do not nest on the AVR core, so there is never more than
/// one live reference. An interrupt that fires before the slot is filled finds it empty.
pub struct InterruptCell<T>(UnsafeCell<Option<T>>);

// Register blocks are not `Sync`; exclusive access comes from the hand over described above.
unsafe impl<T> Sync for InterruptCell<T> {}

impl<T> InterruptCell<T> {
    pub const fn empty() -> Self {
        Self(UnsafeCell::new(None))
    }

    /// Must run before the owning interrupt is enabled.
    pub fn fill(&self, inner: T) {
        unsafe { *self.0.get() = Some(inner) };
    }

    /// Only to be called from the owning interrupt.
    #[allow(clippy::mut_from_ref)]
    pub fn get_mut(&self) -> Option<&mut T> {
        unsafe { (*self.0.get()).as_mut() }
    }
}
