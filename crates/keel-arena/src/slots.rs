//! The owning slot region used by growable containers.
//!
//! [`RawSlots`] owns one allocation of `capacity` element slots. It knows
//! nothing about which slots are live: the container layered on top tracks
//! that and is responsible for dropping live elements before the region is
//! released or relocated past them.

#![allow(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use keel_core::Generation;

use crate::{lifetime, raw};

/// An exclusively owned region of uninitialized `T` slots.
///
/// Dropping a `RawSlots` frees the memory without dropping any element.
pub struct RawSlots<T> {
    ptr: NonNull<T>,
    capacity: usize,
    generation: Generation,
    _marker: PhantomData<T>,
}

// SAFETY: RawSlots owns its allocation exclusively, like `Box<[T]>`.
unsafe impl<T: Send> Send for RawSlots<T> {}
// SAFETY: shared access only hands out `*const T`.
unsafe impl<T: Sync> Sync for RawSlots<T> {}

impl<T> RawSlots<T> {
    /// An empty region. Does not allocate.
    pub const fn new() -> Self {
        Self {
            ptr: NonNull::dangling(),
            capacity: 0,
            generation: Generation(0),
            _marker: PhantomData,
        }
    }

    /// A region with exactly `capacity` slots.
    #[track_caller]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ptr: raw::allocate(capacity),
            capacity,
            generation: Generation(0),
            _marker: PhantomData,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Storage generation. Advances on every [`relocate`](Self::relocate).
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Pointer to slot 0.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Mutable pointer to slot 0.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Whether `[ptr, ptr + len)` intersects this region's slots.
    ///
    /// Empty ranges and zero-sized types never overlap anything.
    pub fn overlaps(&self, ptr: *const T, len: usize) -> bool {
        let elem = std::mem::size_of::<T>();
        if len == 0 || elem == 0 || self.capacity == 0 {
            return false;
        }
        let own_start = self.ptr.as_ptr() as usize;
        let own_end = own_start + self.capacity * elem;
        let start = ptr as usize;
        let end = start.saturating_add(len.saturating_mul(elem));
        start < own_end && own_start < end
    }

    /// Move the first `live` slots into a fresh allocation of `new_capacity`
    /// slots and release the old one.
    ///
    /// Every pointer previously derived from this region is invalidated and
    /// the generation advances.
    ///
    /// # Safety
    ///
    /// The first `live` slots must be live, `live <= new_capacity`, and no
    /// slot at or beyond `live` may hold a live value (it would be leaked).
    #[track_caller]
    pub unsafe fn relocate(&mut self, live: usize, new_capacity: usize) {
        log::trace!(
            "keel: relocate {} live of {} slots -> {} slots (generation {})",
            live,
            self.capacity,
            new_capacity,
            self.generation.next()
        );
        // SAFETY: forwarded from the caller; ptr/capacity describe our allocation.
        self.ptr = unsafe { lifetime::relocate_range(self.ptr, live, self.capacity, new_capacity) };
        self.capacity = new_capacity;
        self.generation = self.generation.next();
    }
}

impl<T> Default for RawSlots<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for RawSlots<T> {
    fn drop(&mut self) {
        // SAFETY: ptr was obtained from raw::allocate(capacity) (or is the
        // dangling pointer of an empty region, which release ignores).
        unsafe { raw::release(self.ptr, self.capacity) };
    }
}

impl<T> fmt::Debug for RawSlots<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawSlots")
            .field("capacity", &self.capacity)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_region_is_empty() {
        let slots = RawSlots::<u32>::new();
        assert_eq!(slots.capacity(), 0);
        assert_eq!(slots.generation(), Generation(0));
    }

    #[test]
    fn relocate_moves_prefix_and_bumps_generation() {
        let mut slots = RawSlots::<u32>::with_capacity(2);
        unsafe {
            slots.as_mut_ptr().write(7);
            slots.as_mut_ptr().add(1).write(9);
            slots.relocate(2, 10);
            assert_eq!(*slots.as_ptr(), 7);
            assert_eq!(*slots.as_ptr().add(1), 9);
        }
        assert_eq!(slots.capacity(), 10);
        assert_eq!(slots.generation(), Generation(1));
    }

    #[test]
    fn overlap_detects_own_storage() {
        let slots = RawSlots::<u64>::with_capacity(8);
        let base = slots.as_ptr();
        assert!(slots.overlaps(base, 1));
        assert!(slots.overlaps(unsafe { base.add(7) }, 4));
        assert!(!slots.overlaps(unsafe { base.add(8) }, 4));
        assert!(!slots.overlaps(base, 0));
    }

    #[test]
    fn overlap_rejects_foreign_storage() {
        let slots = RawSlots::<u64>::with_capacity(8);
        let other = [1u64, 2, 3];
        assert!(!slots.overlaps(other.as_ptr(), other.len()));
    }

    #[test]
    fn zero_sized_elements_never_overlap() {
        let slots = RawSlots::<()>::with_capacity(8);
        assert!(!slots.overlaps(slots.as_ptr(), 8));
    }
}
