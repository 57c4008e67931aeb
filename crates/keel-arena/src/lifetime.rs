//! Construction and destruction of element ranges in raw storage.
//!
//! These functions place values into, or drop values out of, slots obtained
//! from [`raw::allocate`](crate::raw::allocate). They do not track which
//! slots are live; that bookkeeping belongs to the owning container.
//!
//! Construction is unwind-safe: if producing the k-th value panics, the
//! `k` values already written are dropped before the panic continues, so
//! the range is left entirely uninitialized.

#![allow(unsafe_code)]

use std::mem;
use std::ptr::{self, NonNull};

use crate::raw;

/// Drops the constructed prefix of a range if construction unwinds.
struct PartialRange<T> {
    start: *mut T,
    done: usize,
}

impl<T> Drop for PartialRange<T> {
    fn drop(&mut self) {
        // SAFETY: exactly `done` slots from `start` were written.
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.start, self.done)) };
    }
}

/// Value-initialize `count` elements at `ptr`.
///
/// # Safety
///
/// `ptr` must be valid for `count` writes and the slots must not hold live
/// values (they would be overwritten without being dropped).
pub unsafe fn construct_range<T: Default>(ptr: *mut T, count: usize) {
    // SAFETY: forwarded from the caller.
    unsafe { construct_range_with(ptr, count, |_| T::default()) }
}

/// Construct `count` elements at `ptr`, the i-th from `make(i)`.
///
/// # Safety
///
/// Same as [`construct_range`].
pub unsafe fn construct_range_with<T, F>(ptr: *mut T, count: usize, mut make: F)
where
    F: FnMut(usize) -> T,
{
    let mut guard = PartialRange {
        start: ptr,
        done: 0,
    };
    while guard.done < count {
        let value = make(guard.done);
        // SAFETY: guard.done < count, so the slot is in range and uninitialized.
        unsafe { ptr.add(guard.done).write(value) };
        guard.done += 1;
    }
    mem::forget(guard);
}

/// Clone `count` live elements from `src` into uninitialized slots at `dst`.
///
/// # Safety
///
/// `src` must point to `count` live values, `dst` must be valid for `count`
/// writes to slots that hold no live values, and the two ranges must not
/// overlap.
pub unsafe fn clone_range_into<T: Clone>(src: *const T, dst: *mut T, count: usize) {
    // SAFETY: forwarded from the caller.
    unsafe { construct_range_with(dst, count, |i| (*src.add(i)).clone()) }
}

/// Drop `count` live elements at `ptr`.
///
/// The slots are uninitialized afterwards.
///
/// # Safety
///
/// The `count` slots must hold live values. Calling this twice on the same
/// range drops every value twice.
pub unsafe fn destruct_range<T>(ptr: *mut T, count: usize) {
    if count == 0 || !mem::needs_drop::<T>() {
        return;
    }
    // SAFETY: forwarded from the caller.
    unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(ptr, count)) }
}

/// Move the first `live` elements of `old` into fresh storage of
/// `new_capacity` slots and release `old`. Returns the new storage.
///
/// Moves in Rust are bitwise, so relocation never runs user code and the
/// moved-from originals need no destruction.
///
/// # Safety
///
/// `old` must have been allocated with `old_capacity` slots, the first
/// `live` of which are live. `live <= new_capacity`. `old` is invalid after
/// the call.
pub unsafe fn relocate_range<T>(
    old: NonNull<T>,
    live: usize,
    old_capacity: usize,
    new_capacity: usize,
) -> NonNull<T> {
    debug_assert!(live <= old_capacity && live <= new_capacity);
    let new = raw::allocate::<T>(new_capacity);
    // SAFETY: distinct allocations (or dangling for zero bytes), both valid
    // for `live` elements.
    unsafe {
        ptr::copy_nonoverlapping(old.as_ptr(), new.as_ptr(), live);
        raw::release(old, old_capacity);
    }
    new
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_test_utils::{Tracked, Tracker};
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn construct_then_destruct_balances() {
        let tracker = Tracker::new();
        let ptr = raw::allocate::<Tracked>(5);
        unsafe {
            construct_range_with(ptr.as_ptr(), 5, |i| tracker.make(i as i64));
            assert_eq!(tracker.live(), 5);
            assert_eq!((*ptr.as_ptr().add(4)).value(), 4);
            destruct_range(ptr.as_ptr(), 5);
            raw::release(ptr, 5);
        }
        tracker.assert_balanced();
    }

    #[test]
    fn construct_range_value_initializes() {
        let ptr = raw::allocate::<u64>(8);
        unsafe {
            construct_range(ptr.as_ptr(), 8);
            let s = std::slice::from_raw_parts(ptr.as_ptr(), 8);
            assert!(s.iter().all(|&v| v == 0));
            raw::release(ptr, 8);
        }
    }

    #[test]
    fn panicking_constructor_drops_written_prefix() {
        let tracker = Tracker::new();
        let ptr = raw::allocate::<Tracked>(4);
        let result = catch_unwind(AssertUnwindSafe(|| unsafe {
            construct_range_with(ptr.as_ptr(), 4, |i| {
                if i == 2 {
                    panic!("boom");
                }
                tracker.make(i as i64)
            });
        }));
        assert!(result.is_err());
        assert_eq!(tracker.constructed(), 2);
        tracker.assert_balanced();
        unsafe { raw::release(ptr, 4) };
    }

    #[test]
    fn clone_range_copies_values() {
        let tracker = Tracker::new();
        let src: Vec<Tracked> = (0..3).map(|i| tracker.make(i)).collect();
        let dst = raw::allocate::<Tracked>(3);
        unsafe {
            clone_range_into(src.as_ptr(), dst.as_ptr(), 3);
            assert_eq!((*dst.as_ptr().add(2)).value(), 2);
            assert_eq!(tracker.cloned(), 3);
            destruct_range(dst.as_ptr(), 3);
            raw::release(dst, 3);
        }
        drop(src);
        tracker.assert_balanced();
    }

    #[test]
    fn relocate_preserves_live_prefix() {
        let tracker = Tracker::new();
        let old = raw::allocate::<Tracked>(2);
        unsafe {
            construct_range_with(old.as_ptr(), 2, |i| tracker.make(10 + i as i64));
            let new = relocate_range(old, 2, 2, 16);
            assert_eq!((*new.as_ptr()).value(), 10);
            assert_eq!((*new.as_ptr().add(1)).value(), 11);
            // Relocation is a move: nothing constructed, cloned or dropped.
            assert_eq!(tracker.constructed(), 2);
            assert_eq!(tracker.cloned(), 0);
            assert_eq!(tracker.dropped(), 0);
            destruct_range(new.as_ptr(), 2);
            raw::release(new, 16);
        }
        tracker.assert_balanced();
    }
}
