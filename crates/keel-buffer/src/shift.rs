//! Gap opening and closing over raw slots.
//!
//! These routines relocate runs of live elements inside one allocation. They
//! run no user code (moves are bitwise), so they cannot unwind half way.
//!
//! Overlap direction decides iteration order. Opening a gap moves elements
//! to higher indices, so it walks from the top down: every slot is read
//! before anything is written over it. Closing a gap moves elements to lower
//! indices and walks from the bottom up for the same reason.

#![allow(unsafe_code)]

use std::ptr;

/// Open a gap of `amount` slots at `start` in a run of `old_size` live slots.
///
/// Afterwards `[start + amount, old_size + amount)` holds the elements that
/// were at `[start, old_size)`, and `[start, start + amount)` is
/// uninitialized: either moved-out or never constructed.
///
/// # Safety
///
/// `base` must be valid for `old_size + amount` slots, the first `old_size`
/// of which are live; `start <= old_size`.
pub(crate) unsafe fn open_gap<T>(base: *mut T, old_size: usize, start: usize, amount: usize) {
    debug_assert!(start <= old_size);
    if amount == 0 || start == old_size {
        return;
    }
    let top = old_size + amount;
    let first_dest = start + amount;

    // Destinations at or past the old tail are fresh, never-constructed slots.
    let fresh_floor = old_size.max(first_dest);
    let mut index = top;
    while index > fresh_floor {
        index -= 1;
        // SAFETY: index - amount >= start and < old_size, so the source is live
        // and has not been moved yet (we walk downward).
        unsafe { ptr::write(base.add(index), ptr::read(base.add(index - amount))) };
    }

    // Destinations inside the old tail were vacated by the moves above: slot
    // `index` was the source of `index + amount`, which is already done.
    while index > first_dest {
        index -= 1;
        // SAFETY: as above; the destination holds a moved-out value, so
        // writing over it must not drop it.
        unsafe { ptr::write(base.add(index), ptr::read(base.add(index - amount))) };
    }
}

/// Close the gap `[from, to)` in a run of `len` slots.
///
/// The gap's elements must already be destroyed (or moved out). Afterwards
/// the first `len - (to - from)` slots are live and the rest uninitialized.
///
/// # Safety
///
/// `base` must be valid for `len` slots; `[0, from)` and `[to, len)` are
/// live, `[from, to)` is not; `from <= to <= len`.
pub(crate) unsafe fn close_gap<T>(base: *mut T, len: usize, from: usize, to: usize) {
    debug_assert!(from <= to && to <= len);
    let amount = to - from;
    if amount == 0 {
        return;
    }
    for index in from..len - amount {
        // SAFETY: source index + amount is live and unread (we walk upward);
        // the destination was destroyed or already moved out.
        unsafe { ptr::write(base.add(index), ptr::read(base.add(index + amount))) };
    }
}

/// Remove and return slot 0 of a run of `len` live slots, shifting the rest
/// down by one. O(len).
///
/// # Safety
///
/// `base` must point to `len >= 1` live slots. Afterwards the first
/// `len - 1` are live.
pub(crate) unsafe fn shift_left_one<T>(base: *mut T, len: usize) -> T {
    debug_assert!(len >= 1);
    // SAFETY: slot 0 is live; it becomes the gap closed below.
    unsafe {
        let first = ptr::read(base);
        close_gap(base, len, 0, 1);
        first
    }
}
