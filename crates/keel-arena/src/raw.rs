//! Raw, typed allocation.
//!
//! Allocation failure is unrecoverable: it is routed to
//! [`std::alloc::handle_alloc_error`] and never retried. Zero-byte requests
//! (zero count or zero-sized `T`) never touch the allocator and yield a
//! dangling, well-aligned pointer.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use keel_core::contract::violation;

use crate::error::ArenaError;

/// Layout of `count` contiguous `T`s.
pub fn layout_for<T>(count: usize) -> Result<Layout, ArenaError> {
    Layout::array::<T>(count).map_err(|_| ArenaError::CapacityOverflow {
        requested: count,
        element_size: std::mem::size_of::<T>(),
    })
}

/// Allocate uninitialized storage for `count` elements of `T`.
///
/// # Panics
///
/// Reports a capacity-overflow contract violation if the byte size does not
/// fit in `isize`. Aborts through `handle_alloc_error` if the allocator fails.
#[track_caller]
pub fn allocate<T>(count: usize) -> NonNull<T> {
    let layout = match layout_for::<T>(count) {
        Ok(layout) => layout,
        Err(e) => violation(e.into()),
    };
    if layout.size() == 0 {
        return NonNull::dangling();
    }
    // SAFETY: layout has a non-zero size.
    let ptr = unsafe { alloc::alloc(layout) }.cast::<T>();
    match NonNull::new(ptr) {
        Some(ptr) => ptr,
        None => alloc::handle_alloc_error(layout),
    }
}

/// Release storage obtained from [`allocate`].
///
/// Elements are not dropped.
///
/// # Safety
///
/// `ptr` must have been returned by `allocate::<T>(count)` with the same
/// `count`, and must not be released twice.
pub unsafe fn release<T>(ptr: NonNull<T>, count: usize) {
    let size = std::mem::size_of::<T>() * count;
    if size == 0 {
        return;
    }
    // SAFETY: the same layout was validated by `allocate` for this count.
    unsafe {
        let layout = Layout::from_size_align_unchecked(size, std::mem::align_of::<T>());
        alloc::dealloc(ptr.as_ptr().cast(), layout);
    }
}
