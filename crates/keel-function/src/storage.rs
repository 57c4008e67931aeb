//! The 16-byte storage slot and the inline-or-heap decision.

#![allow(unsafe_code)]

use std::fmt;
use std::mem::{self, MaybeUninit};
use std::ptr::{self, NonNull};

use keel_arena::raw;

/// Bytes available for a value stored inline.
pub const INLINE_BYTES: usize = 16;

/// Strictest alignment a value stored inline may require.
pub const INLINE_ALIGN: usize = 8;

/// Where a stored value lives. Decided once, from its type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Locality {
    /// Inside the container's own storage slot.
    Inline,
    /// In a heap block owned by the container.
    Heap,
}

impl Locality {
    /// Where a value of type `F` is stored: inline iff it fits in
    /// [`INLINE_BYTES`] with alignment at most [`INLINE_ALIGN`].
    pub const fn of<F>() -> Self {
        if mem::size_of::<F>() <= INLINE_BYTES && mem::align_of::<F>() <= INLINE_ALIGN {
            Self::Inline
        } else {
            Self::Heap
        }
    }
}

impl fmt::Display for Locality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => f.write_str("inline"),
            Self::Heap => f.write_str("heap"),
        }
    }
}

/// Raw bytes of an inline value, or the pointer to a heap block.
///
/// Holds no type information; the dispatcher that pairs with a slot knows
/// the stored type and which field is meaningful.
#[derive(Clone, Copy)]
#[repr(C, align(8))]
pub(crate) union Storage {
    heap: NonNull<u8>,
    inline: [MaybeUninit<u8>; INLINE_BYTES],
}

const _: () = assert!(mem::size_of::<Storage>() == INLINE_BYTES);
const _: () = assert!(mem::align_of::<Storage>() == INLINE_ALIGN);

impl Storage {
    /// Move `value` into a fresh slot at the locality its type dictates.
    pub(crate) fn store<F>(value: F) -> Self {
        match Locality::of::<F>() {
            Locality::Inline => {
                let mut slot = Storage {
                    inline: [MaybeUninit::uninit(); INLINE_BYTES],
                };
                // SAFETY: F fits in the slot's size and alignment (checked by
                // Locality::of), and every union field starts at offset 0.
                unsafe { ptr::from_mut(&mut slot).cast::<F>().write(value) };
                slot
            }
            Locality::Heap => {
                let block = raw::allocate::<F>(1);
                // SAFETY: block is fresh, aligned for F and sized for one value
                // (or dangling for a zero-sized F, which needs no memory).
                unsafe { block.as_ptr().write(value) };
                Storage {
                    heap: block.cast(),
                }
            }
        }
    }

    /// Pointer to the stored `F`.
    ///
    /// # Safety
    ///
    /// The slot must have been filled by [`store::<F>`](Self::store), so
    /// that `locality == Locality::of::<F>()`.
    pub(crate) unsafe fn value_ptr<F>(&self, locality: Locality) -> *const F {
        match locality {
            Locality::Inline => ptr::from_ref(self).cast(),
            // SAFETY: heap slots always hold the block pointer.
            Locality::Heap => unsafe { self.heap }.as_ptr().cast_const().cast(),
        }
    }

    /// Mutable pointer to the stored `F`.
    ///
    /// # Safety
    ///
    /// Same as [`value_ptr`](Self::value_ptr).
    pub(crate) unsafe fn value_mut_ptr<F>(&mut self, locality: Locality) -> *mut F {
        match locality {
            Locality::Inline => ptr::from_mut(self).cast(),
            // SAFETY: heap slots always hold the block pointer.
            Locality::Heap => unsafe { self.heap }.as_ptr().cast(),
        }
    }

    /// Drop the stored `F` and release its heap block, if any.
    ///
    /// # Safety
    ///
    /// Same as [`value_ptr`](Self::value_ptr); the value must be live and is
    /// dead afterwards.
    pub(crate) unsafe fn drop_value<F>(&mut self, locality: Locality) {
        // SAFETY: forwarded from the caller.
        unsafe {
            let value = self.value_mut_ptr::<F>(locality);
            ptr::drop_in_place(value);
            if locality == Locality::Heap {
                raw::release(NonNull::new_unchecked(value), 1);
            }
        }
    }
}
