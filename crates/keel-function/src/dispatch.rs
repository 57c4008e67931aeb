//! Per-type dispatcher records.
//!
//! Storing a value of type `F` instantiates `Dispatcher::of::<F>`, which
//! points at an operation table built from monomorphized functions for that
//! exact type. The table is a promoted constant: there is no per-instance
//! allocation and the record itself is one pointer wide.

#![allow(unsafe_code)]

use std::any;
use std::mem;

use crate::signature::Invocable;
use crate::storage::{Locality, Storage};

/// The operations a stored value supports.
pub(crate) struct Ops<Args, R> {
    invoke: unsafe fn(&mut Storage, Locality, Args) -> R,
    clone: unsafe fn(&Storage) -> Storage,
    destroy: unsafe fn(&mut Storage, Locality),
    type_name: fn() -> &'static str,
}

/// Handle to the operations of one stored type.
pub(crate) struct Dispatcher<Args: 'static, R: 'static> {
    ops: &'static Ops<Args, R>,
}

const _: () = assert!(mem::size_of::<Dispatcher<(), ()>>() == mem::size_of::<usize>());

impl<Args: 'static, R: 'static> Dispatcher<Args, R> {
    /// The dispatcher for values of type `F`.
    pub(crate) fn of<F>() -> Self
    where
        F: Invocable<Args, R> + Clone + 'static,
    {
        Self {
            ops: &Ops {
                invoke: invoke::<F, Args, R>,
                clone: clone::<F>,
                destroy: destroy::<F>,
                type_name: any::type_name::<F>,
            },
        }
    }

    /// Call the stored value.
    ///
    /// # Safety
    ///
    /// `storage` must hold a live value of this dispatcher's type at
    /// `locality`.
    #[inline]
    pub(crate) unsafe fn invoke(self, storage: &mut Storage, locality: Locality, args: Args) -> R {
        // SAFETY: forwarded from the caller.
        unsafe { (self.ops.invoke)(storage, locality, args) }
    }

    /// Clone the stored value into a fresh slot at the same locality.
    ///
    /// # Safety
    ///
    /// As for [`invoke`](Self::invoke).
    pub(crate) unsafe fn clone_value(self, storage: &Storage) -> Storage {
        // SAFETY: forwarded from the caller.
        unsafe { (self.ops.clone)(storage) }
    }

    /// Drop the stored value and release its heap block, if any.
    ///
    /// # Safety
    ///
    /// As for [`invoke`](Self::invoke). The value is dead afterwards.
    pub(crate) unsafe fn destroy(self, storage: &mut Storage, locality: Locality) {
        // SAFETY: forwarded from the caller.
        unsafe { (self.ops.destroy)(storage, locality) }
    }

    /// Name of the stored type, for diagnostics.
    pub(crate) fn type_name(self) -> &'static str {
        (self.ops.type_name)()
    }
}

impl<Args: 'static, R: 'static> Clone for Dispatcher<Args, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Args: 'static, R: 'static> Copy for Dispatcher<Args, R> {}

unsafe fn invoke<F, Args, R>(storage: &mut Storage, locality: Locality, args: Args) -> R
where
    F: Invocable<Args, R>,
{
    // SAFETY: the dispatcher for F is only paired with slots holding an F.
    let value = unsafe { &mut *storage.value_mut_ptr::<F>(locality) };
    value.invoke(args)
}

unsafe fn clone<F: Clone>(storage: &Storage) -> Storage {
    // SAFETY: as in invoke; F's locality is a function of its type.
    let value = unsafe { &*storage.value_ptr::<F>(Locality::of::<F>()) };
    Storage::store(value.clone())
}

unsafe fn destroy<F>(storage: &mut Storage, locality: Locality) {
    // SAFETY: as in invoke.
    unsafe { storage.drop_value::<F>(locality) }
}
