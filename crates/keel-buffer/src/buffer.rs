//! The growable owning buffer.
//!
//! Lifecycle, capacity management and element access live here; insertion,
//! erasure and append (the operations that shift elements) live in the
//! private `edit` module.

#![allow(unsafe_code)]

use std::fmt;
use std::ops::{Index, IndexMut};
use std::slice;

use keel_arena::lifetime::{clone_range_into, construct_range_with, destruct_range};
use keel_arena::{GrowthPolicy, RawSlots};
use keel_core::contract::{check_index, check_non_empty, violation};
use keel_core::{ContractViolation, Generation, OwnerId};

use crate::cursor::{Cursor, Position};
use crate::shift;
use crate::view::{View, ViewMut};

/// A contiguous, growable sequence that owns its elements.
///
/// Slots `[0, len)` hold live elements and `[len, capacity)` are
/// uninitialized. Growth relocates every live element into a new allocation
/// and advances the buffer's [`Generation`], which invalidates all positions
/// issued before it.
pub struct Buffer<T> {
    pub(crate) slots: RawSlots<T>,
    pub(crate) len: usize,
    owner: OwnerId,
    policy: GrowthPolicy,
}

impl<T> Buffer<T> {
    /// An empty buffer. Does not allocate.
    pub fn new() -> Self {
        Self::with_policy(GrowthPolicy::default())
    }

    /// An empty buffer with room for exactly `capacity` elements.
    #[track_caller]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buffer = Self::new();
        buffer.reserve(capacity);
        buffer
    }

    /// An empty buffer that grows according to `policy`.
    pub fn with_policy(policy: GrowthPolicy) -> Self {
        Self {
            slots: RawSlots::new(),
            len: 0,
            owner: OwnerId::next(),
            policy,
        }
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated slots.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Identity used to validate positions and cursors.
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Storage generation; advances on every relocation.
    pub fn generation(&self) -> Generation {
        self.slots.generation()
    }

    /// Growth policy used by amortized operations.
    pub fn policy(&self) -> GrowthPolicy {
        self.policy
    }

    /// Ensure `capacity >= new_capacity`. Never shrinks.
    #[track_caller]
    pub fn reserve(&mut self, new_capacity: usize) {
        self.reserve_with_headroom(new_capacity, 0);
    }

    /// Ensure `capacity >= new_capacity`; if storage must grow, grow to
    /// `new_capacity + headroom`.
    ///
    /// A no-op when the capacity already suffices, even if it is less than
    /// `new_capacity + headroom`.
    #[track_caller]
    pub fn reserve_with_headroom(&mut self, new_capacity: usize, headroom: usize) {
        if self.slots.capacity() >= new_capacity {
            return;
        }
        let target = match new_capacity.checked_add(headroom) {
            Some(target) => target,
            None => violation(ContractViolation::CapacityOverflow {
                requested: new_capacity,
                element_size: std::mem::size_of::<T>(),
            }),
        };
        // SAFETY: exactly the first `len` slots are live.
        unsafe { self.slots.relocate(self.len, target) };
    }

    /// Make room for `additional` more elements, applying the growth policy
    /// (or `headroom`, if larger) when storage must grow.
    #[track_caller]
    pub(crate) fn grow_for(&mut self, additional: usize, headroom: usize) {
        let needed = match self.len.checked_add(additional) {
            Some(needed) => needed,
            None => violation(ContractViolation::CapacityOverflow {
                requested: additional,
                element_size: std::mem::size_of::<T>(),
            }),
        };
        if needed > self.slots.capacity() {
            let headroom = headroom.max(self.policy.headroom_for(self.len));
            self.reserve_with_headroom(needed, headroom);
        }
    }

    /// Set `len` to `new_size`, value-initializing new elements or dropping
    /// the ones that fall off the end.
    #[track_caller]
    pub fn resize(&mut self, new_size: usize)
    where
        T: Default,
    {
        self.resize_with_headroom(new_size, 0);
    }

    /// [`resize`](Self::resize), reserving `headroom` extra slots if storage
    /// must grow.
    #[track_caller]
    pub fn resize_with_headroom(&mut self, new_size: usize, headroom: usize)
    where
        T: Default,
    {
        self.resize_inner(new_size, headroom, T::default);
    }

    /// Set `len` to `new_size`, filling new slots with values from `make`.
    #[track_caller]
    pub fn resize_with<F>(&mut self, new_size: usize, make: F)
    where
        F: FnMut() -> T,
    {
        self.resize_inner(new_size, 0, make);
    }

    #[track_caller]
    fn resize_inner<F>(&mut self, new_size: usize, headroom: usize, mut make: F)
    where
        F: FnMut() -> T,
    {
        if new_size <= self.len {
            self.truncate(new_size);
            return;
        }
        self.reserve_with_headroom(new_size, headroom);
        let added = new_size - self.len;
        // SAFETY: capacity >= new_size and [len, new_size) is uninitialized.
        // On unwind the constructed prefix is dropped and len is untouched.
        unsafe {
            construct_range_with(self.slots.as_mut_ptr().add(self.len), added, |_| make());
        }
        self.len = new_size;
    }

    /// Drop elements past `new_len`. No-op if `new_len >= len`.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len {
            return;
        }
        let tail = self.len - new_len;
        // Shrink first so a panicking destructor cannot cause a double drop.
        self.len = new_len;
        // SAFETY: [new_len, new_len + tail) were live and are no longer counted.
        unsafe { destruct_range(self.slots.as_mut_ptr().add(new_len), tail) };
    }

    /// Drop every element. Capacity is kept.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Append `value`. Amortized O(1).
    #[track_caller]
    pub fn push_back(&mut self, value: T) -> &mut T {
        self.emplace_back(|| value)
    }

    /// Append the value produced by `make`, constructed after any growth.
    #[track_caller]
    pub fn emplace_back<F>(&mut self, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        self.grow_for(1, 0);
        let value = make();
        let index = self.len;
        // SAFETY: capacity > len after grow_for; the slot is uninitialized.
        unsafe {
            let slot = self.slots.as_mut_ptr().add(index);
            slot.write(value);
            self.len += 1;
            &mut *slot
        }
    }

    /// Prepend `value`. O(len): every element shifts up by one.
    #[track_caller]
    pub fn push_front(&mut self, value: T) -> &mut T {
        self.emplace_front(|| value)
    }

    /// Prepend the value produced by `make`, constructed after any growth
    /// and before the shift.
    #[track_caller]
    pub fn emplace_front<F>(&mut self, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        self.grow_for(1, 0);
        let value = make();
        let base = self.slots.as_mut_ptr();
        // SAFETY: capacity > len; open_gap leaves slot 0 uninitialized.
        unsafe {
            shift::open_gap(base, self.len, 0, 1);
            base.write(value);
            self.len += 1;
            &mut *base
        }
    }

    /// Remove and return the last element. O(1).
    ///
    /// # Panics
    ///
    /// Reports `EmptyContainer` on an empty buffer.
    #[track_caller]
    pub fn pop_back(&mut self) -> T {
        check_non_empty(self.len, "pop_back");
        self.len -= 1;
        // SAFETY: the slot was live and is no longer counted.
        unsafe { self.slots.as_ptr().add(self.len).read() }
    }

    /// Remove and return the first element. O(len): every remaining element
    /// shifts down by one.
    ///
    /// # Panics
    ///
    /// Reports `EmptyContainer` on an empty buffer.
    #[track_caller]
    pub fn pop_front(&mut self) -> T {
        check_non_empty(self.len, "pop_front");
        // SAFETY: len >= 1 live slots.
        let first = unsafe { shift::shift_left_one(self.slots.as_mut_ptr(), self.len) };
        self.len -= 1;
        first
    }

    /// The live elements.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: [0, len) are live; the pointer is non-null and aligned.
        unsafe { slice::from_raw_parts(self.slots.as_ptr(), self.len) }
    }

    /// The live elements, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in as_slice, with exclusive access through &mut self.
        unsafe { slice::from_raw_parts_mut(self.slots.as_mut_ptr(), self.len) }
    }

    /// Read-only view bound to this buffer.
    pub fn view(&self) -> View<'_, T> {
        View::bound(self.as_slice(), self.owner, self.generation())
    }

    /// Read/write view bound to this buffer.
    pub fn view_mut(&mut self) -> ViewMut<'_, T> {
        let owner = self.owner;
        let generation = self.generation();
        ViewMut::bound(self.as_mut_slice(), owner, generation)
    }

    /// Element at `index`.
    ///
    /// # Panics
    ///
    /// Reports `IndexOutOfBounds` if `index >= len`.
    #[track_caller]
    pub fn at(&self, index: usize) -> &T {
        check_index(index, self.len);
        &self.as_slice()[index]
    }

    /// Mutable element at `index`.
    #[track_caller]
    pub fn at_mut(&mut self, index: usize) -> &mut T {
        check_index(index, self.len);
        &mut self.as_mut_slice()[index]
    }

    /// Element at `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// Element at `index` without the bounds check.
    ///
    /// # Safety
    ///
    /// `index < len`.
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(index < self.len);
        // SAFETY: forwarded from the caller.
        unsafe { &*self.slots.as_ptr().add(index) }
    }

    /// First element.
    #[track_caller]
    pub fn front(&self) -> &T {
        check_non_empty(self.len, "front");
        &self.as_slice()[0]
    }

    /// Last element.
    #[track_caller]
    pub fn back(&self) -> &T {
        check_non_empty(self.len, "back");
        &self.as_slice()[self.len - 1]
    }

    /// Cursor to the first element equal to `value`, or [`end`](Self::end).
    pub fn find(&self, value: &T) -> Cursor<'_, T>
    where
        T: PartialEq,
    {
        self.view().find(value)
    }

    /// Whether any element equals `value`.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.as_slice().contains(value)
    }

    /// Cursor at the first element.
    pub fn begin(&self) -> Cursor<'_, T> {
        self.view().begin()
    }

    /// Cursor at the one-past-end sentinel.
    pub fn end(&self) -> Cursor<'_, T> {
        self.view().end()
    }

    /// Cursor at `index` (which may equal `len`).
    #[track_caller]
    pub fn cursor_at(&self, index: usize) -> Cursor<'_, T> {
        self.view().cursor_at(index)
    }

    /// Position token for `index` (which may equal `len`).
    #[track_caller]
    pub fn position_at(&self, index: usize) -> Position {
        if index > self.len {
            violation(ContractViolation::CursorOutOfRange {
                position: index as isize,
                len: self.len,
            });
        }
        Position {
            owner: self.owner,
            generation: self.generation(),
            index,
        }
    }

    /// Validate `pos` against this buffer and return its index.
    #[track_caller]
    pub(crate) fn resolve(&self, pos: Position) -> usize {
        if pos.owner != self.owner {
            violation(ContractViolation::ForeignCursor {
                expected: self.owner,
                found: pos.owner,
            });
        }
        if pos.generation != self.generation() {
            violation(ContractViolation::StaleCursor {
                issued: pos.generation,
                current: self.generation(),
            });
        }
        if pos.index > self.len {
            violation(ContractViolation::CursorOutOfRange {
                position: pos.index as isize,
                len: self.len,
            });
        }
        pos.index
    }

    /// Iterate over the elements.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Iterate mutably over the elements.
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }
}

impl<T> Drop for Buffer<T> {
    fn drop(&mut self) {
        let len = self.len;
        self.len = 0;
        // SAFETY: [0, len) are live; RawSlots frees the memory afterwards.
        unsafe { destruct_range(self.slots.as_mut_ptr(), len) };
    }
}

impl<T> Default for Buffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for Buffer<T> {
    fn clone(&self) -> Self {
        let mut copy = Self::with_policy(self.policy);
        copy.reserve(self.len);
        // SAFETY: copy has capacity >= len and no live elements; the two
        // allocations are distinct.
        unsafe { clone_range_into(self.slots.as_ptr(), copy.slots.as_mut_ptr(), self.len) };
        copy.len = self.len;
        copy
    }
}

impl<T: fmt::Debug> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for Buffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for Buffer<T> {}

impl<T: PartialEq> PartialEq<[T]> for Buffer<T> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq> PartialEq<&[T]> for Buffer<T> {
    fn eq(&self, other: &&[T]) -> bool {
        self.as_slice() == *other
    }
}

impl<T: PartialEq, const N: usize> PartialEq<[T; N]> for Buffer<T> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq> PartialEq<Vec<T>> for Buffer<T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T> Index<usize> for Buffer<T> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        self.at(index)
    }
}

impl<T> IndexMut<usize> for Buffer<T> {
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        self.at_mut(index)
    }
}

impl<T> Extend<T> for Buffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.grow_for(lower, 0);
        for item in iter {
            self.push_back(item);
        }
    }
}

impl<T> FromIterator<T> for Buffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut buffer = Self::new();
        buffer.extend(iter);
        buffer
    }
}

impl<T> From<Vec<T>> for Buffer<T> {
    fn from(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

impl<T: Clone> From<&[T]> for Buffer<T> {
    fn from(items: &[T]) -> Self {
        let mut buffer = Self::new();
        buffer.append(items, 1);
        buffer
    }
}

impl<T, const N: usize> From<[T; N]> for Buffer<T> {
    fn from(items: [T; N]) -> Self {
        items.into_iter().collect()
    }
}

impl<'a, T> IntoIterator for &'a Buffer<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Buffer<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
