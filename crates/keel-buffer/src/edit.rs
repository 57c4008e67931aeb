//! Insertion, erasure and append.
//!
//! Every multi-element insertion funnels into [`Buffer::insert_copies`],
//! which receives its source as a raw range. Before anything is reserved or
//! shifted it asks the slot region whether that range lies inside the
//! buffer's own storage; if so the source is cloned aside first. Growth
//! would otherwise free the source out from under the copy, and the shift
//! would overwrite source slots before they are read.

#![allow(unsafe_code)]

use std::mem;
use std::ops::Range;
use std::slice;

use keel_arena::lifetime::{clone_range_into, construct_range_with, destruct_range};
use keel_core::contract::{check_index, check_range, violation};
use keel_core::ContractViolation;
use smallvec::SmallVec;

use crate::buffer::Buffer;
use crate::cursor::Position;
use crate::shift;

/// Elements staged inline before the aliasing copy spills to the heap.
const STAGE_INLINE: usize = 8;

/// Stack budget for the inline staging area. Element types whose
/// `STAGE_INLINE` copies would exceed it are staged on the heap.
const STAGE_STACK_BYTES: usize = 256;

impl<T> Buffer<T> {
    /// Insert `value` before `pos`. Returns the position of the new element.
    ///
    /// # Panics
    ///
    /// Reports `ForeignCursor`, `StaleCursor` or `CursorOutOfRange` if `pos`
    /// does not name a location in this buffer's current storage.
    #[track_caller]
    pub fn insert(&mut self, pos: Position, value: T) -> Position {
        let index = self.resolve(pos);
        self.grow_for(1, 0);
        let base = self.slots.as_mut_ptr();
        // SAFETY: capacity > len; open_gap leaves `index` uninitialized.
        unsafe {
            shift::open_gap(base, self.len, index, 1);
            base.add(index).write(value);
        }
        self.len += 1;
        self.position_at(index)
    }

    /// Insert `count` clones of `value` before `pos`. Returns the position of
    /// the first inserted element.
    #[track_caller]
    pub fn insert_n(&mut self, pos: Position, value: &T, count: usize) -> Position
    where
        T: Clone,
    {
        self.insert_n_with_headroom(pos, value, count, 0)
    }

    /// [`insert_n`](Self::insert_n), reserving at least `headroom` extra
    /// slots if storage must grow.
    #[track_caller]
    pub fn insert_n_with_headroom(
        &mut self,
        pos: Position,
        value: &T,
        count: usize,
        headroom: usize,
    ) -> Position
    where
        T: Clone,
    {
        let index = self.resolve(pos);
        // SAFETY: `value` is a live reference for the duration of the call.
        unsafe { self.insert_copies(index, value, 1, count, headroom) };
        self.position_at(index)
    }

    /// Insert `count` back-to-back copies of `items` before `pos`.
    #[track_caller]
    pub fn insert_from(&mut self, pos: Position, items: &[T], count: usize) -> Position
    where
        T: Clone,
    {
        self.insert_from_with_headroom(pos, items, count, 0)
    }

    /// [`insert_from`](Self::insert_from), reserving at least `headroom`
    /// extra slots if storage must grow.
    #[track_caller]
    pub fn insert_from_with_headroom(
        &mut self,
        pos: Position,
        items: &[T],
        count: usize,
        headroom: usize,
    ) -> Position
    where
        T: Clone,
    {
        let index = self.resolve(pos);
        // SAFETY: `items` is a live slice for the duration of the call.
        unsafe { self.insert_copies(index, items.as_ptr(), items.len(), count, headroom) };
        self.position_at(index)
    }

    /// Insert `count` copies of this buffer's own elements `source` before
    /// `pos`.
    ///
    /// # Panics
    ///
    /// Reports `InvalidRange` if `source` is not within `[0, len]`.
    #[track_caller]
    pub fn insert_from_self(&mut self, pos: Position, source: Range<usize>, count: usize) -> Position
    where
        T: Clone,
    {
        let index = self.resolve(pos);
        check_range(source.start, source.end, self.len);
        // SAFETY: [source.start, source.end) are live slots of this buffer;
        // insert_copies stages them before mutating.
        unsafe {
            let src = self.slots.as_ptr().add(source.start);
            self.insert_copies(index, src, source.len(), count, 0);
        }
        self.position_at(index)
    }

    /// Append `count` back-to-back copies of `items`.
    #[track_caller]
    pub fn append(&mut self, items: &[T], count: usize)
    where
        T: Clone,
    {
        self.append_with_headroom(items, count, 0);
    }

    /// [`append`](Self::append), reserving at least `headroom` extra slots
    /// if storage must grow.
    #[track_caller]
    pub fn append_with_headroom(&mut self, items: &[T], count: usize, headroom: usize)
    where
        T: Clone,
    {
        let end = self.len;
        // SAFETY: `items` is a live slice for the duration of the call.
        unsafe { self.insert_copies(end, items.as_ptr(), items.len(), count, headroom) };
    }

    /// Append `count` copies of this buffer's current contents.
    ///
    /// `[1, 2].append_self(1)` yields `[1, 2, 1, 2]`.
    #[track_caller]
    pub fn append_self(&mut self, count: usize)
    where
        T: Clone,
    {
        let end = self.len;
        // SAFETY: [0, len) are live; insert_copies stages them before mutating.
        unsafe {
            let src = self.slots.as_ptr();
            self.insert_copies(end, src, end, count, 0);
        }
    }

    /// Remove the element at `pos`. Returns the position of the element that
    /// followed it (or the end).
    ///
    /// # Panics
    ///
    /// Reports `IndexOutOfBounds` if `pos` is the end.
    #[track_caller]
    pub fn erase(&mut self, pos: Position) -> Position {
        let index = self.resolve(pos);
        check_index(index, self.len);
        self.erase_indices(index, index + 1);
        self.position_at(index)
    }

    /// Remove the half-open range `[from, to)`. Returns the position of the
    /// first survivor after the gap (or the end).
    ///
    /// # Panics
    ///
    /// Reports `InvalidRange` if `from` is after `to`.
    #[track_caller]
    pub fn erase_range(&mut self, from: Position, to: Position) -> Position {
        let start = self.resolve(from);
        let end = self.resolve(to);
        check_range(start, end, self.len);
        self.erase_indices(start, end);
        self.position_at(start)
    }

    pub(crate) fn erase_indices(&mut self, start: usize, end: usize) {
        if start == end {
            return;
        }
        let old_len = self.len;
        let base = self.slots.as_mut_ptr();
        // Survivors above `end` are outside the count until the gap closes.
        self.len = start;
        // SAFETY: start < end <= old_len, all live. After the destruct the
        // gap is dead and close_gap moves the tail down over it.
        unsafe {
            destruct_range(base.add(start), end - start);
            shift::close_gap(base, old_len, start, end);
        }
        self.len = old_len - (end - start);
    }

    /// Insert `count` repetitions of the `src_len` elements at `src` before
    /// `index`.
    ///
    /// # Safety
    ///
    /// `src` must point to `src_len` live values, either outside this buffer
    /// or within its live range. `index <= len`.
    #[track_caller]
    pub(crate) unsafe fn insert_copies(
        &mut self,
        index: usize,
        src: *const T,
        src_len: usize,
        count: usize,
        headroom: usize,
    ) where
        T: Clone,
    {
        let total = match src_len.checked_mul(count) {
            Some(total) => total,
            None => violation(ContractViolation::CapacityOverflow {
                requested: src_len.saturating_mul(count),
                element_size: std::mem::size_of::<T>(),
            }),
        };
        if total == 0 {
            return;
        }
        if self.slots.overlaps(src, src_len) {
            log::debug!(
                "keel: staging {} aliased element(s) x{} before insert at {}",
                src_len,
                count,
                index
            );
            // SAFETY: the source is live and nothing has been mutated yet.
            unsafe {
                if mem::size_of::<T>().saturating_mul(STAGE_INLINE) <= STAGE_STACK_BYTES {
                    self.insert_staged_inline(index, src, src_len, total, headroom);
                } else {
                    self.insert_staged_heap(index, src, src_len, total, headroom);
                }
            }
        } else {
            // SAFETY: forwarded from the caller; the source is disjoint.
            unsafe { self.insert_copies_disjoint(index, src, src_len, total, headroom) };
        }
    }

    /// Clone the aliased source into a stack-first staging area, then insert.
    ///
    /// # Safety
    ///
    /// `src` must point to `src_len` live values. `total` is a positive
    /// multiple of `src_len`.
    #[inline(never)]
    #[track_caller]
    unsafe fn insert_staged_inline(
        &mut self,
        index: usize,
        src: *const T,
        src_len: usize,
        total: usize,
        headroom: usize,
    ) where
        T: Clone,
    {
        // SAFETY: forwarded from the caller.
        let staged: SmallVec<[T; STAGE_INLINE]> =
            unsafe { slice::from_raw_parts(src, src_len) }.iter().cloned().collect();
        // SAFETY: `staged` is a separate allocation (or on the stack).
        unsafe { self.insert_copies_disjoint(index, staged.as_ptr(), src_len, total, headroom) };
    }

    /// Clone the aliased source into a heap buffer, then insert.
    ///
    /// # Safety
    ///
    /// As for [`insert_staged_inline`](Self::insert_staged_inline).
    #[inline(never)]
    #[track_caller]
    unsafe fn insert_staged_heap(
        &mut self,
        index: usize,
        src: *const T,
        src_len: usize,
        total: usize,
        headroom: usize,
    ) where
        T: Clone,
    {
        let mut staged = Buffer::<T>::with_capacity(src_len);
        // SAFETY: `staged` has room for `src_len` elements and none are live;
        // its allocation is distinct from the source.
        unsafe { clone_range_into(src, staged.slots.as_mut_ptr(), src_len) };
        staged.len = src_len;
        // SAFETY: `staged` holds `src_len` live values outside this buffer.
        unsafe { self.insert_copies_disjoint(index, staged.slots.as_ptr(), src_len, total, headroom) };
    }

    /// # Safety
    ///
    /// `src` must point to `src_len` live values that do not lie in this
    /// buffer's storage. `total` is a positive multiple of `src_len`.
    #[track_caller]
    unsafe fn insert_copies_disjoint(
        &mut self,
        index: usize,
        src: *const T,
        src_len: usize,
        total: usize,
        headroom: usize,
    ) where
        T: Clone,
    {
        self.grow_for(total, headroom);
        let old_len = self.len;
        let base = self.slots.as_mut_ptr();
        // While the gap is open only the prefix counts as live: a panicking
        // clone leaks the shifted tail instead of dropping it twice.
        self.len = index;
        // SAFETY: capacity >= old_len + total. After open_gap the slots
        // [index, index + total) are uninitialized and the tail is live
        // above them; construct_range_with fills the gap.
        unsafe {
            shift::open_gap(base, old_len, index, total);
            construct_range_with(base.add(index), total, |i| (*src.add(i % src_len)).clone());
        }
        self.len = old_len + total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_test_utils::{values, Tracker};

    #[test]
    fn insert_in_middle() {
        let mut buf = Buffer::from([1, 2, 4]);
        let pos = buf.position_at(2);
        let inserted = buf.insert(pos, 3);
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(inserted.index(), 2);
    }

    #[test]
    fn insert_at_end_appends() {
        let mut buf = Buffer::from([1, 2]);
        let end = buf.end().position();
        buf.insert(end, 3);
        assert_eq!(buf, [1, 2, 3]);
    }

    #[test]
    fn insert_n_repeats_value() {
        let mut buf = Buffer::from([0, 9]);
        let pos = buf.position_at(1);
        buf.insert_n(pos, &7, 3);
        assert_eq!(buf, [0, 7, 7, 7, 9]);
    }

    #[test]
    fn insert_from_repeats_source_range() {
        let mut buf = Buffer::from([0, 9]);
        let pos = buf.position_at(1);
        buf.insert_from(pos, &[1, 2], 2);
        assert_eq!(buf, [0, 1, 2, 1, 2, 9]);
    }

    #[test]
    fn insert_from_self_reads_before_shifting() {
        let mut buf = Buffer::from([1, 2, 3, 4]);
        let pos = buf.position_at(1);
        buf.insert_from_self(pos, 1..3, 1);
        assert_eq!(buf, [1, 2, 3, 2, 3, 4]);
    }

    #[test]
    fn insert_from_self_at_front_with_spare_capacity() {
        let mut buf = Buffer::with_capacity(32);
        buf.extend([1, 2, 3]);
        let gen = buf.generation();
        let pos = buf.position_at(0);
        buf.insert_from_self(pos, 0..3, 2);
        assert_eq!(buf, [1, 2, 3, 1, 2, 3, 1, 2, 3]);
        assert_eq!(buf.generation(), gen);
    }

    #[test]
    fn append_self_duplicates_contents() {
        let mut buf = Buffer::from([10, 20, 30]);
        buf.append_self(1);
        assert_eq!(buf, [10, 20, 30, 10, 20, 30]);
    }

    #[test]
    fn append_self_with_exact_capacity_relocates_safely() {
        let mut buf = Buffer::with_policy(keel_arena::GrowthPolicy::EXACT);
        buf.extend([String::from("a"), String::from("b")]);
        assert_eq!(buf.capacity(), buf.len());
        buf.append_self(2);
        let got: Vec<&str> = buf.iter().map(String::as_str).collect();
        assert_eq!(got, ["a", "b", "a", "b", "a", "b"]);
    }

    #[test]
    fn insert_n_with_headroom_reserves_extra() {
        let mut buf = Buffer::from([1u8, 2]);
        let pos = buf.position_at(1);
        buf.insert_n_with_headroom(pos, &9, 10, 50);
        assert_eq!(buf.len(), 12);
        assert!(buf.capacity() >= 12 + 50);
        assert_eq!(buf.as_slice()[1..11], [9; 10]);
    }

    #[derive(Clone)]
    struct Bulky([u8; 300_000]);

    #[test]
    #[cfg_attr(miri, ignore)]
    fn self_append_of_large_elements_stages_on_the_heap() {
        let mut buf = Buffer::new();
        buf.resize_with(1, || Bulky([7; 300_000]));
        buf.append_self(1);
        let pos = buf.position_at(1);
        buf.insert_from_self(pos, 0..2, 1);
        assert_eq!(buf.len(), 4);
        assert!(buf.iter().all(|b| b.0[0] == 7 && b.0[299_999] == 7));
    }

    #[test]
    fn self_append_of_mid_sized_elements() {
        let mut buf: Buffer<[u64; 8]> = (0..3).map(|i| [i; 8]).collect();
        buf.append_self(2);
        let firsts: Vec<u64> = buf.iter().map(|a| a[0]).collect();
        assert_eq!(firsts, [0, 1, 2, 0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn append_zero_times_is_noop() {
        let mut buf = Buffer::from([1]);
        buf.append(&[2, 3], 0);
        buf.append(&[], 5);
        assert_eq!(buf, [1]);
    }

    #[test]
    fn append_with_headroom_reserves_extra() {
        let mut buf = Buffer::<u8>::new();
        buf.append_with_headroom(&[1, 2, 3], 1, 100);
        assert!(buf.capacity() >= 103);
    }

    #[test]
    fn erase_single() {
        let mut buf = Buffer::from([1, 2, 3]);
        let pos = buf.position_at(1);
        let next = buf.erase(pos);
        assert_eq!(buf, [1, 3]);
        assert_eq!(next.index(), 1);
    }

    #[test]
    fn erase_middle_range() {
        let mut buf = Buffer::from([1, 2, 3, 4, 5]);
        let from = (buf.begin() + 1).position();
        let to = (buf.end() - 1).position();
        let next = buf.erase_range(from, to);
        assert_eq!(buf, [1, 5]);
        assert_eq!(buf.len(), 2);
        assert_eq!(next.index(), 1);
    }

    #[test]
    fn erase_to_tail_returns_end() {
        let mut buf = Buffer::from([1, 2, 3]);
        let from = buf.position_at(1);
        let to = buf.end().position();
        let next = buf.erase_range(from, to);
        assert_eq!(next.index(), buf.len());
    }

    #[test]
    #[should_panic(expected = "index 2 out of bounds for length 2")]
    fn erase_at_end_panics() {
        let mut buf = Buffer::from([1, 2]);
        let end = buf.end().position();
        buf.erase(end);
    }

    #[test]
    #[should_panic(expected = "invalid range 2..1")]
    fn erase_reversed_range_panics() {
        let mut buf = Buffer::from([1, 2, 3]);
        let a = buf.position_at(2);
        let b = buf.position_at(1);
        buf.erase_range(a, b);
    }

    #[test]
    #[should_panic(expected = "stale cursor")]
    fn position_from_before_growth_is_stale() {
        let mut buf = Buffer::with_policy(keel_arena::GrowthPolicy::EXACT);
        buf.push_back(1);
        let pos = buf.position_at(0);
        buf.push_back(2);
        buf.insert(pos, 0);
    }

    #[test]
    fn position_survives_mutation_without_growth() {
        let mut buf = Buffer::with_capacity(8);
        buf.extend([1, 2, 3]);
        let pos = buf.position_at(1);
        buf.push_back(4);
        buf.insert(pos, 9);
        assert_eq!(buf, [1, 9, 2, 3, 4]);
    }

    #[test]
    #[should_panic(expected = "used with container")]
    fn foreign_position_panics() {
        let a = Buffer::from([1, 2]);
        let mut b = Buffer::from([1, 2]);
        let pos = a.position_at(0);
        b.erase(pos);
    }

    #[test]
    fn edits_balance_lifetimes() {
        let tracker = Tracker::new();
        {
            let mut buf: Buffer<_> = (0..5).map(|i| tracker.make(i)).collect();
            let pos = buf.position_at(2);
            buf.insert_n(pos, &tracker.make(-1), 3);
            buf.append_self(1);
            assert_eq!(buf.len(), 16);
            let from = buf.position_at(2);
            let to = buf.position_at(13);
            buf.erase_range(from, to);
            assert_eq!(values(buf.as_slice()), vec![0, 1, 2, 3, 4]);
            assert_eq!(tracker.live(), 5);
        }
        tracker.assert_balanced();
    }

    #[test]
    fn erase_range_drops_exactly_the_gap() {
        let tracker = Tracker::new();
        let mut buf: Buffer<_> = (0..6).map(|i| tracker.make(i)).collect();
        let from = buf.position_at(1);
        let to = buf.position_at(4);
        buf.erase_range(from, to);
        assert_eq!(tracker.dropped(), 3);
        assert_eq!(values(buf.as_slice()), vec![0, 4, 5]);
        drop(buf);
        tracker.assert_balanced();
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn panicking_clone_leaks_instead_of_double_dropping() {
        use keel_test_utils::Tracked;
        use std::panic::{catch_unwind, AssertUnwindSafe};

        struct Fused {
            fuse: u32,
            tracked: Tracked,
        }
        impl Clone for Fused {
            fn clone(&self) -> Self {
                assert!(self.fuse > 0, "fuse burnt");
                Self {
                    fuse: self.fuse - 1,
                    tracked: self.tracked.clone(),
                }
            }
        }
        let tracker = Tracker::new();
        let fused = |fuse, value| Fused {
            fuse,
            tracked: tracker.make(value),
        };

        let mut buf = Buffer::new();
        buf.push_back(fused(5, 1));
        buf.push_back(fused(5, 2));
        let source = vec![fused(1, 3), fused(0, 4)];

        let pos = buf.position_at(0);
        let result = catch_unwind(AssertUnwindSafe(|| buf.insert_from(pos, &source, 1)));
        assert!(result.is_err());
        assert_eq!(buf.len(), 0);
        drop((buf, source));
        // The two shifted elements leak; the one finished clone was dropped.
        assert_eq!(tracker.cloned(), 1);
        assert_eq!(tracker.live(), 2);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn insert_n_matches_vec(
                base in proptest::collection::vec(any::<i16>(), 0..40),
                at in any::<prop::sample::Index>(),
                value in any::<i16>(),
                count in 0usize..20,
            ) {
                let index = at.index(base.len() + 1);
                let mut buf: Buffer<i16> = base.iter().copied().collect();
                let pos = buf.position_at(index);
                buf.insert_n(pos, &value, count);

                let mut model = base.clone();
                model.splice(index..index, std::iter::repeat(value).take(count));
                prop_assert_eq!(buf.as_slice(), model.as_slice());
            }

            #[test]
            fn erase_range_preserves_survivor_order(
                base in proptest::collection::vec(any::<u32>(), 0..60),
                a in any::<prop::sample::Index>(),
                b in any::<prop::sample::Index>(),
            ) {
                let (mut lo, mut hi) = (a.index(base.len() + 1), b.index(base.len() + 1));
                if lo > hi {
                    std::mem::swap(&mut lo, &mut hi);
                }
                let mut buf: Buffer<u32> = base.iter().copied().collect();
                let from = buf.position_at(lo);
                let to = buf.position_at(hi);
                buf.erase_range(from, to);

                let mut model = base.clone();
                model.drain(lo..hi);
                prop_assert_eq!(buf.len(), base.len() - (hi - lo));
                prop_assert_eq!(buf.as_slice(), model.as_slice());
            }

            #[test]
            fn append_self_doubles(
                base in proptest::collection::vec(any::<u8>(), 0..50),
                count in 0usize..4,
            ) {
                let mut buf: Buffer<u8> = base.iter().copied().collect();
                buf.append_self(count);
                let model: Vec<u8> = std::iter::repeat(base.iter().copied())
                    .take(count + 1)
                    .flatten()
                    .collect();
                prop_assert_eq!(buf.as_slice(), model.as_slice());
            }
        }
    }
}
