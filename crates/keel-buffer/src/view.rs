//! Bounds-checked, non-owning views over contiguous elements.
//!
//! A view is a `(pointer, length)` pair plus the identity of the container
//! it was taken from. [`ViewMut`] converts into [`View`]; there is no
//! conversion the other way.

use std::fmt;
use std::ops::{Index, IndexMut};

use keel_core::contract::{check_index, check_non_empty};
use keel_core::{Generation, OwnerId};

use crate::cursor::Cursor;

/// Read-only view over `len` elements.
pub struct View<'a, T> {
    items: &'a [T],
    owner: OwnerId,
    generation: Generation,
}

impl<'a, T> View<'a, T> {
    /// View an arbitrary slice. The view gets an identity of its own.
    pub fn new(items: &'a [T]) -> Self {
        Self::bound(items, OwnerId::next(), Generation::default())
    }

    pub(crate) fn bound(items: &'a [T], owner: OwnerId, generation: Generation) -> Self {
        Self {
            items,
            owner,
            generation,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the view has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Identity of the viewed container.
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub(crate) fn generation(&self) -> Generation {
        self.generation
    }

    /// Element at `index`.
    ///
    /// # Panics
    ///
    /// Reports `IndexOutOfBounds` if `index >= len`.
    #[track_caller]
    pub fn at(&self, index: usize) -> &'a T {
        check_index(index, self.items.len());
        &self.items[index]
    }

    /// Element at `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<&'a T> {
        self.items.get(index)
    }

    /// First element.
    ///
    /// # Panics
    ///
    /// Reports `EmptyContainer` on an empty view.
    #[track_caller]
    pub fn front(&self) -> &'a T {
        check_non_empty(self.items.len(), "front");
        &self.items[0]
    }

    /// Last element.
    ///
    /// # Panics
    ///
    /// Reports `EmptyContainer` on an empty view.
    #[track_caller]
    pub fn back(&self) -> &'a T {
        check_non_empty(self.items.len(), "back");
        &self.items[self.items.len() - 1]
    }

    /// Cursor to the first element equal to `value`, or [`end`](Self::end).
    pub fn find(&self, value: &T) -> Cursor<'a, T>
    where
        T: PartialEq,
    {
        let index = self
            .items
            .iter()
            .position(|item| item == value)
            .unwrap_or(self.items.len());
        Cursor::new(*self, index)
    }

    /// Cursor at the first element.
    pub fn begin(&self) -> Cursor<'a, T> {
        Cursor::new(*self, 0)
    }

    /// Cursor at the one-past-end sentinel.
    pub fn end(&self) -> Cursor<'a, T> {
        Cursor::new(*self, self.items.len())
    }

    /// Cursor at `index`, which may equal `len`.
    #[track_caller]
    pub fn cursor_at(&self, index: usize) -> Cursor<'a, T> {
        Cursor::new(*self, index)
    }

    /// Iterate over the elements.
    pub fn iter(&self) -> std::slice::Iter<'a, T> {
        self.items.iter()
    }

    /// The viewed elements as a slice.
    pub fn as_slice(&self) -> &'a [T] {
        self.items
    }
}

impl<T> Clone for View<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for View<'_, T> {}

impl<T> Index<usize> for View<'_, T> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        self.at(index)
    }
}

impl<'a, T> IntoIterator for View<'a, T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for View<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items).finish()
    }
}

/// Read/write view over `len` elements.
pub struct ViewMut<'a, T> {
    items: &'a mut [T],
    owner: OwnerId,
    generation: Generation,
}

impl<'a, T> ViewMut<'a, T> {
    /// View an arbitrary mutable slice. The view gets an identity of its own.
    pub fn new(items: &'a mut [T]) -> Self {
        Self::bound(items, OwnerId::next(), Generation::default())
    }

    pub(crate) fn bound(items: &'a mut [T], owner: OwnerId, generation: Generation) -> Self {
        Self {
            items,
            owner,
            generation,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the view has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Element at `index`.
    #[track_caller]
    pub fn at(&self, index: usize) -> &T {
        check_index(index, self.items.len());
        &self.items[index]
    }

    /// Mutable element at `index`.
    #[track_caller]
    pub fn at_mut(&mut self, index: usize) -> &mut T {
        check_index(index, self.items.len());
        &mut self.items[index]
    }

    /// First element.
    #[track_caller]
    pub fn front(&self) -> &T {
        check_non_empty(self.items.len(), "front");
        &self.items[0]
    }

    /// Mutable first element.
    #[track_caller]
    pub fn front_mut(&mut self) -> &mut T {
        check_non_empty(self.items.len(), "front_mut");
        &mut self.items[0]
    }

    /// Last element.
    #[track_caller]
    pub fn back(&self) -> &T {
        check_non_empty(self.items.len(), "back");
        &self.items[self.items.len() - 1]
    }

    /// Mutable last element.
    #[track_caller]
    pub fn back_mut(&mut self) -> &mut T {
        check_non_empty(self.items.len(), "back_mut");
        let last = self.items.len() - 1;
        &mut self.items[last]
    }

    /// Cursor to the first element equal to `value`, or the end sentinel.
    pub fn find(&self, value: &T) -> Cursor<'_, T>
    where
        T: PartialEq,
    {
        self.as_view().find(value)
    }

    /// Reborrow as a read-only view.
    pub fn as_view(&self) -> View<'_, T> {
        View::bound(self.items, self.owner, self.generation)
    }

    /// Give up write access for the rest of `'a`.
    pub fn into_view(self) -> View<'a, T> {
        View::bound(self.items, self.owner, self.generation)
    }

    /// Iterate mutably over the elements.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// The viewed elements as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut *self.items
    }
}

impl<'a, T> From<ViewMut<'a, T>> for View<'a, T> {
    fn from(view: ViewMut<'a, T>) -> Self {
        view.into_view()
    }
}

impl<T> Index<usize> for ViewMut<'_, T> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        self.at(index)
    }
}

impl<T> IndexMut<usize> for ViewMut<'_, T> {
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        self.at_mut(index)
    }
}

impl<T: fmt::Debug> fmt::Debug for ViewMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_reads_elements() {
        let data = [10, 20, 30];
        let view = View::new(&data);
        assert_eq!(*view.at(1), 20);
        assert_eq!(view[2], 30);
        assert_eq!(view.len(), 3);
    }

    #[test]
    #[should_panic(expected = "index 3 out of bounds for length 3")]
    fn at_past_end_panics() {
        let data = [10, 20, 30];
        View::new(&data).at(3);
    }

    #[test]
    fn get_is_the_soft_accessor() {
        let data = [1];
        let view = View::new(&data);
        assert_eq!(view.get(0), Some(&1));
        assert_eq!(view.get(1), None);
    }

    #[test]
    fn front_and_back() {
        let data = [4, 5, 6];
        let view = View::new(&data);
        assert_eq!(*view.front(), 4);
        assert_eq!(*view.back(), 6);
    }

    #[test]
    #[should_panic(expected = "front on empty container")]
    fn front_of_empty_panics() {
        let data: [u8; 0] = [];
        View::new(&data).front();
    }

    #[test]
    #[should_panic(expected = "back on empty container")]
    fn back_of_empty_panics() {
        let data: [u8; 0] = [];
        View::new(&data).back();
    }

    #[test]
    fn find_returns_first_match() {
        let data = [3, 7, 7, 9];
        let view = View::new(&data);
        assert_eq!(view.find(&7).index(), 1);
    }

    #[test]
    fn find_missing_returns_end() {
        let data = [3, 7];
        let view = View::new(&data);
        assert!(view.find(&8) == view.end());
    }

    #[test]
    fn mutable_view_writes_through() {
        let mut data = [1, 2, 3];
        let mut view = ViewMut::new(&mut data);
        view[0] = 100;
        *view.back_mut() = 300;
        assert_eq!(view.front(), &100);
        drop(view);
        assert_eq!(data, [100, 2, 300]);
    }

    #[test]
    #[should_panic(expected = "index 5 out of bounds for length 3")]
    fn mutable_view_at_mut_checks_bounds() {
        let mut data = [1, 2, 3];
        ViewMut::new(&mut data).at_mut(5);
    }

    #[test]
    fn mutable_view_converts_to_read_only() {
        let mut data = [1, 2, 3];
        let owner = {
            let view = ViewMut::new(&mut data);
            let owner = view.owner;
            let read: View<'_, i32> = view.into();
            assert_eq!(read.owner(), owner);
            assert_eq!(read.as_slice(), &[1, 2, 3]);
            owner
        };
        assert_ne!(owner, View::new(&data).owner());
    }
}
