//! Validated positions within one container.
//!
//! A [`Cursor`] borrows a [`View`] and walks it; every step is checked to stay
//! within `[begin, end]`, and dereference requires a position strictly before
//! `end`. Cursors from different containers do not compare: doing so is a
//! contract violation, not `false`.
//!
//! Mutating operations cannot take a cursor, since the cursor's borrow would
//! overlap the mutation. They take a [`Position`] instead: a `Copy` token
//! carrying the owner id, the storage generation it was issued at, and the
//! index. A position from another container, or from before a relocation,
//! is rejected when used.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use keel_core::contract::{check_position, violation};
use keel_core::{ContractViolation, Generation, OwnerId};

use crate::view::View;

/// A position in `[0, len]` of a borrowed view.
pub struct Cursor<'a, T> {
    view: View<'a, T>,
    index: usize,
}

impl<'a, T> Cursor<'a, T> {
    #[track_caller]
    pub(crate) fn new(view: View<'a, T>, index: usize) -> Self {
        let index = check_position(index as isize, view.len());
        Self { view, index }
    }

    /// Current index. Equals `len` at the end sentinel.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Identity of the container this cursor walks.
    pub fn owner(&self) -> OwnerId {
        self.view.owner()
    }

    /// Whether the cursor sits on the one-past-end sentinel.
    pub fn is_end(&self) -> bool {
        self.index == self.view.len()
    }

    /// The element under the cursor.
    ///
    /// # Panics
    ///
    /// Reports `DereferenceAtEnd` at the end sentinel.
    #[track_caller]
    pub fn get(&self) -> &'a T {
        if self.index >= self.view.len() {
            violation(ContractViolation::DereferenceAtEnd {
                position: self.index,
                len: self.view.len(),
            });
        }
        &self.view.as_slice()[self.index]
    }

    /// Step forward by one (`++`).
    #[track_caller]
    pub fn move_next(&mut self) {
        self.advance(1);
    }

    /// Step back by one (`--`).
    #[track_caller]
    pub fn move_prev(&mut self) {
        self.advance(-1);
    }

    /// Move by `delta` elements.
    ///
    /// # Panics
    ///
    /// Reports `CursorOutOfRange` if the result leaves `[0, len]`.
    #[track_caller]
    pub fn advance(&mut self, delta: isize) {
        let target = (self.index as isize).checked_add(delta);
        self.seek(target, delta >= 0);
    }

    /// Move back by `delta` elements.
    #[track_caller]
    fn retreat(&mut self, delta: isize) {
        let target = (self.index as isize).checked_sub(delta);
        self.seek(target, delta <= 0);
    }

    /// Land on `target`, or report the saturated position when the step
    /// overflowed `isize`.
    #[track_caller]
    fn seek(&mut self, target: Option<isize>, forward: bool) {
        let len = self.view.len();
        let position = match target {
            Some(position) => position,
            None if forward => violation(ContractViolation::CursorOutOfRange {
                position: isize::MAX,
                len,
            }),
            None => violation(ContractViolation::CursorOutOfRange {
                position: isize::MIN,
                len,
            }),
        };
        self.index = check_position(position, len);
    }

    /// A copy of this cursor moved by `delta`.
    #[track_caller]
    #[must_use]
    pub fn offset(&self, delta: isize) -> Self {
        let mut moved = *self;
        moved.advance(delta);
        moved
    }

    /// Signed distance `self - other`.
    ///
    /// # Panics
    ///
    /// Reports `ForeignCursor` if the cursors walk different containers.
    #[track_caller]
    pub fn distance_from(&self, other: &Self) -> isize {
        self.check_same_owner(other);
        self.index as isize - other.index as isize
    }

    /// Borrow-free token for this location, for use with mutating operations.
    pub fn position(&self) -> Position {
        Position {
            owner: self.view.owner(),
            generation: self.view.generation(),
            index: self.index,
        }
    }

    #[track_caller]
    fn check_same_owner(&self, other: &Self) {
        if self.view.owner() != other.view.owner() {
            violation(ContractViolation::ForeignCursor {
                expected: self.view.owner(),
                found: other.view.owner(),
            });
        }
    }
}

impl<T> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cursor<'_, T> {}

impl<T> PartialEq for Cursor<'_, T> {
    #[track_caller]
    fn eq(&self, other: &Self) -> bool {
        self.check_same_owner(other);
        self.index == other.index
    }
}

impl<T> Eq for Cursor<'_, T> {}

impl<T> PartialOrd for Cursor<'_, T> {
    #[track_caller]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Cursor<'_, T> {
    #[track_caller]
    fn cmp(&self, other: &Self) -> Ordering {
        self.check_same_owner(other);
        self.index.cmp(&other.index)
    }
}

impl<T> AddAssign<isize> for Cursor<'_, T> {
    #[track_caller]
    fn add_assign(&mut self, delta: isize) {
        self.advance(delta);
    }
}

impl<T> SubAssign<isize> for Cursor<'_, T> {
    #[track_caller]
    fn sub_assign(&mut self, delta: isize) {
        self.retreat(delta);
    }
}

impl<T> Add<isize> for Cursor<'_, T> {
    type Output = Self;

    #[track_caller]
    fn add(self, delta: isize) -> Self {
        self.offset(delta)
    }
}

impl<T> Sub<isize> for Cursor<'_, T> {
    type Output = Self;

    #[track_caller]
    fn sub(self, delta: isize) -> Self {
        let mut moved = self;
        moved.retreat(delta);
        moved
    }
}

impl<'a, T> Sub<Cursor<'a, T>> for Cursor<'a, T> {
    type Output = isize;

    #[track_caller]
    fn sub(self, other: Cursor<'a, T>) -> isize {
        self.distance_from(&other)
    }
}

impl<T> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("owner", &self.view.owner())
            .field("index", &self.index)
            .field("len", &self.view.len())
            .finish()
    }
}

/// A location in a specific container at a specific storage generation.
///
/// Obtained from [`Cursor::position`] or
/// [`Buffer::position_at`](crate::Buffer::position_at); consumed by the
/// buffer's insert and erase operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub(crate) owner: OwnerId,
    pub(crate) generation: Generation,
    pub(crate) index: usize,
}

impl Position {
    /// Index of the location.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Container that issued the position.
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Storage generation at issue time.
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Position(owner={}, gen={}, index={})",
            self.owner, self.generation, self.index
        )
    }
}
