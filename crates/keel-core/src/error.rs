//! Contract violations raised by the Keel containers.
//!
//! Every variant is a programmer error: callers are expected to satisfy the
//! precondition rather than handle the failure. Violations are reported
//! through [`violation`](crate::contract::violation), never returned.

use std::error::Error;
use std::fmt;

use crate::id::{Generation, OwnerId};

/// A broken precondition on a container, view, cursor or callable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractViolation {
    /// Element access outside `[0, len)`.
    IndexOutOfBounds {
        /// The index that was requested.
        index: usize,
        /// Number of live elements at the time of access.
        len: usize,
    },
    /// A cursor or position moved outside `[begin, end]`.
    CursorOutOfRange {
        /// The position the cursor would have reached.
        position: isize,
        /// Length of the viewed storage.
        len: usize,
    },
    /// Dereference of a cursor sitting on the one-past-end sentinel.
    DereferenceAtEnd {
        /// Position of the cursor.
        position: usize,
        /// Length of the viewed storage.
        len: usize,
    },
    /// A cursor or position used with a container that did not issue it.
    ForeignCursor {
        /// Owner of the container the cursor was used with.
        expected: OwnerId,
        /// Owner recorded in the cursor.
        found: OwnerId,
    },
    /// A position issued before the container's storage was relocated.
    StaleCursor {
        /// Storage generation when the position was issued.
        issued: Generation,
        /// Current storage generation of the container.
        current: Generation,
    },
    /// An operation that requires at least one element ran on an empty container.
    EmptyContainer {
        /// Name of the operation, e.g. `"pop_front"`.
        operation: &'static str,
    },
    /// A half-open range with `from > to` or `to > len`.
    InvalidRange {
        /// Start of the range.
        from: usize,
        /// End of the range.
        to: usize,
        /// Number of live elements.
        len: usize,
    },
    /// A text byte offset that does not fall on a UTF-8 character boundary.
    NotCharBoundary {
        /// The offending byte offset.
        index: usize,
    },
    /// Invocation of a callable container holding nothing.
    EmptyInvoke,
    /// A capacity request whose byte size does not fit in `isize`.
    CapacityOverflow {
        /// Requested element count.
        requested: usize,
        /// Size of one element in bytes.
        element_size: usize,
    },
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::CursorOutOfRange { position, len } => {
                write!(f, "cursor moved to {position}, outside [0, {len}]")
            }
            Self::DereferenceAtEnd { position, len } => {
                write!(f, "dereference of cursor at {position} with length {len}")
            }
            Self::ForeignCursor { expected, found } => {
                write!(
                    f,
                    "cursor from container {found} used with container {expected}"
                )
            }
            Self::StaleCursor { issued, current } => {
                write!(
                    f,
                    "stale cursor: issued at generation {issued}, storage is at generation {current}"
                )
            }
            Self::EmptyContainer { operation } => {
                write!(f, "{operation} on empty container")
            }
            Self::InvalidRange { from, to, len } => {
                write!(f, "invalid range {from}..{to} for length {len}")
            }
            Self::NotCharBoundary { index } => {
                write!(f, "byte offset {index} is not a character boundary")
            }
            Self::EmptyInvoke => write!(f, "invoke on empty function"),
            Self::CapacityOverflow {
                requested,
                element_size,
            } => {
                write!(
                    f,
                    "capacity overflow: {requested} elements of {element_size} bytes"
                )
            }
        }
    }
}

impl Error for ContractViolation {}
