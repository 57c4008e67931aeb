//! Growable owning buffer, bounds-checked views and validated cursors.
//!
//! [`Buffer`] is the storage backend shared by every owning sequence
//! container in Keel. It owns one contiguous [`RawSlots`](keel_arena::RawSlots)
//! region and keeps the first `len` slots live.
//!
//! ```text
//! Buffer<T>
//! ├── RawSlots<T>       owned allocation + generation (keel-arena)
//! ├── shift             gap open/close over raw slots
//! ├── View / ViewMut    borrowed (pointer, length) with checked access
//! ├── Cursor            validated position bound to one owner
//! └── Position          borrow-free location token for mutations
//! Text                  NUL-terminated UTF-8 over Buffer<u8>
//! ```
//!
//! # Contracts
//!
//! Out-of-range indices, foreign or stale positions, and operations that
//! need an element on an empty buffer all panic with a
//! [`ContractViolation`](keel_core::ContractViolation) description, in every
//! build profile.
//!
//! # Aliasing
//!
//! Multi-element insertion checks whether its source range lies inside the
//! buffer's own storage before mutating anything. If it does, the source is
//! first copied aside, so self-append and self-insert never read slots they
//! have already overwritten.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod cursor;
mod edit;
mod shift;
pub mod text;
pub mod view;

pub use buffer::Buffer;
pub use cursor::{Cursor, Position};
pub use text::Text;
pub use view::{View, ViewMut};
