//! Keel: foundation containers for an engine runtime.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Keel sub-crates. For most users, adding `keel` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use keel::prelude::*;
//!
//! let mut buf = Buffer::from([1, 2, 3, 4, 5]);
//! let from = (buf.begin() + 1).position();
//! let to = (buf.end() - 1).position();
//! buf.erase_range(from, to);
//! assert_eq!(buf, [1, 5]);
//!
//! buf.append_self(1);
//! assert_eq!(buf, [1, 5, 1, 5]);
//!
//! let offset = 10;
//! let mut f = Function::<(i32, i32), i32>::from_value(move |a: i32, b: i32| a + b + offset);
//! assert_eq!(f.call((2, 3)), 15);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `keel-core` | Contract violations, owner ids, generations |
//! | [`arena`] | `keel-arena` | Raw slots, range lifetimes, growth policy |
//! | [`buffer`] | `keel-buffer` | `Buffer`, views, cursors, `Text` |
//! | [`function`] | `keel-function` | `Function` and call signatures |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Contract violations and identifiers (`keel-core`).
///
/// Every precondition failure in Keel panics with the description of a
/// [`types::ContractViolation`].
pub use keel_core as types;

/// Raw storage and lifetime primitives (`keel-arena`).
///
/// [`arena::RawSlots`] owns an allocation; [`arena::GrowthPolicy`]
/// configures how much headroom amortized growth reserves.
pub use keel_arena as arena;

/// Growable owning buffer, views and cursors (`keel-buffer`).
///
/// See [`buffer::Buffer`] for the container and [`buffer::Position`] for
/// naming locations across mutations.
pub use keel_buffer as buffer;

/// Type-erased callable container (`keel-function`).
pub use keel_function as function;

/// Common imports for typical Keel usage.
///
/// ```rust
/// use keel::prelude::*;
/// ```
pub mod prelude {
    // Containers
    pub use keel_buffer::{Buffer, Cursor, Position, Text, View, ViewMut};

    // Callables
    pub use keel_function::{Function, Kind, Locality};

    // Configuration and diagnostics
    pub use keel_arena::GrowthPolicy;
    pub use keel_core::{ContractViolation, Generation, OwnerId};
}
