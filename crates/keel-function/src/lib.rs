//! Type-erased callable container for Keel.
//!
//! [`Function<Args, R>`] owns one of three things: nothing, a plain function
//! pointer, or a clonable callable value. Values are stored in a 16-byte
//! slot when their layout allows it and in a single heap block otherwise.
//!
//! ```text
//! Function<Args, R>
//! ├── State::Empty
//! ├── State::Plain(fn pointer)
//! └── State::Value
//!     ├── Dispatcher   one word: &'static table of invoke / clone / destroy
//!     ├── Locality     Inline | Heap, fixed at construction
//!     └── Storage      16-byte union: inline bytes | heap pointer
//! ```
//!
//! Dispatch does not go through `dyn` trait objects: the operation table for
//! each stored type is generated by monomorphization and referenced from the
//! container, so a call costs one indirect jump.
//!
//! Only `Clone` values can be stored; storing anything else is a compile
//! error, so cloning a `Function` cannot fail at run time.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

mod dispatch;
pub mod function;
pub mod signature;
pub mod storage;

pub use function::{Function, Kind};
pub use signature::{Arguments, Invocable};
pub use storage::{Locality, INLINE_ALIGN, INLINE_BYTES};
