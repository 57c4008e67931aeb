//! Typed raw storage and lifetime primitives for Keel containers.
//!
//! This crate is the only place that talks to the global allocator.
//! Containers above it never allocate or free; they place and shift
//! elements inside the slots a [`RawSlots`] hands them.
//!
//! # Layers
//!
//! ```text
//! RawSlots<T> (owner: {ptr, capacity, generation})
//! ├── raw        allocate / release (fatal on OOM)
//! └── lifetime   construct / clone / destruct over index ranges
//! GrowthPolicy   headroom reserved by amortized growth
//! ```
//!
//! `RawSlots` owns memory, never elements: which slots hold live values is
//! tracked by the container that uses it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod lifetime;
pub mod raw;
pub mod slots;

pub use config::GrowthPolicy;
pub use error::ArenaError;
pub use slots::RawSlots;
