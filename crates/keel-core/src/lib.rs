//! Core types for the Keel runtime containers.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! contract-violation taxonomy shared by every container, the single
//! reporting point for those violations, and the identifiers that bind
//! cursors to the container instance that issued them.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod contract;
pub mod error;
pub mod id;

pub use contract::violation;
pub use error::ContractViolation;
pub use id::{Generation, OwnerId};
