//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use keel_core::ContractViolation;

/// Errors computing the layout of a storage request.
///
/// These never reach container callers as values: the allocation paths turn
/// them into a [`ContractViolation`] and report it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The byte size of the request does not fit in `isize`.
    CapacityOverflow {
        /// Number of elements requested.
        requested: usize,
        /// Size of one element in bytes.
        element_size: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
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

impl Error for ArenaError {}

impl From<ArenaError> for ContractViolation {
    fn from(e: ArenaError) -> Self {
        match e {
            ArenaError::CapacityOverflow {
                requested,
                element_size,
            } => ContractViolation::CapacityOverflow {
                requested,
                element_size,
            },
        }
    }
}
