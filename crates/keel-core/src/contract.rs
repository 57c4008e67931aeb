//! Reporting of contract violations.
//!
//! All checks are active in every build profile: a violated precondition
//! panics with the violation's description. There is no soft-failure path.

use crate::error::ContractViolation;

/// Report a contract violation. Never returns.
#[cold]
#[inline(never)]
#[track_caller]
pub fn violation(v: ContractViolation) -> ! {
    panic!("keel: contract violation: {v}")
}

/// Require `index < len`.
#[inline]
#[track_caller]
pub fn check_index(index: usize, len: usize) {
    if index >= len {
        violation(ContractViolation::IndexOutOfBounds { index, len });
    }
}

/// Require a cursor position inside `[0, len]` (the end sentinel is valid).
///
/// Returns the position as `usize` on success.
#[inline]
#[track_caller]
pub fn check_position(position: isize, len: usize) -> usize {
    if position < 0 || position as usize > len {
        violation(ContractViolation::CursorOutOfRange { position, len });
    }
    position as usize
}

/// Require at least one element.
#[inline]
#[track_caller]
pub fn check_non_empty(len: usize, operation: &'static str) {
    if len == 0 {
        violation(ContractViolation::EmptyContainer { operation });
    }
}

/// Require `from <= to <= len`.
#[inline]
#[track_caller]
pub fn check_range(from: usize, to: usize, len: usize) {
    if from > to || to > len {
        violation(ContractViolation::InvalidRange { from, to, len });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_inside_bounds_passes() {
        check_index(0, 1);
        check_index(4, 5);
    }

    #[test]
    #[should_panic(expected = "index 5 out of bounds for length 5")]
    fn index_at_len_panics() {
        check_index(5, 5);
    }

    #[test]
    fn end_sentinel_is_a_valid_position() {
        assert_eq!(check_position(3, 3), 3);
        assert_eq!(check_position(0, 0), 0);
    }

    #[test]
    #[should_panic(expected = "cursor moved to -1")]
    fn negative_position_panics() {
        check_position(-1, 3);
    }

    #[test]
    #[should_panic(expected = "cursor moved to 4")]
    fn position_past_end_panics() {
        check_position(4, 3);
    }

    #[test]
    #[should_panic(expected = "pop_front on empty container")]
    fn empty_check_names_operation() {
        check_non_empty(0, "pop_front");
    }

    #[test]
    #[should_panic(expected = "invalid range 3..2")]
    fn reversed_range_panics() {
        check_range(3, 2, 10);
    }

    #[test]
    #[should_panic(expected = "keel: contract violation")]
    fn violation_message_has_prefix() {
        violation(ContractViolation::EmptyInvoke);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn valid_ranges_never_panic(len in 0usize..1000, a in 0usize..1000, b in 0usize..1000) {
                let from = a.min(b).min(len);
                let to = a.max(b).min(len);
                check_range(from, to, len);
            }

            #[test]
            fn positions_within_len_round_trip(len in 0usize..1000, p in 0usize..1000) {
                let p = p.min(len);
                prop_assert_eq!(check_position(p as isize, len), p);
            }
        }
    }
}
