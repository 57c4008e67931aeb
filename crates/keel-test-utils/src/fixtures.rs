//! Reusable callable fixtures.
//!
//! Each fixture returns a closure with a known capture layout, so tests can
//! predict where a callable container stores it:
//!
//! - [`offset_adder`]: 4-byte capture, stored inline.
//! - [`counter`]: stateful, stored inline; observes copy independence.
//! - [`weighted_sum`]: 64-byte capture, too large for inline storage.
//! - [`over_aligned`]: 16-byte aligned capture, stored on the heap.
//! - [`tracked_capture`]: captures a [`Tracked`] to observe clone and drop.

use crate::{Tracked, Tracker};

/// `|a, b| a + b + offset`.
pub fn offset_adder(offset: i32) -> impl FnMut(i32, i32) -> i32 + Clone {
    move |a, b| a + b + offset
}

/// Returns 1, 2, 3, ... on successive calls.
pub fn counter() -> impl FnMut() -> u32 + Clone {
    let mut count = 0u32;
    move || {
        count += 1;
        count
    }
}

/// Dot product of `x` replicated against eight weights.
pub fn weighted_sum(weights: [u64; 8]) -> impl FnMut(u64) -> u64 + Clone {
    move |x| weights.iter().map(|w| w * x).sum()
}

#[derive(Clone, Copy)]
#[repr(align(16))]
pub struct Aligned16(pub u64);

/// Adds the captured value; the capture requires 16-byte alignment.
pub fn over_aligned(value: u64) -> impl FnMut(u64) -> u64 + Clone {
    let captured = Aligned16(value);
    move |x| {
        let aligned: Aligned16 = captured;
        x + aligned.0
    }
}

/// Returns the payload of a captured [`Tracked`].
pub fn tracked_capture(tracker: &Tracker, value: i64) -> impl FnMut() -> i64 + Clone {
    let held: Tracked = tracker.make(value);
    move || held.value()
}

/// Plain functions for function-pointer storage.
pub fn add(a: i32, b: i32) -> i32 {
    a + b
}

pub fn negate(x: i64) -> i64 {
    -x
}

pub fn answer() -> u32 {
    42
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_adder_adds_offset() {
        let mut f = offset_adder(10);
        assert_eq!(f(2, 3), 15);
    }

    #[test]
    fn counter_counts() {
        let mut c = counter();
        assert_eq!(c(), 1);
        assert_eq!(c(), 2);
    }

    #[test]
    fn capture_sizes_are_as_documented() {
        assert_eq!(std::mem::size_of_val(&offset_adder(1)), 4);
        assert_eq!(std::mem::size_of_val(&weighted_sum([0; 8])), 64);
        assert_eq!(std::mem::align_of_val(&over_aligned(0)), 16);
    }

    #[test]
    fn tracked_capture_drops_with_closure() {
        let tracker = Tracker::new();
        let mut f = tracked_capture(&tracker, 7);
        assert_eq!(f(), 7);
        drop(f);
        tracker.assert_balanced();
    }
}
