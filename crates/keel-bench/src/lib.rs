//! Workload generators for the Keel benchmarks.
//!
//! Streams are generated from a seeded [`ChaCha8Rng`], so every run of a
//! benchmark replays the same operations:
//!
//! - [`edit_stream`]: mixed push/insert/erase/append operations
//! - [`apply`]: run one [`EditOp`] against a [`Buffer`]
//! - [`filled_buffer`]: a buffer of `0..n`

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use keel_buffer::Buffer;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// One buffer edit. Indices are fractions of the current length in 1/1024
/// steps, so a stream stays valid whatever the buffer's size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOp {
    /// Append a value.
    PushBack(u64),
    /// Prepend a value.
    PushFront(u64),
    /// Insert `count` copies of a value at a relative position.
    Insert {
        /// Position as a fraction of the length, in 1/1024 units.
        at: u16,
        /// Value to insert.
        value: u64,
        /// Number of copies.
        count: u8,
    },
    /// Erase up to `span` elements from a relative position.
    Erase {
        /// Position as a fraction of the length, in 1/1024 units.
        at: u16,
        /// Maximum number of elements removed.
        span: u8,
    },
    /// Append the buffer to itself when it is small.
    AppendSelf,
}

/// Generate `count` operations from `seed`.
///
/// Roughly half are pushes, so buffers grow over the stream.
pub fn edit_stream(seed: u64, count: usize) -> Vec<EditOp> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let roll = rng.next_u32() % 100;
            let value = rng.next_u64();
            let at = (rng.next_u32() % 1025) as u16;
            match roll {
                0..=39 => EditOp::PushBack(value),
                40..=49 => EditOp::PushFront(value),
                50..=74 => EditOp::Insert {
                    at,
                    value,
                    count: (rng.next_u32() % 8) as u8 + 1,
                },
                75..=97 => EditOp::Erase {
                    at,
                    span: (rng.next_u32() % 8) as u8,
                },
                _ => EditOp::AppendSelf,
            }
        })
        .collect()
}

/// Largest buffer [`EditOp::AppendSelf`] will double.
pub const APPEND_SELF_LIMIT: usize = 4096;

fn scaled(at: u16, len: usize) -> usize {
    len * at as usize / 1024
}

/// Apply `op` to `buf`.
pub fn apply(buf: &mut Buffer<u64>, op: EditOp) {
    match op {
        EditOp::PushBack(v) => {
            buf.push_back(v);
        }
        EditOp::PushFront(v) => {
            buf.push_front(v);
        }
        EditOp::Insert { at, value, count } => {
            let pos = buf.position_at(scaled(at, buf.len()));
            buf.insert_n(pos, &value, count as usize);
        }
        EditOp::Erase { at, span } => {
            let start = scaled(at, buf.len());
            let end = (start + span as usize).min(buf.len());
            let from = buf.position_at(start);
            let to = buf.position_at(end);
            buf.erase_range(from, to);
        }
        EditOp::AppendSelf => {
            if buf.len() <= APPEND_SELF_LIMIT {
                buf.append_self(1);
            }
        }
    }
}

/// A buffer holding `0..n`.
pub fn filled_buffer(n: usize) -> Buffer<u64> {
    (0..n as u64).collect()
}
