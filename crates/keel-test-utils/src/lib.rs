//! Lifetime instrumentation and callable fixtures for Keel development.
//!
//! [`Tracker`] is an injectable ledger: each test creates its own, hands it to
//! the values it builds, and asserts on the counts afterwards. Nothing is
//! process-wide, so tests stay isolated when run in parallel.
//!
//! [`Tracked`] is the instrumented value type. Every instance carries a
//! unique id; the ledger remembers whether each id is live or dropped, which
//! turns a double drop into an immediate panic instead of a silent
//! miscount.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Live,
    Dropped,
}

#[derive(Default)]
struct Ledger {
    next_id: u64,
    states: IndexMap<u64, State>,
    constructed: usize,
    cloned: usize,
    dropped: usize,
}

impl Ledger {
    fn issue(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.states.insert(id, State::Live);
        id
    }
}

/// Handle to a per-test construction/destruction ledger.
///
/// Cloning the handle shares the ledger.
#[derive(Clone, Default)]
pub struct Tracker {
    ledger: Rc<RefCell<Ledger>>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a tracked value.
    pub fn make(&self, value: i64) -> Tracked {
        let id = {
            let mut ledger = self.ledger.borrow_mut();
            ledger.constructed += 1;
            ledger.issue()
        };
        Tracked {
            id,
            value,
            tracker: self.clone(),
        }
    }

    /// A factory producing value-initialized (`0`) tracked values.
    ///
    /// Stands in for `Default` where a container needs to value-initialize
    /// new slots.
    pub fn factory(&self) -> impl FnMut() -> Tracked + '_ {
        move || self.make(0)
    }

    /// Values built by [`make`](Self::make).
    pub fn constructed(&self) -> usize {
        self.ledger.borrow().constructed
    }

    /// Values built by `Clone`.
    pub fn cloned(&self) -> usize {
        self.ledger.borrow().cloned
    }

    /// Values dropped.
    pub fn dropped(&self) -> usize {
        self.ledger.borrow().dropped
    }

    /// Values constructed or cloned and not yet dropped.
    pub fn live(&self) -> usize {
        let ledger = self.ledger.borrow();
        ledger.constructed + ledger.cloned - ledger.dropped
    }

    /// Ids of the values still alive, in creation order.
    pub fn live_ids(&self) -> Vec<u64> {
        self.ledger
            .borrow()
            .states
            .iter()
            .filter(|(_, s)| **s == State::Live)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Panic unless every value ever created has been dropped exactly once.
    #[track_caller]
    pub fn assert_balanced(&self) {
        let live = self.live_ids();
        assert!(
            live.is_empty(),
            "leaked {} tracked value(s): ids {:?}",
            live.len(),
            live
        );
    }

    fn record_clone(&self) -> u64 {
        let mut ledger = self.ledger.borrow_mut();
        ledger.cloned += 1;
        ledger.issue()
    }

    fn record_drop(&self, id: u64) {
        let mut ledger = self.ledger.borrow_mut();
        match ledger.states.get(&id).copied() {
            Some(State::Live) => {
                ledger.states.insert(id, State::Dropped);
            }
            Some(State::Dropped) => {
                drop(ledger);
                panic!("tracked value {id} dropped twice");
            }
            None => {
                drop(ledger);
                panic!("tracked value {id} was never issued by this tracker");
            }
        }
        ledger.dropped += 1;
    }
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ledger = self.ledger.borrow();
        f.debug_struct("Tracker")
            .field("constructed", &ledger.constructed)
            .field("cloned", &ledger.cloned)
            .field("dropped", &ledger.dropped)
            .finish()
    }
}

/// A value whose construction, cloning and dropping are recorded.
///
/// Equality compares the payload only, never the instance id.
pub struct Tracked {
    id: u64,
    value: i64,
    tracker: Tracker,
}

impl Tracked {
    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn set_value(&mut self, value: i64) {
        self.value = value;
    }

    /// Unique id of this instance within its tracker.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Self {
            id: self.tracker.record_clone(),
            value: self.value,
            tracker: self.tracker.clone(),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.tracker.record_drop(self.id);
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Tracked {}

impl PartialEq<i64> for Tracked {
    fn eq(&self, other: &i64) -> bool {
        self.value == *other
    }
}

impl fmt::Debug for Tracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tracked({})", self.value)
    }
}

/// Payload values of a slice of tracked values.
pub fn values(items: &[Tracked]) -> Vec<i64> {
    items.iter().map(Tracked::value).collect()
}
