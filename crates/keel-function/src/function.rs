//! The type-erased callable container.

#![allow(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::mem;

use keel_core::contract::violation;
use keel_core::ContractViolation;

use crate::dispatch::Dispatcher;
use crate::signature::{Arguments, Invocable};
use crate::storage::{Locality, Storage};

/// What a [`Function`] currently holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Nothing; calling is a contract violation.
    Empty,
    /// A plain function pointer.
    Plain,
    /// A callable value (closure or other invocable) with its dispatcher.
    Value,
}

enum State<Args, R>
where
    Args: Arguments<R> + 'static,
    R: 'static,
{
    Empty,
    Plain(Args::Plain),
    Value {
        dispatcher: Dispatcher<Args, R>,
        locality: Locality,
        storage: Storage,
    },
}

/// An owned callable with signature `Args -> R`, where `Args` is a tuple.
///
/// `Function<(i32, i32), i32>` holds anything callable as
/// `fn(i32, i32) -> i32`: a function pointer, or a clonable closure. Values
/// of at most 16 bytes and 8-byte alignment are stored inline; larger ones
/// live in a heap block. The choice is made once when the value is stored.
///
/// Cloning clones the stored value. Moving out with [`take`](Self::take)
/// leaves the source empty. The container is neither `Send` nor `Sync`.
///
/// ```
/// use keel_function::Function;
///
/// let offset = 10;
/// let mut f = Function::<(i32, i32), i32>::from_value(move |a: i32, b: i32| a + b + offset);
/// assert_eq!(f.call((2, 3)), 15);
/// assert!(f.is_stored_locally());
/// ```
pub struct Function<Args, R>
where
    Args: Arguments<R> + 'static,
    R: 'static,
{
    state: State<Args, R>,
    _not_sync: PhantomData<*const ()>,
}

impl<Args, R> Function<Args, R>
where
    Args: Arguments<R> + 'static,
    R: 'static,
{
    /// An empty container.
    pub fn new() -> Self {
        Self::with_state(State::Empty)
    }

    /// Hold a plain function pointer.
    pub fn from_fn(f: Args::Plain) -> Self {
        Self::with_state(State::Plain(f))
    }

    /// Hold `value`, inline if its size and alignment allow it.
    pub fn from_value<F>(value: F) -> Self
    where
        F: Invocable<Args, R> + Clone + 'static,
    {
        let locality = Locality::of::<F>();
        if locality == Locality::Heap {
            log::debug!(
                "keel: storing {} ({} bytes, align {}) on the heap",
                std::any::type_name::<F>(),
                mem::size_of::<F>(),
                mem::align_of::<F>()
            );
        }
        Self::with_state(State::Value {
            dispatcher: Dispatcher::of::<F>(),
            locality,
            storage: Storage::store(value),
        })
    }

    fn with_state(state: State<Args, R>) -> Self {
        Self {
            state,
            _not_sync: PhantomData,
        }
    }

    /// Call the held function or value.
    ///
    /// # Panics
    ///
    /// Reports `EmptyInvoke` when the container is empty.
    #[track_caller]
    pub fn call(&mut self, args: Args) -> R {
        match &mut self.state {
            State::Empty => violation(ContractViolation::EmptyInvoke),
            State::Plain(f) => Args::call_plain(*f, args),
            State::Value {
                dispatcher,
                locality,
                storage,
            } => {
                // SAFETY: the dispatcher was created for the type stored in
                // `storage` at `locality`, and the value is live.
                unsafe { dispatcher.invoke(storage, *locality, args) }
            }
        }
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        matches!(self.state, State::Empty)
    }

    /// What is held.
    pub fn kind(&self) -> Kind {
        match self.state {
            State::Empty => Kind::Empty,
            State::Plain(_) => Kind::Plain,
            State::Value { .. } => Kind::Value,
        }
    }

    /// Where the held value lives, or `None` unless a value is held.
    pub fn locality(&self) -> Option<Locality> {
        match self.state {
            State::Value { locality, .. } => Some(locality),
            _ => None,
        }
    }

    /// Whether the container's contents live entirely in its own storage.
    ///
    /// True for empty containers and plain function pointers.
    pub fn is_stored_locally(&self) -> bool {
        self.locality() != Some(Locality::Heap)
    }

    /// Type name of the held value, for diagnostics.
    pub fn stored_type_name(&self) -> Option<&'static str> {
        match self.state {
            State::Value { dispatcher, .. } => Some(dispatcher.type_name()),
            _ => None,
        }
    }

    /// Drop whatever is held. A no-op when already empty.
    pub fn clear(&mut self) {
        let state = mem::replace(&mut self.state, State::Empty);
        if let State::Value {
            dispatcher,
            locality,
            mut storage,
        } = state
        {
            // SAFETY: the value is live and owned by this state, which has
            // been detached from self so it cannot be reached again.
            unsafe { dispatcher.destroy(&mut storage, locality) };
        }
    }

    /// Move the contents out, leaving this container empty.
    #[must_use]
    pub fn take(&mut self) -> Self {
        Self::with_state(mem::replace(&mut self.state, State::Empty))
    }
}

impl<Args, R> Drop for Function<Args, R>
where
    Args: Arguments<R> + 'static,
    R: 'static,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<Args, R> Default for Function<Args, R>
where
    Args: Arguments<R> + 'static,
    R: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Args, R> Clone for Function<Args, R>
where
    Args: Arguments<R> + 'static,
    R: 'static,
{
    fn clone(&self) -> Self {
        let state = match &self.state {
            State::Empty => State::Empty,
            State::Plain(f) => State::Plain(*f),
            State::Value {
                dispatcher,
                locality,
                storage,
            } => State::Value {
                dispatcher: *dispatcher,
                locality: *locality,
                // SAFETY: the dispatcher matches the live value in storage.
                storage: unsafe { dispatcher.clone_value(storage) },
            },
        };
        Self::with_state(state)
    }
}

impl<Args, R> fmt::Debug for Function<Args, R>
where
    Args: Arguments<R> + 'static,
    R: 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Function");
        out.field("kind", &self.kind());
        if let State::Value {
            dispatcher,
            locality,
            ..
        } = &self.state
        {
            out.field("type", &dispatcher.type_name());
            out.field("locality", locality);
        }
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_test_utils::fixtures::{
        add, answer, counter, negate, offset_adder, over_aligned, tracked_capture, weighted_sum,
    };
    use keel_test_utils::Tracker;

    #[test]
    fn capturing_adder_returns_sum_plus_offset() {
        let mut f = Function::<(i32, i32), i32>::from_value(offset_adder(10));
        assert_eq!(f.call((2, 3)), 15);
        assert_eq!(f.kind(), Kind::Value);
        assert_eq!(f.locality(), Some(Locality::Inline));
    }

    #[test]
    fn plain_function_pointer() {
        let mut f = Function::<(i32, i32), i32>::from_fn(add);
        assert_eq!(f.call((4, 5)), 9);
        assert_eq!(f.kind(), Kind::Plain);
        assert!(f.is_stored_locally());
        assert_eq!(f.stored_type_name(), None);
    }

    #[test]
    fn nullary_and_unary_signatures() {
        let mut g = Function::<(), u32>::from_fn(answer);
        let mut h = Function::<(i64,), i64>::from_fn(negate);
        assert_eq!(g.call(()), 42);
        assert_eq!(h.call((5,)), -5);
    }

    #[test]
    fn large_capture_goes_to_heap_and_calls_the_same() {
        let weights = [1, 2, 3, 4, 5, 6, 7, 8];
        let mut direct = weighted_sum(weights);
        let mut f = Function::<(u64,), u64>::from_value(weighted_sum(weights));
        assert!(!f.is_stored_locally());
        assert_eq!(f.call((3,)), direct(3));
    }

    #[test]
    fn over_aligned_capture_goes_to_heap() {
        let mut f = Function::<(u64,), u64>::from_value(over_aligned(100));
        assert_eq!(f.locality(), Some(Locality::Heap));
        assert_eq!(f.call((1,)), 101);
    }

    #[test]
    fn clone_is_independent() {
        let mut a = Function::<(), u32>::from_value(counter());
        assert_eq!(a.call(()), 1);
        let mut b = a.clone();
        assert_eq!(b.call(()), 2);
        assert_eq!(b.call(()), 3);
        assert_eq!(a.call(()), 2);
    }

    #[test]
    fn heap_clone_is_independent() {
        let mut state = [0u64; 4];
        let bump = move |x: u64| {
            state[0] += x;
            state[0]
        };
        let mut a = Function::<(u64,), u64>::from_value(bump);
        assert!(!a.is_stored_locally());
        a.call((1,));
        let mut b = a.clone();
        assert_eq!(b.call((10,)), 11);
        assert_eq!(a.call((1,)), 2);
    }

    #[test]
    fn take_leaves_source_empty() {
        let mut a = Function::<(i32, i32), i32>::from_value(offset_adder(1));
        let mut b = a.take();
        assert!(a.is_empty());
        assert_eq!(b.call((1, 1)), 3);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut f = Function::<(i32, i32), i32>::from_value(offset_adder(1));
        f.clear();
        assert!(f.is_empty());
        f.clear();
        assert!(f.is_empty());
        assert_eq!(f.kind(), Kind::Empty);
    }

    #[test]
    #[should_panic(expected = "keel: contract violation: invoke on empty function")]
    fn calling_empty_panics() {
        Function::<(), ()>::new().call(());
    }

    #[test]
    #[should_panic(expected = "invoke on empty function")]
    fn calling_after_take_panics() {
        let mut f = Function::<(), u32>::from_fn(answer);
        let _moved = f.take();
        f.call(());
    }

    #[test]
    fn stored_values_are_cloned_and_dropped_exactly_once() {
        let tracker = Tracker::new();
        {
            let mut a = Function::<(), i64>::from_value(tracked_capture(&tracker, 7));
            let mut b = a.clone();
            let c = b.clone();
            assert_eq!(a.call(()), 7);
            assert_eq!(b.call(()), 7);
            assert_eq!(tracker.cloned(), 2);
            drop(c);
            b.clear();
            assert_eq!(tracker.live(), 1);
        }
        tracker.assert_balanced();
    }

    #[test]
    fn heap_values_are_dropped() {
        let tracker = Tracker::new();
        {
            let held = (tracker.make(1), tracker.make(2));
            let f = Function::<(), i64>::from_value(move || held.0.value() + held.1.value());
            assert_eq!(f.locality(), Some(Locality::Heap));
            let _copy = f.clone();
        }
        tracker.assert_balanced();
    }

    #[test]
    fn debug_names_kind_and_locality() {
        let f = Function::<(i32, i32), i32>::from_value(offset_adder(0));
        let text = format!("{f:?}");
        assert!(text.contains("Value"));
        assert!(text.contains("Inline"));
        assert_eq!(format!("{:?}", Function::<(), ()>::new()), "Function { kind: Empty }");
    }

    #[test]
    fn container_is_small() {
        let word = mem::size_of::<usize>();
        assert!(mem::size_of::<Function<(u64, u64), u64>>() <= 16 + 3 * word);
    }
}
