//! The reducer contract.
//!
//! A reducer is a pure function `(prior slice state, event) -> next slice state`.
//! In this crate that function is [`Reducer::apply`]:
//!
//! - `prior` is `Option<&Arc<State>>`; `None` means "never initialized" and is
//!   resolved to [`Reducer::initial_state`] before the event is reduced.
//! - The prior state is borrowed immutably. A change is expressed by building a
//!   new value, reusing unchanged parts by cloning their `Arc`s.
//! - An event the reducer does not recognize returns the prior `Arc` itself,
//!   so callers can detect a no-op with [`Arc::ptr_eq`].
//!
//! # Example
//!
//! ```
//! use slicekit_core::event::{DynEvent, Event};
//! use slicekit_core::reducer::Reducer;
//! use std::sync::Arc;
//!
//! struct CountReducer;
//!
//! impl Reducer for CountReducer {
//!     type State = i64;
//!     type Event = DynEvent;
//!
//!     fn initial_state(&self) -> i64 {
//!         0
//!     }
//!
//!     fn reduce(&self, state: &Arc<i64>, event: &DynEvent) -> Arc<i64> {
//!         match event.event_type() {
//!             "INCREMENT" => Arc::new(**state + 1),
//!             _ => Arc::clone(state),
//!         }
//!     }
//! }
//!
//! let reducer = CountReducer;
//! let state = reducer.apply(None, &DynEvent::new("INCREMENT"));
//! assert_eq!(*state, 1);
//!
//! let same = reducer.apply(Some(&state), &DynEvent::new("UNKNOWN"));
//! assert!(Arc::ptr_eq(&state, &same));
//! ```

use crate::event::Event;
use crate::state::StateError;
use std::marker::PhantomData;
use std::sync::Arc;

/// A pure slice reducer.
///
/// Implementations must be deterministic and side-effect free: no clocks, no
/// randomness, no shared mutable state. State types must not use interior
/// mutability. A panicking reducer is a programming defect and is never
/// caught.
pub trait Reducer: Send + Sync {
    /// The slice state this reducer owns.
    type State: Send + Sync + 'static;

    /// The event type this reducer interprets.
    type Event: Event;

    /// The value of this slice before any event has been reduced.
    fn initial_state(&self) -> Self::State;

    /// Reduces an event against an initialized state.
    ///
    /// Unrecognized events must return `Arc::clone(state)`.
    fn reduce(&self, state: &Arc<Self::State>, event: &Self::Event) -> Arc<Self::State>;

    /// Reduces an event against a possibly absent prior state.
    ///
    /// `None` is replaced by a fresh [`initial_state`](Self::initial_state)
    /// and the event is then reduced against it.
    fn apply(&self, prior: Option<&Arc<Self::State>>, event: &Self::Event) -> Arc<Self::State> {
        match prior {
            Some(state) => self.reduce(state, event),
            None => self.reduce(&Arc::new(self.initial_state()), event),
        }
    }

    /// Returns true if `next` is observably the same state as `prior`.
    ///
    /// Defaults to reference identity.
    fn is_unchanged(&self, prior: &Arc<Self::State>, next: &Arc<Self::State>) -> bool {
        Arc::ptr_eq(prior, next)
    }

    /// Checks that a state built outside this reducer is one it can reduce.
    ///
    /// Plain reducers accept any value of their state type. Combined
    /// reducers check every registered slice's type, nested ones included.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::SliceTypeMismatch`] for a slice of the wrong type.
    fn check_state(&self, state: &Self::State) -> Result<(), StateError> {
        let _ = state;
        Ok(())
    }
}

impl<R: Reducer + ?Sized> Reducer for &R {
    type State = R::State;
    type Event = R::Event;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn reduce(&self, state: &Arc<Self::State>, event: &Self::Event) -> Arc<Self::State> {
        (**self).reduce(state, event)
    }

    fn apply(&self, prior: Option<&Arc<Self::State>>, event: &Self::Event) -> Arc<Self::State> {
        (**self).apply(prior, event)
    }

    fn is_unchanged(&self, prior: &Arc<Self::State>, next: &Arc<Self::State>) -> bool {
        (**self).is_unchanged(prior, next)
    }

    fn check_state(&self, state: &Self::State) -> Result<(), StateError> {
        (**self).check_state(state)
    }
}

impl<R: Reducer + ?Sized> Reducer for Box<R> {
    type State = R::State;
    type Event = R::Event;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn reduce(&self, state: &Arc<Self::State>, event: &Self::Event) -> Arc<Self::State> {
        (**self).reduce(state, event)
    }

    fn apply(&self, prior: Option<&Arc<Self::State>>, event: &Self::Event) -> Arc<Self::State> {
        (**self).apply(prior, event)
    }

    fn is_unchanged(&self, prior: &Arc<Self::State>, next: &Arc<Self::State>) -> bool {
        (**self).is_unchanged(prior, next)
    }

    fn check_state(&self, state: &Self::State) -> Result<(), StateError> {
        (**self).check_state(state)
    }
}

impl<R: Reducer + ?Sized> Reducer for Arc<R> {
    type State = R::State;
    type Event = R::Event;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn reduce(&self, state: &Arc<Self::State>, event: &Self::Event) -> Arc<Self::State> {
        (**self).reduce(state, event)
    }

    fn apply(&self, prior: Option<&Arc<Self::State>>, event: &Self::Event) -> Arc<Self::State> {
        (**self).apply(prior, event)
    }

    fn is_unchanged(&self, prior: &Arc<Self::State>, next: &Arc<Self::State>) -> bool {
        (**self).is_unchanged(prior, next)
    }

    fn check_state(&self, state: &Self::State) -> Result<(), StateError> {
        (**self).check_state(state)
    }
}

/// A reducer built from two closures.
///
/// Created by [`reducer_fn`].
pub struct FnReducer<S, E, I, F> {
    initial: I,
    reduce: F,
    _marker: PhantomData<fn(&E) -> S>,
}

/// Builds a reducer from an initial-value constructor and a reduce closure.
///
/// # Example
///
/// ```
/// use slicekit_core::event::{DynEvent, Event};
/// use slicekit_core::reducer::{reducer_fn, Reducer};
/// use std::sync::Arc;
///
/// let count = reducer_fn(
///     || 0_i64,
///     |state: &Arc<i64>, event: &DynEvent| match event.event_type() {
///         "INCREMENT" => Arc::new(**state + 1),
///         _ => Arc::clone(state),
///     },
/// );
///
/// assert_eq!(*count.apply(None, &DynEvent::init()), 0);
/// ```
pub const fn reducer_fn<S, E, I, F>(initial: I, reduce: F) -> FnReducer<S, E, I, F>
where
    S: Send + Sync + 'static,
    E: Event,
    I: Fn() -> S + Send + Sync,
    F: Fn(&Arc<S>, &E) -> Arc<S> + Send + Sync,
{
    FnReducer {
        initial,
        reduce,
        _marker: PhantomData,
    }
}

impl<S, E, I, F> Reducer for FnReducer<S, E, I, F>
where
    S: Send + Sync + 'static,
    E: Event,
    I: Fn() -> S + Send + Sync,
    F: Fn(&Arc<S>, &E) -> Arc<S> + Send + Sync,
{
    type State = S;
    type Event = E;

    fn initial_state(&self) -> S {
        (self.initial)()
    }

    fn reduce(&self, state: &Arc<S>, event: &E) -> Arc<S> {
        (self.reduce)(state, event)
    }
}

impl<S, E, I, F> std::fmt::Debug for FnReducer<S, E, I, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnReducer")
            .field("state", &std::any::type_name::<S>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DynEvent;

    #[derive(Debug, Clone, PartialEq)]
    struct Todo {
        text: String,
        completed: bool,
    }

    struct TodoListReducer;

    impl Reducer for TodoListReducer {
        type State = Vec<Arc<Todo>>;
        type Event = DynEvent;

        fn initial_state(&self) -> Self::State {
            Vec::new()
        }

        fn reduce(&self, state: &Arc<Self::State>, event: &DynEvent) -> Arc<Self::State> {
            match event.event_type() {
                "ADD_ITEM" => {
                    let Ok(text) = event.field_as::<String>("text") else {
                        return Arc::clone(state);
                    };
                    let mut next = Vec::with_capacity(state.len() + 1);
                    next.extend(state.iter().cloned());
                    next.push(Arc::new(Todo {
                        text,
                        completed: false,
                    }));
                    Arc::new(next)
                },
                _ => Arc::clone(state),
            }
        }
    }

    #[test]
    fn apply_without_prior_starts_from_initial_state() {
        let state = TodoListReducer.apply(None, &DynEvent::init());
        assert!(state.is_empty());
    }

    #[test]
    fn apply_without_prior_still_reduces_the_event() {
        let state = TodoListReducer.apply(None, &DynEvent::new("ADD_ITEM").with_field("text", "a"));
        assert_eq!(state.len(), 1);
        assert_eq!(state[0].text, "a");
    }

    #[test]
    fn unknown_event_returns_the_same_arc() {
        let prior = Arc::new(vec![Arc::new(Todo {
            text: "a".to_string(),
            completed: false,
        })]);

        let next = TodoListReducer.apply(Some(&prior), &DynEvent::new("UNKNOWN"));

        assert!(Arc::ptr_eq(&prior, &next));
        assert!(TodoListReducer.is_unchanged(&prior, &next));
    }

    #[test]
    fn adding_reuses_existing_items() {
        let prior = TodoListReducer.apply(None, &DynEvent::new("ADD_ITEM").with_field("text", "a"));
        let next = TodoListReducer.apply(Some(&prior), &DynEvent::new("ADD_ITEM").with_field("text", "b"));

        assert_eq!(prior.len(), 1);
        assert_eq!(next.len(), 2);
        assert!(Arc::ptr_eq(&prior[0], &next[0]));
        assert!(!TodoListReducer.is_unchanged(&prior, &next));
    }

    #[test]
    fn smart_pointers_are_reducers() {
        let boxed: Box<TodoListReducer> = Box::new(TodoListReducer);
        let shared = Arc::new(TodoListReducer);
        let borrowed = &TodoListReducer;

        let event = DynEvent::new("ADD_ITEM").with_field("text", "x");
        assert_eq!(boxed.apply(None, &event).len(), 1);
        assert_eq!(shared.apply(None, &event).len(), 1);
        assert_eq!(borrowed.apply(None, &event).len(), 1);
    }

    #[test]
    fn fn_reducer_delegates_to_closures() {
        let count = reducer_fn(
            || 10_i32,
            |state: &Arc<i32>, event: &DynEvent| match event.event_type() {
                "DECREMENT" => Arc::new(**state - 1),
                _ => Arc::clone(state),
            },
        );

        assert_eq!(count.initial_state(), 10);
        assert_eq!(*count.apply(None, &DynEvent::new("DECREMENT")), 9);
        assert!(format!("{count:?}").contains("i32"));
    }
}
