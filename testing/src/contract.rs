//! Checks for the reducer contract.
//!
//! Each helper panics with a descriptive message when a reducer breaks one of
//! the rules every reducer must follow: purity, identity on unknown events,
//! initialization from an absent state, pointwise composition and slice
//! identity propagation. They are meant to be called from unit tests and
//! from `proptest!` bodies.

#![allow(clippy::panic)] // Test assertions
#![allow(clippy::missing_panics_doc)] // Every helper panics on violation; see module docs

use slicekit_core::composition::CombinedReducer;
use slicekit_core::event::{Event, InitEvent};
use slicekit_core::reducer::Reducer;
use slicekit_core::state::CombinedState;
use std::fmt::Debug;
use std::sync::Arc;

/// Reduces the same inputs twice and checks that the outputs are equal and
/// that neither input was modified.
pub fn assert_pure<R>(reducer: &R, prior: Option<&Arc<R::State>>, event: &R::Event)
where
    R: Reducer + ?Sized,
    R::State: Clone + PartialEq + Debug,
    R::Event: Clone + PartialEq + Debug,
{
    let prior_snapshot = prior.map(|state| (**state).clone());
    let event_snapshot = event.clone();

    let first = reducer.apply(prior, event);
    let second = reducer.apply(prior, event);

    assert_eq!(
        *first,
        *second,
        "Reducer returned different states for identical inputs (event {:?})",
        event.event_type()
    );

    if let (Some(prior), Some(snapshot)) = (prior, prior_snapshot.as_ref()) {
        assert_eq!(**prior, *snapshot, "Reducer modified its prior state");
    }
    assert_eq!(*event, event_snapshot, "Reducer modified its event");
}

/// Checks that an event the reducer does not handle leaves the state
/// unchanged by identity.
pub fn assert_identity_on_unknown<R>(reducer: &R, prior: &Arc<R::State>, event: &R::Event)
where
    R: Reducer + ?Sized,
{
    let next = reducer.apply(Some(prior), event);
    assert!(
        reducer.is_unchanged(prior, &next),
        "Reducer replaced its state for unrecognized event type {:?}",
        event.event_type()
    );
}

/// Checks that reducing from an absent state matches reducing from the
/// reducer's initial state.
pub fn assert_initializes<R>(reducer: &R, event: &R::Event)
where
    R: Reducer + ?Sized,
    R::State: PartialEq + Debug,
{
    let from_none = reducer.apply(None, event);
    let from_initial = reducer.apply(Some(&Arc::new(reducer.initial_state())), event);

    assert_eq!(
        *from_none,
        *from_initial,
        "Reducing {:?} from no state differs from reducing it from the initial state",
        event.event_type()
    );
}

/// Checks that the synthetic initialization event yields exactly the
/// initial state.
pub fn assert_init_yields_initial_state<R>(reducer: &R)
where
    R: Reducer + ?Sized,
    R::State: PartialEq + Debug,
    R::Event: InitEvent,
{
    let state = reducer.apply(None, &<R::Event as InitEvent>::init());
    assert_eq!(
        *state,
        reducer.initial_state(),
        "Initialization event did not produce the initial state"
    );
}

/// Checks that the slice under `key` after a combined update equals what the
/// slice's owner computes from the prior slice alone.
pub fn assert_pointwise<E, R>(
    combined: &CombinedReducer<E>,
    key: &str,
    owner: &R,
    prior: Option<&Arc<CombinedState>>,
    event: &E,
) where
    E: Event,
    R: Reducer<Event = E> + ?Sized,
    R::State: PartialEq + Debug,
{
    let next = combined.apply(prior, event);
    let prior_slice = prior.and_then(|state| state.get::<R::State>(key));
    let expected = owner.apply(prior_slice.as_ref(), event);

    let Some(actual) = next.get::<R::State>(key) else {
        panic!("Combined state has no {key:?} slice of the owner's type: {next:?}");
    };

    assert_eq!(
        *actual,
        *expected,
        "Slice {key:?} differs from its owner's result for event {:?}",
        event.event_type()
    );
}

/// Checks that every slice of `next` is the same allocation as in `prior`.
pub fn assert_slices_preserved(prior: &CombinedState, next: &CombinedState) {
    assert!(
        prior.shares_slices_with(next),
        "Expected every slice to keep its identity.\n prior: {prior:?}\n next:  {next:?}"
    );
}
