//! Property tests for the reducer contract and the composer.

#![allow(clippy::unwrap_used)] // Test code
#![allow(missing_docs)]

use proptest::prelude::*;
use slicekit_core::{
    CombinedReducer, CombinedState, DynEvent, Event, Reducer, combine_reducers, reducer_fn, slice,
};
use slicekit_testing::contract::{
    assert_identity_on_unknown, assert_initializes, assert_pointwise, assert_pure,
    assert_slices_preserved,
};
use slicekit_testing::properties::{arb_dyn_event, arb_unknown_dyn_event};
use std::sync::Arc;

const HANDLED: &[&str] = &["INCREMENT", "DECREMENT", "APPEND"];

fn counter() -> impl Reducer<State = i64, Event = DynEvent> {
    reducer_fn(
        || 0_i64,
        |state: &Arc<i64>, event: &DynEvent| match event.event_type() {
            "INCREMENT" => Arc::new(state.saturating_add(1)),
            "DECREMENT" => Arc::new(state.saturating_sub(1)),
            _ => Arc::clone(state),
        },
    )
}

fn log() -> impl Reducer<State = Vec<String>, Event = DynEvent> {
    reducer_fn(Vec::new, |state: &Arc<Vec<String>>, event: &DynEvent| {
        match (event.event_type(), event.field_as::<String>("text")) {
            ("APPEND", Ok(text)) => {
                let mut next = Vec::clone(state);
                next.push(text);
                Arc::new(next)
            },
            _ => Arc::clone(state),
        }
    })
}

fn app() -> CombinedReducer<DynEvent> {
    combine_reducers([slice("counter", counter()), slice("log", log())]).unwrap()
}

fn nested() -> CombinedReducer<DynEvent> {
    combine_reducers([slice("app", app()), slice("total", counter())]).unwrap()
}

fn arb_handled_event() -> impl Strategy<Value = DynEvent> {
    prop_oneof![
        Just(DynEvent::new("INCREMENT")),
        Just(DynEvent::new("DECREMENT")),
        "[a-z]{0,8}".prop_map(|text| DynEvent::new("APPEND").with_field("text", text)),
    ]
}

fn arb_event() -> impl Strategy<Value = DynEvent> {
    prop_oneof![arb_handled_event(), arb_dyn_event()]
}

fn arb_prior() -> impl Strategy<Value = Option<Arc<CombinedState>>> {
    prop::collection::vec(arb_event(), 0..8).prop_map(|events| {
        let app = app();
        let mut state: Option<Arc<CombinedState>> = None;
        for event in &events {
            state = Some(app.apply(state.as_ref(), event));
        }
        state
    })
}

proptest! {
    #[test]
    fn reducers_are_pure(start in any::<i64>(), event in arb_event()) {
        assert_pure(&counter(), Some(&Arc::new(start)), &event);
        assert_pure(&counter(), None, &event);
        assert_pure(&log(), None, &event);
    }

    #[test]
    fn unknown_events_return_the_same_state(
        start in any::<i64>(),
        event in arb_unknown_dyn_event(HANDLED),
    ) {
        assert_identity_on_unknown(&counter(), &Arc::new(start), &event);
        assert_identity_on_unknown(&log(), &Arc::new(vec!["x".to_string()]), &event);
    }

    #[test]
    fn absent_state_behaves_like_initial_state(event in arb_event()) {
        assert_initializes(&counter(), &event);
        assert_initializes(&log(), &event);

        let from_none = app().apply(None, &event);
        prop_assert_eq!(
            from_none.keys().map(|key| key.as_str()).collect::<Vec<_>>(),
            ["counter", "log"]
        );
    }

    #[test]
    fn combined_state_is_pointwise(prior in arb_prior(), event in arb_event()) {
        let app = app();
        assert_pointwise(&app, "counter", &counter(), prior.as_ref(), &event);
        assert_pointwise(&app, "log", &log(), prior.as_ref(), &event);
    }

    #[test]
    fn unchanged_slices_keep_identity(
        prior in arb_prior(),
        event in arb_unknown_dyn_event(HANDLED),
    ) {
        let app = app();
        let prior = prior.unwrap_or_else(|| app.apply(None, &DynEvent::init()));
        let next = app.apply(Some(&prior), &event);

        prop_assert!(!Arc::ptr_eq(&prior, &next));
        assert_slices_preserved(&prior, &next);
        prop_assert!(app.is_unchanged(&prior, &next));
    }

    #[test]
    fn nested_composers_preserve_identity(event in arb_unknown_dyn_event(HANDLED)) {
        let nested = nested();
        let prior = nested.apply(None, &DynEvent::init());
        let next = nested.apply(Some(&prior), &event);

        assert_slices_preserved(&prior, &next);
        prop_assert!(nested.is_unchanged(&prior, &next));
    }

    #[test]
    fn handled_events_change_the_combined_state(prior in arb_prior(), event in arb_handled_event()) {
        let app = app();
        let prior = prior.unwrap_or_else(|| app.apply(None, &DynEvent::init()));
        let next = app.apply(Some(&prior), &event);

        let counter_changed = !prior.slice("counter").unwrap().ptr_eq(next.slice("counter").unwrap());
        let log_changed = !prior.slice("log").unwrap().ptr_eq(next.slice("log").unwrap());
        prop_assert_eq!(app.is_unchanged(&prior, &next), !(counter_changed || log_changed));
    }
}
