//! End-to-end reducer scenarios over `DynEvent`s.

#![allow(clippy::unwrap_used)] // Test code
#![allow(clippy::panic)] // Test code
#![allow(missing_docs)]

use serde_json::json;
use slicekit_core::{
    CombinedState, CompositionError, DynEvent, Event, Reducer, combine_reducers, reducer_fn,
    slice,
};
use slicekit_testing::{ReducerTest, contract};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Item {
    text: String,
    completed: bool,
}

impl Item {
    fn open(text: &str) -> Self {
        Self {
            text: text.to_string(),
            completed: false,
        }
    }
}

type List = Vec<Arc<Item>>;

fn count_reducer() -> impl Reducer<State = i64, Event = DynEvent> {
    reducer_fn(
        || 0_i64,
        |state: &Arc<i64>, event: &DynEvent| match event.event_type() {
            "INCREMENT" => Arc::new(**state + 1),
            _ => Arc::clone(state),
        },
    )
}

fn list_reducer() -> impl Reducer<State = List, Event = DynEvent> {
    reducer_fn(List::new, |state: &Arc<List>, event: &DynEvent| {
        match event.event_type() {
            "ADD_ITEM" => {
                let Ok(text) = event.field_as::<String>("text") else {
                    return Arc::clone(state);
                };
                let mut next = List::clone(state);
                next.push(Arc::new(Item {
                    text,
                    completed: false,
                }));
                Arc::new(next)
            },
            "COMPLETE_ITEM" => {
                let Ok(index) = event.field_as::<usize>("index") else {
                    return Arc::clone(state);
                };
                let Some(item) = state.get(index) else {
                    return Arc::clone(state);
                };
                let mut next = List::clone(state);
                next[index] = Arc::new(Item {
                    completed: true,
                    ..Item::clone(item)
                });
                Arc::new(next)
            },
            _ => Arc::clone(state),
        }
    })
}

fn event(value: serde_json::Value) -> DynEvent {
    DynEvent::from_value(value).unwrap()
}

fn dispatch_all<R: Reducer>(
    reducer: &R,
    start: Option<Arc<R::State>>,
    events: &[R::Event],
) -> Arc<R::State> {
    let mut state = start;
    for event in events {
        state = Some(reducer.apply(state.as_ref(), event));
    }
    state.unwrap()
}

#[test]
fn counter_counts_increments_and_ignores_unknown_events() {
    let app = combine_reducers([slice("count", count_reducer())]).unwrap();

    let state = dispatch_all(
        &app,
        None,
        &[
            DynEvent::new("INCREMENT"),
            DynEvent::new("INCREMENT"),
            DynEvent::new("UNKNOWN"),
        ],
    );

    assert_eq!(state.len(), 1);
    assert_eq!(state.get::<i64>("count").map(|c| *c), Some(2));
}

#[test]
fn adding_items_leaves_the_original_list_untouched() {
    let app = combine_reducers([slice("list", list_reducer())]).unwrap();
    let empty = Arc::new(List::new());
    let start = Arc::new(
        CombinedState::builder()
            .shared_slice("list", Arc::clone(&empty))
            .build()
            .unwrap(),
    );

    let state = dispatch_all(
        &app,
        Some(Arc::clone(&start)),
        &[
            event(json!({"type": "ADD_ITEM", "text": "a"})),
            event(json!({"type": "ADD_ITEM", "text": "b"})),
        ],
    );

    let list = state.get::<List>("list").unwrap();
    let items: Vec<Item> = list.iter().map(|item| Item::clone(item)).collect();
    assert_eq!(items, [Item::open("a"), Item::open("b")]);

    assert!(empty.is_empty());
    assert!(Arc::ptr_eq(&start.get::<List>("list").unwrap(), &empty));
}

#[test]
fn completing_an_item_replaces_only_that_element() {
    let prior: List = ["a", "b", "c"].iter().map(|t| Arc::new(Item::open(t))).collect();
    let prior = Arc::new(prior);

    let next = list_reducer().apply(
        Some(&prior),
        &event(json!({"type": "COMPLETE_ITEM", "index": 1})),
    );

    assert!(!Arc::ptr_eq(&prior, &next));
    assert!(Arc::ptr_eq(&prior[0], &next[0]));
    assert!(Arc::ptr_eq(&prior[2], &next[2]));
    assert!(!Arc::ptr_eq(&prior[1], &next[1]));
    assert!(next[1].completed);
    assert_eq!(next[1].text, "b");
    assert!(!prior[1].completed);
}

#[test]
fn completing_an_out_of_range_item_is_a_no_op() {
    let prior = Arc::new(vec![Arc::new(Item::open("a"))]);

    ReducerTest::new(list_reducer())
        .given_shared_state(prior)
        .when_event(event(json!({"type": "COMPLETE_ITEM", "index": 5})))
        .then_unchanged()
        .run();
}

#[test]
fn duplicate_keys_are_rejected_before_any_dispatch() {
    let result = combine_reducers([
        slice("count", count_reducer()),
        slice("count", count_reducer()),
    ]);

    match result {
        Err(CompositionError::DuplicateKey(key)) => assert_eq!(key.as_str(), "count"),
        other => panic!("expected a duplicate key error, got {other:?}"),
    }
}

#[test]
fn combined_slices_match_their_owners() {
    let app = combine_reducers([
        slice("count", count_reducer()),
        slice("list", list_reducer()),
    ])
    .unwrap();
    let prior = app.apply(None, &DynEvent::init());

    for incoming in [
        DynEvent::new("INCREMENT"),
        event(json!({"type": "ADD_ITEM", "text": "x"})),
        DynEvent::new("UNKNOWN"),
    ] {
        contract::assert_pointwise(&app, "count", &count_reducer(), Some(&prior), &incoming);
        contract::assert_pointwise(&app, "list", &list_reducer(), Some(&prior), &incoming);
    }
}

#[test]
fn unrelated_slice_keeps_identity_when_another_changes() {
    let app = combine_reducers([
        slice("count", count_reducer()),
        slice("list", list_reducer()),
    ])
    .unwrap();
    let prior = app.apply(None, &DynEvent::init());
    let next = app.apply(Some(&prior), &DynEvent::new("INCREMENT"));

    assert!(
        prior
            .slice("list")
            .unwrap()
            .ptr_eq(next.slice("list").unwrap())
    );
    assert!(!app.is_unchanged(&prior, &next));
}
