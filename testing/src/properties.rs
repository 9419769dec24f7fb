//! Property-based testing utilities using proptest.
//!
//! Strategies for generating events, used to check the reducer contract over
//! many inputs instead of a handful of hand-picked ones.

use proptest::collection::btree_map;
use proptest::prelude::*;
use serde_json::Value;
use slicekit_core::event::{DynEvent, Event};

/// Discriminants shaped like conventional event types (`SCREAMING_SNAKE`).
pub fn arb_event_type() -> impl Strategy<Value = String> {
    "[A-Z][A-Z_]{0,15}"
}

/// Small scalar JSON payload values.
pub fn arb_payload_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z ]{0,12}".prop_map(Value::from),
    ]
}

/// Open-set events with up to three payload fields.
pub fn arb_dyn_event() -> impl Strategy<Value = DynEvent> {
    (
        arb_event_type(),
        btree_map("[a-z]{1,6}", arb_payload_value(), 0..4),
    )
        .prop_map(|(event_type, payload)| {
            payload
                .into_iter()
                .fold(DynEvent::new(event_type), |event, (key, value)| {
                    event.with_field(key, value)
                })
        })
}

/// Events whose discriminant is none of `known`.
pub fn arb_unknown_dyn_event(known: &'static [&'static str]) -> impl Strategy<Value = DynEvent> {
    arb_dyn_event().prop_filter("event type must not be handled", move |event| {
        !known.contains(&event.event_type())
    })
}
