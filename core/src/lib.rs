//! # Slicekit Core
//!
//! Core traits and types for building application state out of pure,
//! composable slice reducers.
//!
//! ## Core Concepts
//!
//! - **Event**: An immutable record with a discriminant and a payload
//! - **Reducer**: Pure function `(Option<State>, Event) → State`
//! - **Slice**: One named part of the application state, owned by exactly one reducer
//! - **Composer**: [`combine_reducers`] builds one reducer over a
//!   [`CombinedState`] from a mapping of slice keys to reducers
//!
//! ## Architecture Principles
//!
//! - Unidirectional Data Flow
//! - Immutable state, shared structurally through `Arc`
//! - Identity means "unchanged": an unrecognized event returns the prior `Arc`
//! - No internal mutable state; the store holding "the" state lives in
//!   `slicekit-runtime`
//!
//! ## Example
//!
//! ```
//! use slicekit_core::{combine_reducers, slice, DynEvent, Event, Reducer};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Item {
//!     text: String,
//!     completed: bool,
//! }
//!
//! struct ListReducer;
//!
//! impl Reducer for ListReducer {
//!     type State = Vec<Arc<Item>>;
//!     type Event = DynEvent;
//!
//!     fn initial_state(&self) -> Self::State {
//!         Vec::new()
//!     }
//!
//!     fn reduce(&self, state: &Arc<Self::State>, event: &DynEvent) -> Arc<Self::State> {
//!         match (event.event_type(), event.field_as::<String>("text")) {
//!             ("ADD_ITEM", Ok(text)) => {
//!                 let mut next: Vec<_> = state.iter().cloned().collect();
//!                 next.push(Arc::new(Item { text, completed: false }));
//!                 Arc::new(next)
//!             }
//!             _ => Arc::clone(state),
//!         }
//!     }
//! }
//!
//! let app = combine_reducers([slice("list", ListReducer)])?;
//! let state = app.apply(None, &DynEvent::init());
//! let state = app.apply(Some(&state), &DynEvent::new("ADD_ITEM").with_field("text", "a"));
//!
//! let list = state.get::<Vec<Arc<Item>>>("list").unwrap_or_default();
//! assert_eq!(list.len(), 1);
//! # Ok::<(), slicekit_core::CompositionError>(())
//! ```

/// Events and the open-set [`DynEvent`](event::DynEvent)
pub mod event;

/// The reducer contract
pub mod reducer;

/// Composite state and type-erased slices
pub mod state;

/// Combining slice reducers into one reducer
pub mod composition;

pub use composition::{
    BoxedSliceReducer, CombineConfig, CombineReducers, CombinedReducer, CompositionError,
    SliceReducer, combine_reducers, slice,
};
pub use event::{DynEvent, Event, EventError, INIT_EVENT_TYPE, InitEvent};
pub use reducer::{FnReducer, Reducer, reducer_fn};
pub use state::{CombinedState, CombinedStateBuilder, SliceKey, SliceValue, StateError};
