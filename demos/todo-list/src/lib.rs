//! # Todo List Demo
//!
//! A todo list built from two slices:
//! - `items`: the list of todo items ([`ItemsReducer`])
//! - `visibility`: which items a view should show ([`VisibilityReducer`])
//!
//! Both reducers see every [`TodoEvent`] and ignore the ones they do not
//! own. [`app_reducer`] combines them into one reducer over a
//! [`CombinedState`].
//!
//! ## Example
//!
//! ```no_run
//! use slicekit_runtime::Store;
//! use todo_list::{TodoEvent, app_reducer, visible_items};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Store::new(app_reducer()?);
//!
//! store.send(TodoEvent::AddItem { text: "Buy milk".to_string() }).await?;
//! store.send(TodoEvent::CompleteItem { index: 0 }).await?;
//!
//! let visible = store.state_with(visible_items);
//! println!("Visible todos: {}", visible.len());
//! # Ok(())
//! # }
//! ```

use slicekit_core::composition::{CombinedReducer, CompositionError, combine_reducers, slice};
use slicekit_core::reducer::Reducer;
use slicekit_core::state::CombinedState;
use slicekit_macros::Event;
use std::sync::Arc;

/// Slice key of the item list
pub const ITEMS: &str = "items";

/// Slice key of the visibility filter
pub const VISIBILITY: &str = "visibility";

/// A single todo item
///
/// Items are shared between successive lists; completing one replaces only
/// that item's `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    /// What needs doing
    pub text: String,
    /// Whether it is done
    pub completed: bool,
}

/// The `items` slice
pub type TodoItems = Vec<Arc<TodoItem>>;

/// Which items a view should show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VisibilityFilter {
    /// Every item
    #[default]
    All,
    /// Items not yet completed
    Active,
    /// Completed items
    Completed,
}

impl VisibilityFilter {
    /// Whether `item` passes this filter
    #[must_use]
    pub const fn shows(self, item: &TodoItem) -> bool {
        match self {
            Self::All => true,
            Self::Active => !item.completed,
            Self::Completed => item.completed,
        }
    }
}

/// Todo list events
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub enum TodoEvent {
    /// Store initialization
    #[init]
    Init,
    /// Append an open item
    AddItem {
        /// Item text
        text: String,
    },
    /// Mark the item at `index` completed
    CompleteItem {
        /// Position in the list
        index: usize,
    },
    /// Remove every completed item
    ClearCompleted,
    /// Change the visibility filter
    #[event_type = "VISIBILITY/SET"]
    SetVisibility {
        /// New filter
        filter: VisibilityFilter,
    },
}

/// Reducer for the `items` slice
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemsReducer;

impl Reducer for ItemsReducer {
    type State = TodoItems;
    type Event = TodoEvent;

    fn initial_state(&self) -> TodoItems {
        Vec::new()
    }

    fn reduce(&self, state: &Arc<TodoItems>, event: &TodoEvent) -> Arc<TodoItems> {
        match event {
            TodoEvent::AddItem { text } => {
                let mut next = TodoItems::clone(state);
                next.push(Arc::new(TodoItem {
                    text: text.clone(),
                    completed: false,
                }));
                Arc::new(next)
            },
            TodoEvent::CompleteItem { index } => match state.get(*index) {
                Some(item) if !item.completed => {
                    let mut next = TodoItems::clone(state);
                    next[*index] = Arc::new(TodoItem {
                        completed: true,
                        ..TodoItem::clone(item)
                    });
                    Arc::new(next)
                },
                Some(_) => Arc::clone(state),
                None => {
                    tracing::debug!(index, len = state.len(), "No item to complete");
                    Arc::clone(state)
                },
            },
            TodoEvent::ClearCompleted if state.iter().any(|item| item.completed) => Arc::new(
                state
                    .iter()
                    .filter(|item| !item.completed)
                    .cloned()
                    .collect(),
            ),
            _ => Arc::clone(state),
        }
    }
}

/// Reducer for the `visibility` slice
#[derive(Debug, Clone, Copy, Default)]
pub struct VisibilityReducer;

impl Reducer for VisibilityReducer {
    type State = VisibilityFilter;
    type Event = TodoEvent;

    fn initial_state(&self) -> VisibilityFilter {
        VisibilityFilter::default()
    }

    fn reduce(&self, state: &Arc<VisibilityFilter>, event: &TodoEvent) -> Arc<VisibilityFilter> {
        match event {
            TodoEvent::SetVisibility { filter } if filter != &**state => Arc::new(*filter),
            _ => Arc::clone(state),
        }
    }
}

/// The application reducer: `items` and `visibility` combined
///
/// # Errors
///
/// Never fails for this fixed mapping; the `Result` comes from
/// [`combine_reducers`].
pub fn app_reducer() -> Result<CombinedReducer<TodoEvent>, CompositionError> {
    combine_reducers([slice(ITEMS, ItemsReducer), slice(VISIBILITY, VisibilityReducer)])
}

/// Items that pass the current visibility filter
#[must_use]
pub fn visible_items(state: &CombinedState) -> TodoItems {
    let filter = state
        .get::<VisibilityFilter>(VISIBILITY)
        .map_or(VisibilityFilter::All, |filter| *filter);

    state
        .get::<TodoItems>(ITEMS)
        .map(|items| {
            items
                .iter()
                .filter(|item| filter.shows(item))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}
