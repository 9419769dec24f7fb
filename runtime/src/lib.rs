//! # Slicekit Runtime
//!
//! Runtime implementation for slicekit reducers.
//!
//! This crate provides the [`Store`]: the thin layer that holds "the" current
//! state and performs `state = reducer.apply(state, event)` for every event.
//!
//! ## Core Components
//!
//! - **Store**: Owns one state lineage and serializes dispatches against it
//! - **Subscriptions**: `tokio::sync::watch` receivers notified on change
//! - **Configuration**: [`StoreConfig`]
//!
//! ## Example
//!
//! ```
//! use slicekit_core::{DynEvent, Event, combine_reducers, reducer_fn, slice};
//! use slicekit_runtime::Store;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let count = reducer_fn(
//!     || 0_i64,
//!     |state: &Arc<i64>, event: &DynEvent| match event.event_type() {
//!         "INCREMENT" => Arc::new(**state + 1),
//!         _ => Arc::clone(state),
//!     },
//! );
//!
//! let store = Store::new(combine_reducers([slice("count", count)])?);
//!
//! store.send(DynEvent::new("INCREMENT")).await?;
//! let count = store.state_with(|s| s.get::<i64>("count").map(|c| *c));
//! assert_eq!(count, Some(1));
//! # Ok(())
//! # }
//! ```

use slicekit_core::reducer::Reducer;
use std::sync::Arc;

/// Error types for the Store runtime
pub mod error {
    use slicekit_core::state::StateError;
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new events
        ///
        /// This error is returned when `send()` is called after `shutdown()`.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// A preloaded state does not fit the reducer
        #[error("Preloaded state rejected: {0}")]
        InvalidState(#[from] StateError),
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use slicekit_runtime::StoreConfig;
///
/// let config = StoreConfig::default()
///     .with_name("todos")
///     .with_notify_unchanged(true);
///
/// assert_eq!(config.name, "todos");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Name used in log fields
    pub name: String,
    /// Notify watchers even when a dispatch left the state unchanged
    pub notify_unchanged: bool,
}

impl StoreConfig {
    /// Set the store name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set whether unchanged dispatches notify watchers
    #[must_use]
    pub const fn with_notify_unchanged(mut self, notify: bool) -> Self {
        self.notify_unchanged = notify;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "store".to_string(),
            notify_unchanged: false,
        }
    }
}

/// Outcome of one dispatch
#[derive(Debug)]
pub struct Dispatched<S> {
    /// The state adopted by the store
    pub state: Arc<S>,
    /// Whether the reducer reported a change
    pub changed: bool,
}

impl<S> Clone for Dispatched<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            changed: self.changed,
        }
    }
}

/// The Store module
pub mod store {
    use super::{Arc, Dispatched, Reducer, StoreConfig, StoreError};
    use slicekit_core::composition::CombinedReducer;
    use slicekit_core::event::{Event, InitEvent};
    use slicekit_core::state::CombinedState;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::{Mutex, watch};

    struct Inner<R: Reducer> {
        reducer: R,
        config: StoreConfig,
        /// Held for the whole of a dispatch; one writer per lineage
        writer: Mutex<()>,
        state: watch::Sender<Arc<R::State>>,
        shutdown: AtomicBool,
    }

    /// The Store - holder of one state lineage
    ///
    /// The Store manages:
    /// 1. State (the latest value returned by the reducer)
    /// 2. Reducer (the pure update function)
    /// 3. Dispatch ordering (one event at a time)
    /// 4. Change notification for watchers
    ///
    /// Every dispatch receives exactly the state returned by the previous
    /// one. Concurrent `send()` calls queue on an async mutex.
    ///
    /// Cloning a Store yields another handle to the same lineage.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let store = Store::new(app_reducer()?);
    ///
    /// store.send(TodoEvent::AddItem { text: "buy milk".into() }).await?;
    /// let items = store.state_with(|s| s.get::<TodoList>("todos"));
    /// ```
    pub struct Store<R: Reducer> {
        inner: Arc<Inner<R>>,
    }

    impl<R: Reducer> Store<R>
    where
        R::Event: InitEvent,
    {
        /// Create a store whose state is initialized by the reducer
        ///
        /// The initial state is `reducer.apply(None, &init)`, where `init` is
        /// the synthetic initialization event.
        #[must_use]
        pub fn new(reducer: R) -> Self {
            Self::with_config(reducer, StoreConfig::default())
        }

        /// Create a store with custom configuration
        #[must_use]
        pub fn with_config(reducer: R, config: StoreConfig) -> Self {
            let init = <R::Event as InitEvent>::init();
            let state = reducer.apply(None, &init);
            tracing::debug!(store = %config.name, "Store initialized");
            Self::from_parts(reducer, state, config)
        }
    }

    impl<R: Reducer> Store<R> {
        /// Create a store from a preloaded state
        ///
        /// No initialization event is dispatched. The state is checked with
        /// [`Reducer::check_state`] before it is adopted.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::InvalidState`] if the reducer rejects the state.
        pub fn with_state(reducer: R, state: Arc<R::State>) -> Result<Self, StoreError> {
            Self::preloaded(reducer, state, StoreConfig::default())
        }

        fn preloaded(
            reducer: R,
            state: Arc<R::State>,
            config: StoreConfig,
        ) -> Result<Self, StoreError> {
            if let Err(error) = reducer.check_state(&state) {
                tracing::error!(store = %config.name, %error, "Preloaded state rejected");
                return Err(error.into());
            }
            Ok(Self::from_parts(reducer, state, config))
        }

        fn from_parts(reducer: R, state: Arc<R::State>, config: StoreConfig) -> Self {
            let (state, _) = watch::channel(state);
            Self {
                inner: Arc::new(Inner {
                    reducer,
                    config,
                    writer: Mutex::new(()),
                    state,
                    shutdown: AtomicBool::new(false),
                }),
            }
        }

        /// Send an event to the store
        ///
        /// 1. Waits for any dispatch in progress to finish
        /// 2. Calls the reducer with the current state and the event
        /// 3. Adopts the returned state
        /// 4. Notifies watchers if the state changed
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        ///
        /// # Panics
        ///
        /// If the reducer panics, the panic propagates to the caller and the
        /// store keeps the last adopted state.
        #[tracing::instrument(
            skip(self, event),
            name = "store_send",
            fields(store = %self.inner.config.name, event_type = event.event_type())
        )]
        pub async fn send(&self, event: R::Event) -> Result<Dispatched<R::State>, StoreError> {
            if self.inner.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected event: store is shutting down");
                metrics::counter!("store.shutdown.rejected_events").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            let _writer = self.inner.writer.lock().await;
            tracing::trace!("Acquired writer lock");

            // shutdown() may have run while this send waited for the lock
            if self.inner.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected queued event: store is shutting down");
                metrics::counter!("store.shutdown.rejected_events").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.events.total").increment(1);

            let prior = Arc::clone(&*self.inner.state.borrow());

            let start = std::time::Instant::now();
            let next = self.inner.reducer.apply(Some(&prior), &event);
            metrics::histogram!("store.reducer.duration_seconds")
                .record(start.elapsed().as_secs_f64());

            let changed = !self.inner.reducer.is_unchanged(&prior, &next);
            let notify = changed || self.inner.config.notify_unchanged;

            self.inner.state.send_if_modified(|current| {
                *current = Arc::clone(&next);
                notify
            });

            if changed {
                tracing::debug!("State changed");
            } else {
                metrics::counter!("store.events.unchanged").increment(1);
                tracing::debug!("State unchanged");
            }

            Ok(Dispatched {
                state: next,
                changed,
            })
        }

        /// Snapshot of the current state
        #[must_use]
        pub fn state(&self) -> Arc<R::State> {
            Arc::clone(&*self.inner.state.borrow())
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let done = store.state_with(|s| s.iter().filter(|t| t.completed).count());
        /// ```
        pub fn state_with<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&R::State) -> T,
        {
            let state = self.state();
            f(&state)
        }

        /// Watch the state
        ///
        /// The receiver holds the latest state and is marked changed after
        /// every dispatch that changed it (or after every dispatch, with
        /// [`StoreConfig::notify_unchanged`]).
        #[must_use]
        pub fn subscribe(&self) -> watch::Receiver<Arc<R::State>> {
            self.inner.state.subscribe()
        }

        /// Stop accepting events
        ///
        /// A dispatch already holding the writer lock completes; every other
        /// `send()`, including those queued for the lock, fails with
        /// [`StoreError::ShutdownInProgress`].
        pub fn shutdown(&self) {
            tracing::info!(store = %self.inner.config.name, "Store shutting down");
            self.inner.shutdown.store(true, Ordering::Release);
        }

        /// Returns true once [`shutdown`](Self::shutdown) has been called
        #[must_use]
        pub fn is_shut_down(&self) -> bool {
            self.inner.shutdown.load(Ordering::Acquire)
        }

        /// The reducer driving this store
        #[must_use]
        pub fn reducer(&self) -> &R {
            &self.inner.reducer
        }

        /// The active configuration
        #[must_use]
        pub fn config(&self) -> &StoreConfig {
            &self.inner.config
        }
    }

    impl<E: Event> Store<CombinedReducer<E>> {
        /// Create a store from a preloaded combined state
        ///
        /// The state is checked against the reducer's slice types before it is
        /// adopted. Missing slices initialize on the first dispatch and
        /// unregistered keys are dropped by it.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::InvalidState`] if a slice holds a value of
        /// the wrong type.
        pub fn with_combined_state(
            reducer: CombinedReducer<E>,
            state: CombinedState,
            config: StoreConfig,
        ) -> Result<Self, StoreError> {
            Self::preloaded(reducer, Arc::new(state), config)
        }
    }

    impl<R: Reducer> Clone for Store<R> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<R: Reducer + std::fmt::Debug> std::fmt::Debug for Store<R> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Store")
                .field("reducer", &self.inner.reducer)
                .field("config", &self.inner.config)
                .field("shut_down", &self.is_shut_down())
                .finish_non_exhaustive()
        }
    }
}

// Re-export for convenience
pub use store::Store;

// Test module
#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use slicekit_core::composition::{CombineReducers, CombinedReducer};
    use slicekit_core::event::{Event, InitEvent};
    use slicekit_core::state::CombinedState;

    #[derive(Debug, Clone)]
    enum TestEvent {
        Init,
        Increment,
        NoOp,
        Panic,
    }

    impl Event for TestEvent {
        fn event_type(&self) -> &str {
            match self {
                Self::Init => slicekit_core::event::INIT_EVENT_TYPE,
                Self::Increment => "INCREMENT",
                Self::NoOp => "NO_OP",
                Self::Panic => "PANIC",
            }
        }
    }

    impl InitEvent for TestEvent {
        fn init() -> Self {
            Self::Init
        }
    }

    #[derive(Debug, Clone)]
    struct TestReducer;

    impl Reducer for TestReducer {
        type State = i32;
        type Event = TestEvent;

        fn initial_state(&self) -> i32 {
            0
        }

        #[allow(clippy::panic)]
        fn reduce(&self, state: &Arc<i32>, event: &TestEvent) -> Arc<i32> {
            match event {
                TestEvent::Increment => Arc::new(**state + 1),
                TestEvent::Panic => panic!("reducer bug"),
                TestEvent::Init | TestEvent::NoOp => Arc::clone(state),
            }
        }
    }

    fn combined() -> CombinedReducer<TestEvent> {
        CombineReducers::new().slice("count", TestReducer).build().unwrap()
    }

    #[tokio::test]
    async fn test_store_initializes_from_reducer() {
        let store = Store::new(TestReducer);
        assert_eq!(*store.state(), 0);
    }

    #[tokio::test]
    async fn test_send_adopts_new_state() {
        let store = Store::new(TestReducer);

        let first = store.send(TestEvent::Increment).await.unwrap();
        assert!(first.changed);
        assert_eq!(*first.state, 1);

        let second = store.send(TestEvent::NoOp).await.unwrap();
        assert!(!second.changed);
        assert!(Arc::ptr_eq(&first.state, &second.state));
        assert_eq!(*store.state(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_only_changes() {
        let store = Store::new(TestReducer);
        let mut rx = store.subscribe();

        store.send(TestEvent::NoOp).await.unwrap();
        assert!(!rx.has_changed().unwrap());

        store.send(TestEvent::Increment).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(**rx.borrow_and_update(), 1);
    }

    #[tokio::test]
    async fn test_notify_unchanged_config() {
        let store = Store::with_config(
            TestReducer,
            StoreConfig::default().with_notify_unchanged(true),
        );
        let mut rx = store.subscribe();

        store.send(TestEvent::NoOp).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(**rx.borrow_and_update(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_events() {
        let store = Store::new(TestReducer);
        store.shutdown();

        assert!(store.is_shut_down());
        let result = store.send(TestEvent::Increment).await;
        assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
        assert_eq!(*store.state(), 0);
    }

    #[tokio::test]
    async fn test_reducer_panic_keeps_last_state() {
        let store = Store::new(TestReducer);
        store.send(TestEvent::Increment).await.unwrap();

        let handle = {
            let store = store.clone();
            tokio::spawn(async move { store.send(TestEvent::Panic).await })
        };
        assert!(handle.await.unwrap_err().is_panic());

        assert_eq!(*store.state(), 1);
        store.send(TestEvent::Increment).await.unwrap();
        assert_eq!(*store.state(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_sends_serialize() {
        let store = Store::new(TestReducer);

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.send(TestEvent::Increment).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(*store.state(), 50);
    }

    #[tokio::test]
    async fn test_combined_store_reports_no_change_by_slice_identity() {
        let store = Store::new(combined());

        let unchanged = store.send(TestEvent::NoOp).await.unwrap();
        assert!(!unchanged.changed);

        let changed = store.send(TestEvent::Increment).await.unwrap();
        assert!(changed.changed);
        assert_eq!(store.state_with(|s| s.get::<i32>("count").map(|c| *c)), Some(1));
    }

    #[tokio::test]
    async fn test_with_combined_state_validates_shape() {
        let good = CombinedState::builder().slice("count", 41_i32).build().unwrap();
        let store = Store::with_combined_state(combined(), good, StoreConfig::default()).unwrap();
        store.send(TestEvent::Increment).await.unwrap();
        assert_eq!(store.state().get::<i32>("count").map(|c| *c), Some(42));

        let bad = CombinedState::builder().slice("count", "41".to_string()).build().unwrap();
        let result = Store::with_combined_state(combined(), bad, StoreConfig::default());
        assert!(matches!(result, Err(StoreError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_with_state_skips_initialization() {
        let store = Store::with_state(TestReducer, Arc::new(7)).unwrap();
        assert_eq!(*store.state(), 7);
        assert_eq!(store.config().name, "store");
    }
}
