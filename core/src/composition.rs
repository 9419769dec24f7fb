//! Reducer composition.
//!
//! [`combine_reducers`] builds one reducer over a [`CombinedState`] from a
//! mapping of slice keys to slice reducers. Each registered reducer sees only
//! its own slice, so the sub-reducers are independent of one another and the
//! order they run in is unobservable.
//!
//! # Unexpected keys
//!
//! The combined reducer only ever emits its registered keys. Slices present in
//! the prior state under any other key are **dropped** from the next state.
//! With [`CombineConfig::warn_unexpected_keys`] enabled (the default in debug
//! builds) every dispatch that drops keys logs a `tracing` warning naming them.
//!
//! # Example
//!
//! ```
//! use slicekit_core::composition::{combine_reducers, slice};
//! use slicekit_core::event::{DynEvent, Event};
//! use slicekit_core::reducer::{reducer_fn, Reducer};
//! use std::sync::Arc;
//!
//! let count = reducer_fn(
//!     || 0_i64,
//!     |state: &Arc<i64>, event: &DynEvent| match event.event_type() {
//!         "INCREMENT" => Arc::new(**state + 1),
//!         _ => Arc::clone(state),
//!     },
//! );
//!
//! let app = combine_reducers([slice("count", count)])?;
//!
//! let state = app.apply(None, &DynEvent::init());
//! let state = app.apply(Some(&state), &DynEvent::new("INCREMENT"));
//! assert_eq!(state.get::<i64>("count").as_deref(), Some(&1));
//! # Ok::<(), slicekit_core::composition::CompositionError>(())
//! ```

use crate::event::Event;
use crate::reducer::Reducer;
use crate::state::{CombinedState, SliceKey, SliceValue, StateError};
use std::any::type_name;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while building or strictly applying a combined reducer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositionError {
    /// Two reducers were registered under the same key.
    #[error("Slice key \"{0}\" is registered more than once")]
    DuplicateKey(SliceKey),

    /// No reducers were registered.
    #[error("A combined reducer needs at least one slice reducer")]
    Empty,

    /// A prior state does not match the registered slice types.
    #[error("State shape mismatch: {0}")]
    Shape(#[from] StateError),
}

/// A reducer with its state type erased, as stored by [`CombinedReducer`].
pub trait SliceReducer<E>: Send + Sync {
    /// Name of the slice state type, for diagnostics.
    fn state_type(&self) -> &'static str;

    /// Returns true if `value` has this reducer's state type.
    fn accepts(&self, value: &SliceValue) -> bool;

    /// The slice's initial value.
    fn initial_slice(&self) -> SliceValue;

    /// Checks a stored slice against this reducer, recursing into nested
    /// combined state.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::SliceTypeMismatch`] if the slice, or a slice
    /// nested inside it, has the wrong type.
    fn check_slice(&self, key: &SliceKey, value: &SliceValue) -> Result<(), StateError>;

    /// Applies the reducer to an erased prior slice.
    ///
    /// A prior of the wrong type is treated as absent. When the reducer
    /// reports no change, the prior value itself is returned.
    fn apply_slice(&self, prior: Option<&SliceValue>, event: &E) -> SliceValue;
}

/// Boxed [`SliceReducer`], the value side of a reducer mapping.
pub type BoxedSliceReducer<E> = Box<dyn SliceReducer<E>>;

struct ErasedReducer<R>(R);

impl<R: Reducer> SliceReducer<R::Event> for ErasedReducer<R> {
    fn state_type(&self) -> &'static str {
        type_name::<R::State>()
    }

    fn accepts(&self, value: &SliceValue) -> bool {
        value.is::<R::State>()
    }

    fn initial_slice(&self) -> SliceValue {
        SliceValue::new(self.0.initial_state())
    }

    fn check_slice(&self, key: &SliceKey, value: &SliceValue) -> Result<(), StateError> {
        let Some(state) = value.downcast::<R::State>() else {
            return Err(StateError::SliceTypeMismatch {
                key: key.clone(),
                expected: self.state_type(),
                found: value.type_name(),
            });
        };
        self.0.check_state(&state)
    }

    fn apply_slice(&self, prior: Option<&SliceValue>, event: &R::Event) -> SliceValue {
        let prior = prior.and_then(SliceValue::downcast::<R::State>);
        let next = self.0.apply(prior.as_ref(), event);

        match prior {
            Some(prior) if self.0.is_unchanged(&prior, &next) => SliceValue::from_arc(prior),
            _ => SliceValue::from_arc(next),
        }
    }
}

/// Pairs a key with a type-erased reducer, ready for [`combine_reducers`].
pub fn slice<R>(key: impl Into<SliceKey>, reducer: R) -> (SliceKey, BoxedSliceReducer<R::Event>)
where
    R: Reducer + 'static,
{
    (key.into(), Box::new(ErasedReducer(reducer)))
}

/// Settings for a [`CombinedReducer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombineConfig {
    /// Log a warning whenever a prior state carries keys that are not
    /// registered (and are therefore dropped).
    pub warn_unexpected_keys: bool,
}

impl CombineConfig {
    /// Sets whether dropped keys are logged.
    #[must_use]
    pub const fn with_warn_unexpected_keys(mut self, warn: bool) -> Self {
        self.warn_unexpected_keys = warn;
        self
    }
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            warn_unexpected_keys: cfg!(debug_assertions),
        }
    }
}

/// Builds a combined reducer from a mapping of slice keys to reducers.
///
/// For every registered key `k`, the combined reducer computes
/// `next[k] = reducers[k].apply(prior[k], event)` and assembles a fresh
/// [`CombinedState`]. With no prior state every sub-reducer receives `None`,
/// so the initial composite is exactly the set of sub-reducer initial values.
///
/// Keys absent from the mapping are dropped from the output (see the module
/// docs).
///
/// # Errors
///
/// Returns [`CompositionError::DuplicateKey`] if a key appears twice and
/// [`CompositionError::Empty`] if the mapping is empty.
///
/// # Example
///
/// ```
/// use slicekit_core::composition::{combine_reducers, slice, CompositionError};
/// use slicekit_core::event::DynEvent;
/// use slicekit_core::reducer::reducer_fn;
/// use std::sync::Arc;
///
/// let passthrough = || reducer_fn(|| 0_u8, |s: &Arc<u8>, _: &DynEvent| Arc::clone(s));
///
/// let result = combine_reducers([slice("a", passthrough()), slice("a", passthrough())]);
/// assert!(matches!(result, Err(CompositionError::DuplicateKey(_))));
/// ```
pub fn combine_reducers<E, K, I>(mapping: I) -> Result<CombinedReducer<E>, CompositionError>
where
    E: Event,
    K: Into<SliceKey>,
    I: IntoIterator<Item = (K, BoxedSliceReducer<E>)>,
{
    mapping
        .into_iter()
        .fold(CombineReducers::new(), |builder, (key, reducer)| {
            builder.boxed_slice(key, reducer)
        })
        .build()
}

/// Builder form of [`combine_reducers`].
pub struct CombineReducers<E> {
    reducers: Vec<(SliceKey, BoxedSliceReducer<E>)>,
    config: CombineConfig,
}

impl<E: Event> CombineReducers<E> {
    /// Starts an empty mapping with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reducers: Vec::new(),
            config: CombineConfig::default(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: CombineConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a reducer for `key`.
    #[must_use]
    pub fn slice<R>(self, key: impl Into<SliceKey>, reducer: R) -> Self
    where
        R: Reducer<Event = E> + 'static,
    {
        let (key, reducer) = slice(key, reducer);
        self.boxed_slice(key, reducer)
    }

    /// Registers an already erased reducer for `key`.
    #[must_use]
    pub fn boxed_slice(mut self, key: impl Into<SliceKey>, reducer: BoxedSliceReducer<E>) -> Self {
        self.reducers.push((key.into(), reducer));
        self
    }

    /// Validates the mapping and builds the combined reducer.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::DuplicateKey`] for the first repeated key
    /// and [`CompositionError::Empty`] if nothing was registered.
    pub fn build(self) -> Result<CombinedReducer<E>, CompositionError> {
        if self.reducers.is_empty() {
            return Err(CompositionError::Empty);
        }

        let mut seen = BTreeSet::new();
        for (key, _) in &self.reducers {
            if !seen.insert(key.clone()) {
                return Err(CompositionError::DuplicateKey(key.clone()));
            }
        }

        tracing::debug!(slices = self.reducers.len(), "Combined reducer built");

        Ok(CombinedReducer {
            reducers: self.reducers,
            config: self.config,
        })
    }
}

impl<E: Event> Default for CombineReducers<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A reducer over [`CombinedState`] that routes each slice to its owner.
///
/// Created by [`combine_reducers`] or [`CombineReducers::build`]. It is itself
/// a [`Reducer`], so combined reducers nest.
pub struct CombinedReducer<E> {
    reducers: Vec<(SliceKey, BoxedSliceReducer<E>)>,
    config: CombineConfig,
}

impl<E: Event> CombinedReducer<E> {
    /// Registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &SliceKey> {
        self.reducers.iter().map(|(key, _)| key)
    }

    /// Number of registered slices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Always false: construction rejects empty mappings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> CombineConfig {
        self.config
    }

    /// Keys present in `state` that no reducer owns.
    #[must_use]
    pub fn unexpected_keys(&self, state: &CombinedState) -> Vec<SliceKey> {
        state
            .keys()
            .filter(|key| !self.reducers.iter().any(|(owned, _)| owned == *key))
            .cloned()
            .collect()
    }

    /// Checks that every registered slice present in `state` has the type its
    /// reducer expects.
    ///
    /// Missing slices are allowed (they initialize on the next dispatch) and
    /// unexpected keys are allowed (they are dropped).
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::Shape`] for the first mismatched slice.
    pub fn check_shape(&self, state: &CombinedState) -> Result<(), CompositionError> {
        Ok(self.check_state(state)?)
    }

    /// Like [`Reducer::apply`], but rejects a malformed prior state instead
    /// of re-initializing its mismatched slices.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::Shape`] if the prior state fails
    /// [`check_shape`](Self::check_shape).
    pub fn try_reduce(
        &self,
        prior: Option<&Arc<CombinedState>>,
        event: &E,
    ) -> Result<Arc<CombinedState>, CompositionError> {
        if let Some(prior) = prior {
            self.check_shape(prior)?;
        }
        Ok(self.apply(prior, event))
    }

    fn combine(&self, prior: Option<&CombinedState>, event: &E) -> CombinedState {
        if let Some(prior) = prior {
            if self.config.warn_unexpected_keys {
                let dropped = self.unexpected_keys(prior);
                if !dropped.is_empty() {
                    tracing::warn!(
                        ?dropped,
                        event_type = event.event_type(),
                        "Prior state has keys with no registered reducer; they will be dropped"
                    );
                }
            }
        }

        let slices = self
            .reducers
            .iter()
            .map(|(key, reducer)| {
                let prior_slice = match prior.and_then(|state| state.slice(key.as_str())) {
                    Some(value) if !reducer.accepts(value) => {
                        tracing::error!(
                            slice = %key,
                            expected = reducer.state_type(),
                            found = value.type_name(),
                            "Slice holds the wrong type, re-initializing it"
                        );
                        None
                    },
                    other => other,
                };

                tracing::trace!(slice = %key, initialized = prior_slice.is_some(), "Reducing slice");
                (key.clone(), reducer.apply_slice(prior_slice, event))
            })
            .collect();

        CombinedState::from_slices(slices)
    }
}

impl<E: Event> Reducer for CombinedReducer<E> {
    type State = CombinedState;
    type Event = E;

    fn initial_state(&self) -> CombinedState {
        CombinedState::from_slices(
            self.reducers
                .iter()
                .map(|(key, reducer)| (key.clone(), reducer.initial_slice()))
                .collect(),
        )
    }

    fn reduce(&self, state: &Arc<CombinedState>, event: &E) -> Arc<CombinedState> {
        Arc::new(self.combine(Some(state), event))
    }

    fn apply(&self, prior: Option<&Arc<CombinedState>>, event: &E) -> Arc<CombinedState> {
        Arc::new(self.combine(prior.map(|state| &**state), event))
    }

    fn is_unchanged(&self, prior: &Arc<CombinedState>, next: &Arc<CombinedState>) -> bool {
        Arc::ptr_eq(prior, next) || prior.shares_slices_with(next)
    }

    fn check_state(&self, state: &CombinedState) -> Result<(), StateError> {
        self.reducers.iter().try_for_each(|(key, reducer)| {
            state
                .slice(key.as_str())
                .map_or(Ok(()), |value| reducer.check_slice(key, value))
        })
    }
}

impl<E> fmt::Debug for CombinedReducer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedReducer")
            .field(
                "slices",
                &self
                    .reducers
                    .iter()
                    .map(|(key, reducer)| (key.as_str(), reducer.state_type()))
                    .collect::<Vec<_>>(),
            )
            .field("config", &self.config)
            .finish()
    }
}
