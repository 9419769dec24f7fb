//! Composite state: an immutable map from slice key to slice value.
//!
//! Slice values are type-erased `Arc`s. Erasure keeps the original
//! allocation, so a slice read back with [`CombinedState::get`] is
//! pointer-identical to the `Arc` its reducer returned.

use std::any::{Any, type_name};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised when reading or assembling a [`CombinedState`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// No slice is stored under the key.
    #[error("No slice stored under key \"{0}\"")]
    MissingSlice(SliceKey),

    /// The slice stored under the key has a different type.
    #[error("Slice \"{key}\" holds {found}, expected {expected}")]
    SliceTypeMismatch {
        /// Slice key
        key: SliceKey,
        /// Type the caller asked for
        expected: &'static str,
        /// Type actually stored
        found: &'static str,
    },

    /// The same key was inserted twice while building a state.
    #[error("Slice key \"{0}\" inserted more than once")]
    DuplicateSlice(SliceKey),
}

/// Name of a state slice.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SliceKey(Arc<str>);

impl SliceKey {
    /// Creates a key.
    #[must_use]
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SliceKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for SliceKey {
    fn from(key: String) -> Self {
        Self(Arc::from(key))
    }
}

impl Borrow<str> for SliceKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SliceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SliceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SliceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// A type-erased slice value.
#[derive(Clone)]
pub struct SliceValue {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl SliceValue {
    /// Wraps a value in a new allocation.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Erases an existing `Arc`, keeping its allocation.
    #[must_use]
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_name: type_name::<T>(),
        }
    }

    /// Recovers the typed `Arc`, or `None` if the value is not a `T`.
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    /// Returns true if the value is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Name of the stored type, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns true if both values share one allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for SliceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.type_name)
    }
}

/// The whole state produced by a combined reducer.
///
/// Immutable once built. Every combined update produces a new `CombinedState`
/// whose unchanged slices are shared with the previous one.
#[derive(Clone, Default)]
pub struct CombinedState {
    slices: BTreeMap<SliceKey, SliceValue>,
}

impl CombinedState {
    /// Starts building a preloaded state.
    #[must_use]
    pub fn builder() -> CombinedStateBuilder {
        CombinedStateBuilder::default()
    }

    pub(crate) const fn from_slices(slices: BTreeMap<SliceKey, SliceValue>) -> Self {
        Self { slices }
    }

    /// Returns the typed slice under `key`.
    ///
    /// `None` if the key is absent or holds another type.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.slices.get(key).and_then(SliceValue::downcast)
    }

    /// Returns the typed slice under `key`, explaining why it is unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::MissingSlice`] if the key is absent and
    /// [`StateError::SliceTypeMismatch`] if it holds another type.
    pub fn try_get<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>, StateError> {
        let slice = self
            .slices
            .get(key)
            .ok_or_else(|| StateError::MissingSlice(SliceKey::new(key)))?;

        slice.downcast().ok_or_else(|| StateError::SliceTypeMismatch {
            key: SliceKey::new(key),
            expected: type_name::<T>(),
            found: slice.type_name(),
        })
    }

    /// Returns the erased slice under `key`.
    #[must_use]
    pub fn slice(&self, key: &str) -> Option<&SliceValue> {
        self.slices.get(key)
    }

    /// Returns true if a slice is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.slices.contains_key(key)
    }

    /// Slice keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &SliceKey> {
        self.slices.keys()
    }

    /// Key/value pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&SliceKey, &SliceValue)> {
        self.slices.iter()
    }

    /// Number of slices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Returns true if the state holds no slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Returns true if both states hold the same keys and every slice is
    /// pointer-identical.
    ///
    /// This is the cheap no-op test for combined updates: the container is
    /// always new, the slices are not.
    #[must_use]
    pub fn shares_slices_with(&self, other: &Self) -> bool {
        self.slices.len() == other.slices.len()
            && self
                .slices
                .iter()
                .zip(other.slices.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && va.ptr_eq(vb))
    }
}

impl fmt::Debug for CombinedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.slices.iter()).finish()
    }
}

/// Builder for preloaded [`CombinedState`]s.
#[derive(Default)]
pub struct CombinedStateBuilder {
    slices: BTreeMap<SliceKey, SliceValue>,
    duplicate: Option<SliceKey>,
}

impl CombinedStateBuilder {
    /// Adds a slice from an owned value.
    #[must_use]
    pub fn slice<T: Any + Send + Sync>(self, key: impl Into<SliceKey>, value: T) -> Self {
        self.insert(key.into(), SliceValue::new(value))
    }

    /// Adds a slice sharing an existing allocation.
    #[must_use]
    pub fn shared_slice<T: Any + Send + Sync>(self, key: impl Into<SliceKey>, value: Arc<T>) -> Self {
        self.insert(key.into(), SliceValue::from_arc(value))
    }

    fn insert(mut self, key: SliceKey, value: SliceValue) -> Self {
        if self.slices.contains_key(&key) {
            self.duplicate.get_or_insert(key);
        } else {
            self.slices.insert(key, value);
        }
        self
    }

    /// Finishes the state.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::DuplicateSlice`] if a key was inserted twice.
    pub fn build(self) -> Result<CombinedState, StateError> {
        match self.duplicate {
            Some(key) => Err(StateError::DuplicateSlice(key)),
            None => Ok(CombinedState::from_slices(self.slices)),
        }
    }
}
