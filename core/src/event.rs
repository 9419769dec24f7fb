//! Events: the immutable inputs every reducer interprets.
//!
//! An event is a record with a discriminant (its *type*) and an arbitrary
//! payload. The composer never looks inside an event; only the reducer owning
//! a slice interprets its payload.
//!
//! Two shapes are supported:
//!
//! - **Closed sets**: an enum implementing [`Event`], usually through
//!   `#[derive(Event)]` from `slicekit-macros`. Reducers `match` on variants
//!   and fall through to identity with `_`.
//! - **Open sets**: [`DynEvent`], a discriminant plus a JSON payload, for
//!   events that arrive as data.
//!
//! # Example
//!
//! ```
//! use slicekit_core::event::{DynEvent, Event};
//!
//! let event = DynEvent::new("ADD_ITEM").with_field("text", "buy milk");
//! assert_eq!(event.event_type(), "ADD_ITEM");
//! assert_eq!(event.field_as::<String>("text").ok().as_deref(), Some("buy milk"));
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Discriminant of the synthetic initialization event.
///
/// Reducers must never handle this type. It is dispatched once, with no prior
/// state, so every reducer takes its unknown-event branch and returns its
/// initial value.
pub const INIT_EVENT_TYPE: &str = "@@slicekit/INIT";

/// Name of the reserved discriminant field in the flat JSON event shape.
pub const TYPE_FIELD: &str = "type";

/// Errors raised while reading events from data.
#[derive(Error, Debug)]
pub enum EventError {
    /// The value is not a JSON object.
    #[error("Event must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// The object has no `type` field.
    #[error("Event is missing its \"type\" field")]
    MissingType,

    /// The `type` field is not a string.
    #[error("Event \"type\" must be a string, found {0}")]
    InvalidType(&'static str),

    /// The `type` field is an empty string.
    #[error("Event \"type\" must not be empty")]
    EmptyType,

    /// A payload field the reducer requires is absent.
    #[error("Event payload is missing field \"{0}\"")]
    MissingField(String),

    /// A payload field could not be decoded into the requested type.
    #[error("Event payload field \"{key}\" has the wrong shape: {source}")]
    InvalidField {
        /// Payload key
        key: String,
        /// Decoding failure
        #[source]
        source: serde_json::Error,
    },
}

/// An event a reducer can interpret.
///
/// Reducers receive events by shared reference, so an event can never be
/// mutated by the reducer handling it.
///
/// # Example
///
/// ```
/// use slicekit_core::event::Event;
///
/// #[derive(Clone, Debug)]
/// enum CounterEvent {
///     Increment,
///     Decrement,
/// }
///
/// impl Event for CounterEvent {
///     fn event_type(&self) -> &str {
///         match self {
///             Self::Increment => "INCREMENT",
///             Self::Decrement => "DECREMENT",
///         }
///     }
/// }
///
/// assert_eq!(CounterEvent::Increment.event_type(), "INCREMENT");
/// ```
pub trait Event: Send + Sync + 'static {
    /// Returns the discriminant of this event.
    fn event_type(&self) -> &str;

    /// Returns true if this is the synthetic initialization event.
    fn is_init(&self) -> bool {
        self.event_type() == INIT_EVENT_TYPE
    }
}

/// Event types that can produce the synthetic initialization event.
///
/// A store seeds its state by dispatching [`InitEvent::init`] against an
/// absent prior state.
pub trait InitEvent: Event {
    /// Builds the initialization event.
    fn init() -> Self;
}

/// Open-set event: a discriminant plus a JSON payload.
///
/// Serializes to and from the flat shape `{"type": "...", ...payload}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct DynEvent {
    event_type: String,
    payload: Map<String, Value>,
}

impl DynEvent {
    /// Creates an event with the given discriminant and an empty payload.
    ///
    /// The discriminant must not be empty, the same rule
    /// [`from_value`](Self::from_value) enforces. Use
    /// [`try_new`](Self::try_new) for discriminants that are not literals.
    ///
    /// # Panics
    ///
    /// Debug builds panic on an empty discriminant.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        let event_type = event_type.into();
        debug_assert!(!event_type.is_empty(), "Event type must not be empty");
        Self {
            event_type,
            payload: Map::new(),
        }
    }

    /// Creates an event, rejecting an empty discriminant.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::EmptyType`] if `event_type` is empty.
    pub fn try_new(event_type: impl Into<String>) -> Result<Self, EventError> {
        let event_type = event_type.into();
        if event_type.is_empty() {
            return Err(EventError::EmptyType);
        }
        Ok(Self::new(event_type))
    }

    /// Builds the synthetic initialization event.
    #[must_use]
    pub fn init() -> Self {
        Self::new(INIT_EVENT_TYPE)
    }

    /// Adds a payload field.
    ///
    /// A field named `type` is ignored; the discriminant is fixed at
    /// construction.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != TYPE_FIELD {
            self.payload.insert(key, value.into());
        }
        self
    }

    /// Parses an event from its flat JSON shape.
    ///
    /// # Errors
    ///
    /// Returns an [`EventError`] if the value is not an object or its `type`
    /// field is absent, not a string, or empty.
    pub fn from_value(value: Value) -> Result<Self, EventError> {
        let Value::Object(mut object) = value else {
            return Err(EventError::NotAnObject(json_kind(&value)));
        };

        let event_type = match object.remove(TYPE_FIELD) {
            None => return Err(EventError::MissingType),
            Some(Value::String(event_type)) => event_type,
            Some(other) => return Err(EventError::InvalidType(json_kind(&other))),
        };

        if event_type.is_empty() {
            return Err(EventError::EmptyType);
        }

        Ok(Self {
            event_type,
            payload: object,
        })
    }

    /// Returns a payload field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Decodes a payload field into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::MissingField`] if the field is absent and
    /// [`EventError::InvalidField`] if it cannot be decoded as `T`.
    pub fn field_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, EventError> {
        let value = self
            .payload
            .get(key)
            .ok_or_else(|| EventError::MissingField(key.to_string()))?;

        T::deserialize(value).map_err(|source| EventError::InvalidField {
            key: key.to_string(),
            source,
        })
    }

    /// Returns the whole payload.
    #[must_use]
    pub const fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }
}

impl Event for DynEvent {
    fn event_type(&self) -> &str {
        &self.event_type
    }
}

impl InitEvent for DynEvent {
    fn init() -> Self {
        Self::init()
    }
}

impl TryFrom<Value> for DynEvent {
    type Error = EventError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<DynEvent> for Value {
    fn from(event: DynEvent) -> Self {
        let mut object = event.payload;
        object.insert(TYPE_FIELD.to_string(), Value::String(event.event_type));
        Self::Object(object)
    }
}

impl fmt::Display for DynEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} payload fields)", self.event_type, self.payload.len())
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
