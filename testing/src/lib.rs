//! # Slicekit Testing
//!
//! Testing utilities and helpers for slice reducers.
//!
//! This crate provides:
//! - [`ReducerTest`]: a Given-When-Then harness for a single reducer
//! - [`contract`]: assertions for the rules every reducer must follow
//! - [`properties`]: proptest strategies for generating events
//! - [`init_test_tracing`]: log capture for tests
//!
//! ## Example
//!
//! ```
//! use slicekit_core::{DynEvent, Event, Reducer, combine_reducers, reducer_fn, slice};
//! use slicekit_testing::contract::{assert_pointwise, assert_slices_preserved};
//! use std::sync::Arc;
//!
//! let count = || {
//!     reducer_fn(
//!         || 0_i64,
//!         |state: &Arc<i64>, event: &DynEvent| match event.event_type() {
//!             "INCREMENT" => Arc::new(**state + 1),
//!             _ => Arc::clone(state),
//!         },
//!     )
//! };
//!
//! let app = combine_reducers([slice("count", count())])?;
//! let prior = app.apply(None, &DynEvent::init());
//!
//! assert_pointwise(&app, "count", &count(), Some(&prior), &DynEvent::new("INCREMENT"));
//! assert_slices_preserved(&prior, &app.apply(Some(&prior), &DynEvent::new("NOOP")));
//! # Ok::<(), slicekit_core::CompositionError>(())
//! ```

/// Reducer contract assertions
pub mod contract;

/// Property-based testing utilities
pub mod properties;


// Re-export commonly used items
pub use reducer_test::ReducerTest;

/// Installs a `tracing` subscriber that writes through the test harness.
///
/// Honors `RUST_LOG`; safe to call from every test, only the first call
/// installs anything.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_test_tracing_is_idempotent() {
        init_test_tracing();
        init_test_tracing();
        tracing::debug!("tracing initialized twice without panicking");
    }
}
