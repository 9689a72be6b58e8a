//! Transport contract
//!
//! A transport is the only thing that knows how a location is represented
//! (history API, hash fragment, in-memory stack). The engine reads and
//! writes logical locations through it and never looks further.

use futures_util::future::BoxFuture;
use std::sync::Arc;

use crate::error::TransportError;
use crate::listeners::Subscription;

/// Receives `(path, query)`; the query carries no leading `?`
pub type LocationCallback = Arc<dyn Fn(String, String) + Send + Sync>;

pub trait Transport: Send + Sync {
    /// Logical path of the active location, relative to the router root
    fn current_path(&self) -> String;

    /// Raw query of the active location, without the leading `?`
    fn current_query(&self) -> String;

    /// Record `location` as the active location without a reload.
    ///
    /// `location` is a logical path, optionally followed by `?query`.
    /// Implementations must not report their own writes through
    /// [`Transport::on_external_change`].
    fn write_location<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<(), TransportError>>;

    /// Notify `callback` when the user changes the location (back/forward,
    /// hash edit).
    fn on_external_change(&self, callback: LocationCallback) -> Subscription;

    /// Forward clicks on annotated links to `callback`, suppressing the
    /// default navigation. Transports without link support return `None`.
    fn intercept_links(&self, _callback: LocationCallback) -> Option<Subscription> {
        None
    }
}

/// Split `path?query` into its two halves
pub fn split_location(location: &str) -> (&str, &str) {
    match location.split_once('?') {
        Some((path, query)) => (path, query),
        None => (location, ""),
    }
}
