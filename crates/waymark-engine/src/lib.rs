//! Waymark Navigation Engine
//!
//! Turns a location into a dispatch:
//! 1. Parse the query string
//! 2. Resolve the path against the route table (first match wins)
//! 3. Invoke the matched handler, or the not-found handler
//! 4. Contain handler failures and publish the outcome
//!
//! The engine never touches a browser. Locations come in as strings and
//! writes go out through the [`Transport`] trait.

mod engine;
mod error;
mod event;
pub mod handler;
mod listeners;
mod query;
mod safety;
mod state;
mod transport;

use std::collections::HashMap;

pub use engine::{EventListener, NavigationEngine};
pub use error::{NavigationError, TransportError};
pub use event::{Dispatch, NavigationEvent, NavigationOutcome};
pub use handler::{HandlerFuture, IntoHandlerResult, NotFoundHandler, RouteHandler};
pub use listeners::{ListenerList, Subscription};
pub use query::parse_query;
pub use safety::{is_safe_target, logical_path};
pub use state::EngineState;
pub use transport::{split_location, LocationCallback, Transport};

pub use waymark_routes::PathParams;

/// Decoded query parameters; on duplicate keys the last one wins
pub type QueryParams = HashMap<String, String>;

pub type Result<T> = std::result::Result<T, NavigationError>;
