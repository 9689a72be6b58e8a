//! Waymark Core
//!
//! The router facade: one engine, one transport, and the loop that feeds
//! location changes from the transport back into the engine.
//!
//! ```ignore
//! let (router, _history) = Router::open(&RouterConfig::default(), "https://site.example/app/")?;
//! router.on_sync("/users/:id", |_query, params| render_user(&params["id"]))?;
//!
//! let (_outcome, listener) = router.start().await?;
//! tokio::spawn(listener.run());
//! ```

mod config;
mod error;
mod router;

pub use config::{RouterConfig, TransportMode};
pub use error::CoreError;
pub use router::{ListenerLoop, LocationChange, Router};

// Re-export the layers below
pub use waymark_engine::{
    handler, Dispatch, EngineState, NavigationEngine, NavigationError, NavigationEvent,
    NavigationOutcome, PathParams, QueryParams, Subscription, Transport, TransportError,
};
pub use waymark_location::{
    Anchor, HashTransport, HistoryTransport, LocationError, MemoryHistory, DEFAULT_LINK_ATTRIBUTE,
};
pub use waymark_routes::{CompiledRoute, PatternError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
