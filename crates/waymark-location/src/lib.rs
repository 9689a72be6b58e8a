//! Waymark Location
//!
//! Transports for the navigation engine:
//! - `HistoryTransport`: logical path is the pathname below a root prefix
//! - `HashTransport`: logical path is the fragment after `#`
//!
//! Both sit on `MemoryHistory`, a headless model of the browser's
//! location, session history and anchor clicks.

mod anchor;
mod error;
mod hash;
mod history;
mod memory;

pub use anchor::{Anchor, ClickEvent, DEFAULT_LINK_ATTRIBUTE};
pub use error::LocationError;
pub use hash::HashTransport;
pub use history::HistoryTransport;
pub use memory::{ClickListener, LocationListener, MemoryHistory};

pub type Result<T> = std::result::Result<T, LocationError>;
