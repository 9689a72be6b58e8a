//! Waymark Routes
//!
//! Route templates and first-match lookup:
//! - `:name` and `*name` placeholders capture one path segment
//! - Templates compile once, at registration
//! - Lookup walks entries in registration order; the first match wins

mod error;
mod pattern;
mod table;

use std::collections::HashMap;

pub use error::PatternError;
pub use pattern::{compile, CompiledRoute};
pub use table::{normalize_leading_separators, RouteEntry, RouteMatch, RouteTable};

/// Captured path parameters keyed by placeholder name
pub type PathParams = HashMap<String, String>;

pub type Result<T> = std::result::Result<T, PatternError>;
