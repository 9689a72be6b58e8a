//! Navigation target allow-list

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::NavigationError;
use crate::Result;

/// `/` or `#/`, then only word characters, `-` and `/`
static SAFE_TARGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:/|#/)[A-Za-z0-9_\-/]*$").expect("safe target regex is valid")
});

/// Check a programmatic navigation target against the allow-list.
///
/// Anything with a dot (so `..`), a query, a scheme, whitespace or
/// percent escapes is rejected.
pub fn is_safe_target(target: &str) -> bool {
    SAFE_TARGET.is_match(target)
}

/// Validate `target` and return the logical path it names.
///
/// `#/users/1` and `/users/1` both name `/users/1`.
pub fn logical_path(target: &str) -> Result<String> {
    if !is_safe_target(target) {
        return Err(NavigationError::UnsafePath(target.to_string()));
    }

    Ok(target.strip_prefix('#').unwrap_or(target).to_string())
}
