//! Ordered route table
//!
//! Entries are kept in registration order and lookup returns the first
//! entry that accepts the path. There is no specificity scoring: if `/:x`
//! is registered before `/about`, `/about` is unreachable.

use std::borrow::Cow;
use std::sync::Arc;

use crate::pattern::CompiledRoute;
use crate::{PathParams, Result};

/// A compiled template paired with its handler
#[derive(Debug, Clone)]
pub struct RouteEntry<H> {
    route: Arc<CompiledRoute>,
    handler: H,
}

impl<H> RouteEntry<H> {
    pub fn template(&self) -> &str {
        self.route.template()
    }

    pub fn route(&self) -> &CompiledRoute {
        &self.route
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

/// Result of a successful lookup
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    /// The first entry that accepted the path
    pub entry: &'a RouteEntry<H>,
    /// Captured values keyed by placeholder name
    pub params: PathParams,
}

pub struct RouteTable<H> {
    entries: Vec<RouteEntry<H>>,
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Compile `template` and append it.
    ///
    /// Registering the same template twice is allowed; the earlier entry
    /// always wins at lookup time. On a compile error the table is left
    /// untouched.
    pub fn register(&mut self, template: &str, handler: H) -> Result<()> {
        let route = CompiledRoute::compile(template)?;

        tracing::debug!(
            template = %template,
            params = ?route.param_names(),
            position = self.entries.len(),
            "Registered route"
        );

        self.entries.push(RouteEntry {
            route: Arc::new(route),
            handler,
        });

        Ok(())
    }

    /// Remove every entry registered with exactly `template`
    pub fn unregister(&mut self, template: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.template() != template);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered templates in lookup order
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(RouteEntry::template)
    }

    /// Find the first entry accepting `path`
    pub fn find(&self, path: &str) -> Option<RouteMatch<'_, H>> {
        let path = normalize_leading_separators(path);

        self.entries.iter().find_map(|entry| {
            entry
                .route
                .captures(&path)
                .map(|params| RouteMatch { entry, params })
        })
    }
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse a run of leading `/` into exactly one.
///
/// Borrows when there is nothing to collapse.
pub fn normalize_leading_separators(path: &str) -> Cow<'_, str> {
    if path.starts_with("//") {
        Cow::Owned(format!("/{}", path.trim_start_matches('/')))
    } else {
        Cow::Borrowed(path)
    }
}
