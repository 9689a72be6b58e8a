//! History-mode transport
//!
//! The logical path is the pathname below the router root:
//!
//! ```text
//! root = /app
//! https://site.example/app/users/7?tab=2  →  path /users/7, query tab=2
//! ```
//!
//! Writes push a new session history entry. Back/forward arrive through
//! `popstate`.

use futures_util::future::{self, BoxFuture, FutureExt};

use waymark_engine::{split_location, LocationCallback, Subscription, Transport, TransportError};

use crate::anchor::DEFAULT_LINK_ATTRIBUTE;
use crate::memory::MemoryHistory;

pub struct HistoryTransport {
    history: MemoryHistory,
    /// Pathname prefix without trailing `/`; empty for the origin root
    root: String,
    link_attribute: String,
}

impl HistoryTransport {
    pub fn new(history: MemoryHistory, root: &str) -> Self {
        Self {
            history,
            root: root.trim_end_matches('/').to_string(),
            link_attribute: DEFAULT_LINK_ATTRIBUTE.to_string(),
        }
    }

    /// Builder: intercept links carrying `attribute` instead of `data-router`
    pub fn with_link_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.link_attribute = attribute.into();
        self
    }

    pub fn history(&self) -> &MemoryHistory {
        &self.history
    }

    pub fn root(&self) -> &str {
        &self.root
    }
}

/// Path of `pathname` relative to `root`, or `None` if it lies outside
fn relative_to_root(root: &str, pathname: &str) -> Option<String> {
    let relative = pathname.strip_prefix(root)?;

    if relative.is_empty() {
        Some("/".to_string())
    } else if relative.starts_with('/') {
        Some(relative.to_string())
    } else {
        None
    }
}

impl Transport for HistoryTransport {
    fn current_path(&self) -> String {
        let pathname = self.history.pathname();
        relative_to_root(&self.root, &pathname).unwrap_or(pathname)
    }

    fn current_query(&self) -> String {
        self.history
            .location()
            .query()
            .unwrap_or_default()
            .to_string()
    }

    fn write_location<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<(), TransportError>> {
        let (path, query) = split_location(location);

        let mut href = format!("{}{}", self.root, path);
        if !query.is_empty() {
            href.push('?');
            href.push_str(query);
        }

        let result = match self.history.push(&href) {
            Ok(url) => {
                tracing::debug!(url = %url, "Wrote history entry");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(href = %href, error = %e, "History write rejected");
                Err(e.into())
            }
        };

        future::ready(result).boxed()
    }

    fn on_external_change(&self, callback: LocationCallback) -> Subscription {
        let root = self.root.clone();

        self.history.on_popstate(move |url| {
            let path = relative_to_root(&root, url.path()).unwrap_or_else(|| url.path().to_string());
            callback(path, url.query().unwrap_or_default().to_string());
        })
    }

    fn intercept_links(&self, callback: LocationCallback) -> Option<Subscription> {
        let root = self.root.clone();
        let attribute = self.link_attribute.clone();
        let origin = self.history.location().origin();

        let subscription = self.history.on_click(move |event| {
            if !event.anchor.has_attribute(&attribute) || event.target.origin() != origin {
                return;
            }

            // Links leaving the router root are real page loads
            let Some(path) = relative_to_root(&root, event.target.path()) else {
                return;
            };

            event.prevent_default();
            callback(path, event.target.query().unwrap_or_default().to_string());
        });

        Some(subscription)
    }
}
