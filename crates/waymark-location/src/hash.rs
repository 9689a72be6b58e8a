//! Hash-mode transport
//!
//! The logical location lives in the fragment; the document URL never
//! changes:
//!
//! ```text
//! https://site.example/index.html#/users/7?tab=2  →  path /users/7, query tab=2
//! ```

use futures_util::future::{self, BoxFuture, FutureExt};
use url::Url;

use waymark_engine::{split_location, LocationCallback, Subscription, Transport, TransportError};

use crate::anchor::DEFAULT_LINK_ATTRIBUTE;
use crate::memory::MemoryHistory;

pub struct HashTransport {
    history: MemoryHistory,
    link_attribute: String,
}

impl HashTransport {
    pub fn new(history: MemoryHistory) -> Self {
        Self {
            history,
            link_attribute: DEFAULT_LINK_ATTRIBUTE.to_string(),
        }
    }

    pub fn with_link_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.link_attribute = attribute.into();
        self
    }

    pub fn history(&self) -> &MemoryHistory {
        &self.history
    }
}

/// Split a URL's fragment into `(path, query)`. A missing or empty
/// fragment is the root path.
fn fragment_location(url: &Url) -> (String, String) {
    let (path, query) = split_location(url.fragment().unwrap_or_default());
    let path = if path.is_empty() { "/" } else { path };
    (path.to_string(), query.to_string())
}

impl Transport for HashTransport {
    fn current_path(&self) -> String {
        fragment_location(&self.history.location()).0
    }

    fn current_query(&self) -> String {
        fragment_location(&self.history.location()).1
    }

    fn write_location<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<(), TransportError>> {
        let result = self
            .history
            .push(&format!("#{}", location))
            .map(|url| tracing::debug!(url = %url, "Wrote hash location"))
            .map_err(TransportError::from);

        future::ready(result).boxed()
    }

    fn on_external_change(&self, callback: LocationCallback) -> Subscription {
        self.history.on_hashchange(move |url| {
            let (path, query) = fragment_location(url);
            callback(path, query);
        })
    }

    fn intercept_links(&self, callback: LocationCallback) -> Option<Subscription> {
        let attribute = self.link_attribute.clone();

        let subscription = self.history.on_click(move |event| {
            // Links into another document are real page loads
            if !event.anchor.has_attribute(&attribute)
                || !event.is_same_document()
                || event.target.fragment().is_none()
            {
                return;
            }

            event.prevent_default();
            let (path, query) = fragment_location(&event.target);
            callback(path, query);
        });

        Some(subscription)
    }
}
