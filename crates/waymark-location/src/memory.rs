//! In-memory browser location
//!
//! Models what the router needs from a browser window:
//! - A session history stack with a cursor (`push`, `back`, `forward`)
//! - `popstate` on traversal, `hashchange` when the fragment changes
//! - Click dispatch on anchors, with `prevent_default`
//!
//! `push` mirrors `history.pushState`: it never fires an event.

use parking_lot::RwLock;
use std::sync::Arc;
use url::Url;

use waymark_engine::{ListenerList, Subscription};

use crate::anchor::{Anchor, ClickEvent};
use crate::error::LocationError;
use crate::Result;

/// Receives the new location
pub type LocationListener = Arc<dyn Fn(&Url) + Send + Sync>;

pub type ClickListener = Arc<dyn Fn(&ClickEvent) + Send + Sync>;

struct SessionHistory {
    entries: Vec<Url>,
    index: usize,
}

impl SessionHistory {
    fn current(&self) -> &Url {
        &self.entries[self.index]
    }
}

pub struct MemoryHistory {
    session: Arc<RwLock<SessionHistory>>,
    popstate: ListenerList<LocationListener>,
    hashchange: ListenerList<LocationListener>,
    clicks: ListenerList<ClickListener>,
}

impl MemoryHistory {
    /// Open a window at an absolute URL
    pub fn new(initial: &str) -> Result<Self> {
        let initial = Url::parse(initial)?;

        Ok(Self {
            session: Arc::new(RwLock::new(SessionHistory {
                entries: vec![initial],
                index: 0,
            })),
            popstate: ListenerList::new(),
            hashchange: ListenerList::new(),
            clicks: ListenerList::new(),
        })
    }

    // === Location ===

    pub fn location(&self) -> Url {
        self.session.read().current().clone()
    }

    pub fn href(&self) -> String {
        self.location().to_string()
    }

    pub fn pathname(&self) -> String {
        self.location().path().to_string()
    }

    /// Query with its leading `?`, or empty
    pub fn search(&self) -> String {
        self.location()
            .query()
            .filter(|query| !query.is_empty())
            .map(|query| format!("?{}", query))
            .unwrap_or_default()
    }

    /// Fragment with its leading `#`, or empty
    pub fn hash(&self) -> String {
        self.location()
            .fragment()
            .filter(|fragment| !fragment.is_empty())
            .map(|fragment| format!("#{}", fragment))
            .unwrap_or_default()
    }

    /// Resolve `href` against the current location
    pub fn resolve(&self, href: &str) -> Result<Url> {
        Ok(self.location().join(href)?)
    }

    // === Session history ===

    /// Push a same-origin entry, dropping any forward entries.
    ///
    /// Fires no event.
    pub fn push(&self, href: &str) -> Result<Url> {
        let mut session = self.session.write();
        let url = session.current().join(href)?;

        let origin = session.current().origin();
        if url.origin() != origin {
            return Err(LocationError::CrossOrigin {
                url: url.to_string(),
                origin: origin.ascii_serialization(),
            });
        }

        let keep = session.index + 1;
        session.entries.truncate(keep);
        session.entries.push(url.clone());
        session.index = keep;

        tracing::trace!(url = %url, depth = session.entries.len(), "Pushed history entry");

        Ok(url)
    }

    /// User edit of the fragment: new entry, then `popstate` and `hashchange`
    pub fn set_hash(&self, fragment: &str) -> Result<Url> {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        let previous = self.location();
        let url = self.push(&format!("#{}", fragment))?;

        self.fire_popstate(&url);
        if previous.fragment() != url.fragment() {
            self.fire_hashchange(&url);
        }

        Ok(url)
    }

    pub fn back(&self) -> bool {
        self.go(-1)
    }

    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Move the cursor by `delta`; out-of-range moves do nothing.
    ///
    /// Returns whether the location changed.
    pub fn go(&self, delta: isize) -> bool {
        let (previous, url) = {
            let mut session = self.session.write();
            let target = match (session.index as isize).checked_add(delta) {
                Some(target) if delta != 0 && target >= 0 && (target as usize) < session.entries.len() => {
                    target as usize
                }
                _ => return false,
            };

            let previous = session.current().clone();
            session.index = target;
            (previous, session.current().clone())
        };

        tracing::trace!(url = %url, delta, "Traversed history");

        self.fire_popstate(&url);
        if previous.fragment() != url.fragment() {
            self.fire_hashchange(&url);
        }

        true
    }

    pub fn len(&self) -> usize {
        self.session.read().entries.len()
    }

    /// Cursor position in the history stack
    pub fn index(&self) -> usize {
        self.session.read().index
    }

    // === Events ===

    pub fn on_popstate<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Url) + Send + Sync + 'static,
    {
        self.popstate.add(Arc::new(listener))
    }

    pub fn on_hashchange<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Url) + Send + Sync + 'static,
    {
        self.hashchange.add(Arc::new(listener))
    }

    pub fn on_click<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ClickEvent) + Send + Sync + 'static,
    {
        self.clicks.add(Arc::new(listener))
    }

    /// Click `anchor`.
    ///
    /// Listeners run first. Unless one of them prevents the default, the
    /// click follows the link: a same-document fragment change fires
    /// `hashchange`, anything else loads as a new entry without events.
    /// Returns whether the default was prevented.
    pub fn click(&self, anchor: &Anchor) -> Result<bool> {
        let source = self.location();
        let target = source.join(&anchor.href)?;
        let event = ClickEvent::new(anchor.clone(), target, source);

        for listener in self.clicks.snapshot() {
            listener(&event);
        }

        if event.default_prevented() {
            return Ok(true);
        }

        if event.is_same_document() && event.target.fragment().is_some() {
            self.set_hash(event.target.fragment().unwrap_or_default())?;
        } else {
            self.push(event.target.as_str())?;
        }

        Ok(false)
    }

    fn fire_popstate(&self, url: &Url) {
        for listener in self.popstate.snapshot() {
            listener(url);
        }
    }

    fn fire_hashchange(&self, url: &Url) {
        for listener in self.hashchange.snapshot() {
            listener(url);
        }
    }
}

impl Clone for MemoryHistory {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            popstate: self.popstate.clone(),
            hashchange: self.hashchange.clone(),
            clicks: self.clicks.clone(),
        }
    }
}

impl std::fmt::Debug for MemoryHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryHistory")
            .field("href", &self.href())
            .field("index", &self.index())
            .field("len", &self.len())
            .finish()
    }
}
