//! Anchors and click events

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

/// Attribute marking a link for interception
pub const DEFAULT_LINK_ATTRIBUTE: &str = "data-router";

/// An `<a>` element: its `href` as written and its attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub href: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Anchor {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            attributes: HashMap::new(),
        }
    }

    /// Builder: add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder: add the default interception attribute
    pub fn routed(self) -> Self {
        self.with_attribute(DEFAULT_LINK_ATTRIBUTE, "")
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }
}

/// A click on an anchor, as seen by click listeners
#[derive(Debug)]
pub struct ClickEvent {
    pub anchor: Anchor,
    /// `href` resolved against the location at click time
    pub target: Url,
    /// Location at click time
    pub source: Url,
    default_prevented: AtomicBool,
}

impl ClickEvent {
    pub(crate) fn new(anchor: Anchor, target: Url, source: Url) -> Self {
        Self {
            anchor,
            target,
            source,
            default_prevented: AtomicBool::new(false),
        }
    }

    /// Whether the target differs from the current location only in its
    /// fragment
    pub fn is_same_document(&self) -> bool {
        let mut target = self.target.clone();
        target.set_fragment(None);
        let mut source = self.source.clone();
        source.set_fragment(None);
        target == source
    }

    /// Suppress the browser's own navigation for this click
    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::SeqCst);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_attributes() {
        let anchor = Anchor::new("/about").routed().with_attribute("class", "nav");
        assert!(anchor.has_attribute(DEFAULT_LINK_ATTRIBUTE));
        assert!(anchor.has_attribute("class"));
        assert!(!Anchor::new("/about").has_attribute(DEFAULT_LINK_ATTRIBUTE));
    }

    #[test]
    fn test_prevent_default() {
        let target = Url::parse("https://app.example/about").unwrap();
        let source = Url::parse("https://app.example/").unwrap();
        let event = ClickEvent::new(Anchor::new("/about"), target, source);
        assert!(!event.default_prevented());
        event.prevent_default();
        assert!(event.default_prevented());
    }

    #[test]
    fn test_same_document_ignores_fragment() {
        let source = Url::parse("https://app.example/index.html?v=1#/home").unwrap();
        let same = ClickEvent::new(
            Anchor::new("#/x"),
            source.join("#/x").unwrap(),
            source.clone(),
        );
        assert!(same.is_same_document());

        let other = ClickEvent::new(
            Anchor::new("/other.html#/x"),
            source.join("/other.html#/x").unwrap(),
            source,
        );
        assert!(!other.is_same_document());
    }
}
