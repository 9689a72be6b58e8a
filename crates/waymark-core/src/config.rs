//! Router configuration

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use waymark_engine::Transport;
use waymark_location::{HashTransport, HistoryTransport, MemoryHistory, DEFAULT_LINK_ATTRIBUTE};

use crate::error::CoreError;
use crate::Result;

/// Where the logical location lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Pathname below `root`, written with the history API
    #[default]
    History,
    /// Fragment after `#`
    Hash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub mode: TransportMode,
    /// Pathname prefix stripped in history mode; empty for the origin root
    pub root: String,
    /// Attribute marking links the router intercepts
    pub link_attribute: String,
}

impl RouterConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.link_attribute.trim().is_empty() {
            return Err(CoreError::Config("link_attribute must not be empty".to_string()));
        }

        if !self.root.is_empty() && !self.root.starts_with('/') {
            return Err(CoreError::Config(format!(
                "root must start with '/': {}",
                self.root
            )));
        }

        if self.root.contains(['?', '#']) {
            return Err(CoreError::Config(format!(
                "root must be a plain path: {}",
                self.root
            )));
        }

        if self.mode == TransportMode::Hash && !self.root.is_empty() {
            tracing::warn!(root = %self.root, "Root is ignored in hash mode");
        }

        Ok(())
    }

    /// Build the transport this configuration describes over `history`
    pub fn transport(&self, history: MemoryHistory) -> Arc<dyn Transport> {
        match self.mode {
            TransportMode::History => Arc::new(
                HistoryTransport::new(history, &self.root)
                    .with_link_attribute(self.link_attribute.clone()),
            ),
            TransportMode::Hash => {
                Arc::new(HashTransport::new(history).with_link_attribute(self.link_attribute.clone()))
            }
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            mode: TransportMode::History,
            root: String::new(),
            link_attribute: DEFAULT_LINK_ATTRIBUTE.to_string(),
        }
    }
}
