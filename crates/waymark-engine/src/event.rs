//! Navigation outcomes and events

use serde::Serialize;

use crate::{PathParams, QueryParams};

/// What a navigation resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Dispatch {
    /// A route matched and its handler settled successfully
    Matched { template: String, params: PathParams },
    /// Nothing matched; the not-found handler ran
    NotFound,
    /// Nothing matched and no not-found handler is registered
    Unmatched,
    /// The route handler (`template` set) or the not-found handler failed
    HandlerFailed {
        template: Option<String>,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationOutcome {
    pub generation: u64,
    pub path: String,
    pub query: QueryParams,
    pub dispatch: Dispatch,
    /// A newer navigation started before this one settled
    pub superseded: bool,
}

impl NavigationOutcome {
    /// Template of the matched route, if any
    pub fn template(&self) -> Option<&str> {
        match &self.dispatch {
            Dispatch::Matched { template, .. } => Some(template),
            Dispatch::HandlerFailed { template, .. } => template.as_deref(),
            _ => None,
        }
    }

    pub fn params(&self) -> Option<&PathParams> {
        match &self.dispatch {
            Dispatch::Matched { params, .. } => Some(params),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.dispatch, Dispatch::HandlerFailed { .. })
    }
}

/// Published to engine subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NavigationEvent {
    Started { generation: u64, path: String },
    HandlerFailed {
        generation: u64,
        path: String,
        message: String,
    },
    Completed { outcome: NavigationOutcome },
    Superseded { outcome: NavigationOutcome },
}

impl NavigationEvent {
    pub fn generation(&self) -> u64 {
        match self {
            NavigationEvent::Started { generation, .. }
            | NavigationEvent::HandlerFailed { generation, .. } => *generation,
            NavigationEvent::Completed { outcome } | NavigationEvent::Superseded { outcome } => {
                outcome.generation
            }
        }
    }
}
