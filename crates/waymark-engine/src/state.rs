//! Engine state
//!
//! ```text
//! Idle
//!   ↓ navigation trigger
//! Resolving
//!   ↓ handler settled / no match / handler failed
//! Idle
//! ```
//!
//! Navigations overlap, so the engine is `Resolving` while at least one
//! episode is in flight. There is no error state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    /// Waiting for a navigation trigger
    Idle,
    /// At least one navigation is being matched or awaiting its handler
    Resolving,
}

impl EngineState {
    pub fn from_in_flight(in_flight: usize) -> Self {
        if in_flight == 0 {
            EngineState::Idle
        } else {
            EngineState::Resolving
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Idle => "idle",
            EngineState::Resolving => "resolving",
        }
    }
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
