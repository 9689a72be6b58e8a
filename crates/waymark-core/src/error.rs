//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Navigation error: {0}")]
    Navigation(#[from] waymark_engine::NavigationError),

    #[error("Location error: {0}")]
    Location(#[from] waymark_location::LocationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Router not started")]
    NotStarted,

    #[error("Router already started")]
    AlreadyStarted,
}
