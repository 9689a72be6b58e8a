//! Navigation error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("Invalid route template: {0}")]
    InvalidTemplate(#[from] waymark_routes::PatternError),

    #[error("Unsafe navigation target: {0}")]
    UnsafePath(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Location rejected: {0}")]
    Rejected(String),
}
