//! Location error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("URL {url} is not on origin {origin}")]
    CrossOrigin { url: String, origin: String },
}

impl From<LocationError> for waymark_engine::TransportError {
    fn from(e: LocationError) -> Self {
        waymark_engine::TransportError::Rejected(e.to_string())
    }
}
