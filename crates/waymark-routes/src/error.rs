//! Route compilation error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("Duplicate parameter name `{name}` in template {template}")]
    DuplicateParameterName { template: String, name: String },

    #[error("Template {template} failed to compile: {reason}")]
    Matcher { template: String, reason: String },
}
