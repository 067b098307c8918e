//! Error types shared across the workspace.

use std::path::PathBuf;
use thiserror::Error;

use crate::task::TaskStatus;

/// A filter parameter failed validation. Raised before any query is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid {param}: '{value}'. Must be one of: {allowed}")]
    InvalidChoice {
        param: String,
        value: String,
        allowed: String,
    },

    #[error("Invalid date format for {param}: '{value}'. Use 'YYYY-MM-DD'")]
    InvalidDate { param: String, value: String },

    #[error("to_date cannot be earlier than from_date")]
    InvertedRange,

    #[error("Invalid {param}: expected {expected}")]
    WrongType { param: String, expected: &'static str },

    #[error("{param} must be a non-empty list")]
    EmptyList { param: String },

    #[error("{param} is required")]
    Missing { param: String },
}

/// Store access failed.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Store error on '{collection}': {message}")]
    Backend { collection: String, message: String },

    #[error("Malformed document in '{collection}': {message}")]
    Decode { collection: String, message: String },
}

impl StoreError {
    pub fn backend(collection: &str, message: impl Into<String>) -> Self {
        Self::Backend {
            collection: collection.to_string(),
            message: message.into(),
        }
    }

    pub fn decode(collection: &str, message: impl Into<String>) -> Self {
        Self::Decode {
            collection: collection.to_string(),
            message: message.into(),
        }
    }
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// A report export failed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Illegal task status change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid task transition from {from} on {event}")]
pub struct TransitionError {
    pub from: TaskStatus,
    pub event: &'static str,
}

/// A dispatcher run could not proceed.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("No report templates configured for environment '{0}'")]
    MissingAllowList(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment '{0}' is not defined in the config")]
    MissingEnvironment(String),

    #[error("Invalid template id '{0}': expected a positive integer")]
    InvalidTemplateId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages() {
        let err = ValidationError::InvalidChoice {
            param: "status".into(),
            value: "Open".into(),
            allowed: "Complete, Reject".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid status: 'Open'. Must be one of: Complete, Reject"
        );
        assert_eq!(
            ValidationError::InvertedRange.to_string(),
            "to_date cannot be earlier than from_date"
        );
    }

    #[test]
    fn export_error_wraps_validation_transparently() {
        let err: ExportError = ValidationError::InvertedRange.into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "to_date cannot be earlier than from_date");
    }
}
