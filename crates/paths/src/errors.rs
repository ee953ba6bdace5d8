//! Error types for PathBuilder

use std::fmt;

/// Errors that can occur during path construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathBuilderError {
    /// Required parameter is missing
    MissingRequiredParameter(String),

    /// Secret path is empty or only slashes
    EmptyPath,

    /// Path has no segment after the mount, so no metadata path can be derived
    MissingMount(String),
}

impl fmt::Display for PathBuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathBuilderError::MissingRequiredParameter(param) => {
                write!(f, "Missing required parameter: {param}")
            }
            PathBuilderError::EmptyPath => write!(f, "Secret path is empty"),
            PathBuilderError::MissingMount(path) => {
                write!(f, "Path '{path}' has no secret name below its mount")
            }
        }
    }
}

impl std::error::Error for PathBuilderError {}
