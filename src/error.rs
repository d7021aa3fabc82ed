//! Error Handling
//!
//! Error type definitions used in gh-label-reconciler

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a failure
///
/// The run reports every failure the same way; the kind only exists so that
/// callers and tests can tell where in the pipeline a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The desired label set or the run configuration is unusable
    Validation,

    /// The label source could not be read or parsed
    Load,

    /// A call against the remote repository failed
    Remote,
}

/// Error types for gh-label-reconciler
#[derive(Error, Debug)]
pub enum Error {
    #[error("GitHub API error: {0}")]
    GitHubApi(#[from] octocrab::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Label source error: {0}")]
    Source(String),

    #[error("Multiple labels share the same previousName: {}", .0.join(", "))]
    DuplicatePreviousName(Vec<String>),

    #[error("Configuration validation error: {0}")]
    ConfigValidation(String),

    #[error("Label validation error: {0}")]
    LabelValidation(String),

    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("Invalid repository format: {0} (expected 'owner/repo')")]
    InvalidRepositoryFormat(String),

    #[error("Invalid label color: {0} (expected 6-digit hex, optionally prefixed with #)")]
    InvalidLabelColor(String),
}

impl Error {
    /// Create a new configuration validation error
    pub fn config_validation<S: Into<String>>(message: S) -> Self {
        Error::ConfigValidation(message.into())
    }

    /// Create a new label validation error
    pub fn label_validation<S: Into<String>>(message: S) -> Self {
        Error::LabelValidation(message.into())
    }

    /// Create a new label source error
    pub fn invalid_source<S: Into<String>>(message: S) -> Self {
        Error::Source(message.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::GitHubApi(_) | Error::RepositoryNotFound(_) => ErrorKind::Remote,
            Error::Http(_)
            | Error::Json(_)
            | Error::Yaml(_)
            | Error::Io(_)
            | Error::Source(_) => ErrorKind::Load,
            Error::DuplicatePreviousName(_)
            | Error::ConfigValidation(_)
            | Error::LabelValidation(_)
            | Error::InvalidRepositoryFormat(_)
            | Error::InvalidLabelColor(_) => ErrorKind::Validation,
        }
    }
}
