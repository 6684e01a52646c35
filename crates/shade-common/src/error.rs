//! Error types for Shade.

use thiserror::Error;

/// Top-level error type for Shade operations.
#[derive(Debug, Error)]
pub enum ShadeError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Static data lookup errors
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while wiring or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required collaborator was not provided at construction.
    #[error("missing collaborator `{collaborator}` for {component}")]
    MissingCollaborator {
        /// Component that was being built
        component: &'static str,
        /// Collaborator that was absent
        collaborator: &'static str,
    },

    /// A value was outside the accepted range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Builds a [`ConfigError::InvalidValue`] for `field`.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    /// Field or component the error refers to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingCollaborator { component, .. } => component,
            Self::InvalidValue { field, .. } => field,
        }
    }
}

/// Errors raised by keyed lookups into static tables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The key has no entry in the table.
    #[error("unknown key: {0}")]
    UnknownKey(String),

    /// The table was queried before it was initialized.
    #[error("table `{0}` is not loaded")]
    NotLoaded(&'static str),
}
