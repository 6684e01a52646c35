//! Gameplay error types.

use shade_common::{ConfigError, ShadeError};
use thiserror::Error;

/// A component was constructed without a collaborator it needs.
///
/// The component is still built, but disabled; callers log the error and
/// carry on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WiringError {
    /// A required collaborator is missing.
    #[error("{component} is missing {collaborator}")]
    MissingCollaborator {
        /// Component being wired
        component: &'static str,
        /// Missing collaborator
        collaborator: &'static str,
    },
}

impl From<WiringError> for ShadeError {
    fn from(err: WiringError) -> Self {
        match err {
            WiringError::MissingCollaborator {
                component,
                collaborator,
            } => ShadeError::Config(ConfigError::MissingCollaborator {
                component,
                collaborator,
            }),
        }
    }
}
