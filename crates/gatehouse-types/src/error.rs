//! Error taxonomy shared across the workspace.

use thiserror::Error;

use crate::provider::ProviderFailure;

/// Errors surfaced while handling one inbound event or wizard step.
///
/// None of these are fatal to the process; every handler recovers locally
/// and turns the error into a short user-visible notice.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Provider(#[from] ProviderFailure),

    #[error("session expired")]
    SessionExpired,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("store error: {0}")]
    Store(String),
}

/// Errors from the externally persisted plan override table.
#[derive(Debug, Error)]
pub enum PlanStoreError {
    #[error("io error: {0}")]
    Io(String),

    #[error("corrupt override table: {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_error_display() {
        let err = GatewayError::CollaboratorUnavailable("handoff channel missing".into());
        assert!(err.to_string().contains("handoff channel missing"));
    }

    #[test]
    fn provider_failure_converts() {
        let err: GatewayError = ProviderFailure::AuthInvalid.into();
        assert!(matches!(
            err,
            GatewayError::Provider(ProviderFailure::AuthInvalid)
        ));
    }
}
