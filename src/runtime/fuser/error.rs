use thiserror::Error;

use crate::runtime::guard::GuardError;

#[derive(Debug, Error)]
pub enum FuserError {
    /// Enabling was requested on a system that cannot run the fuser.
    #[error("running the fusion backend is only supported on accelerated builds")]
    Capability,
    #[error("{operation} requires a fusion backend, but none is installed")]
    BackendUnavailable { operation: &'static str },
    #[error("fusion backend failed to {operation}")]
    Backend {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("fallback execution failed")]
    Fallback(#[source] anyhow::Error),
    #[error(transparent)]
    Guard(#[from] GuardError),
}
