//! Error taxonomy for the Atlas operator.
//!
//! The reconciliation engine distinguishes errors by how they affect a cycle:
//! configuration errors abort and are not retryable without user correction,
//! read errors abort the cycle, apply errors are isolated to a single object.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid desired-state input. Requeueing will not help until the user
    /// corrects the owning resource.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// Listing the deployed state failed. Aborts the whole cycle: an
    /// incomplete read cannot be distinguished from legitimate absence.
    #[error("failed to read deployed state: {0}")]
    ReadError(#[source] kube::Error),

    /// A single object's create/update/delete failed. Scoped to that object
    /// and aggregated into the cycle result.
    #[error("failed to apply object: {0}")]
    ApplyError(#[source] kube::Error),

    /// Kubernetes API error outside the engine itself (status patches,
    /// event emission, client setup).
    #[error("Kubernetes API error: {0}")]
    KubeError(#[source] kube::Error),
}

impl Error {
    /// Whether the external scheduler should retry soon.
    pub fn is_retriable(&self) -> bool {
        match self {
            Error::ConfigurationError(_) => false,
            Error::ReadError(_) | Error::ApplyError(_) | Error::KubeError(_) => true,
        }
    }
}
