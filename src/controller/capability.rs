//! Capability probe for optional managed dependencies.
//!
//! A managed kind's CRD is installed by a third-party operator and may
//! legitimately be absent. Capability is probed once per reconciliation
//! cycle and never cached across cycles: the extension can be installed or
//! removed between reconciliations.

use tracing::{debug, warn};

use super::cluster::ClusterHandle;
use super::resources::ManagedKind;

/// Whether the cluster can manage `kind` right now.
///
/// Never fails. A discovery error is logged and reported as "not capable":
/// capability absence is a legitimate steady state, and failing the whole
/// cycle on a transient discovery hiccup would block the operator entirely.
pub async fn probe_capability(handle: &dyn ClusterHandle, kind: ManagedKind) -> bool {
    match handle.discover_type(kind).await {
        Ok(capable) => {
            debug!(%kind, capable, "capability probe finished");
            capable
        }
        Err(err) => {
            warn!(%kind, error = %err, "capability discovery failed, treating kind as unsupported");
            false
        }
    }
}
