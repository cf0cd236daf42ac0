//! Deployed-state reader.
//!
//! Queries the cluster for the objects currently deployed for an owner,
//! grouped by kind. Only objects in the owner's namespace carrying its owner
//! reference are returned.

use kube::ResourceExt;
use tracing::warn;

use crate::crd::AtlasInfra;
use crate::error::{Error, Result};

use super::cluster::ClusterHandle;
use super::resources::{ManagedKind, ManagedResourceSet};

/// Read the objects currently deployed for `infra`.
///
/// Without capability no list call is issued at all: listing an unregistered
/// type is itself an API error. A failed list aborts with a read error,
/// since an incomplete read cannot be distinguished from legitimate absence
/// and proceeding would risk spurious deletes.
pub async fn read_deployed(
    handle: &dyn ClusterHandle,
    infra: &AtlasInfra,
    capable: bool,
) -> Result<ManagedResourceSet> {
    let mut deployed = ManagedResourceSet::new();

    if !capable {
        return Ok(deployed);
    }

    let namespace = infra.namespace().unwrap_or_else(|| "default".to_string());

    for kind in ManagedKind::ALL {
        let objects = handle.list(kind, &namespace, infra).await.map_err(|err| {
            warn!(%kind, %namespace, error = %err, "failed to list deployed objects");
            Error::ReadError(err)
        })?;

        for object in objects {
            deployed.insert(object);
        }
    }

    Ok(deployed)
}
