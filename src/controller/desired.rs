//! Desired-state builder.
//!
//! A pure function from the owner's declared intent to the canonical set of
//! objects that should exist. Identical inputs yield structurally identical
//! output, which is what makes the diff stable and the builder testable
//! without a cluster.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use tracing::debug;

use crate::crd::{AtlasInfra, MessagingCluster, MessagingClusterSpec};
use crate::error::{Error, Result};

use super::resources::{owner_reference, standard_labels, ManagedObject, ManagedResourceSet};

/// Default name for the messaging cluster managed by AtlasInfra
pub const MESSAGING_INSTANCE_NAME: &str = "atlas-messaging";

/// Compute the canonical desired set for `infra`.
///
/// Empty when the cluster lacks the capability or `installMessaging` is off.
/// The empty set signals intended absence: previously-created objects become
/// delete candidates in the diff. Invalid sizing fails with a configuration
/// error rather than being clamped.
pub fn build_desired(infra: &AtlasInfra, capable: bool) -> Result<ManagedResourceSet> {
    let mut desired = ManagedResourceSet::new();

    if !capable || !infra.spec.install_messaging {
        return Ok(desired);
    }

    infra
        .spec
        .validate()
        .map_err(|e| Error::ConfigurationError(e.to_string()))?;

    debug!(
        namespace = infra.namespace().as_deref().unwrap_or("default"),
        "building default messaging resources"
    );

    desired.insert(ManagedObject::MessagingCluster(build_messaging_cluster(
        infra,
    )));
    Ok(desired)
}

fn build_messaging_cluster(infra: &AtlasInfra) -> MessagingCluster {
    MessagingCluster {
        metadata: ObjectMeta {
            name: Some(MESSAGING_INSTANCE_NAME.to_string()),
            namespace: infra.namespace(),
            labels: Some(standard_labels(infra)),
            owner_references: Some(vec![owner_reference(infra)]),
            ..Default::default()
        },
        spec: MessagingClusterSpec {
            replicas: infra.spec.messaging_replicas(),
            version: infra.spec.messaging_version().map(String::from),
        },
        status: None,
    }
}
