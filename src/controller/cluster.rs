//! Narrow interface between the reconciliation engine and the cluster.
//!
//! The engine consumes cluster access through [`ClusterHandle`] and never
//! constructs transport connections itself. Production runs against
//! [`KubeClusterHandle`]; tests run against an in-memory implementation.

use async_trait::async_trait;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};
use tracing::debug;

use crate::crd::{AtlasInfra, MessagingCluster};

use super::resources::{is_owned_by, ManagedKind, ManagedObject};

/// Field manager identity for server-side apply patches
pub const FIELD_MANAGER: &str = "atlas-operator";

/// Cluster operations the reconciliation engine needs.
///
/// Errors are raw transport/API errors; callers wrap them into the cycle
/// taxonomy (`ReadError` for listing, `ApplyError` for dispatch).
#[async_trait]
pub trait ClusterHandle: Send + Sync {
    /// List objects of `kind` in `namespace` owned by `owner`. Foreign
    /// objects are never returned.
    async fn list(
        &self,
        kind: ManagedKind,
        namespace: &str,
        owner: &AtlasInfra,
    ) -> Result<Vec<ManagedObject>, kube::Error>;

    async fn create(&self, object: &ManagedObject) -> Result<(), kube::Error>;

    async fn update(&self, object: &ManagedObject) -> Result<(), kube::Error>;

    async fn delete(&self, object: &ManagedObject) -> Result<(), kube::Error>;

    /// Whether the cluster currently serves `kind`'s API group.
    async fn discover_type(&self, kind: ManagedKind) -> Result<bool, kube::Error>;
}

/// Production handle backed by a kube [`Client`]
#[derive(Clone)]
pub struct KubeClusterHandle {
    client: Client,
}

impl KubeClusterHandle {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn messaging_api(&self, namespace: &str) -> Api<MessagingCluster> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn object_namespace(object: &ManagedObject) -> String {
    object.namespace().unwrap_or_else(|| "default".to_string())
}

#[async_trait]
impl ClusterHandle for KubeClusterHandle {
    async fn list(
        &self,
        kind: ManagedKind,
        namespace: &str,
        owner: &AtlasInfra,
    ) -> Result<Vec<ManagedObject>, kube::Error> {
        match kind {
            ManagedKind::MessagingCluster => {
                let listed = self
                    .messaging_api(namespace)
                    .list(&ListParams::default())
                    .await?;
                Ok(listed
                    .items
                    .into_iter()
                    .map(ManagedObject::MessagingCluster)
                    .filter(|object| is_owned_by(object, owner))
                    .collect())
            }
        }
    }

    async fn create(&self, object: &ManagedObject) -> Result<(), kube::Error> {
        match object {
            ManagedObject::MessagingCluster(mc) => {
                self.messaging_api(&object_namespace(object))
                    .create(&PostParams::default(), mc)
                    .await?;
            }
        }
        Ok(())
    }

    async fn update(&self, object: &ManagedObject) -> Result<(), kube::Error> {
        // Server-side apply with forced ownership of the managed fields.
        // The object sent is the deployed object with the desired spec
        // grafted on, so unmanaged metadata survives the patch.
        match object {
            ManagedObject::MessagingCluster(mc) => {
                self.messaging_api(&object_namespace(object))
                    .patch(
                        &mc.name_any(),
                        &PatchParams::apply(FIELD_MANAGER).force(),
                        &Patch::Apply(mc),
                    )
                    .await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, object: &ManagedObject) -> Result<(), kube::Error> {
        match object {
            ManagedObject::MessagingCluster(mc) => {
                let api = self.messaging_api(&object_namespace(object));
                match api.delete(&mc.name_any(), &DeleteParams::default()).await {
                    Ok(_) => {}
                    Err(kube::Error::Api(e)) if e.code == 404 => {
                        debug!("{} not found, already deleted", mc.name_any());
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }

    async fn discover_type(&self, kind: ManagedKind) -> Result<bool, kube::Error> {
        let group = kind.api_group();
        match kube::discovery::group(&self.client, &group).await {
            Ok(apigroup) => Ok(apigroup
                .recommended_resources()
                .iter()
                .any(|(ar, _)| ar.kind == kind.kind())),
            // An absent group is a definitive "not capable", not a failure
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(false),
            Err(kube::Error::Discovery(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
