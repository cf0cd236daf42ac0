//! Managed-resource data model for the reconciliation engine.
//!
//! Each cycle works on two snapshots, what should exist and what does
//! exist, grouped by managed kind. Kinds are a closed enumeration and
//! objects are kind-tagged variants, so the diff never inspects types at
//! runtime. Snapshots are rebuilt every cycle and hold no cross-cycle state.

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{Resource, ResourceExt};

use crate::crd::{AtlasInfra, MessagingCluster};

/// The closed set of Kubernetes object kinds this operator manages on behalf
/// of an AtlasInfra owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ManagedKind {
    MessagingCluster,
}

impl ManagedKind {
    /// Every managed kind, in deterministic order.
    pub const ALL: [ManagedKind; 1] = [ManagedKind::MessagingCluster];

    /// API group serving this kind; the group's presence in discovery is
    /// what makes the cluster "capable" of the kind.
    pub fn api_group(&self) -> String {
        match self {
            ManagedKind::MessagingCluster => MessagingCluster::group(&()).into_owned(),
        }
    }

    pub fn kind(&self) -> String {
        match self {
            ManagedKind::MessagingCluster => MessagingCluster::kind(&()).into_owned(),
        }
    }
}

impl fmt::Display for ManagedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kind())
    }
}

/// Identity of a managed object: kind + namespace + name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub kind: ManagedKind,
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// A single managed object, tagged by kind.
#[derive(Clone, Debug)]
pub enum ManagedObject {
    MessagingCluster(MessagingCluster),
}

impl ManagedObject {
    pub fn kind(&self) -> ManagedKind {
        match self {
            ManagedObject::MessagingCluster(_) => ManagedKind::MessagingCluster,
        }
    }

    pub fn meta(&self) -> &ObjectMeta {
        match self {
            ManagedObject::MessagingCluster(mc) => mc.meta(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            ManagedObject::MessagingCluster(mc) => mc.name_any(),
        }
    }

    pub fn namespace(&self) -> Option<String> {
        match self {
            ManagedObject::MessagingCluster(mc) => mc.namespace(),
        }
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey {
            kind: self.kind(),
            namespace: self.namespace().unwrap_or_default(),
            name: self.name(),
        }
    }

    /// Whether the managed spec fields of two objects match. Metadata such
    /// as resource version is ignored; a deployed object only counts as
    /// divergent when a field this operator manages differs.
    pub fn spec_matches(&self, other: &ManagedObject) -> bool {
        match (self, other) {
            (ManagedObject::MessagingCluster(a), ManagedObject::MessagingCluster(b)) => {
                a.spec == b.spec
            }
        }
    }

    /// The object an update dispatch sends: the desired spec and managed
    /// labels grafted onto the deployed object's metadata, so unmanaged
    /// metadata (resource version, third-party annotations) survives.
    /// Status and managedFields are cleared since server-side apply rejects
    /// them.
    pub fn merged_for_update(&self, deployed: &ManagedObject) -> ManagedObject {
        match (self, deployed) {
            (ManagedObject::MessagingCluster(desired), ManagedObject::MessagingCluster(live)) => {
                let mut merged = live.clone();
                merged.spec = desired.spec.clone();
                let mut labels = live.labels().clone();
                labels.extend(desired.labels().clone());
                merged.metadata.labels = Some(labels);
                merged.metadata.managed_fields = None;
                merged.status = None;
                ManagedObject::MessagingCluster(merged)
            }
        }
    }
}

/// Per-cycle snapshot of managed objects, grouped by kind. BTreeMap keeps
/// iteration deterministic so diff output and logs are stable across runs.
#[derive(Clone, Debug, Default)]
pub struct ManagedResourceSet {
    by_kind: BTreeMap<ManagedKind, Vec<ManagedObject>>,
}

impl ManagedResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: ManagedObject) {
        self.by_kind.entry(object.kind()).or_default().push(object);
    }

    pub fn of_kind(&self, kind: ManagedKind) -> &[ManagedObject] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn objects(&self) -> impl Iterator<Item = &ManagedObject> {
        self.by_kind.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.values().all(Vec::is_empty)
    }
}

/// Get the standard labels stamped on every object the operator creates
pub fn standard_labels(infra: &AtlasInfra) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(
        "app.kubernetes.io/name".to_string(),
        "atlas-infra".to_string(),
    );
    labels.insert("app.kubernetes.io/instance".to_string(), infra.name_any());
    labels.insert(
        "app.kubernetes.io/managed-by".to_string(),
        "atlas-operator".to_string(),
    );
    labels
}

/// Create an OwnerReference back to the AtlasInfra instance
///
/// Back-reference only: it enables cascade deletion and ownership filtering
/// during reads. The engine never holds deployed objects across cycles.
pub fn owner_reference(infra: &AtlasInfra) -> OwnerReference {
    OwnerReference {
        api_version: AtlasInfra::api_version(&()).to_string(),
        kind: AtlasInfra::kind(&()).to_string(),
        name: infra.name_any(),
        uid: infra.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Whether `object` carries an owner reference back to this AtlasInfra
/// instance. Matches by UID when the owner has one, by kind and name
/// otherwise (objects built before the owner was persisted).
pub fn is_owned_by(object: &ManagedObject, infra: &AtlasInfra) -> bool {
    let refs = object
        .meta()
        .owner_references
        .as_deref()
        .unwrap_or_default();

    refs.iter().any(|r| match infra.metadata.uid.as_deref() {
        Some(uid) => r.uid == uid,
        None => r.kind == AtlasInfra::kind(&()) && r.name == infra.name_any(),
    })
}
