//! Reconciliation engine for Atlas platform infrastructure.
//!
//! Converges each AtlasInfra owner's namespace to its declared state:
//! capability probe, desired/deployed snapshots, diff, and per-object
//! dispatch with partial-failure containment.

pub mod capability;
pub mod cluster;
pub mod conditions;
pub mod deployed;
pub mod desired;
pub mod diff;
pub mod resources;

mod reconciler;

#[cfg(test)]
mod resources_test;

pub use capability::probe_capability;
pub use cluster::{ClusterHandle, KubeClusterHandle, FIELD_MANAGER};
pub use deployed::read_deployed;
pub use desired::{build_desired, MESSAGING_INSTANCE_NAME};
pub use diff::{compute_diff, DiffAction, ResourceDiff};
pub use reconciler::{
    reconcile_infra, run_controller, ApplyFailure, ControllerState, ReconciliationResult,
};
pub use resources::{
    is_owned_by, owner_reference, standard_labels, ManagedKind, ManagedObject, ManagedResourceSet,
    ObjectKey,
};
