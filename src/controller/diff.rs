//! Desired/deployed diff.
//!
//! Pure computation over the two per-cycle snapshots. The full diff is
//! produced before anything is dispatched; dispatch never acts on a
//! partially-computed diff.

use std::collections::BTreeMap;

use super::resources::{ManagedObject, ManagedResourceSet, ObjectKey};

/// One convergence action for a single object
#[derive(Clone, Debug)]
pub enum DiffAction {
    Create(ManagedObject),
    Update(ManagedObject),
    Delete(ManagedObject),
}

impl DiffAction {
    pub fn key(&self) -> ObjectKey {
        match self {
            DiffAction::Create(o) | DiffAction::Update(o) | DiffAction::Delete(o) => o.key(),
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            DiffAction::Create(_) => "create",
            DiffAction::Update(_) => "update",
            DiffAction::Delete(_) => "delete",
        }
    }
}

/// Outcome of diffing one cycle's desired set against its deployed set
#[derive(Clone, Debug, Default)]
pub struct ResourceDiff {
    /// Actions needed to converge, in key order
    pub actions: Vec<DiffAction>,
    /// Objects present in both sets with matching spec
    pub unchanged: usize,
}

impl ResourceDiff {
    pub fn is_converged(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Diff `desired` against `deployed` by identity key (kind + namespace +
/// name).
///
/// Desired-only objects are created, deployed-only objects are deleted, and
/// objects present in both are updated when a managed spec field differs.
/// Updates carry the desired spec grafted onto the deployed object's
/// metadata so unmanaged fields survive. Actions come out in key order, so
/// logs are stable across runs; dispatch order carries no semantic
/// requirement since the actions target distinct identities.
pub fn compute_diff(desired: &ManagedResourceSet, deployed: &ManagedResourceSet) -> ResourceDiff {
    let desired_by_key: BTreeMap<ObjectKey, &ManagedObject> =
        desired.objects().map(|o| (o.key(), o)).collect();
    let deployed_by_key: BTreeMap<ObjectKey, &ManagedObject> =
        deployed.objects().map(|o| (o.key(), o)).collect();

    let mut diff = ResourceDiff::default();

    for (key, want) in &desired_by_key {
        match deployed_by_key.get(key) {
            None => diff.actions.push(DiffAction::Create((*want).clone())),
            Some(have) if want.spec_matches(have) => diff.unchanged += 1,
            Some(have) => diff
                .actions
                .push(DiffAction::Update(want.merged_for_update(have))),
        }
    }

    for (key, have) in &deployed_by_key {
        if !desired_by_key.contains_key(key) {
            diff.actions.push(DiffAction::Delete((*have).clone()));
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    use super::*;
    use crate::crd::{MessagingCluster, MessagingClusterSpec};

    fn cluster(name: &str, replicas: i32) -> ManagedObject {
        ManagedObject::MessagingCluster(MessagingCluster {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("team-a".to_string()),
                ..Default::default()
            },
            spec: MessagingClusterSpec {
                replicas,
                version: None,
            },
            status: None,
        })
    }

    fn set_of(objects: Vec<ManagedObject>) -> ManagedResourceSet {
        let mut set = ManagedResourceSet::new();
        for object in objects {
            set.insert(object);
        }
        set
    }

    fn verbs_by_name(diff: &ResourceDiff) -> BTreeMap<String, &'static str> {
        diff.actions
            .iter()
            .map(|a| (a.key().name, a.verb()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Core diff semantics
    // -----------------------------------------------------------------------

    #[test]
    fn test_desired_only_becomes_create() {
        let diff = compute_diff(&set_of(vec![cluster("a", 1)]), &set_of(vec![]));

        assert_eq!(diff.actions.len(), 1);
        assert_eq!(diff.actions[0].verb(), "create");
        assert_eq!(diff.unchanged, 0);
    }

    #[test]
    fn test_deployed_only_becomes_delete() {
        let diff = compute_diff(&set_of(vec![]), &set_of(vec![cluster("old", 1)]));

        assert_eq!(diff.actions.len(), 1);
        assert_eq!(diff.actions[0].verb(), "delete");
    }

    #[test]
    fn test_matching_spec_is_no_op() {
        let diff = compute_diff(&set_of(vec![cluster("a", 3)]), &set_of(vec![cluster("a", 3)]));

        assert!(diff.is_converged());
        assert_eq!(diff.unchanged, 1);
    }

    #[test]
    fn test_divergent_spec_becomes_update() {
        let diff = compute_diff(&set_of(vec![cluster("a", 5)]), &set_of(vec![cluster("a", 3)]));

        assert_eq!(diff.actions.len(), 1);
        assert_eq!(diff.actions[0].verb(), "update");
    }

    #[test]
    fn test_mixed_diff_yields_create_update_delete() {
        // desired {a, b} vs deployed {b(old-spec), c}
        let desired = set_of(vec![cluster("a", 1), cluster("b", 5)]);
        let deployed = set_of(vec![cluster("b", 3), cluster("c", 1)]);

        let diff = compute_diff(&desired, &deployed);
        let verbs = verbs_by_name(&diff);

        assert_eq!(verbs.get("a"), Some(&"create"));
        assert_eq!(verbs.get("b"), Some(&"update"));
        assert_eq!(verbs.get("c"), Some(&"delete"));
        assert_eq!(diff.actions.len(), 3);
        assert_eq!(diff.unchanged, 0);
    }

    // -----------------------------------------------------------------------
    // Equality ignores unmanaged metadata
    // -----------------------------------------------------------------------

    #[test]
    fn test_resource_version_does_not_count_as_drift() {
        let desired = cluster("a", 3);
        let deployed = match cluster("a", 3) {
            ManagedObject::MessagingCluster(mut mc) => {
                mc.metadata.resource_version = Some("4711".to_string());
                mc.metadata.annotations = Some(BTreeMap::from([(
                    "messaging.streamhouse.io/rack".to_string(),
                    "r1".to_string(),
                )]));
                ManagedObject::MessagingCluster(mc)
            }
        };

        let diff = compute_diff(&set_of(vec![desired]), &set_of(vec![deployed]));
        assert!(diff.is_converged());
        assert_eq!(diff.unchanged, 1);
    }

    // -----------------------------------------------------------------------
    // Update merge semantics
    // -----------------------------------------------------------------------

    #[test]
    fn test_update_preserves_unmanaged_metadata() {
        let desired = cluster("a", 5);
        let deployed = match cluster("a", 3) {
            ManagedObject::MessagingCluster(mut mc) => {
                mc.metadata.resource_version = Some("4711".to_string());
                mc.metadata.annotations = Some(BTreeMap::from([(
                    "messaging.streamhouse.io/rack".to_string(),
                    "r1".to_string(),
                )]));
                ManagedObject::MessagingCluster(mc)
            }
        };

        let diff = compute_diff(&set_of(vec![desired]), &set_of(vec![deployed]));

        let merged = match &diff.actions[0] {
            DiffAction::Update(ManagedObject::MessagingCluster(mc)) => mc,
            other => panic!("expected update, got {:?}", other),
        };
        assert_eq!(merged.spec.replicas, 5);
        assert_eq!(merged.metadata.resource_version.as_deref(), Some("4711"));
        assert!(merged
            .metadata
            .annotations
            .as_ref()
            .unwrap()
            .contains_key("messaging.streamhouse.io/rack"));
        assert!(merged.metadata.managed_fields.is_none());
        assert!(merged.status.is_none());
    }

    // -----------------------------------------------------------------------
    // Determinism
    // -----------------------------------------------------------------------

    #[test]
    fn test_actions_come_out_in_key_order() {
        let desired = set_of(vec![cluster("zeta", 1), cluster("alpha", 1)]);
        let diff = compute_diff(&desired, &set_of(vec![]));

        let names: Vec<String> = diff.actions.iter().map(|a| a.key().name).collect();
        assert_eq!(names, vec!["alpha".to_string(), "zeta".to_string()]);
    }
}
