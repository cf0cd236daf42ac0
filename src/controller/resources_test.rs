//! Unit tests for the managed-resource data model.

#[cfg(test)]
mod tests {
    use kube::api::ObjectMeta;

    use crate::controller::resources::{
        is_owned_by, owner_reference, ManagedKind, ManagedObject, ManagedResourceSet,
    };
    use crate::crd::{AtlasInfra, AtlasInfraSpec, MessagingCluster, MessagingClusterSpec};

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn infra(name: &str, uid: &str) -> AtlasInfra {
        AtlasInfra {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("team-a".to_string()),
                uid: Some(uid.to_string()),
                ..Default::default()
            },
            spec: AtlasInfraSpec {
                install_messaging: true,
                messaging: None,
            },
            status: None,
        }
    }

    fn cluster(name: &str, owner: Option<&AtlasInfra>) -> ManagedObject {
        ManagedObject::MessagingCluster(MessagingCluster {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("team-a".to_string()),
                owner_references: owner.map(|o| vec![owner_reference(o)]),
                ..Default::default()
            },
            spec: MessagingClusterSpec {
                replicas: 1,
                version: None,
            },
            status: None,
        })
    }

    // -----------------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------------

    #[test]
    fn test_object_key_display() {
        let key = cluster("atlas-messaging", None).key();
        assert_eq!(key.to_string(), "MessagingCluster/team-a/atlas-messaging");
    }

    #[test]
    fn test_managed_kind_metadata_comes_from_the_typed_crd() {
        assert_eq!(
            ManagedKind::MessagingCluster.api_group(),
            "messaging.streamhouse.io"
        );
        assert_eq!(ManagedKind::MessagingCluster.kind(), "MessagingCluster");
    }

    // -----------------------------------------------------------------------
    // ManagedResourceSet
    // -----------------------------------------------------------------------

    #[test]
    fn test_set_groups_by_kind() {
        let mut set = ManagedResourceSet::new();
        set.insert(cluster("a", None));
        set.insert(cluster("b", None));

        assert_eq!(set.len(), 2);
        assert_eq!(set.of_kind(ManagedKind::MessagingCluster).len(), 2);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_empty_set() {
        let set = ManagedResourceSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert!(set.of_kind(ManagedKind::MessagingCluster).is_empty());
    }

    // -----------------------------------------------------------------------
    // Ownership
    // -----------------------------------------------------------------------

    #[test]
    fn test_owned_object_matches_by_uid() {
        let owner = infra("team-a-infra", "uid-1");
        let object = cluster("atlas-messaging", Some(&owner));

        assert!(is_owned_by(&object, &owner));
    }

    #[test]
    fn test_foreign_object_is_not_owned() {
        let owner = infra("team-a-infra", "uid-1");
        let foreign = cluster("intruder", None);

        assert!(!is_owned_by(&foreign, &owner));
    }

    #[test]
    fn test_object_owned_by_different_instance_is_not_owned() {
        let owner = infra("team-a-infra", "uid-1");
        let other = infra("team-a-infra", "uid-2");
        let object = cluster("atlas-messaging", Some(&other));

        // Same kind and name, different instance: UID decides
        assert!(!is_owned_by(&object, &owner));
    }

    #[test]
    fn test_owner_reference_enables_cascade_deletion() {
        let owner = infra("team-a-infra", "uid-1");
        let reference = owner_reference(&owner);

        assert_eq!(reference.api_version, "atlas.dev/v1alpha1");
        assert_eq!(reference.block_owner_deletion, Some(true));
        assert_eq!(reference.controller, Some(true));
    }
}
