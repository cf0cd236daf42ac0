//! Unit tests for the Atlas CRD types

use kube::CustomResourceExt;

use super::{AtlasInfra, AtlasInfraSpec, MessagingCluster, MessagingConfig};

// ---------------------------------------------------------------------------
// Serde behaviour
// ---------------------------------------------------------------------------

#[test]
fn test_install_flag_defaults_to_false() {
    let spec: AtlasInfraSpec = serde_json::from_str("{}").expect("empty spec must deserialize");
    assert!(!spec.install_messaging);
    assert!(spec.messaging.is_none());
}

#[test]
fn test_messaging_replicas_default_is_one() {
    let spec: AtlasInfraSpec =
        serde_json::from_str(r#"{"installMessaging": true, "messaging": {}}"#).unwrap();
    assert_eq!(spec.messaging_replicas(), 1);
}

#[test]
fn test_messaging_replicas_default_without_sizing_block() {
    let spec: AtlasInfraSpec = serde_json::from_str(r#"{"installMessaging": true}"#).unwrap();
    assert_eq!(spec.messaging_replicas(), 1);
    assert_eq!(spec.messaging_version(), None);
}

#[test]
fn test_spec_fields_are_camel_case() {
    let spec = AtlasInfraSpec {
        install_messaging: true,
        messaging: Some(MessagingConfig {
            replicas: 3,
            version: Some("3.7.0".to_string()),
        }),
    };

    let json = serde_json::to_value(&spec).unwrap();
    assert_eq!(json["installMessaging"], true);
    assert_eq!(json["messaging"]["replicas"], 3);
    assert_eq!(json["messaging"]["version"], "3.7.0");
}

// ---------------------------------------------------------------------------
// Spec validation
// ---------------------------------------------------------------------------

#[test]
fn test_validate_accepts_positive_replicas() {
    let spec = AtlasInfraSpec {
        install_messaging: true,
        messaging: Some(MessagingConfig {
            replicas: 1,
            version: None,
        }),
    };
    assert!(spec.validate().is_ok());
}

#[test]
fn test_validate_rejects_zero_replicas() {
    let spec = AtlasInfraSpec {
        install_messaging: true,
        messaging: Some(MessagingConfig {
            replicas: 0,
            version: None,
        }),
    };
    let err = spec.validate().expect_err("zero replicas must be rejected");
    assert_eq!(err.field, "spec.messaging.replicas");
}

#[test]
fn test_validate_rejects_negative_replicas() {
    let spec = AtlasInfraSpec {
        install_messaging: true,
        messaging: Some(MessagingConfig {
            replicas: -2,
            version: None,
        }),
    };
    assert!(spec.validate().is_err());
}

#[test]
fn test_validate_accepts_absent_sizing_block() {
    let spec = AtlasInfraSpec {
        install_messaging: true,
        messaging: None,
    };
    assert!(spec.validate().is_ok());
}

// ---------------------------------------------------------------------------
// CRD generation
// ---------------------------------------------------------------------------

#[test]
fn test_atlas_infra_crd_identity() {
    let crd = AtlasInfra::crd();
    assert_eq!(crd.metadata.name.as_deref(), Some("atlasinfras.atlas.dev"));
    assert_eq!(crd.spec.group, "atlas.dev");
}

#[test]
fn test_messaging_cluster_group_is_third_party() {
    let crd = MessagingCluster::crd();
    assert_eq!(crd.spec.group, "messaging.streamhouse.io");
}
