//! Typed access to the third-party MessagingCluster custom resource.
//!
//! The CRD itself is owned and installed by the Streamhouse messaging
//! operator, not by this crate. The struct here mirrors only the fields the
//! Atlas operator manages; whether the type is registered at all is probed
//! per reconciliation cycle.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "messaging.streamhouse.io",
    version = "v1beta1",
    kind = "MessagingCluster",
    namespaced,
    status = "MessagingClusterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct MessagingClusterSpec {
    /// Broker replica count
    pub replicas: i32,

    /// Broker version; the messaging operator's default applies when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessagingClusterStatus {
    /// Brokers currently ready, as reported by the messaging operator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_replicas: Option<i32>,
}
