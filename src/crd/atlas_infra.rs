//! AtlasInfra Custom Resource Definition
//!
//! An AtlasInfra resource declares which managed platform dependencies a
//! namespace should have installed. The operator converges the namespace to
//! that declaration on every reconciliation cycle.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{Condition, CycleSummary, MessagingConfig};

/// Structured validation error for `AtlasInfraSpec`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpecValidationError {
    pub field: String,
    pub message: String,
    pub how_to_fix: String,
}

impl SpecValidationError {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        how_to_fix: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            how_to_fix: how_to_fix.into(),
        }
    }
}

impl fmt::Display for SpecValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (fix: {})",
            self.field, self.message, self.how_to_fix
        )
    }
}

#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "atlas.dev",
    version = "v1alpha1",
    kind = "AtlasInfra",
    namespaced,
    status = "AtlasInfraStatus",
    shortname = "ainfra",
    printcolumn = r#"{"name":"Messaging","type":"boolean","jsonPath":".spec.installMessaging"}"#,
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct AtlasInfraSpec {
    /// Install the managed messaging cluster into this namespace
    #[serde(default)]
    pub install_messaging: bool,

    /// Sizing for the managed messaging cluster; operator defaults apply
    /// when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messaging: Option<MessagingConfig>,
}

impl AtlasInfraSpec {
    /// Validate the declared sizing parameters.
    ///
    /// Invalid sizing is rejected, never silently clamped. Intended absence
    /// of the dependency is expressed with `installMessaging: false`, not
    /// with a zero replica count.
    pub fn validate(&self) -> Result<(), SpecValidationError> {
        if let Some(messaging) = &self.messaging {
            if messaging.replicas < 1 {
                return Err(SpecValidationError::new(
                    "spec.messaging.replicas",
                    format!("replica count {} is not positive", messaging.replicas),
                    "set spec.messaging.replicas to 1 or more, or set spec.installMessaging to false",
                ));
            }
        }
        Ok(())
    }

    /// Effective replica count for the messaging cluster
    pub fn messaging_replicas(&self) -> i32 {
        self.messaging
            .as_ref()
            .map(|m| m.replicas)
            .unwrap_or_else(|| MessagingConfig::default().replicas)
    }

    /// Requested broker version, if pinned
    pub fn messaging_version(&self) -> Option<&str> {
        self.messaging.as_ref().and_then(|m| m.version.as_deref())
    }
}

/// Status of an AtlasInfra resource
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AtlasInfraStatus {
    /// Human-readable summary of the last reconciliation cycle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Observed generation for status sync detection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Readiness conditions following Kubernetes conventions
    ///
    /// - Ready: True when the last cycle converged with no failures
    /// - Degraded: True when one or more per-object applies failed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Action counts from the most recent reconciliation cycle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle: Option<CycleSummary>,
}
